use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Cause, Error, ErrorKind, Result};

/// Separates the operation text of a raw error from its byte report.
const REPORT_MARKER: &str = "error found in";

/// Starts the wide excerpt inside a byte report.
const CONTEXT_MARKER: &str = "bigger context";

const DECODING_FAILED: &str = "failed to decode json";

static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

/// Matchers for the raw error text rendered by [`RawError`](crate::RawError).
///
/// These patterns and the wording in `engine.rs` change together.
struct Patterns {
    unknown_field: Regex,
    byte_context: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            // eg: `app::Webhook.data: ReadObject: found unknown field: caca, `
            unknown_field: Regex::new(r"found unknown field: (.+), ").unwrap(),
            // eg: ` #10 byte of ...|on": "120"|..., `
            // The capture may span lines but stops at the first closing marker.
            byte_context: Regex::new(r"byte of \.\.\.\|((?s:.+?))\|\.\.\.").unwrap(),
        }
    }

    fn unexpected_field<'a>(&self, prefix: &'a str) -> Option<&'a str> {
        self.unknown_field
            .captures(prefix)
            .and_then(|captures| captures.get(1))
            .map(|field| field.as_str())
    }

    fn parsing_context<'a>(&self, report: &'a str) -> Option<&'a str> {
        let excerpt = report
            .split_once(CONTEXT_MARKER)
            .map_or(report, |(excerpt, _)| excerpt);
        self.byte_context
            .captures(excerpt)
            .and_then(|captures| captures.get(1))
            .map(|context| context.as_str())
    }

    fn classify(&self, text: &str) -> (ErrorKind, String) {
        let (prefix, report) = match text.split_once(REPORT_MARKER) {
            Some((prefix, report)) => (prefix, Some(report)),
            None => (text, None),
        };

        if let Some(field) = self.unexpected_field(prefix) {
            return (
                ErrorKind::UnexpectedField,
                format!("unexpected field '{field}'"),
            );
        }

        if let Some(context) = report.and_then(|report| self.parsing_context(report)) {
            return (
                ErrorKind::ParsingFailed,
                format!("parsing failed at '{context}'"),
            );
        }

        (ErrorKind::DecodingFailed, DECODING_FAILED.to_string())
    }
}

/// Turns a raw engine error into a structured [`Error`].
///
/// Always succeeds: text that matches no known pattern becomes
/// [`ErrorKind::DecodingFailed`]. The raw error is kept as the cause.
pub fn classify<E>(raw: E) -> Error
where
    E: Into<Cause>,
{
    let cause = raw.into();
    let (kind, message) = PATTERNS.classify(&cause.to_string());
    tracing::debug!(kind = %kind, cause = %cause, "Classified json decoding error");
    Error::new(kind, message, cause)
}

/// Classifies the error side of `result`, passing success through untouched.
pub fn classify_result<T, E>(result: std::result::Result<T, E>) -> Result<T>
where
    E: Into<Cause>,
{
    result.map_err(classify)
}
