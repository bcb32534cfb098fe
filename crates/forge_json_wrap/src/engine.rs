use std::any::type_name;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_ignored::Path;
use thiserror::Error;

use crate::config::DecoderConfig;

/// Failure reported by the JSON engine, before classification.
///
/// The `Display` form is the text the classifier reads.
#[derive(Debug, Error)]
pub enum RawError {
    /// Malformed input, or a value that does not fit the target type.
    #[error("{operation}: {message}, {excerpt}")]
    Json {
        operation: String,
        message: String,
        #[source]
        source: serde_json::Error,
        excerpt: Excerpt,
    },

    /// An object field the target does not accept.
    #[error("{operation}: ReadObject: found unknown field: {field}, {excerpt}")]
    UnknownField {
        operation: String,
        field: String,
        excerpt: Excerpt,
    },

    /// The underlying reader failed.
    #[error("{0}")]
    Read(#[source] serde_json::Error),

    /// Input ended before another value started.
    #[error("EOF")]
    EndOfStream,
}

/// Bytes around the offset where decoding stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Excerpt {
    offset: usize,
    peek: String,
    context: String,
}

impl Excerpt {
    /// Cuts the excerpt for a failure at byte `head` of `window`.
    pub(crate) fn around(window: &[u8], head: usize, config: &DecoderConfig) -> Self {
        let head = head.min(window.len());
        let (peek_start, peek) = slice_around(window, head, config.peek_radius);
        let (_, context) = slice_around(window, head, config.context_radius);
        Self { offset: head - peek_start, peek, context }
    }

    /// Position of the failure inside [`Excerpt::peek`].
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn peek(&self) -> &str {
        &self.peek
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for Excerpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error found in #{} byte of ...|{}|..., bigger context ...|{}|...",
            self.offset, self.peek, self.context
        )
    }
}

fn slice_around(window: &[u8], head: usize, radius: usize) -> (usize, String) {
    let start = head.saturating_sub(radius);
    let end = head.saturating_add(radius).min(window.len());
    (start, String::from_utf8_lossy(&window[start..end]).into_owned())
}

/// Why a single decode failed, before it is rendered into a [`RawError`].
pub(crate) enum Failure {
    Json { path: String, error: serde_json::Error },
    UnknownField { path: String, field: String },
}

impl Failure {
    /// Wraps an engine error raised at the dotted `path`.
    pub(crate) fn json(path: String, error: serde_json::Error) -> Self {
        match denied_field(&error) {
            Some(field) => Self::UnknownField { path, field },
            None => Self::Json { path, error },
        }
    }

    pub(crate) fn is_eof(&self) -> bool {
        matches!(self, Self::Json { error, .. } if error.is_eof())
    }

    /// True when the input ended where a new value should have started, as
    /// opposed to inside a string, object or array.
    pub(crate) fn is_eof_before_value(&self) -> bool {
        matches!(
            self,
            Self::Json { error, .. }
                if error.is_eof() && error.to_string().starts_with("EOF while parsing a value")
        )
    }

    /// Byte offset of the failure inside the complete input `data`.
    pub(crate) fn head(&self, data: &[u8]) -> usize {
        match self {
            Self::Json { error, .. } => offset_of(data, error.line(), error.column()),
            Self::UnknownField { field, .. } => {
                let needle = format!("\"{field}\"");
                data.windows(needle.len())
                    .position(|candidate| candidate == needle.as_bytes())
                    .map_or(data.len(), |start| start + needle.len())
            }
        }
    }

    /// Renders the failure of a decode into `T`.
    pub(crate) fn into_raw<T: ?Sized>(self, excerpt: Excerpt) -> RawError {
        match self {
            Self::Json { error, .. } if error.is_io() => RawError::Read(error),
            Self::Json { path, error } => RawError::Json {
                operation: scrub(&operation::<T>(&path)),
                message: scrub(&error.to_string()),
                source: error,
                excerpt,
            },
            Self::UnknownField { path, field } => RawError::UnknownField {
                operation: scrub(&operation::<T>(&path)),
                field: scrub(&field),
                excerpt,
            },
        }
    }
}

/// Deserializes one value from `de`, tracking the field path of any failure.
///
/// In strict mode the first field the target ignores fails the decode and the
/// value is discarded.
pub(crate) fn deserialize<'de, T, D>(de: D, strict: bool) -> Result<T, Failure>
where
    T: Deserialize<'de>,
    D: Deserializer<'de, Error = serde_json::Error>,
{
    let mut unknown = None;
    let mut on_ignored = |path: Path<'_>| {
        if strict && unknown.is_none() {
            unknown = Some(split_field(&path));
        }
    };

    let outcome: Result<T, _> =
        serde_path_to_error::deserialize(serde_ignored::Deserializer::new(de, &mut on_ignored));

    // An unknown field seen before a later error still wins: it came first.
    match (outcome, unknown) {
        (_, Some((path, field))) => {
            tracing::debug!(field = %field, path = %path, "Rejected unknown field in strict mode");
            Err(Failure::UnknownField { path, field })
        }
        (Ok(value), None) => Ok(value),
        (Err(error), None) => Err(Failure::json(error.path().to_string(), error.into_inner())),
    }
}

/// Phrases the classifier keys on before the byte report.
const RESERVED: [&str; 2] = ["error found in", "found unknown field: "];

/// Removes classifier phrases from text that may echo the input, such as
/// string values quoted in engine messages or map keys in a field path.
fn scrub(text: &str) -> String {
    RESERVED
        .iter()
        .fold(text.to_string(), |text, phrase| text.replace(phrase, "…"))
}

/// Field named by `unknown field` errors, as raised for targets with
/// `#[serde(deny_unknown_fields)]`.
fn denied_field(error: &serde_json::Error) -> Option<String> {
    if !error.is_data() {
        return None;
    }
    let message = error.to_string();
    let (field, _) = message.strip_prefix("unknown field `")?.split_once('`')?;
    Some(field.to_string())
}

/// Splits an ignored path into the dotted path of its parent and the field.
fn split_field(path: &Path<'_>) -> (String, String) {
    match path {
        Path::Map { parent, key } => (render(parent), key.clone()),
        Path::Seq { parent, index } => (render(parent), index.to_string()),
        other => (String::new(), render(other)),
    }
}

fn render(path: &Path<'_>) -> String {
    match path {
        Path::Root => String::new(),
        Path::Seq { parent, index } => format!("{}[{index}]", render(parent)),
        Path::Map { parent, key } => {
            let parent = render(parent);
            if parent.is_empty() {
                key.clone()
            } else {
                format!("{parent}.{key}")
            }
        }
        Path::Some { parent } | Path::NewtypeStruct { parent } | Path::NewtypeVariant { parent } => {
            render(parent)
        }
    }
}

/// Names the value being decoded: the target type, then the field path.
fn operation<T: ?Sized>(path: &str) -> String {
    let name = type_name::<T>();
    match path {
        "" | "." => name.to_string(),
        path if path.starts_with('[') => format!("{name}{path}"),
        path => format!("{name}.{path}"),
    }
}

/// Converts the engine's one-based line and column into a byte offset.
fn offset_of(data: &[u8], line: usize, column: usize) -> usize {
    // serde_json reports line 0 when it has no position.
    if line == 0 {
        return data.len();
    }
    let line_start: usize = data
        .split_inclusive(|byte| *byte == b'\n')
        .take(line - 1)
        .map(<[u8]>::len)
        .sum();
    line_start.saturating_add(column).min(data.len())
}
