use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::engine::RawError;

/// Original error returned by the JSON engine, kept for inspection.
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Stable classification of a failed decode.
///
/// The string forms (`decodingFailed`, `parsingFailed`, `unexpectedField`) are
/// part of the public contract and are shared by `Display`, `FromStr` and
/// serde.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ErrorKind {
    /// Any decode failure without a more specific diagnostic.
    DecodingFailed,
    /// The engine stopped at a byte location; the message carries the bytes
    /// around it.
    ParsingFailed,
    /// The input held an object field the target does not accept.
    UnexpectedField,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// Structured decoding error.
///
/// `Display` renders only the short message. The engine's own text is reachable
/// through [`Error::cause`] or [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Cause,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>, cause: Cause) -> Self {
        Self { kind, message: message.into(), cause }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw error this one was classified from.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> Cause {
        self.cause
    }

    /// True when a stream ran out before another value started, the
    /// equivalent of a clean EOF between values.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(
            self.cause.downcast_ref::<RawError>(),
            Some(RawError::EndOfStream)
        )
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 2)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_kind_string_forms() {
        let actual = [
            ErrorKind::DecodingFailed.as_str(),
            ErrorKind::ParsingFailed.as_str(),
            ErrorKind::UnexpectedField.as_str(),
        ];
        let expected = ["decodingFailed", "parsingFailed", "unexpectedField"];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_kind_display_matches_serde() {
        let fixture = ErrorKind::UnexpectedField;
        let actual = serde_json::to_value(fixture).unwrap();
        let expected = json!(fixture.to_string());
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_kind_from_str() {
        let actual: ErrorKind = "parsingFailed".parse().unwrap();
        let expected = ErrorKind::ParsingFailed;
        assert_eq!(actual, expected);

        assert!("ParsingFailed".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_error_display_is_message() {
        let fixture = Error::new(
            ErrorKind::UnexpectedField,
            "unexpected field 'caca'",
            "ReadObject: found unknown field: caca, ".into(),
        );
        let actual = fixture.to_string();
        let expected = "unexpected field 'caca'";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_error_serializes_without_cause() {
        let fixture = Error::new(
            ErrorKind::DecodingFailed,
            "failed to decode json",
            "unexpected end of input".into(),
        );
        let actual = serde_json::to_value(&fixture).unwrap();
        let expected = json!({"kind": "decodingFailed", "message": "failed to decode json"});
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_end_of_stream_detection() {
        let fixture = Error::new(
            ErrorKind::DecodingFailed,
            "failed to decode json",
            Box::new(RawError::EndOfStream),
        );
        assert!(fixture.is_end_of_stream());

        let fixture = Error::new(
            ErrorKind::DecodingFailed,
            "failed to decode json",
            "EOF".into(),
        );
        assert!(!fixture.is_end_of_stream());
    }
}
