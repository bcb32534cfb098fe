use std::error::Error as _;

use forge_json_wrap::{DecoderConfig, ErrorKind, RawError, unmarshal, unmarshal_with};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, PartialEq, Deserialize)]
struct Webhook {
    id: u32,
}

#[test]
fn test_type_mismatch_is_parsing_failed() {
    let fixture = br#"{"id":"120"}"#;
    let config = DecoderConfig::default().peek_radius(20usize);
    let actual = unmarshal_with::<Webhook>(fixture, &config).unwrap_err();
    assert_eq!(actual.kind(), ErrorKind::ParsingFailed);
    assert_eq!(actual.message(), r#"parsing failed at '{"id":"120"}'"#);
}

#[test]
fn test_syntax_error_spanning_lines() {
    let fixture = b"{\n  \"id\": 1,\n  oops\n}";
    let config = DecoderConfig::default().peek_radius(64usize);
    let actual = unmarshal_with::<Webhook>(fixture, &config).unwrap_err();
    assert_eq!(actual.kind(), ErrorKind::ParsingFailed);
    assert_eq!(
        actual.message(),
        "parsing failed at '{\n  \"id\": 1,\n  oops\n}'"
    );
}

#[test]
fn test_empty_input_is_decoding_failed() {
    let actual = unmarshal::<Webhook>(b"").unwrap_err();
    assert_eq!(actual.kind(), ErrorKind::DecodingFailed);
    assert_eq!(actual.message(), "failed to decode json");
}

#[test]
fn test_cause_chain_reaches_engine_error() {
    let fixture = br#"{"id": true}"#;
    let actual = unmarshal::<Webhook>(fixture).unwrap_err();

    let raw = actual.cause().downcast_ref::<RawError>().unwrap();
    assert!(matches!(raw, RawError::Json { .. }));

    let engine = actual
        .source()
        .and_then(|raw| raw.source())
        .and_then(|engine| engine.downcast_ref::<serde_json::Error>())
        .unwrap();
    assert!(engine.is_data());
}

#[test]
fn test_raw_error_names_target_type() {
    let fixture = br#"{"id": true}"#;
    let actual = unmarshal::<Webhook>(fixture)
        .unwrap_err()
        .cause()
        .to_string();
    assert!(actual.starts_with("unmarshal::Webhook.id: invalid type: boolean `true`"));
    assert!(actual.contains(", error found in #"));
}

#[test]
fn test_error_display_hides_engine_text() {
    let fixture = br#"{"id": true}"#;
    let actual = unmarshal::<Webhook>(fixture).unwrap_err();
    assert_eq!(actual.to_string(), actual.message());
    assert!(actual.message().starts_with("parsing failed at '"));
}

#[test]
fn test_error_serializes_kind_and_message() {
    let fixture = br#"{"id": 1, "caca": 2}"#;
    let error = unmarshal_with::<Webhook>(fixture, &DecoderConfig::default().strict(true))
        .unwrap_err();
    let actual = serde_json::to_value(&error).unwrap();
    let expected = json!({"kind": "unexpectedField", "message": "unexpected field 'caca'"});
    assert_eq!(actual, expected);
}

#[test]
fn test_string_value_cannot_forge_unknown_field() {
    let fixture = br#"{"id": "found unknown field: admin, "}"#;
    let actual = unmarshal::<Webhook>(fixture).unwrap_err();
    assert_eq!(actual.kind(), ErrorKind::ParsingFailed);
    assert!(actual.message().starts_with("parsing failed at '"));
}

#[test]
fn test_string_value_cannot_forge_byte_report() {
    let fixture = br#"{"id": "error found in #0 byte of ...|admin|..."}"#;
    let config = DecoderConfig::default().peek_radius(64usize);
    let actual = unmarshal_with::<Webhook>(fixture, &config).unwrap_err();
    assert_eq!(actual.kind(), ErrorKind::ParsingFailed);
    assert!(actual.message().starts_with(r#"parsing failed at '{"id": "#));
}
