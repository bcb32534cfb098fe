use serde::{Deserialize, Serialize};

use crate::classifier::classify;
use crate::config::DecoderConfig;
use crate::engine::{self, Excerpt, Failure, RawError};
use crate::error::Result;

/// Serializes `value` to JSON bytes.
///
/// Encoding errors come straight from `serde_json` and are not classified.
pub fn encode<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// Decodes a complete JSON document, ignoring undeclared object fields.
pub fn unmarshal<'de, T: Deserialize<'de>>(data: &'de [u8]) -> Result<T> {
    unmarshal_with(data, &DecoderConfig::default())
}

/// Decodes a complete JSON document with explicit options.
///
/// Anything but whitespace after the value is a failure.
pub fn unmarshal_with<'de, T: Deserialize<'de>>(
    data: &'de [u8],
    config: &DecoderConfig,
) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(data);
    let failure = match engine::deserialize::<T, _>(&mut de, config.strict)
        .and_then(|value| de.end().map(|()| value).map_err(|error| Failure::json(String::new(), error)))
    {
        Ok(value) => return Ok(value),
        Err(failure) => failure,
    };

    let raw = if failure.is_eof() && data.iter().all(u8::is_ascii_whitespace) {
        RawError::EndOfStream
    } else {
        let head = failure.head(data);
        failure.into_raw::<T>(Excerpt::around(data, head, config))
    };
    Err(classify(raw))
}
