//! JSON encode/decode on top of `serde_json` with a small, stable error
//! taxonomy.
//!
//! Decode failures are classified into an [`ErrorKind`] with a short message,
//! keeping the engine's own error as the cause.

mod classifier;
mod codec;
mod config;
mod decoder;
mod engine;
mod error;

pub use classifier::{classify, classify_result};
pub use codec::{encode, unmarshal, unmarshal_with};
pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use engine::{Excerpt, RawError};
pub use error::{Cause, Error, ErrorKind, Result};
