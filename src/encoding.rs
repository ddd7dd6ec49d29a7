//! Text encoding for salts and ciphertext
//!
//! Standard base64 (RFC 4648 alphabet, with `=` padding) so that raw bytes
//! can live in configuration records, environment variables and log lines.
//! The output never contains whitespace.

use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Encode bytes as base64 text.
pub fn to_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text produced by [`to_text`].
///
/// Leading and trailing whitespace is ignored so that values read back from
/// text files (with a final newline) decode cleanly.
pub fn from_text(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text.trim()).map_err(|e| {
        PbeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EncodingInvalid,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
