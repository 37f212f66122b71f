//! Base64 helpers for file payloads.
//!
//! The relay stores and forwards file bodies as the base64 text it
//! received and never decodes them; only the endpoints do.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::ProtocolError;

/// Encodes raw file bytes for a `file` record.
pub fn encode_file(contents: &[u8]) -> String {
    BASE64.encode(contents)
}

/// Decodes the base64 body of a received `file` frame.
pub fn decode_file(data: &str) -> Result<Vec<u8>, ProtocolError> {
    Ok(BASE64.decode(data)?)
}

/// Approximate decoded size of a base64 body, for logging.
pub fn decoded_len_hint(data: &str) -> usize {
    data.len() * 3 / 4
}
