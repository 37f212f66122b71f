//! Error types for the protocol layer.
//!
//! Each lanchat crate defines its own error enum. A `ProtocolError` always
//! means the bytes themselves were wrong: bad JSON, an unknown frame tag,
//! a payload that is not valid base64. It never means a network failure.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing required field,
    /// or an unknown record `type`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule, e.g. a `file` frame
    /// without its three `||`-separated fields.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A relay frame carried a tag other than `msg`, `file`, or
    /// `online_users`.
    #[error("unknown frame tag: {0}")]
    UnknownTag(String),

    /// A file payload was not valid base64.
    #[error("invalid file payload: {0}")]
    InvalidFile(#[from] base64::DecodeError),
}
