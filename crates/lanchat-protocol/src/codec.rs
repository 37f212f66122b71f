//! Codec trait and implementations for serializing/deserializing records.
//!
//! The relay decodes every inbound frame into a
//! [`ClientRecord`](crate::ClientRecord) through a [`Codec`], and uses the
//! same codec for the `online_users` list it sends back. The protocol layer
//! does not care which serialization format sits behind the trait.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what existing lanchat clients speak, so this is the default.
/// It is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use lanchat_protocol::{ClientRecord, Codec, Control, JsonCodec};
///
/// let codec = JsonCodec;
/// let record = ClientRecord::text(Control::Broadcast, "hi");
///
/// let bytes = codec.encode(&record).unwrap();
/// let decoded: ClientRecord = codec.decode(&bytes).unwrap();
/// assert_eq!(record, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
