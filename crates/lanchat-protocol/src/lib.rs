//! Wire protocol for lanchat.
//!
//! Two message shapes share one TCP stream:
//!
//! - **Records** ([`ClientRecord`]), client → relay: JSON objects with a
//!   `type` tag, a `control` destination, a `message` body, and an optional
//!   `filename`.
//! - **Frames** ([`ServerFrame`]), relay → client: `<tag>=<payload>` text
//!   with the tags `msg`, `file`, and `online_users`.
//!
//! The [`Codec`] trait turns records into bytes and back; [`JsonCodec`] is
//! the default. File bodies travel as base64 (see [`encode_file`] and
//! [`decode_file`]).
//!
//! ```text
//! Transport (frames) → Protocol (records) → Relay (routing)
//! ```

mod codec;
mod error;
mod file;
mod frame;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use file::{decode_file, decoded_len_hint, encode_file};
pub use frame::{FILE_FIELD_SEPARATOR, SERVER_PREFIX, ServerFrame};
pub use types::{
    BROADCAST_CONTROL, ClientRecord, Control, IGNORED_CONTROL, OnlineUser, RecordType,
};

/// Well-known TCP port of the chat relay.
pub const DEFAULT_CHAT_PORT: u16 = 5050;
