//! Client → relay records.
//!
//! Every inbound frame is one JSON object:
//!
//! ```text
//! { "type": "name" | "msg" | "file" | "online_usr",
//!   "control": "<user name>" | "4all" | "dontcare",
//!   "message": "<text or base64>",
//!   "filename": "<name>"            // file records only
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::file::encode_file;

/// Literal `control` value meaning "send to everyone".
pub const BROADCAST_CONTROL: &str = "4all";

/// Literal `control` value for records where the field is unused.
pub const IGNORED_CONTROL: &str = "dontcare";

// ---------------------------------------------------------------------------
// RecordType
// ---------------------------------------------------------------------------

/// The kind tag of an inbound record.
///
/// Serialized as the lowercase wire names: `"name"`, `"msg"`, `"file"`,
/// `"online_usr"`. Any other value fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Register a display name. The name is carried in `message`.
    Name,
    /// A text message.
    Msg,
    /// A file; `message` is base64 and `filename` names it.
    File,
    /// Ask for the list of other connected users.
    OnlineUsr,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Name => "name",
            Self::Msg => "msg",
            Self::File => "file",
            Self::OnlineUsr => "online_usr",
        };
        f.write_str(tag)
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// The `control` field: where a record is going.
///
/// On the wire this is a plain string. `"4all"` and `"dontcare"` are
/// reserved; anything else is taken as a display name, compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Control {
    /// `"4all"`: every other registered session.
    Broadcast,
    /// `"dontcare"`: the field is not used by this record type.
    Ignored,
    /// A specific display name.
    User(String),
}

impl From<String> for Control {
    fn from(value: String) -> Self {
        match value.as_str() {
            BROADCAST_CONTROL => Self::Broadcast,
            IGNORED_CONTROL => Self::Ignored,
            _ => Self::User(value),
        }
    }
}

impl From<Control> for String {
    fn from(value: Control) -> Self {
        match value {
            Control::Broadcast => BROADCAST_CONTROL.to_string(),
            Control::Ignored => IGNORED_CONTROL.to_string(),
            Control::User(name) => name,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => f.write_str(BROADCAST_CONTROL),
            Self::Ignored => f.write_str(IGNORED_CONTROL),
            Self::User(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRecord
// ---------------------------------------------------------------------------

/// One inbound record, exactly as a client sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// What the client wants.
    #[serde(rename = "type")]
    pub kind: RecordType,

    /// Destination, broadcast marker, or placeholder.
    pub control: Control,

    /// Text, a display name, or a base64 file body depending on `kind`.
    pub message: String,

    /// File name; only meaningful for [`RecordType::File`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ClientRecord {
    /// A `name` record asking to register `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            kind: RecordType::Name,
            control: Control::Ignored,
            message: name.into(),
            filename: None,
        }
    }

    /// A `msg` record carrying text.
    pub fn text(to: Control, text: impl Into<String>) -> Self {
        Self {
            kind: RecordType::Msg,
            control: to,
            message: text.into(),
            filename: None,
        }
    }

    /// A `file` record; `contents` is base64-encoded here.
    pub fn file(to: Control, filename: impl Into<String>, contents: &[u8]) -> Self {
        Self {
            kind: RecordType::File,
            control: to,
            message: encode_file(contents),
            filename: Some(filename.into()),
        }
    }

    /// An `online_usr` request.
    pub fn online_users() -> Self {
        Self {
            kind: RecordType::OnlineUsr,
            control: Control::Ignored,
            message: IGNORED_CONTROL.to_string(),
            filename: None,
        }
    }
}

// ---------------------------------------------------------------------------
// OnlineUser
// ---------------------------------------------------------------------------

/// One entry of the `online_users` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    /// Display name.
    pub name: String,
    /// Remote address as `ip:port`.
    pub addr: String,
}
