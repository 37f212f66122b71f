//! Stored chat records and how they render as relay frames.

use std::fmt;

use lanchat_protocol::{ClientRecord, Control, RecordType, ServerFrame, decoded_len_hint};

/// Label shown in place of a destination for global text messages.
pub const BROADCAST_LABEL: &str = "todos";

/// File name used when a `file` record arrives without one.
pub const DEFAULT_FILENAME: &str = "received_file";

/// Where a record is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Every registered session except the sender.
    All,
    /// Exactly one session, by display name.
    User(String),
}

impl From<Control> for Destination {
    /// `"4all"` is a broadcast; any other control value, including the
    /// `"dontcare"` placeholder, is taken literally as a user name.
    fn from(control: Control) -> Self {
        match control {
            Control::Broadcast => Self::All,
            other => Self::User(other.into()),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::User(name) => f.write_str(name),
        }
    }
}

/// What a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Text,
    File,
}

/// A chat event as the relay stores it. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub sender: String,
    pub destination: Destination,
    pub kind: RecordKind,
    /// Raw text, or the base64 body for files.
    pub content: String,
    /// Only set for [`RecordKind::File`].
    pub filename: Option<String>,
}

impl Record {
    pub fn text(
        sender: impl Into<String>,
        destination: Destination,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            destination,
            kind: RecordKind::Text,
            content: content.into(),
            filename: None,
        }
    }

    pub fn file(
        sender: impl Into<String>,
        destination: Destination,
        filename: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            destination,
            kind: RecordKind::File,
            content: data.into(),
            filename: Some(filename.into()),
        }
    }

    /// Builds a record from a client's `msg` or `file` request.
    ///
    /// Returns `None` for `name` and `online_usr`, which never become
    /// records. A file without a name gets [`DEFAULT_FILENAME`].
    pub fn from_client(sender: &str, request: ClientRecord) -> Option<Self> {
        let destination = Destination::from(request.control);
        match request.kind {
            RecordType::Msg => Some(Self::text(sender, destination, request.message)),
            RecordType::File => Some(Self::file(
                sender,
                destination,
                request
                    .filename
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
                request.message,
            )),
            RecordType::Name | RecordType::OnlineUsr => None,
        }
    }

    /// Returns `true` for records addressed to everyone.
    pub fn is_global(&self) -> bool {
        self.destination == Destination::All
    }

    /// Payload size in bytes. For files this is the approximate decoded
    /// size, not the length of the base64 body.
    pub fn payload_len(&self) -> usize {
        match self.kind {
            RecordKind::Text => self.content.len(),
            RecordKind::File => decoded_len_hint(&self.content),
        }
    }

    /// Renders the frame every recipient of this record gets.
    pub fn to_frame(&self) -> ServerFrame {
        match self.kind {
            RecordKind::Text => {
                let to = match &self.destination {
                    Destination::All => BROADCAST_LABEL,
                    Destination::User(name) => name.as_str(),
                };
                ServerFrame::Msg(format!("[{} -> {}]: {}", self.sender, to, self.content))
            }
            RecordKind::File => ServerFrame::File {
                sender: self.sender.clone(),
                filename: self
                    .filename
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
                data: self.content.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_text_renders_with_broadcast_label() {
        let record = Record::text("alice", Destination::All, "hi");
        assert_eq!(
            record.to_frame(),
            ServerFrame::Msg("[alice -> todos]: hi".into())
        );
    }

    #[test]
    fn test_private_text_renders_destination() {
        let record = Record::text("alice", Destination::User("bob".into()), "psst");
        assert_eq!(
            record.to_frame(),
            ServerFrame::Msg("[alice -> bob]: psst".into())
        );
    }

    #[test]
    fn test_file_renders_sender_filename_data() {
        let record = Record::file("alice", Destination::All, "a.txt", "aGk=");
        assert_eq!(
            record.to_frame(),
            ServerFrame::File {
                sender: "alice".into(),
                filename: "a.txt".into(),
                data: "aGk=".into(),
            }
        );
    }

    #[test]
    fn test_payload_len_reports_decoded_file_size() {
        let body = lanchat_protocol::encode_file(&[1u8; 3000]);
        let file = Record::file("alice", Destination::All, "a.bin", body);
        let text = Record::text("alice", Destination::All, "hello");

        assert_eq!(file.payload_len(), 3000);
        assert_eq!(text.payload_len(), 5);
    }

    #[test]
    fn test_from_client_file_without_name_gets_default() {
        let request = ClientRecord {
            kind: RecordType::File,
            control: Control::User("bob".into()),
            message: "aGk=".into(),
            filename: None,
        };

        let record = Record::from_client("alice", request).unwrap();

        assert_eq!(record.filename.as_deref(), Some(DEFAULT_FILENAME));
        assert_eq!(record.destination, Destination::User("bob".into()));
    }

    #[test]
    fn test_from_client_broadcast_is_global() {
        let record =
            Record::from_client("alice", ClientRecord::text(Control::Broadcast, "hi")).unwrap();
        assert!(record.is_global());
        assert_eq!(record.kind, RecordKind::Text);
    }

    #[test]
    fn test_from_client_name_and_online_usr_are_not_records() {
        assert!(Record::from_client("alice", ClientRecord::name("x")).is_none());
        assert!(Record::from_client("alice", ClientRecord::online_users()).is_none());
    }

    #[test]
    fn test_placeholder_control_is_taken_as_user_name() {
        assert_eq!(
            Destination::from(Control::Ignored),
            Destination::User("dontcare".into())
        );
    }
}
