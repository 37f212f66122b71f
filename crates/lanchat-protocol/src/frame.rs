//! Relay → client frames.
//!
//! A frame body is `<tag>=<payload>`, split at the first `=`:
//!
//! ```text
//! msg=<text>
//! file=<sender>||<filename>||<base64>
//! online_users=[{"name":"alice","addr":"10.0.0.2:51234"}, ...]
//! ```
//!
//! The transport's length prefix delimits the frame, so `<text>` may
//! contain anything, including `=` and newlines.

use crate::{Codec, OnlineUser, ProtocolError};

/// Separator between the fields of a `file` payload.
pub const FILE_FIELD_SEPARATOR: &str = "||";

/// Prefix of every notification the relay itself generates.
pub const SERVER_PREFIX: &str = "[Server]:";

const MSG_TAG: &str = "msg";
const FILE_TAG: &str = "file";
const ONLINE_USERS_TAG: &str = "online_users";

/// One frame sent by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// A chat line or a relay notification.
    Msg(String),

    /// A relayed file. `data` is the base64 body as the sender sent it.
    File {
        sender: String,
        filename: String,
        data: String,
    },

    /// The other users currently online, in registration order.
    OnlineUsers(Vec<OnlineUser>),
}

impl ServerFrame {
    /// A relay notification, rendered as `[Server]: <text>`.
    pub fn notice(text: impl AsRef<str>) -> Self {
        Self::Msg(format!("{SERVER_PREFIX} {}", text.as_ref()))
    }

    /// Returns `true` if this is a notification from the relay itself
    /// rather than a chat line from another user.
    pub fn is_notice(&self) -> bool {
        matches!(self, Self::Msg(text) if text.starts_with(SERVER_PREFIX))
    }

    /// Renders the frame body.
    pub fn encode(&self, codec: &impl Codec) -> Result<Vec<u8>, ProtocolError> {
        let body = match self {
            Self::Msg(text) => format!("{MSG_TAG}={text}").into_bytes(),
            Self::File {
                sender,
                filename,
                data,
            } => format!(
                "{FILE_TAG}={sender}{sep}{filename}{sep}{data}",
                sep = FILE_FIELD_SEPARATOR
            )
            .into_bytes(),
            Self::OnlineUsers(users) => {
                let mut body = format!("{ONLINE_USERS_TAG}=").into_bytes();
                body.extend(codec.encode(users)?);
                body
            }
        };
        Ok(body)
    }

    /// Parses a frame body received from the relay.
    pub fn parse(data: &[u8], codec: &impl Codec) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ProtocolError::InvalidMessage(format!("frame is not UTF-8: {e}")))?;
        let (tag, payload) = text
            .split_once('=')
            .ok_or_else(|| ProtocolError::InvalidMessage("frame has no '=' separator".into()))?;

        match tag {
            MSG_TAG => Ok(Self::Msg(payload.to_string())),
            FILE_TAG => {
                let mut fields = payload.splitn(3, FILE_FIELD_SEPARATOR);
                match (fields.next(), fields.next(), fields.next()) {
                    (Some(sender), Some(filename), Some(data)) => Ok(Self::File {
                        sender: sender.to_string(),
                        filename: filename.to_string(),
                        data: data.to_string(),
                    }),
                    _ => Err(ProtocolError::InvalidMessage(
                        "file frame needs sender||filename||data".into(),
                    )),
                }
            }
            ONLINE_USERS_TAG => Ok(Self::OnlineUsers(codec.decode(payload.as_bytes())?)),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::JsonCodec;

    #[test]
    fn test_msg_frame_wire_format() {
        let frame = ServerFrame::Msg("[alice -> todos]: hi".into());
        let bytes = frame.encode(&JsonCodec).unwrap();
        assert_eq!(bytes, b"msg=[alice -> todos]: hi");
    }

    #[test]
    fn test_file_frame_wire_format() {
        let frame = ServerFrame::File {
            sender: "alice".into(),
            filename: "notes.txt".into(),
            data: "aGk=".into(),
        };
        let bytes = frame.encode(&JsonCodec).unwrap();
        assert_eq!(bytes, b"file=alice||notes.txt||aGk=");
    }

    #[test]
    fn test_online_users_frame_wire_format() {
        let frame = ServerFrame::OnlineUsers(vec![OnlineUser {
            name: "alice".into(),
            addr: "127.0.0.1:4000".into(),
        }]);
        let bytes = frame.encode(&JsonCodec).unwrap();
        assert_eq!(
            bytes,
            br#"online_users=[{"name":"alice","addr":"127.0.0.1:4000"}]"#
        );
    }

    #[test]
    fn test_notice_is_prefixed_and_detected() {
        let frame = ServerFrame::notice("Welcome to the chat, bob!");
        assert_eq!(
            frame,
            ServerFrame::Msg("[Server]: Welcome to the chat, bob!".into())
        );
        assert!(frame.is_notice());
        assert!(!ServerFrame::Msg("[alice -> todos]: hi".into()).is_notice());
    }

    #[test]
    fn test_parse_msg_keeps_later_equals_signs() {
        let frame = ServerFrame::parse(b"msg=[a -> todos]: 1+1=2", &JsonCodec).unwrap();
        assert_eq!(frame, ServerFrame::Msg("[a -> todos]: 1+1=2".into()));
    }

    #[test]
    fn test_parse_file_splits_three_fields() {
        let frame = ServerFrame::parse(b"file=bob||a||b.txt||ZGF0YQ==", &JsonCodec).unwrap();
        // At most three fields: a `||` inside the last field stays there.
        assert_eq!(
            frame,
            ServerFrame::File {
                sender: "bob".into(),
                filename: "a".into(),
                data: "b.txt||ZGF0YQ==".into(),
            }
        );
    }

    #[test]
    fn test_parse_file_with_missing_fields_returns_error() {
        let result = ServerFrame::parse(b"file=bob||only", &JsonCodec);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_parse_online_users_reads_list() {
        let frame = ServerFrame::parse(
            br#"online_users=[{"name":"a","addr":"1.2.3.4:5"},{"name":"b","addr":"1.2.3.4:6"}]"#,
            &JsonCodec,
        )
        .unwrap();
        match frame {
            ServerFrame::OnlineUsers(users) => {
                let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
                assert_eq!(names, ["a", "b"]);
            }
            other => panic!("expected OnlineUsers, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_tag_returns_error() {
        let result = ServerFrame::parse(b"shout=hey", &JsonCodec);
        assert!(matches!(result, Err(ProtocolError::UnknownTag(t)) if t == "shout"));
    }

    #[test]
    fn test_parse_without_separator_returns_error() {
        let result = ServerFrame::parse(b"hello", &JsonCodec);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }
}
