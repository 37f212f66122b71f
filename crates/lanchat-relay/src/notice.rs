//! Texts of the `[Server]:` notices the relay sends to clients.

use lanchat_protocol::ServerFrame;

/// Sent right after a successful registration, before history replay.
pub fn welcome(name: &str) -> ServerFrame {
    ServerFrame::notice(format!("Welcome to the chat, {name}!"))
}

/// Sent when a requested name is held by another session. Two frames:
/// the rejection, then the prompt for another name.
pub fn name_taken(name: &str) -> [ServerFrame; 2] {
    [
        ServerFrame::notice(format!(
            "Name '{name}' is already taken! Choose another name."
        )),
        ServerFrame::notice("Enter a new name:"),
    ]
}

/// Sent when a registered session asks for a name again.
pub fn already_registered(name: &str) -> ServerFrame {
    ServerFrame::notice(format!("You are already registered as '{name}'."))
}

/// Sent for `msg`, `file`, or `online_usr` before registration.
pub fn not_registered() -> ServerFrame {
    ServerFrame::notice("You must set a name first!")
}

/// Sent when a private text names a user who is not online.
pub fn user_not_found(destination: &str) -> ServerFrame {
    ServerFrame::notice(format!("User '{destination}' not found or offline."))
}

/// Sent when a private file names a user who is not online.
pub fn file_not_delivered(destination: &str, filename: &str) -> ServerFrame {
    ServerFrame::notice(format!(
        "User '{destination}' not found. File '{filename}' was not delivered."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_carry_server_prefix() {
        assert_eq!(
            welcome("alice"),
            ServerFrame::Msg("[Server]: Welcome to the chat, alice!".into())
        );
        assert_eq!(
            user_not_found("carol"),
            ServerFrame::Msg("[Server]: User 'carol' not found or offline.".into())
        );
    }

    #[test]
    fn test_name_taken_is_rejection_then_prompt() {
        let [rejection, prompt] = name_taken("alice");
        assert_eq!(
            rejection,
            ServerFrame::Msg(
                "[Server]: Name 'alice' is already taken! Choose another name.".into()
            )
        );
        assert_eq!(prompt, ServerFrame::Msg("[Server]: Enter a new name:".into()));
    }
}
