//! Error types for the session layer.

use lanchat_transport::ConnectionId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Another active session already holds this display name.
    /// Recoverable: the client is asked for a different name.
    #[error("name '{0}' is already taken")]
    NameTaken(String),

    /// No active session holds this display name.
    #[error("no session named '{0}'")]
    NotFound(String),

    /// The connection is already registered under a name.
    /// Names are fixed for the life of a session.
    #[error("{0} is already registered as '{1}'")]
    AlreadyRegistered(ConnectionId, String),

    /// The session's outbound queue is gone; its writer has stopped.
    #[error("session {0} is closed")]
    Closed(ConnectionId),
}
