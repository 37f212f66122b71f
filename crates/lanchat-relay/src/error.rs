//! Error types for the relay layer.

use lanchat_session::SessionError;

/// Errors that can occur while routing records.
///
/// All of these are recoverable: the connection that caused them gets a
/// notification and stays open.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The connection has not registered a name yet.
    #[error("connection is not registered")]
    NotRegistered,

    /// A private record named a user who is not connected.
    /// The record is dropped, never stored.
    #[error("destination '{0}' not found")]
    DestinationNotFound(String),

    /// A session-level failure (name taken, already registered).
    #[error(transparent)]
    Session(#[from] SessionError),
}
