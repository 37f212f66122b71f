//! Unified error type for lanchat.

use lanchat_protocol::ProtocolError;
use lanchat_relay::RelayError;
use lanchat_session::SessionError;
use lanchat_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LanchatError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed record or frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (name taken, queue closed).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A routing error.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Address resolution or other I/O outside the transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
