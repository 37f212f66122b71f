//! Session types: the relay's record of one connected client.
//!
//! A session tracks:
//! - WHICH connection it is (`ConnectionId`) and where it came from
//! - WHO it is (the display name, once registered)
//! - HOW to reach it (a queue drained by the connection's writer task)
//!
//! The socket itself never leaves the connection handler. Everything
//! else in the relay talks to a client by pushing [`ServerFrame`]s onto
//! its [`Outbound`] queue, so a slow client only ever slows down its own
//! writer task.

use std::net::SocketAddr;

use lanchat_protocol::ServerFrame;
use lanchat_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Sending half of a session's outbound frame queue.
pub type Outbound = mpsc::UnboundedSender<ServerFrame>;

/// Receiving half, owned by the connection's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerFrame>;

/// Creates the queue for a freshly accepted connection.
pub fn outbound_channel() -> (Outbound, OutboundReceiver) {
    mpsc::unbounded_channel()
}

/// A single client's session on the relay.
///
/// Created when a connection is accepted, named on its first successful
/// `name` record, and dropped from the registry when the connection
/// closes. A session is never re-added after removal.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which connection this session belongs to.
    pub id: ConnectionId,

    /// Remote address of the client.
    pub addr: SocketAddr,

    /// Display name; `None` until registration succeeds.
    pub name: Option<String>,

    outbound: Outbound,
}

impl Session {
    /// Creates an unnamed session for an accepted connection.
    pub fn new(id: ConnectionId, addr: SocketAddr, outbound: Outbound) -> Self {
        Self {
            id,
            addr,
            name: None,
            outbound,
        }
    }

    /// Returns the display name, if registered.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Queues a frame for this session's writer.
    ///
    /// Never blocks. Fails only when the writer task has already exited,
    /// i.e. the connection is on its way out.
    pub fn deliver(&self, frame: ServerFrame) -> Result<(), SessionError> {
        self.outbound
            .send(frame)
            .map_err(|_| SessionError::Closed(self.id))
    }
}
