//! Transport layer for lanchat.
//!
//! Provides the [`Transport`] and [`Connection`] traits plus the TCP
//! implementation the relay runs on. Every frame on the stream is a
//! 4-byte big-endian length followed by the frame body, so frames survive
//! TCP segments being split or coalesced.
//!
//! The [`discovery`] module holds the UDP beacon that lets clients find the
//! relay on the local network.

#![allow(async_fn_in_trait)]

pub mod discovery;
mod error;
mod tcp;

pub use discovery::{DiscoveryResponder, discover};
pub use error::TransportError;
pub use tcp::{DEFAULT_MAX_FRAME_LEN, TcpConnection, TcpTransport, frame_codec};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A single connection that sends and receives whole frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Sends several frames and flushes once.
    ///
    /// Defaults to one `send` per frame. Implementations with a buffered
    /// writer should override this to coalesce the writes.
    async fn send_batch(&self, frames: &[Vec<u8>]) -> Result<(), Self::Error> {
        for frame in frames {
            self.send(frame).await?;
        }
        Ok(())
    }

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the sending side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the remote peer's address.
    fn peer_addr(&self) -> SocketAddr;
}
