//! A minimal client for talking to a relay.
//!
//! `ChatClient` speaks the same framed protocol as any other lanchat
//! client: it sends [`ClientRecord`]s and reads back [`ServerFrame`]s.
//! It holds no chat state of its own.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use lanchat_protocol::{ClientRecord, Codec, Control, JsonCodec, ServerFrame};
use lanchat_transport::{Connection, DEFAULT_MAX_FRAME_LEN, TcpConnection, discover};
use tokio::net::ToSocketAddrs;

use crate::LanchatError;

/// A connection to a relay.
pub struct ChatClient {
    conn: TcpConnection,
    codec: JsonCodec,
}

impl ChatClient {
    /// Connects to a relay at `addr`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, LanchatError> {
        let conn = TcpConnection::connect(addr, DEFAULT_MAX_FRAME_LEN).await?;
        tracing::debug!(relay = %conn.peer_addr(), "connected to relay");
        Ok(Self {
            conn,
            codec: JsonCodec,
        })
    }

    /// Looks for a relay by sending a discovery probe to `target`,
    /// normally `255.255.255.255:5051`.
    ///
    /// Returns the IP of the first relay that answers, or `None` after
    /// `timeout`. The relay's chat port is not part of the answer.
    pub async fn discover_relay(
        target: impl ToSocketAddrs,
        timeout: Duration,
    ) -> Result<Option<IpAddr>, LanchatError> {
        let mut targets = tokio::net::lookup_host(target).await?;
        let Some(target) = targets.next() else {
            return Ok(None);
        };
        Ok(discover(target, timeout).await?.map(|relay| relay.ip()))
    }

    /// Address of the relay this client is connected to.
    pub fn relay_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    /// Asks to be registered as `name`.
    pub async fn register(&self, name: &str) -> Result<(), LanchatError> {
        self.send_record(&ClientRecord::name(name)).await
    }

    /// Sends text to everyone (`Control::Broadcast`) or one user.
    pub async fn send_text(&self, to: Control, text: &str) -> Result<(), LanchatError> {
        self.send_record(&ClientRecord::text(to, text)).await
    }

    /// Sends a file to everyone or one user. `contents` are base64-encoded
    /// on the way out.
    pub async fn send_file(
        &self,
        to: Control,
        filename: &str,
        contents: &[u8],
    ) -> Result<(), LanchatError> {
        self.send_record(&ClientRecord::file(to, filename, contents))
            .await
    }

    /// Asks for the list of other users online.
    pub async fn request_online_users(&self) -> Result<(), LanchatError> {
        self.send_record(&ClientRecord::online_users()).await
    }

    /// Sends any record as-is.
    pub async fn send_record(&self, record: &ClientRecord) -> Result<(), LanchatError> {
        let bytes = self.codec.encode(record)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    /// Receives the next frame from the relay.
    ///
    /// Returns `Ok(None)` once the relay has closed the connection.
    pub async fn recv(&self) -> Result<Option<ServerFrame>, LanchatError> {
        match self.conn.recv().await? {
            Some(data) => Ok(Some(ServerFrame::parse(&data, &self.codec)?)),
            None => Ok(None),
        }
    }

    /// Receives the next frame that did not come from the relay itself,
    /// skipping `[Server]:` notices.
    pub async fn recv_chat(&self) -> Result<Option<ServerFrame>, LanchatError> {
        while let Some(frame) = self.recv().await? {
            if frame.is_notice() {
                tracing::debug!(?frame, "skipping relay notice");
                continue;
            }
            return Ok(Some(frame));
        }
        Ok(None)
    }

    /// Closes the sending side; the relay sees a clean disconnect.
    pub async fn close(&self) -> Result<(), LanchatError> {
        self.conn.close().await?;
        Ok(())
    }
}
