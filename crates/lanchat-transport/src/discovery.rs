//! LAN discovery over UDP broadcast.
//!
//! A client broadcasts [`DISCOVERY_PROBE`] to the discovery port; every
//! relay listening there answers with [`DISCOVERY_ACK`], unicast back to
//! the probe's source. The client learns the relay's IP from the reply's
//! source address. Nothing here touches chat session state.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::TransportError;

/// Well-known UDP port the responder listens on.
pub const DEFAULT_DISCOVERY_PORT: u16 = 5051;

/// Datagram a client broadcasts to find a relay.
pub const DISCOVERY_PROBE: &[u8] = b"CHAT_DISCOVER";

/// Datagram the relay sends back.
pub const DISCOVERY_ACK: &[u8] = b"CHAT_SERVER";

/// Receive buffer size. Probes are tiny; anything longer is not a probe.
const MAX_DATAGRAM: usize = 1024;

/// Pause after a failed receive before trying again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Answers discovery probes for the lifetime of the process.
pub struct DiscoveryResponder {
    socket: UdpSocket,
}

impl DiscoveryResponder {
    /// Binds the responder with broadcast reception enabled.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let bind_err = |e| TransportError::BindFailed {
            addr: addr.to_string(),
            source: e,
        };
        let socket = UdpSocket::bind(addr).await.map_err(bind_err)?;
        socket.set_broadcast(true).map_err(bind_err)?;
        tracing::info!(addr, "discovery responder listening");
        Ok(Self { socket })
    }

    /// Returns the address the responder is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(TransportError::ReceiveFailed)
    }

    /// Runs the receive loop forever.
    ///
    /// Socket errors are logged and the loop keeps going after a short
    /// pause, so a persistent error cannot spin the task.
    pub async fn run(self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "discovery receive failed");
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
            };

            if &buf[..len] != DISCOVERY_PROBE {
                tracing::trace!(%from, len, "ignoring non-probe datagram");
                continue;
            }

            tracing::info!(%from, "discovery request");
            if let Err(e) = self.socket.send_to(DISCOVERY_ACK, from).await {
                tracing::warn!(%from, error = %e, "discovery reply failed");
            }
        }
    }
}

/// Sends a discovery probe to `target` and waits up to `timeout` for a
/// relay to answer.
///
/// `target` is normally the broadcast address on the discovery port,
/// e.g. `255.255.255.255:5051`. Returns the address of the first relay
/// that answers, or `None` if the timeout elapses first.
pub async fn discover(
    target: SocketAddr,
    timeout: Duration,
) -> Result<Option<SocketAddr>, TransportError> {
    let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let bind_err = |e| TransportError::BindFailed {
        addr: bind_addr.to_string(),
        source: e,
    };
    let socket = UdpSocket::bind(bind_addr).await.map_err(bind_err)?;
    socket.set_broadcast(true).map_err(bind_err)?;

    socket
        .send_to(DISCOVERY_PROBE, target)
        .await
        .map_err(TransportError::SendFailed)?;
    tracing::debug!(%target, "discovery probe sent");

    let wait_for_ack = async {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, from) = socket
                .recv_from(&mut buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if &buf[..len] == DISCOVERY_ACK {
                return Ok::<_, TransportError>(from);
            }
        }
    };

    match tokio::time::timeout(timeout, wait_for_ack).await {
        Ok(Ok(relay)) => {
            tracing::info!(%relay, "relay discovered");
            Ok(Some(relay))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::debug!(%target, "no relay answered");
            Ok(None)
        }
    }
}
