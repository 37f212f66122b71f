//! TCP transport using `tokio-util`'s length-delimited framing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Largest frame body the 4-byte length prefix can describe.
pub const DEFAULT_MAX_FRAME_LEN: usize = u32::MAX as usize;

/// Builds the codec used on both sides of a lanchat stream:
/// a 4-byte big-endian length prefix, then the body.
pub fn frame_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_len)
        .new_codec()
}

/// A TCP [`Transport`] that listens for incoming chat connections.
pub struct TcpTransport {
    listener: TcpListener,
    max_frame_len: usize,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str, max_frame_len: usize) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| TransportError::BindFailed {
            addr: addr.to_string(),
            source: e,
        })?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            max_frame_len,
        })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let conn = TcpConnection::from_stream(stream, addr, self.max_frame_len);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> Result<SocketAddr, Self::Error> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

/// A single framed TCP connection.
///
/// The read and write halves sit behind separate locks, so one task can
/// block in [`recv`](Connection::recv) while another task writes.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<FramedRead<OwnedReadHalf, LengthDelimitedCodec>>,
    writer: Mutex<FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>>,
}

impl TcpConnection {
    /// Wraps an established stream.
    pub fn from_stream(stream: TcpStream, peer: SocketAddr, max_frame_len: usize) -> Self {
        let (read_half, write_half) = stream.into_split();
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            peer,
            reader: Mutex::new(FramedRead::new(read_half, frame_codec(max_frame_len))),
            writer: Mutex::new(FramedWrite::new(write_half, frame_codec(max_frame_len))),
        }
    }

    /// Opens a client connection to a relay.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        max_frame_len: usize,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let peer = stream.peer_addr().map_err(TransportError::ConnectFailed)?;
        Ok(Self::from_stream(stream, peer, max_frame_len))
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .send(Bytes::copy_from_slice(frame))
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn send_batch(&self, frames: &[Vec<u8>]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        for frame in frames {
            writer
                .feed(Bytes::copy_from_slice(frame))
                .await
                .map_err(TransportError::SendFailed)?;
        }
        // The codec encodes both `Bytes` and `&[u8]`, so name the sink.
        SinkExt::<Bytes>::flush(&mut *writer)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match self.reader.lock().await.next().await {
            Some(Ok(frame)) => Ok(Some(frame.to_vec())),
            Some(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        SinkExt::<Bytes>::close(&mut *self.writer.lock().await)
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
