//! Per-connection handler: registration and record dispatch.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the session's outbound queue. The flow
//! is:
//!   1. Create an unnamed session and spawn the writer
//!   2. Loop: receive a frame → decode a record → dispatch by state
//!   3. On EOF, transport error, or a malformed record: leave the router,
//!      let the writer flush what is queued, close the socket
//!
//! Every frame for the client, replies included, goes through the outbound
//! queue so it stays ordered with broadcasts from other connections.

use std::sync::Arc;

use lanchat_protocol::{ClientRecord, Codec, RecordType, ServerFrame};
use lanchat_relay::{Record, RelayError, Router, notice};
use lanchat_session::{OutboundReceiver, Session, SessionError, outbound_channel};
use lanchat_transport::{Connection, ConnectionId, TcpConnection};

use crate::LanchatError;
use crate::server::ServerState;

/// Where a connection is in its lifecycle.
///
/// `Closed` is not represented: the handler simply returns.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    /// Accepted, no name yet.
    Connected,
    /// Registered under this name. Names never change.
    Named(String),
}

/// Drop guard that removes a connection from the router if the handler
/// exits without leaving, panics included.
///
/// `Drop` is synchronous, so the removal is spawned as its own task.
struct LeaveGuard {
    conn_id: ConnectionId,
    router: Arc<Router>,
    armed: bool,
}

impl LeaveGuard {
    fn new(conn_id: ConnectionId, router: Arc<Router>) -> Self {
        Self {
            conn_id,
            router,
            armed: true,
        }
    }

    /// Leaves the router now and disarms the guard.
    async fn leave(mut self) {
        self.router.leave(self.conn_id).await;
        self.armed = false;
    }
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let conn_id = self.conn_id;
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            router.leave(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: TcpConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LanchatError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let addr = conn.peer_addr();
    tracing::info!(%conn_id, %addr, "client connected");

    let (outbound, rx) = outbound_channel();
    let session = Session::new(conn_id, addr, outbound);
    let guard = LeaveGuard::new(conn_id, Arc::clone(&state.router));
    let writer = tokio::spawn(write_frames(Arc::clone(&conn), rx, Arc::clone(&state)));

    let result = read_loop(&conn, &state, &session).await;

    // Leaving drops the registry's copy of the outbound queue; dropping
    // ours closes it, so the writer drains what is left and exits.
    guard.leave().await;
    drop(session);
    if let Err(e) = writer.await {
        tracing::warn!(%conn_id, error = %e, "writer task failed");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }

    tracing::info!(%conn_id, %addr, "client disconnected");
    result
}

/// Receives and dispatches records until the connection ends.
///
/// Returns `Ok` on a clean close and `Err` for anything fatal.
async fn read_loop<C: Codec>(
    conn: &TcpConnection,
    state: &ServerState<C>,
    session: &Session,
) -> Result<(), LanchatError> {
    let mut phase = Phase::Connected;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(conn_id = %session.id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(conn_id = %session.id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let record: ClientRecord = match state.codec.decode(&data) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(conn_id = %session.id, error = %e, "malformed record, closing");
                return Err(e.into());
            }
        };

        match &phase {
            Phase::Connected => {
                if let Some(name) = register(state, session, record).await? {
                    phase = Phase::Named(name);
                }
            }
            Phase::Named(name) => dispatch(state, session, name, record).await?,
        }
    }
}

/// Handles a record from a connection that has not registered yet.
///
/// Returns the registered name on success. A taken name gets the
/// rejection and a prompt; the connection stays unnamed and may retry.
async fn register<C: Codec>(
    state: &ServerState<C>,
    session: &Session,
    record: ClientRecord,
) -> Result<Option<String>, LanchatError> {
    if record.kind != RecordType::Name {
        tracing::debug!(conn_id = %session.id, kind = %record.kind, "record before registration");
        reply(session, notice::not_registered())?;
        return Ok(None);
    }

    let name = record.message;
    match state.router.join(&name, session.clone()).await {
        Ok(_) => Ok(Some(name)),
        Err(RelayError::Session(SessionError::NameTaken(name))) => {
            tracing::info!(conn_id = %session.id, %name, "name rejected");
            for frame in notice::name_taken(&name) {
                reply(session, frame)?;
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Handles a record from a registered connection.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    session: &Session,
    name: &str,
    record: ClientRecord,
) -> Result<(), LanchatError> {
    match record.kind {
        RecordType::Name => reply(session, notice::already_registered(name)),

        RecordType::OnlineUsr => match state.router.online_users(session.id).await {
            Ok(users) => reply(session, ServerFrame::OnlineUsers(users)),
            Err(RelayError::NotRegistered) => reply(session, notice::not_registered()),
            Err(e) => Err(e.into()),
        },

        RecordType::Msg | RecordType::File => {
            let Some(record) = Record::from_client(name, record) else {
                return Ok(());
            };
            if record.is_global() {
                state.router.submit_global(record).await;
                return Ok(());
            }

            let filename = record.filename.clone();
            match state.router.submit_private(record).await {
                Ok(()) => Ok(()),
                Err(RelayError::DestinationNotFound(destination)) => {
                    let frame = match filename {
                        Some(filename) => notice::file_not_delivered(&destination, &filename),
                        None => notice::user_not_found(&destination),
                    };
                    reply(session, frame)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Queues a frame for this connection only.
fn reply(session: &Session, frame: ServerFrame) -> Result<(), LanchatError> {
    session.deliver(frame).map_err(LanchatError::from)
}

/// Drains the outbound queue onto the socket.
///
/// Everything already queued when the writer wakes up goes out as one
/// batch with a single flush, which is how history replay reaches a
/// newcomer. Exits when the queue closes or a write fails.
async fn write_frames<C: Codec>(
    conn: Arc<TcpConnection>,
    mut rx: OutboundReceiver,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();
    let mut batch = Vec::new();

    while let Some(frame) = rx.recv().await {
        push_encoded(&mut batch, &frame, &state.codec, conn_id);
        while let Ok(frame) = rx.try_recv() {
            push_encoded(&mut batch, &frame, &state.codec, conn_id);
        }

        if let Err(e) = conn.send_batch(&batch).await {
            tracing::debug!(%conn_id, error = %e, "write failed, stopping writer");
            return;
        }
        tracing::trace!(%conn_id, frames = batch.len(), "frames written");
        batch.clear();
    }
}

fn push_encoded(
    batch: &mut Vec<Vec<u8>>,
    frame: &ServerFrame,
    codec: &impl Codec,
    conn_id: ConnectionId,
) {
    match frame.encode(codec) {
        Ok(bytes) => batch.push(bytes),
        Err(e) => tracing::warn!(%conn_id, error = %e, "dropping unencodable frame"),
    }
}
