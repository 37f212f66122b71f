//! The router: shared relay state and every operation that touches it.
//!
//! The registry and the message store sit behind ONE mutex. Registration,
//! removal, append, and the recipient snapshot for a delivery all happen
//! under that lock, so a global message racing with a join is seen by the
//! newcomer exactly once: either in its replay or live, never both.
//!
//! Nothing awaits while the lock is held. Delivery is a push onto each
//! recipient's unbounded outbound queue.

use lanchat_protocol::OnlineUser;
use lanchat_session::{Session, SessionRegistry};
use lanchat_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{Destination, MessageStore, Record, RelayError, notice};

/// Everything the relay shares between connections.
#[derive(Debug, Default)]
struct RelayState {
    registry: SessionRegistry,
    store: MessageStore,
}

/// Record counts, for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCounts {
    pub global: usize,
    pub private: usize,
}

/// Routes records between sessions and keeps the history.
#[derive(Debug, Default)]
pub struct Router {
    state: Mutex<RelayState>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session` under `name`, then queues the welcome notice
    /// followed by the full global history.
    ///
    /// All three happen under the relay lock. Returns the number of
    /// records replayed.
    ///
    /// # Errors
    /// [`RelayError::Session`] when the name is taken or the connection
    /// is already registered. Nothing is queued in that case.
    pub async fn join(&self, name: &str, session: Session) -> Result<usize, RelayError> {
        let mut state = self.state.lock().await;
        let RelayState { registry, store } = &mut *state;

        let session = registry.register(name, session)?;
        let conn_id = session.id;
        if let Err(e) = session.deliver(notice::welcome(name)) {
            tracing::warn!(%conn_id, error = %e, "welcome not delivered");
        }
        let replayed = Self::on_connect(session, store);

        tracing::info!(
            %conn_id,
            name,
            replayed,
            online = registry.len(),
            "user joined"
        );
        Ok(replayed)
    }

    /// Replays the global history to a newly registered session, oldest
    /// first. Private records are never replayed.
    fn on_connect(session: &Session, store: &MessageStore) -> usize {
        let mut replayed = 0;
        for record in store.global_history() {
            if let Err(e) = session.deliver(record.to_frame()) {
                tracing::warn!(conn_id = %session.id, error = %e, "history replay cut short");
                break;
            }
            replayed += 1;
        }
        replayed
    }

    /// Stores a global record and delivers it to every registered session
    /// except the sender, in registration order.
    ///
    /// A recipient whose queue is closed is logged and skipped. Returns the
    /// number of sessions the record was queued for.
    pub async fn submit_global(&self, record: Record) -> usize {
        debug_assert_eq!(record.destination, Destination::All);

        let mut state = self.state.lock().await;
        let RelayState { registry, store } = &mut *state;

        let record = store.append_global(record);
        let frame = record.to_frame();

        let mut delivered = 0;
        for session in registry
            .iter()
            .filter(|s| s.name() != Some(record.sender.as_str()))
        {
            match session.deliver(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(conn_id = %session.id, error = %e, "global delivery failed")
                }
            }
        }

        tracing::debug!(
            sender = %record.sender,
            kind = ?record.kind,
            bytes = record.payload_len(),
            recipients = delivered,
            "global record relayed"
        );
        delivered
    }

    /// Delivers a private record to its destination and stores it.
    ///
    /// # Errors
    /// [`RelayError::DestinationNotFound`] if nobody holds the destination
    /// name. The record is dropped without being stored.
    pub async fn submit_private(&self, record: Record) -> Result<(), RelayError> {
        let Destination::User(destination) = &record.destination else {
            return Err(RelayError::DestinationNotFound(record.destination.to_string()));
        };

        let mut state = self.state.lock().await;
        let RelayState { registry, store } = &mut *state;

        let Ok(recipient) = registry.lookup(destination) else {
            tracing::debug!(sender = %record.sender, %destination, "private destination offline");
            return Err(RelayError::DestinationNotFound(destination.clone()));
        };

        let record = store.append_private(record);
        if let Err(e) = recipient.deliver(record.to_frame()) {
            tracing::warn!(conn_id = %recipient.id, error = %e, "private delivery failed");
        }

        tracing::debug!(
            sender = %record.sender,
            destination = %record.destination,
            kind = ?record.kind,
            bytes = record.payload_len(),
            "private record relayed"
        );
        Ok(())
    }

    /// Lists everyone online except the requesting connection.
    ///
    /// # Errors
    /// [`RelayError::NotRegistered`] if `id` has no registered session.
    pub async fn online_users(&self, id: ConnectionId) -> Result<Vec<OnlineUser>, RelayError> {
        let state = self.state.lock().await;
        if state.registry.get(id).is_none() {
            return Err(RelayError::NotRegistered);
        }
        Ok(state.registry.list_others(id))
    }

    /// Deregisters a connection. Safe to call for connections that never
    /// registered or have already left.
    pub async fn leave(&self, id: ConnectionId) -> Option<Session> {
        let mut state = self.state.lock().await;
        let session = state.registry.remove(id)?;
        tracing::info!(
            conn_id = %id,
            name = session.name().unwrap_or_default(),
            online = state.registry.len(),
            messages = state.store.total_len(),
            "user left"
        );
        Some(session)
    }

    /// Number of registered sessions.
    pub async fn online_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    /// How many records the store holds.
    pub async fn message_counts(&self) -> MessageCounts {
        let state = self.state.lock().await;
        MessageCounts {
            global: state.store.global_len(),
            private: state.store.private_len(),
        }
    }

    /// A copy of the global history, oldest first.
    pub async fn global_history(&self) -> Vec<Record> {
        self.state.lock().await.store.global_history().to_vec()
    }
}
