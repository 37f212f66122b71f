//! The session registry: every named session currently connected.
//!
//! Responsibilities:
//! - Enforcing display-name uniqueness (exact, case-sensitive)
//! - Resolving a name to the session that holds it
//! - Dropping sessions when their connection ends
//! - Listing the other users online, in the order they registered
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself. The relay keeps it
//! behind a single mutex together with the message store, so every
//! register, remove, and broadcast snapshot is one atomic step.

use lanchat_protocol::OnlineUser;
use lanchat_transport::ConnectionId;

use crate::{Session, SessionError};

/// Tracks all registered sessions.
///
/// Sessions live in a `Vec` in registration order. Broadcast delivery and
/// the `online_users` list both walk that order, and the relay targets a
/// LAN with a handful of peers, so linear lookups are fine.
///
/// ## Lifecycle
///
/// ```text
/// accept ──→ [unnamed] ──register()──→ [registered] ──remove()──→ gone
///                 │  ↑
///                 └──┘ NameTaken: stays unnamed, may retry
/// ```
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `session` and admits it to the active set.
    ///
    /// # Errors
    /// - [`SessionError::NameTaken`] if any active session already holds
    ///   `name`. The existing holder is never evicted.
    /// - [`SessionError::AlreadyRegistered`] if this connection is already
    ///   registered.
    pub fn register(
        &mut self,
        name: &str,
        mut session: Session,
    ) -> Result<&Session, SessionError> {
        if self.sessions.iter().any(|s| s.name() == Some(name)) {
            return Err(SessionError::NameTaken(name.to_string()));
        }
        if let Some(existing) = self.sessions.iter().find(|s| s.id == session.id) {
            return Err(SessionError::AlreadyRegistered(
                session.id,
                existing.name().unwrap_or_default().to_string(),
            ));
        }

        session.name = Some(name.to_string());
        tracing::info!(conn_id = %session.id, addr = %session.addr, name, "session registered");
        self.sessions.push(session);

        Ok(&self.sessions[self.sessions.len() - 1])
    }

    /// Finds the session holding `name`.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if nobody holds the name.
    pub fn lookup(&self, name: &str) -> Result<&Session, SessionError> {
        self.sessions
            .iter()
            .find(|s| s.name() == Some(name))
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    /// Returns the session for a connection, if registered.
    pub fn get(&self, id: ConnectionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Removes a connection's session. Idempotent: removing an unknown
    /// or already-removed connection does nothing and returns `None`.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        let session = self.sessions.remove(index);
        tracing::info!(
            conn_id = %id,
            name = session.name().unwrap_or_default(),
            remaining = self.sessions.len(),
            "session removed"
        );
        Some(session)
    }

    /// Lists every registered user except `excluding`, in registration
    /// order.
    pub fn list_others(&self, excluding: ConnectionId) -> Vec<OnlineUser> {
        self.sessions
            .iter()
            .filter(|s| s.id != excluding)
            .filter_map(|s| {
                s.name().map(|name| OnlineUser {
                    name: name.to_string(),
                    addr: s.addr.to_string(),
                })
            })
            .collect()
    }

    /// Iterates over registered sessions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
