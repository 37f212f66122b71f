//! Session management for lanchat.
//!
//! This crate answers "who is connected, and under which name?":
//!
//! 1. **Sessions** ([`Session`]): one per accepted connection, carrying the
//!    remote address, the display name once registered, and the outbound
//!    frame queue used to reach the client.
//! 2. **Registry** ([`SessionRegistry`]): the set of registered sessions,
//!    with exact, case-sensitive name uniqueness.
//!
//! # How it fits in the stack
//!
//! ```text
//! Relay Layer (above)    ← resolves destinations, delivers records
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below) ← ServerFrame, OnlineUser
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Outbound, OutboundReceiver, Session, outbound_channel};
