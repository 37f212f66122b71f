//! Message routing and history for lanchat.
//!
//! # Key types
//!
//! - [`Record`]: one accepted chat event (text or file, global or private)
//! - [`MessageStore`]: append-only global and private history
//! - [`Router`]: the shared relay state; joins, routing, replay, departures
//! - [`notice`]: texts of the `[Server]:` notices sent to clients

pub mod notice;

mod error;
mod record;
mod router;
mod store;

pub use error::RelayError;
pub use record::{BROADCAST_LABEL, DEFAULT_FILENAME, Destination, Record, RecordKind};
pub use router::{MessageCounts, Router};
pub use store::MessageStore;
