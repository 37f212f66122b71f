//! # lanchat
//!
//! Zero-configuration chat relay for a local network.
//!
//! Clients find the relay with a UDP broadcast probe, connect over TCP,
//! pick a unique display name, and then exchange text and files, either
//! with everyone or with one user. Newcomers receive the full global
//! history on joining; private messages are never replayed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lanchat::prelude::*;
//!
//! # async fn start() -> Result<(), LanchatError> {
//! let server = ChatServer::builder().build().await?;
//! server.run().await
//! # }
//! ```

mod client;
mod config;
mod error;
mod handler;
mod server;

pub use client::ChatClient;
pub use config::ServerConfig;
pub use error::LanchatError;
pub use server::{ChatServer, ChatServerBuilder};

/// Re-exports for running or talking to a relay.
pub mod prelude {
    pub use crate::{ChatClient, ChatServer, ChatServerBuilder, LanchatError, ServerConfig};

    pub use lanchat_protocol::{
        ClientRecord, Codec, Control, DEFAULT_CHAT_PORT, JsonCodec, OnlineUser, ProtocolError,
        RecordType, ServerFrame, decode_file, encode_file,
    };
    pub use lanchat_relay::{Destination, MessageCounts, Record, RecordKind, RelayError, Router};
    pub use lanchat_session::SessionError;
    pub use lanchat_transport::TransportError;
    pub use lanchat_transport::discovery::{DEFAULT_DISCOVERY_PORT, DISCOVERY_ACK, DISCOVERY_PROBE};
}
