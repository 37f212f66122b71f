//! Relay configuration.

use lanchat_protocol::DEFAULT_CHAT_PORT;
use lanchat_transport::DEFAULT_MAX_FRAME_LEN;
use lanchat_transport::discovery::DEFAULT_DISCOVERY_PORT;
use serde::{Deserialize, Serialize};

/// Settings for one relay instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP address for chat connections.
    pub bind_addr: String,

    /// UDP address for the discovery responder. `None` disables discovery.
    pub discovery_addr: Option<String>,

    /// Largest frame accepted or sent, in bytes.
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_CHAT_PORT}"),
            discovery_addr: Some(format!("0.0.0.0:{DEFAULT_DISCOVERY_PORT}")),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
