//! `ChatServer` builder and server loop.
//!
//! This is the entry point for running a relay. It ties together all the
//! layers: transport → protocol → session → relay.

use std::net::SocketAddr;
use std::sync::Arc;

use lanchat_protocol::{Codec, JsonCodec};
use lanchat_relay::Router;
use lanchat_transport::{DiscoveryResponder, TcpTransport, Transport};

use crate::LanchatError;
use crate::config::ServerConfig;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) router: Arc<Router>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,no_run
/// use lanchat::prelude::*;
///
/// # async fn start() -> Result<(), LanchatError> {
/// let server = ChatServer::builder()
///     .bind("0.0.0.0:5050")
///     .discovery("0.0.0.0:5051")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChatServerBuilder {
    config: ServerConfig,
}

impl ChatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the TCP address for chat connections.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the UDP address for the discovery responder.
    pub fn discovery(mut self, addr: &str) -> Self {
        self.config.discovery_addr = Some(addr.to_string());
        self
    }

    /// Turns the discovery responder off.
    pub fn no_discovery(mut self) -> Self {
        self.config.discovery_addr = None;
        self
    }

    /// Sets the largest frame the relay accepts or sends.
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.max_frame_len = len;
        self
    }

    /// Binds the chat listener (and discovery socket, if enabled).
    ///
    /// Uses `JsonCodec`, which is what lanchat clients speak.
    pub async fn build(self) -> Result<ChatServer<JsonCodec>, LanchatError> {
        let transport =
            TcpTransport::bind(&self.config.bind_addr, self.config.max_frame_len).await?;

        let discovery = match &self.config.discovery_addr {
            Some(addr) => Some(DiscoveryResponder::bind(addr).await?),
            None => None,
        };

        let state = Arc::new(ServerState {
            router: Arc::new(Router::new()),
            codec: JsonCodec,
        });

        Ok(ChatServer {
            transport,
            discovery,
            state,
        })
    }
}

/// A bound relay.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ChatServer<C: Codec> {
    transport: TcpTransport,
    discovery: Option<DiscoveryResponder>,
    state: Arc<ServerState<C>>,
}

impl ChatServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ChatServerBuilder {
        ChatServerBuilder::new()
    }
}

impl<C: Codec> ChatServer<C> {
    /// Returns the address the chat listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LanchatError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns the address the discovery responder is bound to, if any.
    pub fn discovery_addr(&self) -> Option<SocketAddr> {
        self.discovery.as_ref().and_then(|d| d.local_addr().ok())
    }

    /// Returns a handle to the relay's routing state.
    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.state.router)
    }

    /// Runs the discovery responder and the accept loop.
    ///
    /// Spawns one handler task per accepted connection. Accept errors are
    /// logged and the loop continues. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), LanchatError> {
        if let Some(discovery) = self.discovery.take() {
            tokio::spawn(discovery.run());
        }

        tracing::info!(addr = %self.transport.local_addr()?, "lanchat relay running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
