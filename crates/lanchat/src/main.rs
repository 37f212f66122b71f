//! lanchat relay server
//!
//! Listens for chat clients over TCP and answers discovery probes over UDP
//! broadcast, so clients on the same network need no configuration.

use anyhow::Result;
use clap::Parser;
use lanchat::{ChatServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// lanchat relay: LAN chat with history replay and file relay
#[derive(Parser)]
#[command(name = "lanchat-server")]
#[command(author, version, about)]
struct Args {
    /// TCP address for chat connections
    #[arg(short, long, default_value = "0.0.0.0:5050")]
    listen: String,

    /// UDP address for the discovery responder
    #[arg(long, default_value = "0.0.0.0:5051")]
    discovery: String,

    /// Do not answer discovery probes
    #[arg(long)]
    no_discovery: bool,

    /// Largest frame accepted or sent, in bytes
    #[arg(long)]
    max_frame_len: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind_addr: self.listen.clone(),
            discovery_addr: (!self.no_discovery).then(|| self.discovery.clone()),
            max_frame_len: self.max_frame_len.unwrap_or(defaults.max_frame_len),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let server = ChatServer::builder().config(args.config()).build().await?;

    tracing::info!(
        chat = %server.local_addr()?,
        discovery = ?server.discovery_addr(),
        "relay started"
    );

    server.run().await?;
    Ok(())
}
