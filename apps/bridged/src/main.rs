//! # Canvas Bridge Daemon
//!
//! Runs the bridge agent against the in-memory canvas adapter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bridge Daemon                                   │
//! │                                                                         │
//! │  Remote peer ───► REST+WS (3030) ───► BridgeAgent ───► Canvas adapter  │
//! │                                           │                             │
//! │                                           ▼                             │
//! │                                     Element store                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `bridged [config.toml]` - without an argument the platform
//! config directory is consulted, falling back to defaults.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bridge_sync::{BridgeAgent, BridgeConfig, MemoryCanvas};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting canvas bridge daemon...");

    // Load configuration: explicit path argument, then platform config
    // directory, then defaults.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = BridgeConfig::load_or_default(config_path);
    info!(
        server_enabled = config.server.enabled,
        bind = %config.server.bind_address(),
        auto_sync = config.sync.auto_sync_enabled,
        interval_ms = config.sync.interval_ms,
        "Configuration loaded"
    );

    let adapter = Arc::new(MemoryCanvas::new());
    let mut agent = BridgeAgent::new(config, adapter);

    if let Err(err) = agent.start().await {
        error!(error = %err, "Bridge agent failed to start");
        return Err(err.into());
    }

    if let Some(addr) = agent.server_addr() {
        info!(addr = %addr, "Bridge ready");
    }

    // Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    agent.shutdown().await;
    info!("Canvas bridge daemon stopped");
    Ok(())
}
