//! # Bridge Agent
//!
//! Main orchestrator for the bridge. Owns the shared state and the
//! lifecycles of the protocol server and the canvas poller.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BridgeAgent Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        BridgeAgent                               │  │
//! │  │                                                                  │  │
//! │  │  • Builds the shared store, suppressor, and applier              │  │
//! │  │  • Starts the protocol server (when enabled)                     │  │
//! │  │  • Spawns the canvas poller (when auto-sync is enabled)          │  │
//! │  │  • Tears both down on shutdown                                   │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │              ┌────────────────┴────────────────┐                       │
//! │              ▼                                 ▼                        │
//! │      ┌──────────────┐                  ┌──────────────┐                 │
//! │      │ BridgeServer │                  │ CanvasPoller │                 │
//! │      │  REST + WS   │                  │  tick loop   │                 │
//! │      └──────┬───────┘                  └──────┬───────┘                 │
//! │             │       shared event channel      │                        │
//! │             └───────────────┬─────────────────┘                        │
//! │                             ▼                                           │
//! │                      WS subscribers                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::adapter::CanvasAdapter;
use crate::applier::{CrudApplier, LogNotifier, Notifier};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::outbound::OutboundPusher;
use crate::poller::CanvasPoller;
use crate::protocol::BridgeEvent;
use crate::server::{BridgeServer, BridgeState, ServerHandle};
use crate::store::{ElementStore, SharedStore};
use crate::suppressor::EchoSuppressor;

/// Orchestrates the protocol server and the poll loop around one shared
/// element store.
pub struct BridgeAgent {
    config: BridgeConfig,
    adapter: Arc<dyn CanvasAdapter>,
    store: SharedStore,
    suppressor: Arc<EchoSuppressor>,
    applier: CrudApplier,
    events: broadcast::Sender<BridgeEvent>,
    server: Option<ServerHandle>,
    poller_shutdown: Option<mpsc::Sender<()>>,
}

impl BridgeAgent {
    /// Creates an agent with log-routed notifications.
    pub fn new(config: BridgeConfig, adapter: Arc<dyn CanvasAdapter>) -> Self {
        Self::with_notifier(config, adapter, Arc::new(LogNotifier))
    }

    /// Creates an agent with a custom notification sink.
    pub fn with_notifier(
        config: BridgeConfig,
        adapter: Arc<dyn CanvasAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = ElementStore::shared();
        let suppressor = Arc::new(EchoSuppressor::new());
        let applier = CrudApplier::new(
            adapter.clone(),
            store.clone(),
            suppressor.clone(),
            notifier,
            config.sync.suppression_window(),
        );
        let (events, _) = broadcast::channel(256);

        BridgeAgent {
            config,
            adapter,
            store,
            suppressor,
            applier,
            events,
            server: None,
            poller_shutdown: None,
        }
    }

    /// The shared element store.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    /// The write path, for embedders that mutate without going through
    /// the protocol surface.
    pub fn applier(&self) -> CrudApplier {
        self.applier.clone()
    }

    /// Subscribes to the broadcast event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Address of the running protocol server, if started.
    pub fn server_addr(&self) -> Option<&str> {
        self.server.as_ref().map(ServerHandle::addr)
    }

    /// Validates the configuration, then starts the enabled components.
    pub async fn start(&mut self) -> BridgeResult<()> {
        self.config.validate()?;

        if self.config.server.enabled {
            let state = Arc::new(BridgeState::with_events(
                self.store.clone(),
                self.applier.clone(),
                self.events.clone(),
            ));
            let server = BridgeServer::new(self.config.server.clone(), state);
            self.server = Some(server.start().await?);
        }

        if self.config.sync.auto_sync_enabled {
            let pusher = self
                .config
                .sync
                .outbound_api_base_url
                .as_deref()
                .map(OutboundPusher::new);
            let poller = CanvasPoller::new(
                self.adapter.clone(),
                self.store.clone(),
                self.suppressor.clone(),
                self.events.clone(),
                pusher,
                self.config.sync.interval(),
            );
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
            self.poller_shutdown = Some(shutdown_tx);
            tokio::spawn(poller.run(shutdown_rx));
        }

        info!(
            server_enabled = self.config.server.enabled,
            auto_sync = self.config.sync.auto_sync_enabled,
            "Bridge agent started"
        );
        Ok(())
    }

    /// Stops the poller and the server. Idempotent.
    pub async fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.poller_shutdown.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(server) = self.server.take() {
            let _ = server.shutdown().await;
        }
        info!("Bridge agent stopped");
    }
}
