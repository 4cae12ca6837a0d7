//! # Canvas Poller
//!
//! The outbound half of the bridge: a timer-driven loop that snapshots the
//! canvas, diffs it against the fingerprint index, broadcasts the classified
//! changes, and pushes the new snapshot to the remote peer.
//!
//! ## Cycle
//! ```text
//! tick ──▶ suppressed? ──yes──▶ skip (bridge wrote the canvas recently)
//!            │ no
//!            ▼
//!          list canvas elements (unavailable surface = quiet skip)
//!            ▼
//!          store.apply_snapshot ──▶ ChangeSet (empty = idle, stop here)
//!            ▼
//!          broadcast created/updated/deleted events
//!            ▼
//!          push full snapshot to remote peer (best effort)
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::adapter::CanvasAdapter;
use crate::error::BridgeError;
use crate::outbound::OutboundPusher;
use crate::protocol::BridgeEvent;
use crate::store::SharedStore;
use crate::suppressor::EchoSuppressor;

/// Timer-driven canvas change detector.
pub struct CanvasPoller {
    adapter: Arc<dyn CanvasAdapter>,
    store: SharedStore,
    suppressor: Arc<EchoSuppressor>,
    events: broadcast::Sender<BridgeEvent>,
    pusher: Option<OutboundPusher>,
    interval: Duration,
}

impl CanvasPoller {
    pub fn new(
        adapter: Arc<dyn CanvasAdapter>,
        store: SharedStore,
        suppressor: Arc<EchoSuppressor>,
        events: broadcast::Sender<BridgeEvent>,
        pusher: Option<OutboundPusher>,
        interval: Duration,
    ) -> Self {
        CanvasPoller {
            adapter,
            store,
            suppressor,
            events,
            pusher,
            interval,
        }
    }

    /// Runs the poll loop until a shutdown signal arrives.
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "Canvas poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Canvas poller stopping");
                    break;
                }
            }
        }
    }

    /// One poll cycle: detect, broadcast, push.
    pub async fn tick(&self) {
        if self.suppressor.is_suppressed() {
            debug!("Poll skipped: echo suppression window active");
            return;
        }

        let snapshot = match self.adapter.list_elements().await {
            Ok(snapshot) => snapshot,
            Err(BridgeError::AdapterUnavailable) => {
                debug!("Poll skipped: no canvas open");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Canvas snapshot failed");
                return;
            }
        };

        // Broadcast while still holding the write guard so subscribers can
        // never observe a store that lags the events they just received.
        {
            let mut store = self.store.write().await;
            let changes = match store.apply_snapshot(snapshot.clone()) {
                Ok(changes) => changes,
                Err(err) => {
                    warn!(error = %err, "Snapshot diff failed");
                    return;
                }
            };

            if changes.is_empty() {
                return;
            }

            info!(
                created = changes.created.len(),
                updated = changes.updated.len(),
                deleted = changes.deleted.len(),
                "Canvas changes detected"
            );

            for element in changes.created {
                self.broadcast(BridgeEvent::ElementCreated { element });
            }
            for element in changes.updated {
                self.broadcast(BridgeEvent::ElementUpdated { element });
            }
            for element_id in changes.deleted {
                self.broadcast(BridgeEvent::ElementDeleted { element_id });
            }
        }

        if let Some(pusher) = &self.pusher {
            if let Err(err) = pusher.push_snapshot(snapshot).await {
                warn!(error = %err, "Outbound snapshot push failed");
            }
        }
    }

    fn broadcast(&self, event: BridgeEvent) {
        // A send error only means no subscribers are connected.
        let _ = self.events.send(event);
    }
}
