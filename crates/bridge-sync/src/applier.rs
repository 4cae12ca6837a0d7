//! # CRUD Applier
//!
//! The single write path for remote-originated mutations. Every operation
//! follows the same ordered, independently fallible sequence:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ 1. normalize + dispatch   exhaustive kind match; unsupported kinds   │
//! │                           abort here, nothing persisted              │
//! │ 2. store write            authoritative, always succeeds             │
//! │ 3. canvas mirror          best effort; failure never rolls back      │
//! │                           the store, unavailability is a no-op      │
//! │ 4. arm suppressor         only when the canvas was actually touched  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::time::Duration;
use tracing::{debug, info, warn};

use bridge_core::{Element, ElementKind};

use crate::adapter::{CanvasAdapter, DrawCommand, StyleAttrs};
use crate::error::{BridgeError, BridgeResult};
use crate::store::SharedStore;
use crate::suppressor::EchoSuppressor;

// =============================================================================
// Notifier
// =============================================================================

/// User-facing notification seam. The daemon logs; an embedding host can
/// surface these in its own UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Discards notifications. Used in tests and headless embeddings.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str) {}
}

/// Routes notifications to the log at warn level.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!("{}", message);
    }
}

// =============================================================================
// Draw Command Dispatch
// =============================================================================

/// Maps an element to its typed drawing primitive.
///
/// The match is exhaustive; the unsupported branch is the only error and
/// fires before any state is touched.
fn draw_command(element: &Element) -> BridgeResult<DrawCommand> {
    match element.kind() {
        ElementKind::Rectangle => Ok(DrawCommand::Rectangle {
            x: element.x,
            y: element.y,
            width: element.width.unwrap_or(100.0),
            height: element.height.unwrap_or(60.0),
        }),
        ElementKind::Ellipse => Ok(DrawCommand::Ellipse {
            x: element.x,
            y: element.y,
            width: element.width.unwrap_or(100.0),
            height: element.height.unwrap_or(60.0),
        }),
        ElementKind::Diamond => Ok(DrawCommand::Diamond {
            x: element.x,
            y: element.y,
            width: element.width.unwrap_or(100.0),
            height: element.height.unwrap_or(60.0),
        }),
        ElementKind::Text => Ok(DrawCommand::Text {
            x: element.x,
            y: element.y,
            text: element.display_text().unwrap_or("Text").to_string(),
        }),
        ElementKind::Arrow => Ok(DrawCommand::Arrow {
            points: element.path_pairs(),
            start_arrowhead: element.start_arrowhead.clone(),
            end_arrowhead: element.end_arrowhead.clone(),
        }),
        ElementKind::Line => Ok(DrawCommand::Line {
            points: element.path_pairs(),
        }),
        ElementKind::Unsupported => Err(BridgeError::UnsupportedElementType(
            element.element_type.clone(),
        )),
    }
}

// =============================================================================
// CRUD Applier
// =============================================================================

/// Applies remote-originated mutations to the store and mirrors them onto
/// the canvas.
#[derive(Clone)]
pub struct CrudApplier {
    adapter: Arc<dyn CanvasAdapter>,
    store: SharedStore,
    suppressor: Arc<EchoSuppressor>,
    notifier: Arc<dyn Notifier>,
    suppression_window: Duration,
}

impl CrudApplier {
    pub fn new(
        adapter: Arc<dyn CanvasAdapter>,
        store: SharedStore,
        suppressor: Arc<EchoSuppressor>,
        notifier: Arc<dyn Notifier>,
        suppression_window: Duration,
    ) -> Self {
        CrudApplier {
            adapter,
            store,
            suppressor,
            notifier,
            suppression_window,
        }
    }

    /// Creates an element: normalizes it, writes the store, and mirrors it
    /// onto the canvas (opening one on demand).
    ///
    /// Unsupported kinds abort with nothing persisted.
    pub async fn create(&self, element: Element, silent: bool) -> BridgeResult<Element> {
        let element = element.normalized();
        let command = draw_command(&element)?;

        self.store.write().await.upsert(&element)?;

        let mirrored = self.mirror(&element, command, true, silent).await;
        info!(
            element_id = %element.id,
            element_type = %element.element_type,
            mirrored,
            "Element created"
        );
        Ok(element)
    }

    /// Updates an element: writes the merged state to the store, then
    /// replaces the canvas object (delete + recreate, since the surface
    /// has no in-place mutation primitive).
    pub async fn update(&self, element: Element, silent: bool) -> BridgeResult<Element> {
        let element = element.normalized();
        let command = draw_command(&element)?;

        self.store.write().await.upsert(&element)?;

        if self.adapter.ensure_canvas(false).await.is_ok() {
            match self
                .adapter
                .delete_elements(std::slice::from_ref(&element.id))
                .await
            {
                // The delete alone already mutated the canvas; arm the
                // window now so a failed redraw cannot leak an echo.
                Ok(()) => self.suppressor.mark(self.suppression_window),
                Err(err) => {
                    warn!(element_id = %element.id, error = %err, "Stale canvas object removal failed");
                }
            }
        }
        let mirrored = self.mirror(&element, command, false, silent).await;
        info!(
            element_id = %element.id,
            element_type = %element.element_type,
            mirrored,
            "Element updated"
        );
        Ok(element)
    }

    /// Deletes an element from the store and the canvas. Returns whether
    /// the store held the id; absent ids are not an error.
    pub async fn delete(&self, id: &str) -> BridgeResult<bool> {
        let existed = self.store.write().await.remove(id);

        match self.adapter.ensure_canvas(false).await {
            Ok(()) => match self.adapter.delete_elements(&[id.to_string()]).await {
                Ok(()) => self.suppressor.mark(self.suppression_window),
                Err(err) => warn!(element_id = %id, error = %err, "Canvas deletion failed"),
            },
            Err(BridgeError::AdapterUnavailable) => {
                debug!(element_id = %id, "No canvas open; deleting from store only");
            }
            Err(err) => warn!(element_id = %id, error = %err, "Canvas unreachable for deletion"),
        }

        info!(element_id = %id, existed, "Element deleted");
        Ok(existed)
    }

    /// Creates a batch of elements. Unsupported kinds are skipped with a
    /// warning; the returned list holds only the elements actually created.
    pub async fn batch_create(
        &self,
        elements: Vec<Element>,
        silent: bool,
    ) -> BridgeResult<Vec<Element>> {
        let mut created = Vec::with_capacity(elements.len());
        for element in elements {
            match self.create(element, silent).await {
                Ok(element) => created.push(element),
                Err(BridgeError::UnsupportedElementType(element_type)) => {
                    warn!(%element_type, "Skipping unsupported element in batch");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(created)
    }

    /// Replaces the whole store (and canvas) with a remote snapshot.
    /// Unsupported kinds are skipped with a warning.
    pub async fn replace_all(&self, elements: Vec<Element>) -> BridgeResult<Vec<Element>> {
        let mut kept = Vec::new();
        let mut commands = Vec::new();
        for element in elements {
            let element = element.normalized();
            match draw_command(&element) {
                Ok(command) => {
                    commands.push((element.clone(), command));
                    kept.push(element);
                }
                Err(BridgeError::UnsupportedElementType(element_type)) => {
                    warn!(%element_type, "Skipping unsupported element in snapshot");
                }
                Err(err) => return Err(err),
            }
        }

        {
            let mut store = self.store.write().await;
            store.clear();
            for element in &kept {
                store.upsert(element)?;
            }
        }

        match self.adapter.ensure_canvas(false).await {
            Ok(()) => {
                let existing: Vec<String> = match self.adapter.list_elements().await {
                    Ok(elements) => elements.into_iter().map(|e| e.id).collect(),
                    Err(err) => {
                        warn!(error = %err, "Canvas listing failed during snapshot replace");
                        Vec::new()
                    }
                };
                if !existing.is_empty() {
                    if let Err(err) = self.adapter.delete_elements(&existing).await {
                        warn!(error = %err, "Canvas wipe failed during snapshot replace");
                    }
                }
                for (element, command) in commands {
                    self.adapter.reset_style().await;
                    self.adapter
                        .apply_style(&StyleAttrs::from_element(&element))
                        .await;
                    if let Err(err) = self.adapter.create_element(&element.id, command).await {
                        warn!(element_id = %element.id, error = %err, "Canvas draw failed during snapshot replace");
                    }
                }
                self.suppressor.mark(self.suppression_window);
            }
            Err(BridgeError::AdapterUnavailable) => {
                debug!("No canvas open; snapshot applied to store only");
            }
            Err(err) => warn!(error = %err, "Canvas unreachable for snapshot replace"),
        }

        info!(count = kept.len(), "Snapshot replaced");
        Ok(kept)
    }

    /// Mirrors one element onto the canvas. Returns whether the surface
    /// was actually mutated; all failures are absorbed here.
    async fn mirror(
        &self,
        element: &Element,
        command: DrawCommand,
        allow_create: bool,
        silent: bool,
    ) -> bool {
        match self.adapter.ensure_canvas(allow_create).await {
            Ok(()) => {}
            Err(BridgeError::AdapterUnavailable) => {
                if !silent {
                    self.notifier
                        .notify("No active canvas. Open one to see synced elements.");
                }
                debug!(element_id = %element.id, "No canvas open; stored without mirroring");
                return false;
            }
            Err(err) => {
                warn!(element_id = %element.id, error = %err, "Canvas unreachable");
                return false;
            }
        }

        self.adapter.reset_style().await;
        self.adapter
            .apply_style(&StyleAttrs::from_element(element))
            .await;
        if let Err(err) = self.adapter.create_element(&element.id, command).await {
            warn!(element_id = %element.id, error = %err, "Canvas draw failed");
            return false;
        }

        self.suppressor.mark(self.suppression_window);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::broadcast;
    use tokio::time;

    use super::*;
    use crate::adapter::MemoryCanvas;
    use crate::poller::CanvasPoller;
    use crate::store::ElementStore;

    /// Canvas whose draw primitive can be made to fail, leaving deletes
    /// working. Exercises half-applied update sequences.
    #[derive(Clone)]
    struct RedrawFailCanvas {
        inner: MemoryCanvas,
        fail_creates: Arc<AtomicBool>,
    }

    impl RedrawFailCanvas {
        fn new() -> Self {
            RedrawFailCanvas {
                inner: MemoryCanvas::new(),
                fail_creates: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl CanvasAdapter for RedrawFailCanvas {
        async fn ensure_canvas(&self, allow_create: bool) -> BridgeResult<()> {
            self.inner.ensure_canvas(allow_create).await
        }

        async fn list_elements(&self) -> BridgeResult<Vec<Element>> {
            self.inner.list_elements().await
        }

        async fn reset_style(&self) {
            self.inner.reset_style().await;
        }

        async fn apply_style(&self, style: &StyleAttrs) {
            self.inner.apply_style(style).await;
        }

        async fn create_element(&self, id: &str, command: DrawCommand) -> BridgeResult<()> {
            if self.fail_creates.load(Ordering::SeqCst) {
                return Err(BridgeError::CanvasFailed("draw rejected".into()));
            }
            self.inner.create_element(id, command).await
        }

        async fn delete_elements(&self, ids: &[String]) -> BridgeResult<()> {
            self.inner.delete_elements(ids).await
        }
    }

    fn applier(canvas: &MemoryCanvas) -> (CrudApplier, SharedStore, Arc<EchoSuppressor>) {
        let store = ElementStore::shared();
        let suppressor = Arc::new(EchoSuppressor::new());
        let applier = CrudApplier::new(
            Arc::new(canvas.clone()),
            store.clone(),
            suppressor.clone(),
            Arc::new(NoopNotifier),
            Duration::from_millis(1500),
        );
        (applier, store, suppressor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_stores_mirrors_and_suppresses() {
        let canvas = MemoryCanvas::new();
        let (applier, store, suppressor) = applier(&canvas);

        let created = applier
            .create(Element::new("rectangle", 10.0, 20.0), false)
            .await
            .unwrap();

        assert!(created.id.starts_with("bridge-"));
        assert_eq!(created.width, Some(100.0));
        assert!(store.read().await.contains(&created.id));
        assert!(canvas.get(&created.id).await.is_some());
        assert!(suppressor.is_suppressed());
    }

    #[tokio::test]
    async fn test_unsupported_kind_persists_nothing() {
        let canvas = MemoryCanvas::new();
        let (applier, store, suppressor) = applier(&canvas);

        let result = applier.create(Element::new("frame", 0.0, 0.0), false).await;

        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedElementType(t)) if t == "frame"
        ));
        assert!(store.read().await.is_empty());
        assert!(canvas.is_empty().await);
        assert!(!suppressor.is_suppressed());
    }

    #[tokio::test]
    async fn test_create_without_canvas_stores_only() {
        let canvas = MemoryCanvas::new();
        canvas.set_reachable(false).await;
        let (applier, store, suppressor) = applier(&canvas);

        let created = applier
            .create(Element::new("ellipse", 0.0, 0.0), true)
            .await
            .unwrap();

        assert!(store.read().await.contains(&created.id));
        assert!(!suppressor.is_suppressed());
    }

    #[tokio::test]
    async fn test_update_replaces_canvas_object() {
        let canvas = MemoryCanvas::new();
        let (applier, store, _) = applier(&canvas);

        let created = applier
            .create(Element::new("rectangle", 1.0, 1.0), false)
            .await
            .unwrap();

        let mut moved = created.clone();
        moved.x = 50.0;
        let updated = applier.update(moved, false).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(store.read().await.get(&created.id).unwrap().x, 50.0);
        assert_eq!(canvas.get(&created.id).await.unwrap().x, 50.0);
        assert_eq!(canvas.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let canvas = MemoryCanvas::new();
        let (applier, store, _) = applier(&canvas);

        let created = applier
            .create(Element::new("line", 0.0, 0.0), false)
            .await
            .unwrap();

        assert!(applier.delete(&created.id).await.unwrap());
        assert!(!applier.delete(&created.id).await.unwrap());
        assert!(store.read().await.is_empty());
        assert!(canvas.is_empty().await);
    }

    #[tokio::test]
    async fn test_batch_skips_unsupported() {
        let canvas = MemoryCanvas::new();
        let (applier, store, _) = applier(&canvas);

        let created = applier
            .batch_create(
                vec![
                    Element::new("rectangle", 0.0, 0.0),
                    Element::new("frame", 0.0, 0.0),
                    Element::new("text", 5.0, 5.0),
                ],
                false,
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(store.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_wipes_previous_state() {
        let canvas = MemoryCanvas::new();
        let (applier, store, _) = applier(&canvas);

        applier
            .create(Element::new("rectangle", 0.0, 0.0), false)
            .await
            .unwrap();
        applier
            .create(Element::new("ellipse", 0.0, 0.0), false)
            .await
            .unwrap();

        let kept = applier
            .replace_all(vec![Element::new("diamond", 3.0, 4.0)])
            .await
            .unwrap();

        assert_eq!(kept.len(), 1);
        assert_eq!(store.read().await.len(), 1);
        assert_eq!(canvas.len().await, 1);
        assert_eq!(canvas.get(&kept[0].id).await.unwrap().element_type, "diamond");
    }

    #[tokio::test]
    async fn test_replace_all_with_empty_snapshot_clears() {
        let canvas = MemoryCanvas::new();
        let (applier, store, _) = applier(&canvas);

        applier
            .create(Element::new("rectangle", 0.0, 0.0), false)
            .await
            .unwrap();

        let kept = applier.replace_all(Vec::new()).await.unwrap();
        assert!(kept.is_empty());
        assert!(store.read().await.is_empty());
        assert!(canvas.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_with_failed_redraw_still_suppresses_poll() {
        let canvas = RedrawFailCanvas::new();
        let store = ElementStore::shared();
        let suppressor = Arc::new(EchoSuppressor::new());
        let window = Duration::from_millis(1500);
        let applier = CrudApplier::new(
            Arc::new(canvas.clone()),
            store.clone(),
            suppressor.clone(),
            Arc::new(NoopNotifier),
            window,
        );

        let created = applier
            .create(Element::new("rectangle", 1.0, 1.0), false)
            .await
            .unwrap();

        time::advance(Duration::from_millis(1600)).await;
        assert!(!suppressor.is_suppressed());

        // Delete succeeds, redraw fails: the canvas object is gone but the
        // store still holds the element.
        canvas.fail_creates.store(true, Ordering::SeqCst);
        let mut moved = created.clone();
        moved.x = 9.0;
        let updated = applier.update(moved, false).await.unwrap();
        assert!(canvas.inner.get(&updated.id).await.is_none());
        assert!(store.read().await.contains(&updated.id));

        // The delete alone mutated the canvas, so the window is armed.
        assert!(suppressor.is_suppressed());

        // A poll inside the window must not read the half-applied write back
        // as a human deletion.
        let (events, mut events_rx) = broadcast::channel(16);
        let poller = CanvasPoller::new(
            Arc::new(canvas.clone()),
            store.clone(),
            suppressor.clone(),
            events,
            None,
            window,
        );
        poller.tick().await;
        assert!(events_rx.try_recv().is_err());
        assert!(store.read().await.contains(&updated.id));
    }
}
