//! # Canvas Adapter
//!
//! The abstract interface to the externally-owned canvas surface. The core
//! only consumes this contract; the real drawing surface lives outside the
//! bridge.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Canvas Adapter Contract                            │
//! │                                                                         │
//! │  ensure_canvas(allow_create) ── reach the surface, optionally opening   │
//! │                                 a fresh canvas on demand                │
//! │  list_elements()             ── snapshot of everything drawn            │
//! │  reset_style()/apply_style() ── pending style state, fire-and-forget    │
//! │  create_element(id,cmd,style)── one typed drawing primitive             │
//! │  delete_elements(ids)        ── remove by id, absence is not an error   │
//! │                                                                         │
//! │  The surface offers NO change notifications - it must be polled.        │
//! │  Unavailability is transient and normal (surface not open).             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use bridge_core::element::{Element, FontFamily, Point};

use crate::error::{BridgeError, BridgeResult};

// =============================================================================
// Draw Command
// =============================================================================

/// The typed drawing primitive an element dispatches to.
///
/// Built by the CRUD applier's exhaustive match over [`bridge_core::ElementKind`];
/// unsupported kinds never reach the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Ellipse {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Diamond {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    Arrow {
        points: Vec<[f64; 2]>,
        start_arrowhead: Option<String>,
        end_arrowhead: Option<String>,
    },
    Line {
        points: Vec<[f64; 2]>,
    },
}

impl DrawCommand {
    /// Wire type string of the primitive.
    pub fn type_name(&self) -> &'static str {
        match self {
            DrawCommand::Rectangle { .. } => "rectangle",
            DrawCommand::Ellipse { .. } => "ellipse",
            DrawCommand::Diamond { .. } => "diamond",
            DrawCommand::Text { .. } => "text",
            DrawCommand::Arrow { .. } => "arrow",
            DrawCommand::Line { .. } => "line",
        }
    }
}

// =============================================================================
// Style Attributes
// =============================================================================

/// Presentation fields applied only where present; absence leaves the
/// canvas default unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleAttrs {
    pub background_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub roughness: Option<f64>,
    pub opacity: Option<f64>,
    pub font_size: Option<f64>,
    /// Coerced numeric family code; non-numeric input is dropped here.
    pub font_family: Option<f64>,
}

impl StyleAttrs {
    /// Extracts present presentation fields from an element.
    pub fn from_element(element: &Element) -> Self {
        StyleAttrs {
            background_color: element.background_color.clone(),
            stroke_color: element.stroke_color.clone(),
            stroke_width: element.stroke_width,
            roughness: element.roughness,
            opacity: element.opacity,
            font_size: element.font_size,
            font_family: element.font_family.as_ref().and_then(FontFamily::code),
        }
    }
}

// =============================================================================
// Canvas Adapter Trait
// =============================================================================

/// Read/write access to the live drawing surface.
///
/// All mutating calls may fail with [`BridgeError::AdapterUnavailable`] when
/// the surface is not open; callers treat that as a transient no-op.
#[async_trait]
pub trait CanvasAdapter: Send + Sync {
    /// Reaches the canvas surface. With `allow_create`, adapters that
    /// support creation-on-demand may lazily open a fresh canvas.
    async fn ensure_canvas(&self, allow_create: bool) -> BridgeResult<()>;

    /// Snapshot of every element currently drawn.
    async fn list_elements(&self) -> BridgeResult<Vec<Element>>;

    /// Clears pending style state. Fire-and-forget.
    async fn reset_style(&self);

    /// Arms pending style state for the next creation. Fire-and-forget.
    async fn apply_style(&self, style: &StyleAttrs);

    /// Draws one typed primitive under the given id.
    async fn create_element(&self, id: &str, command: DrawCommand) -> BridgeResult<()>;

    /// Removes elements by id. Absent ids are not an error.
    async fn delete_elements(&self, ids: &[String]) -> BridgeResult<()>;
}

// =============================================================================
// Memory Canvas
// =============================================================================

/// In-memory canvas adapter used by tests and the reference daemon.
///
/// Behaves like a real surface: reconstructs elements from the primitives
/// it was handed (so cache-only fields such as labels do not survive the
/// round trip), and can simulate unavailability and direct human edits.
#[derive(Clone)]
pub struct MemoryCanvas {
    inner: Arc<Mutex<MemoryCanvasInner>>,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct MemoryCanvasInner {
    /// Drawn elements in insertion order.
    elements: Vec<Element>,
    /// Style state armed for the next creation.
    pending_style: StyleAttrs,
    /// Whether a canvas surface is open at all.
    canvas_open: bool,
    /// Simulates the whole adapter being unreachable.
    reachable: bool,
}

impl MemoryCanvas {
    /// Creates a reachable adapter with an open canvas.
    pub fn new() -> Self {
        MemoryCanvas {
            inner: Arc::new(Mutex::new(MemoryCanvasInner {
                elements: Vec::new(),
                pending_style: StyleAttrs::default(),
                canvas_open: true,
                reachable: true,
            })),
        }
    }

    /// Creates a reachable adapter with no canvas open yet.
    pub fn closed() -> Self {
        MemoryCanvas {
            inner: Arc::new(Mutex::new(MemoryCanvasInner {
                elements: Vec::new(),
                pending_style: StyleAttrs::default(),
                canvas_open: false,
                reachable: true,
            })),
        }
    }

    /// Simulates the adapter becoming (un)reachable.
    pub async fn set_reachable(&self, reachable: bool) {
        self.inner.lock().await.reachable = reachable;
    }

    /// Simulates a direct human edit: places an element on the surface
    /// without going through the bridge.
    pub async fn place(&self, element: Element) {
        let mut inner = self.inner.lock().await;
        inner.elements.retain(|existing| existing.id != element.id);
        inner.elements.push(element);
    }

    /// Simulates a direct human removal.
    pub async fn erase(&self, id: &str) {
        self.inner.lock().await.elements.retain(|e| e.id != id);
    }

    /// Number of elements currently drawn.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.elements.len()
    }

    /// Returns true when nothing is drawn.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.elements.is_empty()
    }

    /// Looks up a drawn element by id.
    pub async fn get(&self, id: &str) -> Option<Element> {
        self.inner
            .lock()
            .await
            .elements
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    fn build_element(id: &str, command: DrawCommand, style: &StyleAttrs) -> Element {
        let mut element = match &command {
            DrawCommand::Rectangle { x, y, .. }
            | DrawCommand::Ellipse { x, y, .. }
            | DrawCommand::Diamond { x, y, .. } => Element::new(command.type_name(), *x, *y),
            DrawCommand::Text { x, y, .. } => Element::new("text", *x, *y),
            DrawCommand::Arrow { points, .. } | DrawCommand::Line { points } => {
                let origin = points.first().copied().unwrap_or([0.0, 0.0]);
                Element::new(command.type_name(), origin[0], origin[1])
            }
        };
        element.id = id.to_string();

        match command {
            DrawCommand::Rectangle { width, height, .. }
            | DrawCommand::Ellipse { width, height, .. }
            | DrawCommand::Diamond { width, height, .. } => {
                element.width = Some(width);
                element.height = Some(height);
            }
            DrawCommand::Text { text, .. } => {
                element.text = Some(text);
            }
            DrawCommand::Arrow {
                points,
                start_arrowhead,
                end_arrowhead,
            } => {
                element.points = Some(points.iter().map(|p| Point::new(p[0], p[1])).collect());
                element.start_arrowhead = start_arrowhead;
                element.end_arrowhead = end_arrowhead;
            }
            DrawCommand::Line { points } => {
                element.points = Some(points.iter().map(|p| Point::new(p[0], p[1])).collect());
            }
        }

        element.background_color = style.background_color.clone();
        element.stroke_color = style.stroke_color.clone();
        element.stroke_width = style.stroke_width;
        element.roughness = style.roughness;
        element.opacity = style.opacity;
        element.font_size = style.font_size;
        element.font_family = style.font_family.map(FontFamily::Code);

        element
    }
}

#[async_trait]
impl CanvasAdapter for MemoryCanvas {
    async fn ensure_canvas(&self, allow_create: bool) -> BridgeResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.reachable {
            return Err(BridgeError::AdapterUnavailable);
        }
        if !inner.canvas_open {
            if !allow_create {
                return Err(BridgeError::AdapterUnavailable);
            }
            debug!("Opening fresh in-memory canvas on demand");
            inner.canvas_open = true;
        }
        Ok(())
    }

    async fn list_elements(&self) -> BridgeResult<Vec<Element>> {
        let inner = self.inner.lock().await;
        if !inner.reachable || !inner.canvas_open {
            return Err(BridgeError::AdapterUnavailable);
        }
        Ok(inner.elements.clone())
    }

    async fn reset_style(&self) {
        self.inner.lock().await.pending_style = StyleAttrs::default();
    }

    async fn apply_style(&self, style: &StyleAttrs) {
        self.inner.lock().await.pending_style = style.clone();
    }

    async fn create_element(&self, id: &str, command: DrawCommand) -> BridgeResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.reachable || !inner.canvas_open {
            return Err(BridgeError::AdapterUnavailable);
        }
        let style = inner.pending_style.clone();
        let element = Self::build_element(id, command, &style);
        inner.elements.retain(|existing| existing.id != id);
        inner.elements.push(element);
        Ok(())
    }

    async fn delete_elements(&self, ids: &[String]) -> BridgeResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.reachable || !inner.canvas_open {
            return Err(BridgeError::AdapterUnavailable);
        }
        inner.elements.retain(|e| !ids.contains(&e.id));
        Ok(())
    }
}
