//! # Element Model
//!
//! The unit of synchronization: a single visual object with geometry, style,
//! and identity.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Element Model                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Element      │   │  ElementKind    │   │     Point       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (string)    │   │  Rectangle      │   │  x, y (f64)     │       │
//! │  │  type (wire)    │   │  Ellipse        │   │  accepts {x,y}  │       │
//! │  │  x, y           │   │  Diamond        │   │  and [x,y]      │       │
//! │  │  width, height  │   │  Text           │   └─────────────────┘       │
//! │  │  points         │   │  Arrow          │                             │
//! │  │  style fields   │   │  Line           │   ┌─────────────────┐       │
//! │  │  text / label   │   │  Unsupported    │   │   FontFamily    │       │
//! │  └─────────────────┘   └─────────────────┘   │  ─────────────  │       │
//! │                                              │  Code(f64)      │       │
//! │                                              │  Name(string)   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Rules
//! - `id` is opaque, unique within a store, and immutable once assigned
//! - Missing IDs are generated as `bridge-<timestamp-millis>-<random>`
//! - The wire `type` string is preserved verbatim so unrecognized values
//!   round-trip through the cache; dispatch goes through [`ElementKind`]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Element Kind
// =============================================================================

/// The closed set of canvas primitives, plus an explicit branch for
/// everything outside it.
///
/// Dispatch over element types always matches on this enum; the raw wire
/// string is never compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Ellipse within its bounding box.
    Ellipse,
    /// Diamond within its bounding box.
    Diamond,
    /// Free-standing text.
    Text,
    /// Multi-point arrow with optional arrowheads.
    Arrow,
    /// Multi-point line.
    Line,
    /// Anything outside the closed set. Rejected by canvas dispatch but
    /// still cacheable.
    Unsupported,
}

impl ElementKind {
    /// Classifies a wire type string.
    pub fn of(type_str: &str) -> Self {
        match type_str {
            "rectangle" => ElementKind::Rectangle,
            "ellipse" => ElementKind::Ellipse,
            "diamond" => ElementKind::Diamond,
            "text" => ElementKind::Text,
            "arrow" => ElementKind::Arrow,
            "line" => ElementKind::Line,
            _ => ElementKind::Unsupported,
        }
    }

    /// Returns true for box-geometry kinds that receive 100x60 defaults.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            ElementKind::Rectangle | ElementKind::Ellipse | ElementKind::Diamond
        )
    }

    /// Returns true for point-sequence kinds (arrow, line).
    pub fn is_linear(&self) -> bool {
        matches!(self, ElementKind::Arrow | ElementKind::Line)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Diamond => "diamond",
            ElementKind::Text => "text",
            ElementKind::Arrow => "arrow",
            ElementKind::Line => "line",
            ElementKind::Unsupported => "unsupported",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Point
// =============================================================================

/// A 2D coordinate in a path.
///
/// Canvas surfaces emit both `{"x": 1, "y": 2}` objects and `[1, 2]` pairs;
/// deserialization accepts either, serialization always emits the object
/// form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PointRepr")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Returns the `[x, y]` pair form used by canvas drawing primitives.
    pub fn to_pair(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Wire representations accepted for a point.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Coords { x: f64, y: f64 },
    Pair([f64; 2]),
}

impl From<PointRepr> for Point {
    fn from(repr: PointRepr) -> Self {
        match repr {
            PointRepr::Coords { x, y } => Point { x, y },
            PointRepr::Pair([x, y]) => Point { x, y },
        }
    }
}

// =============================================================================
// Font Family
// =============================================================================

/// Numeric font family code, with string input coerced on use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontFamily {
    /// Native numeric family code.
    Code(f64),
    /// String input; coerced to a code when applied to the canvas.
    Name(String),
}

impl FontFamily {
    /// Returns the numeric code, coercing string input. `None` when the
    /// string is not numeric; callers then leave the canvas default.
    pub fn code(&self) -> Option<f64> {
        match self {
            FontFamily::Code(code) => Some(*code),
            FontFamily::Name(name) => name.trim().parse().ok(),
        }
    }
}

// =============================================================================
// Label
// =============================================================================

/// Label wrapper carrying text for container kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// =============================================================================
// Element
// =============================================================================

/// A single visual object with geometry, style, and identity.
///
/// Optional fields mean "leave the canvas default unchanged"; they are
/// omitted from the wire form when absent so the fingerprint canonical
/// serialization is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Opaque identity; generated when empty on input.
    #[serde(default)]
    pub id: String,

    /// Wire type string, preserved verbatim. Dispatch uses [`Element::kind`].
    #[serde(rename = "type")]
    pub element_type: String,

    /// Required position.
    pub x: f64,
    pub y: f64,

    /// Bounding box, defaulted to 100x60 for shape kinds on normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Ordered path, required for arrow/line. Order is significant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,

    // Presentation fields: absence means "leave canvas default".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,

    /// Text content for text elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Label wrapper carrying equivalent text for container kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,

    /// Arrowhead markers (arrow kind only). `null` is a valid marker value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_arrowhead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_arrowhead: Option<String>,
}

impl Element {
    /// Creates a minimal element with position only.
    pub fn new(element_type: &str, x: f64, y: f64) -> Self {
        Element {
            id: String::new(),
            element_type: element_type.to_string(),
            x,
            y,
            width: None,
            height: None,
            points: None,
            background_color: None,
            stroke_color: None,
            stroke_width: None,
            roughness: None,
            opacity: None,
            font_size: None,
            font_family: None,
            text: None,
            label: None,
            start_arrowhead: None,
            end_arrowhead: None,
        }
    }

    /// Classifies the wire type string.
    pub fn kind(&self) -> ElementKind {
        ElementKind::of(&self.element_type)
    }

    /// Returns the display text: `text` for text elements, otherwise the
    /// label text with `text` as fallback.
    pub fn display_text(&self) -> Option<&str> {
        if self.kind() == ElementKind::Text {
            return self.text.as_deref();
        }
        self.label
            .as_ref()
            .and_then(|label| label.text.as_deref())
            .or(self.text.as_deref())
    }

    /// Returns the path as `[x, y]` pairs, defaulting to a degenerate
    /// two-point segment when absent or empty.
    pub fn path_pairs(&self) -> Vec<[f64; 2]> {
        match self.points.as_deref() {
            Some(points) if !points.is_empty() => {
                points.iter().map(Point::to_pair).collect()
            }
            _ => vec![[0.0, 0.0], [0.0, 0.0]],
        }
    }

    /// Normalizes the element: assigns an id when absent and fills the
    /// kind-specific geometry defaults.
    ///
    /// Normalization is idempotent; identity is never changed once set.
    pub fn normalized(mut self) -> Self {
        if self.id.is_empty() {
            self.id = generate_element_id();
        }

        let kind = self.kind();
        if kind.is_shape() {
            self.width.get_or_insert(100.0);
            self.height.get_or_insert(60.0);
        }
        if kind.is_linear() {
            let degenerate = self.points.as_deref().map_or(true, <[Point]>::is_empty);
            if degenerate {
                self.points = Some(vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0)]);
            }
        }

        self
    }
}

/// Generates a fresh element id: `bridge-<timestamp-millis>-<random>`.
pub fn generate_element_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("bridge-{}-{}", millis, &random[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ElementKind::of("rectangle"), ElementKind::Rectangle);
        assert_eq!(ElementKind::of("ellipse"), ElementKind::Ellipse);
        assert_eq!(ElementKind::of("diamond"), ElementKind::Diamond);
        assert_eq!(ElementKind::of("text"), ElementKind::Text);
        assert_eq!(ElementKind::of("arrow"), ElementKind::Arrow);
        assert_eq!(ElementKind::of("line"), ElementKind::Line);
        assert_eq!(ElementKind::of("frame"), ElementKind::Unsupported);
        assert_eq!(ElementKind::of(""), ElementKind::Unsupported);
    }

    #[test]
    fn test_shape_defaults_on_normalize() {
        let rect = Element::new("rectangle", 10.0, 20.0).normalized();
        assert_eq!(rect.width, Some(100.0));
        assert_eq!(rect.height, Some(60.0));
        assert!(rect.id.starts_with("bridge-"));
    }

    #[test]
    fn test_explicit_geometry_preserved() {
        let mut ellipse = Element::new("ellipse", 0.0, 0.0);
        ellipse.width = Some(250.0);
        let ellipse = ellipse.normalized();
        assert_eq!(ellipse.width, Some(250.0));
        assert_eq!(ellipse.height, Some(60.0));
    }

    #[test]
    fn test_linear_default_points() {
        let line = Element::new("line", 0.0, 0.0).normalized();
        assert_eq!(
            line.points,
            Some(vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0)])
        );
        // Empty sequences get the same degenerate default.
        let mut arrow = Element::new("arrow", 0.0, 0.0);
        arrow.points = Some(vec![]);
        assert_eq!(arrow.normalized().path_pairs(), vec![[0.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_normalize_keeps_existing_id() {
        let mut text = Element::new("text", 1.0, 2.0);
        text.id = "el-1".to_string();
        assert_eq!(text.normalized().id, "el-1");
    }

    #[test]
    fn test_point_accepts_both_wire_forms() {
        let coords: Point = serde_json::from_str(r#"{"x": 3.0, "y": 4.0}"#).unwrap();
        let pair: Point = serde_json::from_str("[3.0, 4.0]").unwrap();
        assert_eq!(coords, pair);
    }

    #[test]
    fn test_font_family_coercion() {
        let code = FontFamily::Code(2.0);
        assert_eq!(code.code(), Some(2.0));
        assert_eq!(FontFamily::Name("3".into()).code(), Some(3.0));
        assert_eq!(FontFamily::Name("cursive".into()).code(), None);
    }

    #[test]
    fn test_display_text_resolution() {
        let mut text = Element::new("text", 0.0, 0.0);
        text.text = Some("hello".into());
        assert_eq!(text.display_text(), Some("hello"));

        let mut rect = Element::new("rectangle", 0.0, 0.0);
        rect.label = Some(Label {
            text: Some("boxed".into()),
        });
        rect.text = Some("fallback".into());
        assert_eq!(rect.display_text(), Some("boxed"));

        rect.label = None;
        assert_eq!(rect.display_text(), Some("fallback"));
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let json = r#"{"id":"f-1","type":"frame","x":0.0,"y":0.0}"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.kind(), ElementKind::Unsupported);
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "frame");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_element_id();
        let b = generate_element_id();
        assert_ne!(a, b);
    }
}
