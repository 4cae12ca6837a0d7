//! # bridge-core: Pure Domain Logic for Canvas Bridge
//!
//! This crate is the **heart** of Canvas Bridge. It contains the element
//! model and the change-detection logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Canvas Bridge Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Canvas Surface (external)                       │   │
//! │  │        polled snapshots ──► raw elements                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bridge-sync (I/O layer)                      │   │
//! │  │    element store, CRUD applier, REST+WS server, sync loop      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bridge-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐                │   │
//! │  │   │  element  │  │ fingerprint │  │   diff    │                │   │
//! │  │   │  Element  │  │   digests   │  │ ChangeSet │                │   │
//! │  │   │  Point    │  │   (blake3)  │  │  index    │                │   │
//! │  │   └───────────┘  └─────────────┘  └───────────┘                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CANVAS • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`element`] - Element model, kinds, normalization defaults
//! - [`fingerprint`] - Deterministic element/scene digests
//! - [`diff`] - Fingerprint index and change classification
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Canvas, network, file system access is FORBIDDEN here
//! 3. **Typed Dispatch**: Element kinds are a sum type, never string comparison
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bridge_core::element::{Element, ElementKind};
//! use bridge_core::fingerprint::element_fingerprint;
//!
//! let rect = Element::new("rectangle", 10.0, 20.0).normalized();
//!
//! // Shape kinds receive default geometry on normalization.
//! assert_eq!(rect.width, Some(100.0));
//! assert_eq!(rect.height, Some(60.0));
//! assert_eq!(rect.kind(), ElementKind::Rectangle);
//!
//! // Fingerprints are stable across repeated computation.
//! let a = element_fingerprint(&rect).unwrap();
//! let b = element_fingerprint(&rect).unwrap();
//! assert_eq!(a, b);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diff;
pub mod element;
pub mod error;
pub mod fingerprint;

// =============================================================================
// Re-exports
// =============================================================================

pub use diff::{ChangeSet, FingerprintIndex};
pub use element::{Element, ElementKind, FontFamily, Label, Point};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{element_fingerprint, scene_fingerprint, Fingerprint};
