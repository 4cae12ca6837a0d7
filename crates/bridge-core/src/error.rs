//! # Error Types
//!
//! Domain-specific error types for bridge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bridge-core errors (this file)                                        │
//! │  └── CoreError        - Domain failures (types, serialization)        │
//! │                                                                         │
//! │  bridge-sync errors (separate crate)                                   │
//! │  └── BridgeError      - Adapter, protocol, and transport failures     │
//! │                                                                         │
//! │  Flow: CoreError → BridgeError → JSON error envelope → Remote peer     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (element id, type string)
//! 3. Errors are enum variants, never String

use thiserror::Error;

/// Result type alias for bridge-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The element carries a type outside the supported closed set.
    ///
    /// The element may still be cached by callers; only canvas dispatch
    /// refuses it.
    #[error("Unsupported element type: '{0}'")]
    UnsupportedElementType(String),

    /// The canonical serialization used for fingerprints failed.
    #[error("Fingerprint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
