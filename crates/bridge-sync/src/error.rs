//! # Bridge Error Types
//!
//! Error types for sync and protocol operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bridge Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Canvas      │  │    Protocol     │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ AdapterUnavail. │  │  NotFound       │  │  Transport              │ │
//! │  │ Unsupported     │  │  Malformed      │  │  BindFailed             │ │
//! │  │   ElementType   │  │    Payload      │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  Configuration  │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  InvalidConfig  │  │  Serialization  │                              │
//! │  │  ConfigLoad/Save│  │  Channel        │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Policy
//! Canvas-adapter failures are absorbed locally and never fail a protocol
//! request; the element store is the authoritative response source. Only a
//! startup bind failure is fatal to the running service.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error type covering sync and protocol failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    // =========================================================================
    // Canvas Errors
    // =========================================================================
    /// The canvas surface is not reachable. Non-fatal: the operation becomes
    /// a no-op and is retried on the next tick or request.
    #[error("Canvas adapter unavailable")]
    AdapterUnavailable,

    /// Creation aborted for a type outside the supported closed set.
    #[error("Unsupported element type: '{0}'")]
    UnsupportedElementType(String),

    /// A canvas-side operation failed after the adapter was reached.
    #[error("Canvas operation failed: {0}")]
    CanvasFailed(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The requested element id is absent. Surfaced as 404, never retried.
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Unparseable request body. Surfaced as a generic 500; the body is
    /// discarded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Outbound push or peer send failed. Logged; local state unaffected.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The protocol server could not bind its host/port. Fatal at startup.
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid bridge configuration.
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// JSON (de)serialization failed outside a request body.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    Channel(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<bridge_core::CoreError> for BridgeError {
    fn from(err: bridge_core::CoreError) -> Self {
        match err {
            bridge_core::CoreError::UnsupportedElementType(t) => {
                BridgeError::UnsupportedElementType(t)
            }
            bridge_core::CoreError::Serialization(e) => BridgeError::Serialization(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for BridgeError {
    fn from(err: url::ParseError) -> Self {
        BridgeError::InvalidConfig(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for BridgeError {
    fn from(err: toml::ser::Error) -> Self {
        BridgeError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl BridgeError {
    /// Returns true when the next tick or request naturally retries the
    /// failed operation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::AdapterUnavailable
                | BridgeError::Transport(_)
                | BridgeError::CanvasFailed(_)
        )
    }

    /// Returns true when the failure must never fail a protocol request.
    pub fn is_absorbed(&self) -> bool {
        matches!(
            self,
            BridgeError::AdapterUnavailable
                | BridgeError::CanvasFailed(_)
                | BridgeError::UnsupportedElementType(_)
        )
    }

    /// Returns true for configuration problems.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidConfig(_)
                | BridgeError::ConfigLoadFailed(_)
                | BridgeError::ConfigSaveFailed(_)
        )
    }
}
