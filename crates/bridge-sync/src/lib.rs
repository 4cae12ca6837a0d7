//! # bridge-sync: Sync Engine for the Canvas Bridge
//!
//! This crate runs the live synchronization between a polled canvas
//! surface, the canonical in-memory element store, and remote peers
//! speaking REST + WebSocket.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bridge Agent Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   BridgeAgent (Main Orchestrator)                │  │
//! │  │                                                                  │  │
//! │  │  Owns the shared store, suppressor, and applier                  │  │
//! │  │  Starts/stops the server and the poll loop                       │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ CanvasPoller   │  │ BridgeServer   │  │  CrudApplier           │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Snapshots the  │  │ REST + WSverbs │  │ Applies remote writes  │    │
//! │  │ canvas, diffs  │  │ over the store │  │ to store and canvas,   │    │
//! │  │ fingerprints,  │  │ with JSON      │  │ arms echo suppression  │    │
//! │  │ broadcasts     │  │ envelopes      │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       Echo Suppression                          │   │
//! │  │                                                                 │   │
//! │  │ Bridge-originated canvas writes arm a wall-clock window         │   │
//! │  │ during which poll cycles are skipped, so remote mutations       │   │
//! │  │ are never re-broadcast as canvas-side changes                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - Main `BridgeAgent` orchestrator
//! - [`adapter`] - Canvas surface contract and the in-memory adapter
//! - [`applier`] - Single write path for remote-originated mutations
//! - [`config`] - TOML configuration with env overrides
//! - [`error`] - Bridge error taxonomy
//! - [`outbound`] - Full-snapshot push to a remote peer store
//! - [`poller`] - Timer-driven canvas change detection
//! - [`protocol`] - Wire events and request payloads
//! - [`server`] - REST + WebSocket protocol surface
//! - [`store`] - Canonical element cache plus fingerprint index
//! - [`suppressor`] - Echo suppression window
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bridge_sync::{BridgeAgent, BridgeConfig, MemoryCanvas};
//!
//! let config = BridgeConfig::load_or_default(None);
//! let mut agent = BridgeAgent::new(config, Arc::new(MemoryCanvas::new()));
//! agent.start().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod agent;
pub mod applier;
pub mod config;
pub mod error;
pub mod outbound;
pub mod poller;
pub mod protocol;
pub mod server;
pub mod store;
pub mod suppressor;

// =============================================================================
// Re-exports
// =============================================================================

pub use adapter::{CanvasAdapter, DrawCommand, MemoryCanvas, StyleAttrs};
pub use agent::BridgeAgent;
pub use applier::{CrudApplier, LogNotifier, NoopNotifier, Notifier};
pub use config::{BridgeConfig, ServerSettings, SyncSettings};
pub use error::{BridgeError, BridgeResult};
pub use outbound::OutboundPusher;
pub use poller::CanvasPoller;
pub use protocol::{BatchRequest, BridgeEvent, SyncPush, SyncRequest};
pub use server::{router, BridgeServer, BridgeState, ServerHandle};
pub use store::{ElementStore, SharedStore};
pub use suppressor::EchoSuppressor;
