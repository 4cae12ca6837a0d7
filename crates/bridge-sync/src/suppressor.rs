//! # Echo Suppressor
//!
//! After the bridge mutates the canvas itself, the next poll would observe
//! that mutation and re-broadcast it as if a human had drawn it. The
//! suppressor closes that loop: every bridge-originated canvas write arms a
//! fixed window during which poll cycles are skipped entirely.
//!
//! The window is wall-clock based and re-arms on every write, so a burst of
//! writes keeps polling paused until the burst settles.

use std::sync::Mutex;

use tokio::time::{Duration, Instant};

/// Pauses the poll loop for a window after bridge-originated canvas writes.
///
/// Shared between the CRUD applier (which arms it) and the poller (which
/// consults it). Cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct EchoSuppressor {
    deadline: Mutex<Option<Instant>>,
}

impl EchoSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the suppression window.
    pub fn mark(&self, window: Duration) {
        let mut deadline = self.deadline.lock().unwrap_or_else(|e| e.into_inner());
        *deadline = Some(Instant::now() + window);
    }

    /// Returns true while inside an armed window.
    pub fn is_suppressed(&self) -> bool {
        let deadline = self.deadline.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*deadline, Some(until) if Instant::now() < until)
    }
}
