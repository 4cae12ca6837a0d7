//! # Element Store
//!
//! The canonical in-memory cache of elements, keyed by id, paired with the
//! fingerprint index that drives change detection. The pair mutates under
//! one lock so a poll cycle never observes elements and fingerprints from
//! different generations.
//!
//! The store is never mutated directly by external callers; all writes go
//! through the CRUD applier or the poll cycle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use bridge_core::{ChangeSet, Element, FingerprintIndex};

use crate::error::BridgeResult;

/// Shared handle to the store; one per bridge agent.
pub type SharedStore = Arc<RwLock<ElementStore>>;

/// Canonical element cache plus its fingerprint index.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: HashMap<String, Element>,
    fingerprints: FingerprintIndex,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh shared store.
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// All cached elements. Order is unspecified.
    pub fn list(&self) -> Vec<Element> {
        self.elements.values().cloned().collect()
    }

    /// Inserts or replaces an element and records its fingerprint, so the
    /// next poll does not re-classify a bridge-originated write as a
    /// canvas-side change.
    pub fn upsert(&mut self, element: &Element) -> BridgeResult<()> {
        self.fingerprints.record(element)?;
        self.elements.insert(element.id.clone(), element.clone());
        Ok(())
    }

    /// Removes an element and forgets its fingerprint. Returns whether the
    /// id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.fingerprints.forget(id);
        self.elements.remove(id).is_some()
    }

    /// Drops every element and fingerprint.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.fingerprints.clear();
    }

    /// Replaces the cache with a polled canvas snapshot and returns the
    /// classified changes relative to the previous generation.
    ///
    /// The fingerprint index is rebuilt even when the change set is empty,
    /// so drift in the index never accumulates.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Element>) -> BridgeResult<ChangeSet> {
        let (changes, next_index) = self.fingerprints.diff(&snapshot)?;
        self.elements = snapshot
            .into_iter()
            .map(|element| (element.id.clone(), element))
            .collect();
        self.fingerprints = next_index;
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(id: &str, x: f64) -> Element {
        let mut element = Element::new("rectangle", x, 0.0).normalized();
        element.id = id.to_string();
        element
    }

    #[test]
    fn test_upsert_and_get() {
        let mut store = ElementStore::new();
        store.upsert(&rect("el-1", 1.0)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("el-1").unwrap().x, 1.0);

        store.upsert(&rect("el-1", 5.0)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("el-1").unwrap().x, 5.0);
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut store = ElementStore::new();
        store.upsert(&rect("el-1", 1.0)).unwrap();
        assert!(store.remove("el-1"));
        assert!(!store.remove("el-1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_classifies_changes() {
        let mut store = ElementStore::new();
        let changes = store
            .apply_snapshot(vec![rect("el-1", 1.0), rect("el-2", 2.0)])
            .unwrap();
        assert_eq!(changes.created.len(), 2);

        let mut moved = rect("el-1", 9.0);
        moved.stroke_color = Some("#ff0000".into());
        let changes = store.apply_snapshot(vec![moved]).unwrap();
        assert_eq!(changes.created.len(), 0);
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.deleted, vec!["el-2".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_is_invisible_to_next_snapshot() {
        let mut store = ElementStore::new();
        let element = rect("el-1", 1.0);
        store.upsert(&element).unwrap();

        // The canvas now shows exactly what the bridge wrote; no changes.
        let changes = store.apply_snapshot(vec![element]).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_identical_snapshot_is_empty_changeset() {
        let mut store = ElementStore::new();
        let snapshot = vec![rect("el-1", 1.0)];
        store.apply_snapshot(snapshot.clone()).unwrap();
        let changes = store.apply_snapshot(snapshot).unwrap();
        assert!(changes.is_empty());
    }
}
