//! # Change Classification
//!
//! Diffs a polled canvas snapshot against the previously recorded
//! fingerprints and classifies every element into exactly one bucket.
//!
//! ## Classification Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Change Classification                              │
//! │                                                                         │
//! │  1. scene digest unchanged  ──► empty ChangeSet (primary throttle)      │
//! │                                                                         │
//! │  2. per-element digests:                                                │
//! │     id unseen before        ──► created                                 │
//! │     digest differs          ──► updated                                 │
//! │     digest identical        ──► (no event)                              │
//! │     id gone from snapshot   ──► deleted                                 │
//! │                                                                         │
//! │  3. the replacement index is rebuilt from the current snapshot          │
//! │     REGARDLESS of whether anything classified (silent-drift defense)    │
//! │                                                                         │
//! │  Emission order: created, then updated, then deleted.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::element::Element;
use crate::error::CoreResult;
use crate::fingerprint::{element_fingerprint, scene_fingerprint, Fingerprint};

// =============================================================================
// Change Set
// =============================================================================

/// The classified outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Elements present now with no prior fingerprint.
    pub created: Vec<Element>,
    /// Elements whose fingerprint differs from the prior one.
    pub updated: Vec<Element>,
    /// IDs present in the prior fingerprint map but absent now.
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// Returns true when no element classified into any bucket.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of classified events.
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

// =============================================================================
// Fingerprint Index
// =============================================================================

/// Scene digest plus per-element digests recorded after the last cycle.
///
/// Owned by the element store and never shared mutably; diffing produces a
/// fresh replacement index rather than patching in place.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    /// Whole-scene digest from the last cycle.
    scene: Fingerprint,
    /// Digest per element id from the last cycle.
    per_element: HashMap<String, Fingerprint>,
}

impl FingerprintIndex {
    /// Builds an index directly from a snapshot.
    pub fn from_snapshot(snapshot: &[Element]) -> CoreResult<Self> {
        let scene = scene_fingerprint(snapshot)?;
        let mut per_element = HashMap::with_capacity(snapshot.len());
        for element in snapshot {
            per_element.insert(element.id.clone(), element_fingerprint(element)?);
        }
        Ok(FingerprintIndex { scene, per_element })
    }

    /// Diffs a snapshot against this index.
    ///
    /// Returns the classified [`ChangeSet`] together with the replacement
    /// index built from the snapshot. The replacement is produced even when
    /// the change set is empty, so callers always install it.
    pub fn diff(&self, snapshot: &[Element]) -> CoreResult<(ChangeSet, FingerprintIndex)> {
        let scene = scene_fingerprint(snapshot)?;
        if scene == self.scene {
            // Idle canvas: skip per-element work, but still hand back a
            // rebuilt index so stored and observed state cannot drift.
            return Ok((ChangeSet::default(), FingerprintIndex::from_snapshot(snapshot)?));
        }

        let mut per_element = HashMap::with_capacity(snapshot.len());
        let mut changes = ChangeSet::default();

        for element in snapshot {
            let digest = element_fingerprint(element)?;
            match self.per_element.get(&element.id) {
                None => changes.created.push(element.clone()),
                Some(prior) if *prior != digest => changes.updated.push(element.clone()),
                Some(_) => {}
            }
            per_element.insert(element.id.clone(), digest);
        }

        for id in self.per_element.keys() {
            if !per_element.contains_key(id) {
                changes.deleted.push(id.clone());
            }
        }

        Ok((changes, FingerprintIndex { scene, per_element }))
    }

    /// Records one element's digest, e.g. after an explicit create/update.
    ///
    /// The scene digest is left stale on purpose: the next diff then takes
    /// the per-element path and finds the recorded digest already current.
    pub fn record(&mut self, element: &Element) -> CoreResult<()> {
        self.per_element
            .insert(element.id.clone(), element_fingerprint(element)?);
        Ok(())
    }

    /// Removes one element's digest, e.g. after an explicit delete.
    pub fn forget(&mut self, id: &str) {
        self.per_element.remove(id);
    }

    /// Drops all recorded digests, e.g. when the store is repopulated.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.per_element.clear();
    }

    /// Number of elements recorded in the index.
    pub fn len(&self) -> usize {
        self.per_element.len()
    }

    /// Returns true when no element is recorded.
    pub fn is_empty(&self) -> bool {
        self.per_element.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn rect(id: &str, x: f64) -> Element {
        let mut element = Element::new("rectangle", x, 0.0);
        element.id = id.to_string();
        element.normalized()
    }

    #[test]
    fn test_unchanged_snapshot_is_empty() {
        let snapshot = vec![rect("a", 1.0), rect("b", 2.0)];
        let index = FingerprintIndex::from_snapshot(&snapshot).unwrap();
        let (changes, next) = index.diff(&snapshot).unwrap();
        assert!(changes.is_empty());
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_new_element_classifies_created() {
        let index = FingerprintIndex::from_snapshot(&[rect("a", 1.0)]).unwrap();
        let (changes, _) = index.diff(&[rect("a", 1.0), rect("b", 2.0)]).unwrap();
        assert_eq!(changes.created.len(), 1);
        assert_eq!(changes.created[0].id, "b");
        assert!(changes.updated.is_empty());
        assert!(changes.deleted.is_empty());
    }

    #[test]
    fn test_moved_element_classifies_updated() {
        let index = FingerprintIndex::from_snapshot(&[rect("a", 1.0)]).unwrap();
        let (changes, _) = index.diff(&[rect("a", 9.0)]).unwrap();
        assert!(changes.created.is_empty());
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.updated[0].id, "a");
    }

    #[test]
    fn test_missing_element_classifies_deleted() {
        let index =
            FingerprintIndex::from_snapshot(&[rect("a", 1.0), rect("b", 2.0)]).unwrap();
        let (changes, next) = index.diff(&[rect("a", 1.0)]).unwrap();
        assert_eq!(changes.deleted, vec!["b".to_string()]);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_each_id_lands_in_exactly_one_bucket() {
        let index =
            FingerprintIndex::from_snapshot(&[rect("keep", 1.0), rect("gone", 2.0)]).unwrap();
        let (changes, _) = index
            .diff(&[rect("keep", 5.0), rect("fresh", 3.0)])
            .unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes.created[0].id, "fresh");
        assert_eq!(changes.updated[0].id, "keep");
        assert_eq!(changes.deleted, vec!["gone".to_string()]);
    }

    #[test]
    fn test_empty_to_empty() {
        let index = FingerprintIndex::default();
        let (changes, next) = index.diff(&[]).unwrap();
        assert!(changes.is_empty());
        assert!(next.is_empty());
    }

    #[test]
    fn test_forget_removes_digest() {
        let mut index = FingerprintIndex::from_snapshot(&[rect("a", 1.0)]).unwrap();
        index.forget("a");
        assert!(index.is_empty());
    }
}
