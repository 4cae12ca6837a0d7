//! # Fingerprints
//!
//! Deterministic digests over an element's (or a whole scene's) comparable
//! fields, used to detect change without semantic diffing.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Fingerprint Pipeline                              │
//! │                                                                         │
//! │  Element ──► canonical JSON ──► blake3 ──► hex digest                   │
//! │              (struct order,                                             │
//! │               Nones omitted)                                            │
//! │                                                                         │
//! │  Scene   ──► per-element canonical JSON, fed into one hasher            │
//! │              in snapshot order ──► hex digest                           │
//! │                                                                         │
//! │  Equal digest ⇒ no observable change ⇒ poll cycle short-circuits        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The canonical form is the serde serialization of [`Element`]: field order
//! is fixed by the struct declaration and absent optionals are skipped, so
//! the digest is deterministic. Order within `points` is preserved (it
//! defines the path); order of elements within a scene is preserved as
//! observed.

use crate::element::Element;
use crate::error::CoreResult;

/// A hex-encoded digest of an element or scene.
pub type Fingerprint = String;

/// Computes the fingerprint of a single element over all comparable fields.
pub fn element_fingerprint(element: &Element) -> CoreResult<Fingerprint> {
    let canonical = serde_json::to_vec(element)?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

/// Computes the whole-scene fingerprint: an order-preserving digest of each
/// element's canonical serialization.
pub fn scene_fingerprint(elements: &[Element]) -> CoreResult<Fingerprint> {
    let mut hasher = blake3::Hasher::new();
    for element in elements {
        let canonical = serde_json::to_vec(element)?;
        // Length prefix keeps adjacent serializations from gluing together.
        hasher.update(&(canonical.len() as u64).to_le_bytes());
        hasher.update(&canonical);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
