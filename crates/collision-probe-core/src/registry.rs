//! Fingerprint registry.
//!
//! The authoritative mapping from fingerprint to retained payload, owned and
//! mutated exclusively by the collision detector. Growth is monotonic for the
//! lifetime of a run; there is no eviction. Periodic compaction trims excess
//! table capacity and reports the registry's footprint, the dominant memory
//! cost of a long run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::mem;

/// Outcome of a registry insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The fingerprint was not present; it is now registered.
    Fresh,
    /// The fingerprint was already registered: a collision.
    Collision {
        /// Payload stored with the first occurrence.
        existing: Option<String>,
        /// Whether the stored payload matches the new one exactly. With
        /// payload retention disabled both sides are absent, which counts
        /// as an exact match.
        exact: bool,
    },
}

/// Registry footprint before and after a compaction pass.
#[derive(Debug, Clone, Copy)]
pub struct CompactionStats {
    pub entries: usize,
    pub capacity_before: usize,
    pub capacity_after: usize,
    pub approx_bytes_before: usize,
    pub approx_bytes_after: usize,
}

/// Mapping from fingerprint to optionally retained content.
#[derive(Debug, Default)]
pub struct FingerprintRegistry {
    entries: HashMap<String, Option<String>>,
}

impl FingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a fingerprint, detecting duplicates.
    ///
    /// Idempotence contract: a fingerprint not yet present never reports a
    /// collision; a fingerprint already present always does.
    pub fn insert(&mut self, fingerprint: String, content: Option<String>) -> InsertOutcome {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(occupied) => InsertOutcome::Collision {
                exact: *occupied.get() == content,
                existing: occupied.get().clone(),
            },
            Entry::Vacant(vacant) => {
                vacant.insert(content);
                InsertOutcome::Fresh
            }
        }
    }

    /// Shrink excess table capacity and report the footprint change.
    ///
    /// Transient allocations (vectors, byte buffers) are freed by ownership
    /// as they go out of scope; the table's over-allocation is the only
    /// reclaimable churn left, so this is the run's compaction step.
    pub fn compact(&mut self) -> CompactionStats {
        let capacity_before = self.entries.capacity();
        let approx_bytes_before = self.approx_bytes();
        self.entries.shrink_to_fit();
        CompactionStats {
            entries: self.entries.len(),
            capacity_before,
            capacity_after: self.entries.capacity(),
            approx_bytes_before,
            approx_bytes_after: self.approx_bytes(),
        }
    }

    /// Estimated heap footprint: table slots plus owned string bytes.
    pub fn approx_bytes(&self) -> usize {
        let slot = mem::size_of::<(String, Option<String>)>();
        let strings: usize = self
            .entries
            .iter()
            .map(|(key, value)| key.len() + value.as_ref().map_or(0, String::len))
            .sum();
        self.entries.capacity() * slot + strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ Insertion ============

    #[test]
    fn test_fresh_insert_never_collides() {
        let mut registry = FingerprintRegistry::new();
        assert_eq!(
            registry.insert("d41d8cd98f00b204e9".to_string(), None),
            InsertOutcome::Fresh
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_always_collides() {
        let mut registry = FingerprintRegistry::new();
        registry.insert("d41d8cd98f00b204e9".to_string(), None);
        let outcome = registry.insert("d41d8cd98f00b204e9".to_string(), None);
        assert_eq!(
            outcome,
            InsertOutcome::Collision {
                existing: None,
                exact: true,
            }
        );
        // The first occurrence's payload is preserved.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collision_with_differing_payloads() {
        let mut registry = FingerprintRegistry::new();
        registry.insert("aaaa".to_string(), Some("first".to_string()));
        let outcome = registry.insert("aaaa".to_string(), Some("second".to_string()));
        match outcome {
            InsertOutcome::Collision { existing, exact } => {
                assert_eq!(existing.as_deref(), Some("first"));
                assert!(!exact);
            }
            InsertOutcome::Fresh => panic!("duplicate insert reported fresh"),
        }
    }

    // ============ Compaction ============

    #[test]
    fn test_compact_preserves_entries() {
        let mut registry = FingerprintRegistry::new();
        for idx in 0..100 {
            registry.insert(format!("fingerprint-{idx}"), None);
        }
        let stats = registry.compact();
        assert_eq!(stats.entries, 100);
        assert_eq!(registry.len(), 100);
        assert!(stats.capacity_after <= stats.capacity_before);
    }

    #[test]
    fn test_approx_bytes_grows_with_entries() {
        let mut registry = FingerprintRegistry::new();
        let empty = registry.approx_bytes();
        for idx in 0..1000 {
            registry.insert(format!("fingerprint-{idx}"), None);
        }
        assert!(registry.approx_bytes() > empty);
    }
}
