//! Content store (spec.md §3/§6, part of component C6).
//!
//! One row per ingested byte stream: hash, size, mime, and the
//! caller-supplied source identifier evidence purge keys on.

use crate::id::{Id128, Tier};
use crate::model::Content;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Append-mostly store of [`Content`] rows, indexed by hash and by the
/// `source_identifier` that surgical deletion purges on.
#[derive(Default)]
pub struct ContentStore {
    by_hash: RwLock<HashMap<[u8; 16], Content>>,
    by_source: RwLock<HashMap<String, Vec<Id128>>>,
}

impl ContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the content row keyed by `hash`, creating it if absent.
    pub fn get_or_create(
        &self,
        hash: [u8; 16],
        size: u64,
        mime: &str,
        source_identifier: &str,
    ) -> (Content, bool) {
        if let Some(existing) = self.by_hash.read().get(&hash).cloned() {
            return (existing, false);
        }
        let id = Id128::for_tier(Tier::Atom, hash); // content rows are not part of the tier lattice; reuse hash bytes directly
        let row = Content {
            id,
            hash,
            size,
            mime: mime.to_string(),
            source_identifier: source_identifier.to_string(),
        };
        self.by_hash.write().insert(hash, row.clone());
        self.by_source
            .write()
            .entry(source_identifier.to_string())
            .or_default()
            .push(id);
        (row, true)
    }

    /// Every content id ever ingested under `source_identifier`.
    #[must_use]
    pub fn ids_for_source(&self, source_identifier: &str) -> Vec<Id128> {
        self.by_source
            .read()
            .get(source_identifier)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lookup_by_hash(&self, hash: [u8; 16]) -> Option<Content> {
        self.by_hash.read().get(&hash).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_hash.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_dedupes_and_indexes_by_source() {
        let store = ContentStore::new();
        let (first, created) = store.get_or_create([1; 16], 10, "text/plain", "doc-a");
        let (second, created_again) = store.get_or_create([1; 16], 10, "text/plain", "doc-a");
        assert!(created);
        assert!(!created_again);
        assert_eq!(first, second);
        assert_eq!(store.ids_for_source("doc-a"), vec![first.id]);
    }
}
