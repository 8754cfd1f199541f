//! Composition store (spec.md §4.6, part of component C6).
//!
//! An ordered atom n-gram promoted to a first-class node the first time
//! it crosses [`crate::ngram`]'s significance threshold. Content-addressed:
//! `get_or_create` dedupes by hash, and the sequence edges enforce the
//! gap-free ordinal invariant (spec.md §3 Invariant C3).

use crate::error::{Error, Result};
use crate::id::{Id128, Tier};
use crate::model::{Composition, CompositionSequenceEdge};
use crate::store::physicality::PhysicalityRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Append-mostly store of Compositions and their atom-sequence edges.
pub struct CompositionStore {
    by_hash: RwLock<HashMap<[u8; 16], Composition>>,
    sequences: RwLock<HashMap<Id128, Vec<CompositionSequenceEdge>>>,
    physicality: Arc<PhysicalityRegistry>,
}

impl CompositionStore {
    #[must_use]
    pub fn new(physicality: Arc<PhysicalityRegistry>) -> Self {
        Self {
            by_hash: RwLock::new(HashMap::new()),
            sequences: RwLock::new(HashMap::new()),
            physicality,
        }
    }

    /// Get the composition keyed by `hash`, creating it from `child_centroids`
    /// (the atoms' physicality centroids, in sequence order) if absent.
    /// Atomic at the hash boundary: on concurrent creation, the lowest-id
    /// writer wins and every other caller reads that row back (spec.md §4.6).
    pub fn get_or_create(
        &self,
        hash: [u8; 16],
        child_centroids: &[[f64; 4]],
    ) -> Result<(Composition, bool)> {
        if let Some(existing) = self.by_hash.read().get(&hash).copied() {
            return Ok((existing, false));
        }
        let id = Id128::for_tier(Tier::Composition, hash);
        let phys = self
            .physicality
            .create_from_children(id, Tier::Composition, child_centroids)?;
        let composition = Composition {
            id,
            hash,
            physicality_id: phys.id,
        };

        let mut table = self.by_hash.write();
        // Lost the race: another thread created this row first.
        if let Some(existing) = table.get(&hash).copied() {
            return Ok((existing, false));
        }
        table.insert(hash, composition);
        Ok((composition, true))
    }

    /// Append sequence edges for `composition_id`. `edges` is
    /// `(atom_id, ordinal, occurrences)`. Enforces ordinal contiguity over
    /// the union of pre-existing and newly appended edges; on a duplicate
    /// `(composition_id, ordinal)` the existing row's `occurrences` is
    /// incremented rather than replaced (spec.md §4.6).
    pub fn append_sequence(
        &self,
        composition_id: Id128,
        edges: &[(Id128, u32, u32)],
    ) -> Result<()> {
        let mut sequences = self.sequences.write();
        let mut rows = sequences.get(&composition_id).cloned().unwrap_or_default();

        for &(atom_id, ordinal, occurrences) in edges {
            if let Some(existing) = rows.iter_mut().find(|r| r.ordinal == ordinal) {
                existing.occurrences += occurrences;
            } else {
                rows.push(CompositionSequenceEdge {
                    composition_id,
                    atom_id,
                    ordinal,
                    occurrences,
                });
            }
        }
        rows.sort_by_key(|r| r.ordinal);

        let actual: Vec<u32> = rows.iter().map(|r| r.ordinal).collect();
        let expected: Vec<u32> = (0..rows.len() as u32).collect();
        if actual != expected {
            return Err(Error::Internal(format!(
                "composition {composition_id} sequence ordinals are not gap-free: {actual:?}"
            )));
        }
        sequences.insert(composition_id, rows);
        Ok(())
    }

    #[must_use]
    pub fn sequence_of(&self, composition_id: Id128) -> Vec<CompositionSequenceEdge> {
        self.sequences
            .read()
            .get(&composition_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lookup_by_hash(&self, hash: [u8; 16]) -> Option<Composition> {
        self.by_hash.read().get(&hash).copied()
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

    fn store() -> CompositionStore {
        CompositionStore::new(Arc::new(PhysicalityRegistry::new()))
    }

    #[test]
    fn get_or_create_dedupes_by_hash() {
        let store = store();
        let centroids = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        let (first, created_first) = store.get_or_create([7; 16], &centroids).unwrap();
        let (second, created_second) = store.get_or_create([7; 16], &centroids).unwrap();
        assert!(created_first);
        assert!(!created_second);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_sequence_enforces_contiguous_ordinals() {
        let store = store();
        let (comp, _) = store
            .get_or_create([1; 16], &[[1.0, 0.0, 0.0, 0.0]])
            .unwrap();
        let a = Id128::for_tier(Tier::Atom, [2; 16]);
        let b = Id128::for_tier(Tier::Atom, [3; 16]);
        store.append_sequence(comp.id, &[(a, 0, 1), (b, 2, 1)]).unwrap_err();
        store.append_sequence(comp.id, &[(a, 0, 1), (b, 1, 1)]).unwrap();
        assert_eq!(store.sequence_of(comp.id).len(), 2);
    }

    #[test]
    fn duplicate_ordinal_increments_occurrences() {
        let store = store();
        let (comp, _) = store
            .get_or_create([9; 16], &[[1.0, 0.0, 0.0, 0.0]])
            .unwrap();
        let a = Id128::for_tier(Tier::Atom, [2; 16]);
        store.append_sequence(comp.id, &[(a, 0, 1)]).unwrap();
        store.append_sequence(comp.id, &[(a, 0, 3)]).unwrap();
        let rows = store.sequence_of(comp.id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].occurrences, 4);
    }
}
