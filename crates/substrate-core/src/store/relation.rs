//! Relation store (spec.md §4.6, part of component C6).
//!
//! An ordered tuple of compositions observed to co-occur within a window.
//! Relations carry no content hash of their own (spec.md §3): identity is
//! the hash of the ordered child-composition ids, so `get_or_create` takes
//! that hash as its key, same as [`crate::store::composition::CompositionStore`].

use crate::error::{Error, Result};
use crate::id::{Id128, Tier};
use crate::model::{Relation, RelationSequenceEdge};
use crate::store::physicality::PhysicalityRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use substrate_geometry::Vec4;

/// Append-mostly store of Relations and their composition-sequence edges.
pub struct RelationStore {
    by_identity_hash: RwLock<HashMap<[u8; 16], Relation>>,
    sequences: RwLock<HashMap<Id128, Vec<RelationSequenceEdge>>>,
    physicality: Arc<PhysicalityRegistry>,
}

impl RelationStore {
    #[must_use]
    pub fn new(physicality: Arc<PhysicalityRegistry>) -> Self {
        Self {
            by_identity_hash: RwLock::new(HashMap::new()),
            sequences: RwLock::new(HashMap::new()),
            physicality,
        }
    }

    /// Get the relation keyed by `identity_hash` (the hash of its ordered
    /// child-composition ids), creating it from `child_centroids` (the
    /// compositions' physicality centroids, in sequence order) if absent.
    pub fn get_or_create(
        &self,
        identity_hash: [u8; 16],
        child_centroids: &[Vec4],
        tier: Tier,
    ) -> Result<(Relation, bool)> {
        if let Some(existing) = self.by_identity_hash.read().get(&identity_hash).copied() {
            return Ok((existing, false));
        }
        let id = Id128::for_tier(tier, identity_hash);
        let phys = self.physicality.create_from_children(id, tier, child_centroids)?;
        let relation = Relation {
            id,
            physicality_id: phys.id,
        };

        let mut table = self.by_identity_hash.write();
        if let Some(existing) = table.get(&identity_hash).copied() {
            return Ok((existing, false));
        }
        table.insert(identity_hash, relation);
        Ok((relation, true))
    }

    /// Append sequence edges for `relation_id`. Same contiguity and
    /// duplicate-ordinal semantics as
    /// [`CompositionStore::append_sequence`](crate::store::composition::CompositionStore::append_sequence).
    pub fn append_sequence(
        &self,
        relation_id: Id128,
        edges: &[(Id128, u32, u32)],
    ) -> Result<()> {
        let mut sequences = self.sequences.write();
        let mut rows = sequences.get(&relation_id).cloned().unwrap_or_default();

        for &(composition_id, ordinal, occurrences) in edges {
            if let Some(existing) = rows.iter_mut().find(|r| r.ordinal == ordinal) {
                existing.occurrences += occurrences;
            } else {
                rows.push(RelationSequenceEdge {
                    relation_id,
                    composition_id,
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
                "relation {relation_id} sequence ordinals are not gap-free: {actual:?}"
            )));
        }
        sequences.insert(relation_id, rows);
        Ok(())
    }

    #[must_use]
    pub fn sequence_of(&self, relation_id: Id128) -> Vec<RelationSequenceEdge> {
        self.sequences.read().get(&relation_id).cloned().unwrap_or_default()
    }

    /// Outgoing neighbours of `composition_id`: every relation whose
    /// sequence contains it, paired with the ordinal at which it appears.
    /// Used by [`crate::walk`] to find a composition's outgoing edges.
    #[must_use]
    pub fn relations_containing(&self, composition_id: Id128) -> Vec<Id128> {
        self.sequences
            .read()
            .iter()
            .filter(|(_, rows)| rows.iter().any(|r| r.composition_id == composition_id))
            .map(|(id, _)| *id)
            .collect()
    }

    #[must_use]
    pub fn lookup_by_identity_hash(&self, identity_hash: [u8; 16]) -> Option<Relation> {
        self.by_identity_hash.read().get(&identity_hash).copied()
    }

    /// Remove `relation_id` entirely: its row and its sequence edges.
    /// Used by [`crate::rating::RatingEngine`] when a relation's evidence
    /// set reaches zero (spec.md §4.9 surgical deletion).
    pub fn remove(&self, relation_id: Id128) {
        self.by_identity_hash
            .write()
            .retain(|_, r| r.id != relation_id);
        self.sequences.write().remove(&relation_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_identity_hash.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
