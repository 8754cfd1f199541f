//! Evidence store (spec.md §4.6/§4.9, part of component C6).
//!
//! Append-only provenance: every relation observation is backed by an
//! evidence row linking it to the content event that produced or confirmed
//! it. `attach_evidence` is always additive; `purge_by_source` implements
//! the GDPR-style surgical deletion described in spec.md §4.9 (P-DELETE):
//! remove every evidence row tagged with a source, and report which
//! relations now have zero remaining evidence so the caller can prune them
//! and recompute ratings.

use crate::id::Id128;
use crate::model::RelationEvidence;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Append-only store of [`RelationEvidence`] rows.
#[derive(Default)]
pub struct EvidenceStore {
    rows: RwLock<Vec<RelationEvidence>>,
    next_id: RwLock<u64>,
}

impl EvidenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new evidence row. Always additive; returns the new row's id.
    pub fn attach_evidence(
        &self,
        relation_id: Id128,
        content_id: Id128,
        source_type: i16,
        position: u32,
        weight: f64,
        source_identifier: &str,
        created: i64,
    ) -> u64 {
        let mut next_id = self.next_id.write();
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        self.rows.write().push(RelationEvidence {
            id,
            relation_id,
            content_id,
            source_type,
            position,
            weight,
            created,
        });
        let _ = source_identifier; // kept only in the Content row (spec.md §3); not duplicated here.
        id
    }

    #[must_use]
    pub fn for_relation(&self, relation_id: Id128) -> Vec<RelationEvidence> {
        self.rows
            .read()
            .iter()
            .filter(|e| e.relation_id == relation_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn count_for_relation(&self, relation_id: Id128) -> usize {
        self.rows.read().iter().filter(|e| e.relation_id == relation_id).count()
    }

    /// Remove every evidence row whose content was ingested from
    /// `content_ids` (the set of content rows tagged with the purged
    /// source). Returns `(touched, emptied)`: every relation that lost at
    /// least one evidence row, and the subset of those that now have zero
    /// remaining evidence (for the caller to prune; the rest need only a
    /// rating recompute — spec.md §4.9).
    pub fn purge_by_content(&self, content_ids: &HashSet<Id128>) -> (Vec<Id128>, Vec<Id128>) {
        let mut rows = self.rows.write();
        let mut touched: HashMap<Id128, ()> = HashMap::new();
        for row in rows.iter() {
            if content_ids.contains(&row.content_id) {
                touched.insert(row.relation_id, ());
            }
        }
        rows.retain(|row| !content_ids.contains(&row.content_id));
        drop(rows);

        let remaining = self.rows.read();
        let touched: Vec<Id128> = touched.into_keys().collect();
        let emptied = touched
            .iter()
            .filter(|relation_id| !remaining.iter().any(|r| r.relation_id == **relation_id))
            .copied()
            .collect();
        (touched, emptied)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Tier;

    fn id(n: u8) -> Id128 {
        Id128::for_tier(Tier::Composition, [n; 16])
    }

    #[test]
    fn attach_evidence_is_additive_and_counted() {
        let store = EvidenceStore::new();
        let rel = id(1);
        let content = id(2);
        store.attach_evidence(rel, content, 0, 0, 1.0, "doc-a", 100);
        store.attach_evidence(rel, content, 0, 1, 0.5, "doc-a", 101);
        assert_eq!(store.count_for_relation(rel), 2);
    }

    #[test]
    fn purge_by_content_drops_rows_and_reports_emptied_relations() {
        let store = EvidenceStore::new();
        let rel_a = id(1);
        let rel_b = id(2);
        let content_from_source = id(3);
        let content_other = id(4);

        store.attach_evidence(rel_a, content_from_source, 0, 0, 1.0, "doc-a", 0);
        store.attach_evidence(rel_b, content_from_source, 0, 0, 1.0, "doc-a", 0);
        store.attach_evidence(rel_b, content_other, 0, 1, 1.0, "doc-b", 0);

        let mut purged = HashSet::new();
        purged.insert(content_from_source);
        let (mut touched, emptied) = store.purge_by_content(&purged);
        touched.sort_by_key(|id| id.to_hex());

        let mut expected_touched = vec![rel_a, rel_b];
        expected_touched.sort_by_key(|id| id.to_hex());
        assert_eq!(touched, expected_touched);
        assert_eq!(emptied, vec![rel_a]);
        assert_eq!(store.count_for_relation(rel_a), 0);
        assert_eq!(store.count_for_relation(rel_b), 1);
    }
}
