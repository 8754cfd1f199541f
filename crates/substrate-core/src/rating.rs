//! RatingEngine (spec.md §4.9, component C9): dual-ELO update and decay.
//!
//! Ratings are read-modify-write, not append-mostly, so each relation gets
//! its own lock (spec.md §5: "rating updates on the same relation are
//! linearised by a per-relation lock (fine-grained)") rather than sharing
//! [`crate::store`]'s append-mostly pattern.

use crate::config::EngineConfig;
use crate::id::Id128;
use crate::model::{RelationEvidence, RelationRating};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

const INITIAL_ELO: f64 = 1500.0;

pub struct RatingEngine {
    ratings: RwLock<HashMap<Id128, Arc<Mutex<RelationRating>>>>,
    config: EngineConfig,
}

impl RatingEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            ratings: RwLock::new(HashMap::new()),
            config,
        }
    }

    fn entry(&self, relation_id: Id128) -> Arc<Mutex<RelationRating>> {
        if let Some(existing) = self.ratings.read().get(&relation_id) {
            return existing.clone();
        }
        self.ratings
            .write()
            .entry(relation_id)
            .or_insert_with(|| Arc::new(Mutex::new(self.fresh_rating(relation_id))))
            .clone()
    }

    fn fresh_rating(&self, relation_id: Id128) -> RelationRating {
        RelationRating {
            relation_id,
            base_elo: self.config.rating_base_default,
            consensus_elo: 0.0,
            observations: 0,
            k_factor: self.config.rating_k_factor,
        }
    }

    /// Record one observation of `relation_id` with outcome `o ∈ [0,1]`
    /// (`1.0` confirmed, `0.5` weak, `0.0` contradicted) and evidence
    /// weight `weight_in`. Implements the update in spec.md §4.9:
    /// ```text
    /// expected = 1 / (1 + 10^((1500 − base_elo)/400))
    /// base_elo' = clamp(base_elo + k_factor·(o − expected), 0, 4000)
    /// consensus_elo' = consensus_elo + log2(1 + observations)·weight_in
    /// observations' = observations + 1
    /// ```
    pub fn observe(&self, relation_id: Id128, outcome: f64, weight_in: f64) -> RelationRating {
        let entry = self.entry(relation_id);
        let mut rating = entry.lock();
        let expected = 1.0 / (1.0 + 10f64.powf((INITIAL_ELO - rating.base_elo) / 400.0));
        rating.base_elo =
            (rating.base_elo + rating.k_factor * (outcome - expected)).clamp(0.0, 4000.0);
        rating.consensus_elo += (1.0 + rating.observations as f64).log2() * weight_in;
        rating.observations += 1;
        *rating
    }

    #[must_use]
    pub fn get(&self, relation_id: Id128) -> Option<RelationRating> {
        self.ratings.read().get(&relation_id).map(|e| *e.lock())
    }

    pub fn remove(&self, relation_id: Id128) {
        self.ratings.write().remove(&relation_id);
    }

    /// Recompute `relation_id`'s rating from scratch, replaying
    /// `remaining_evidence` in its original chronological order, as if the
    /// purged evidence had never been ingested (spec.md §4.9/P-DELETE).
    /// Returns `None` (and removes the rating) if no evidence remains.
    pub fn recompute_from_evidence(
        &self,
        relation_id: Id128,
        remaining_evidence: &[RelationEvidence],
    ) -> Option<RelationRating> {
        if remaining_evidence.is_empty() {
            self.remove(relation_id);
            return None;
        }
        self.ratings
            .write()
            .insert(relation_id, Arc::new(Mutex::new(self.fresh_rating(relation_id))));

        let mut ordered = remaining_evidence.to_vec();
        ordered.sort_by_key(|e| (e.created, e.position));

        let mut last = None;
        for evidence in &ordered {
            last = Some(self.observe(relation_id, 1.0, evidence.weight));
        }
        last
    }
}
