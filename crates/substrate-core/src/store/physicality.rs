//! Physicality rows (spec.md §3): the geometric facet shared by atoms,
//! compositions, and relations.
//!
//! Computed once at parent creation and never mutated (spec.md §4.6): the
//! composition/relation centroid is the normalised sum of its children's
//! centroids, and the Hilbert code is derived from `(centroid + 1) / 2`
//! mapped into `[0,1]⁴`.

use crate::error::{Error, Result};
use crate::id::{Id128, Tier};
use crate::model::Physicality;
use parking_lot::RwLock;
use std::collections::HashMap;
use substrate_geometry::{Vec4, centroid as geo_centroid, encode, norm, with_entity_tag};

/// Map a unit-sphere centroid into the `[0,1]⁴` cube the Hilbert encoder
/// expects.
fn to_unit_cube(v: Vec4) -> Vec4 {
    [
        (v[0] + 1.0) / 2.0,
        (v[1] + 1.0) / 2.0,
        (v[2] + 1.0) / 2.0,
        (v[3] + 1.0) / 2.0,
    ]
}

/// In-memory registry of Physicality rows, keyed by their owning
/// atom/composition/relation id.
#[derive(Default)]
pub struct PhysicalityRegistry {
    rows: RwLock<HashMap<Id128, Physicality>>,
}

impl PhysicalityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or overwrite, if called twice for the same id — callers
    /// never do this for a sealed/created row) the physicality facet for
    /// `owner_id`, given its unit-norm `centroid`.
    ///
    /// Returns `Internal` if `centroid` isn't unit-norm within 1e-9
    /// (spec.md §3 Invariant P1) — this would indicate an invariant
    /// violation upstream, not caller error.
    pub fn create(&self, owner_id: Id128, tier: Tier, centroid: Vec4) -> Result<Physicality> {
        if (norm(centroid) - 1.0).abs() > 1e-9 {
            return Err(Error::Internal(format!(
                "non-unit centroid observed for {owner_id}: norm={}",
                norm(centroid)
            )));
        }
        let hilbert = with_entity_tag(encode(to_unit_cube(centroid)), matches!(tier, Tier::Atom));
        // The physicality row lives in its own table; reusing the owner's
        // id as its primary key is sufficient since ownership is exclusive
        // and 1:1 (spec.md §3 "Ownership").
        let physicality_id = owner_id;
        let row = Physicality {
            id: physicality_id,
            hilbert,
            centroid,
            trajectory: None,
        };
        self.rows.write().insert(physicality_id, row);
        Ok(row)
    }

    /// Compute the centroid of `child_centroids`, create a new physicality
    /// row for `owner_id` from it, and return it. This is how
    /// Composition/Relation centroids are derived per spec.md §4.6.
    pub fn create_from_children(
        &self,
        owner_id: Id128,
        tier: Tier,
        child_centroids: &[Vec4],
    ) -> Result<Physicality> {
        let centroid = geo_centroid(child_centroids);
        self.create(owner_id, tier, centroid)
    }

    #[must_use]
    pub fn get(&self, id: Id128) -> Option<Physicality> {
        self.rows.read().get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate a snapshot of every row, for invariant checks (P-NORM,
    /// P-HILBERT) in the harness.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Physicality> {
        self.rows.read().values().copied().collect()
    }
}
