//! AtomStore (spec.md §4.5, component C5): the immutable foundation.
//!
//! One row per Unicode scalar value (~1,114,112 rows). Sealed after the
//! initial seeding transaction; every write after seal fails with
//! `SealedFoundation` (spec.md §3 Invariant A1).

use crate::error::{Error, Result};
use crate::id::{Id128, Tier};
use crate::model::{Atom, Physicality};
use crate::store::physicality::PhysicalityRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use substrate_geometry::hash_to_point;

/// The immutable Unicode-scalar foundation.
pub struct AtomStore {
    sealed: AtomicBool,
    by_codepoint: RwLock<HashMap<u32, Atom>>,
    by_hash: RwLock<HashMap<[u8; 16], Atom>>,
    by_id: RwLock<HashMap<Id128, Atom>>,
    physicality: Arc<PhysicalityRegistry>,
}

impl Default for AtomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomStore {
    /// A standalone store with its own physicality registry. Use
    /// [`AtomStore::with_physicality`] when atoms, compositions, and
    /// relations must share the one physicality table, as in a fully
    /// assembled engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_physicality(Arc::new(PhysicalityRegistry::new()))
    }

    #[must_use]
    pub fn with_physicality(physicality: Arc<PhysicalityRegistry>) -> Self {
        Self {
            sealed: AtomicBool::new(false),
            by_codepoint: RwLock::new(HashMap::new()),
            by_hash: RwLock::new(HashMap::new()),
            by_id: RwLock::new(HashMap::new()),
            physicality,
        }
    }

    /// Clone of the shared physicality registry, for wiring into sibling
    /// Composition/Relation stores.
    #[must_use]
    pub fn physicality_registry(&self) -> Arc<PhysicalityRegistry> {
        self.physicality.clone()
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Seed the full reference set of Unicode scalar values in one pass.
    /// Idempotent: re-seeding an unsealed store upserts by codepoint
    /// rather than erroring, per spec.md §4.5. Marks the store sealed on
    /// completion. Returns the number of rows created (not upserted) by
    /// this call.
    pub fn seed(&self, reference_data: impl IntoIterator<Item = u32>) -> Result<usize> {
        if self.is_sealed() {
            return Err(Error::SealedFoundation);
        }
        let mut created = 0usize;
        for codepoint in reference_data {
            if char::from_u32(codepoint).is_none() {
                return Err(Error::InvalidInput(format!(
                    "codepoint {codepoint} is not a valid Unicode scalar value"
                )));
            }
            if self.by_codepoint.read().contains_key(&codepoint) {
                continue;
            }
            let hash = crate::hash::hash_codepoint(codepoint);
            let id = Id128::for_tier(Tier::Atom, hash.0);
            let point = hash_to_point(&hash.0);
            let phys = self.physicality.create(id, Tier::Atom, point)?;
            let atom = Atom {
                id,
                codepoint,
                hash: hash.0,
                physicality_id: phys.id,
            };
            self.by_codepoint.write().insert(codepoint, atom);
            self.by_hash.write().insert(hash.0, atom);
            self.by_id.write().insert(id, atom);
            created += 1;
        }
        self.sealed.store(true, Ordering::SeqCst);
        Ok(created)
    }

    pub fn lookup_by_codepoint(&self, codepoint: u32) -> Result<Atom> {
        self.by_codepoint
            .read()
            .get(&codepoint)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("atom for codepoint {codepoint}")))
    }

    /// Look up an atom by its `Id128` (the key sequence edges carry).
    #[must_use]
    pub fn lookup_by_id(&self, id: Id128) -> Option<Atom> {
        self.by_id.read().get(&id).copied()
    }

    pub fn lookup_by_hash(&self, hash: [u8; 16]) -> Result<Atom> {
        self.by_hash
            .read()
            .get(&hash)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("atom for hash {}", hex::encode(hash))))
    }

    #[must_use]
    pub fn physicality_of(&self, atom: &Atom) -> Option<Physicality> {
        self.physicality.get(atom.physicality_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_codepoint.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every seeded physicality row, for invariant checks.
    #[must_use]
    pub fn physicality_snapshot(&self) -> Vec<Physicality> {
        self.physicality.snapshot()
    }
}
