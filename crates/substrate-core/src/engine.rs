//! The assembled engine: one physicality table shared by atoms,
//! compositions, and relations, plus the append-mostly and read-modify-write
//! stores built on top of it (spec.md §2 data flow).
//!
//! `Substrate` is the handle every component (C8-C11) borrows to do its
//! work; `substrate-abi` wraps it behind the opaque `db_connection_t`.

use crate::atom_store::AtomStore;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::rating::RatingEngine;
use crate::store::{CompositionStore, ContentStore, EvidenceStore, PhysicalityRegistry, RelationStore};
use std::sync::Arc;

pub struct Substrate {
    pub atoms: Arc<AtomStore>,
    pub compositions: Arc<CompositionStore>,
    pub relations: Arc<RelationStore>,
    pub evidence: Arc<EvidenceStore>,
    pub content: Arc<ContentStore>,
    pub ratings: Arc<RatingEngine>,
    pub physicality: Arc<PhysicalityRegistry>,
    pub config: EngineConfig,
}

impl Substrate {
    /// Build a fresh engine. Does not seed the Atom foundation; call
    /// [`Substrate::seed_atoms`] once before ingesting.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let physicality = Arc::new(PhysicalityRegistry::new());
        Ok(Self {
            atoms: Arc::new(AtomStore::with_physicality(physicality.clone())),
            compositions: Arc::new(CompositionStore::new(physicality.clone())),
            relations: Arc::new(RelationStore::new(physicality.clone())),
            evidence: Arc::new(EvidenceStore::new()),
            content: Arc::new(ContentStore::new()),
            ratings: Arc::new(RatingEngine::new(config)),
            physicality,
            config,
        })
    }

    /// Seed the immutable Unicode-scalar foundation (spec.md §4.5).
    pub fn seed_atoms(&self, reference_data: impl IntoIterator<Item = u32>) -> Result<usize> {
        self.atoms.seed(reference_data)
    }
}
