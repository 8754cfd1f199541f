//! Ingestion (spec.md §4.8, component C8): text/model ingest pipeline.
//!
//! Takes a byte stream, decodes it as UTF-8, resolves every codepoint
//! against the sealed [`crate::atom_store::AtomStore`], discovers
//! significant compositions via [`crate::ngram`], emits co-occurrence
//! pairs within a sliding window, and promotes significant pairs to
//! Relations with attached evidence and an initial rating observation.
//!
//! Resolution and significance analysis are pure (no store writes) and
//! run to completion before any write lands, so the common failure
//! modes (malformed UTF-8, an unknown codepoint) leave the graph
//! untouched — the "all-or-nothing" requirement in spec.md §4.8 for
//! those cases. A constraint violation surfaced by the store layer
//! itself (an `Internal` invariant failure) can still leave a partial
//! write in this in-memory engine; see DESIGN.md.

use crate::cancel::{CancellationToken, should_check};
use crate::engine::Substrate;
use crate::error::{Error, Result};
use crate::hash::hash;
use crate::id::{Id128, Tier};
use crate::log::{Event, IngestEvent, LogSink, NullSink};
use crate::ngram::extract_significant_ngrams;
use std::collections::HashMap;

/// Per-ingest counters (spec.md §4.8 step 5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestReport {
    pub atoms_processed: usize,
    pub compositions_created: usize,
    pub relations_created: usize,
    pub original_bytes: usize,
    pub stored_bytes: usize,
    pub compression_ratio: f64,
}

/// One occurrence of a significant composition at a given start position
/// in the ingested atom sequence.
struct Occurrence {
    start: usize,
    composition_hash: [u8; 16],
    atom_ids: Vec<Id128>,
}

pub struct Ingestor<'a> {
    substrate: &'a Substrate,
}

impl<'a> Ingestor<'a> {
    #[must_use]
    pub fn new(substrate: &'a Substrate) -> Self {
        Self { substrate }
    }

    /// Ingest `bytes` tagged with `source_identifier`/`mime`, in one
    /// logical transaction. `cancel` is checked every
    /// `config.check_interval` atoms.
    pub fn ingest(
        &self,
        bytes: &[u8],
        source_identifier: &str,
        mime: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestReport> {
        self.ingest_logged(bytes, source_identifier, mime, cancel, &NullSink)
    }

    pub fn ingest_logged(
        &self,
        bytes: &[u8],
        source_identifier: &str,
        mime: &str,
        cancel: &CancellationToken,
        log: &dyn LogSink,
    ) -> Result<IngestReport> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("ingest buffer must be non-empty".into()));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::InvalidInput(format!("malformed UTF-8: {e}")))?;

        let config = self.substrate.config;
        let codepoints: Vec<u32> = text.chars().map(|c| c as u32).collect();
        let mut atom_ids = Vec::with_capacity(codepoints.len());
        for (i, &cp) in codepoints.iter().enumerate() {
            if should_check(i, config.check_interval) && cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let atom = self.substrate.atoms.lookup_by_codepoint(cp).map_err(|_| {
                Error::InvalidInput(format!("unknown codepoint U+{cp:04X} at position {i}"))
            })?;
            atom_ids.push(atom.id);
        }

        let candidates = extract_significant_ngrams(&codepoints, &config);
        let candidate_by_hash: HashMap<[u8; 16], usize> = candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.hash.0, idx))
            .collect();

        // Re-scan for every occurrence (not just the aggregate count) of
        // each significant candidate, so co-occurrence pairs can use
        // actual positions.
        let mut occurrences: Vec<Occurrence> = Vec::new();
        let len = codepoints.len();
        let max_n = config.ngram_max_n.max(3);
        for n in 3..=max_n {
            if n > len {
                break;
            }
            for start in 0..=(len - n) {
                let slice = &codepoints[start..start + n];
                let h = hash(&slice.iter().flat_map(|c| c.to_le_bytes()).collect::<Vec<u8>>());
                if candidate_by_hash.contains_key(&h.0) {
                    occurrences.push(Occurrence {
                        start,
                        composition_hash: h.0,
                        atom_ids: atom_ids[start..start + n].to_vec(),
                    });
                }
            }
        }
        occurrences.sort_by_key(|o| o.start);

        // --- commit phase: atoms/candidates validated, now write. ---
        let mut compositions_created = 0usize;
        let mut composition_ids: HashMap<[u8; 16], Id128> = HashMap::new();
        for occ in &occurrences {
            if composition_ids.contains_key(&occ.composition_hash) {
                continue;
            }
            let centroids: Vec<[f64; 4]> = occ
                .atom_ids
                .iter()
                .map(|id| {
                    self.substrate
                        .physicality
                        .get(*id)
                        .map(|p| p.centroid)
                        .unwrap_or(substrate_geometry::POLE)
                })
                .collect();
            let (composition, created) = self
                .substrate
                .compositions
                .get_or_create(occ.composition_hash, &centroids)?;
            if created {
                compositions_created += 1;
            }
            let edges: Vec<(Id128, u32, u32)> = occ
                .atom_ids
                .iter()
                .enumerate()
                .map(|(ordinal, atom_id)| (*atom_id, ordinal as u32, 1u32))
                .collect();
            self.substrate.compositions.append_sequence(composition.id, &edges)?;
            composition_ids.insert(occ.composition_hash, composition.id);
        }

        let (content, _) = self.substrate.content.get_or_create(
            hash(bytes).0,
            bytes.len() as u64,
            mime,
            source_identifier,
        );

        let mut relations_created = 0usize;
        let window = config.cooccurrence_window.max(1);
        for i in 0..occurrences.len() {
            for j in (i + 1)..occurrences.len() {
                let (a, b) = (&occurrences[i], &occurrences[j]);
                // Per spec.md §4.8 step 3, `j-i` is the distance between
                // compositions in the ordered occurrence sequence (token
                // distance), not their raw character offsets — two
                // adjacent word-compositions separated by a long
                // space-spanning candidate would otherwise read as "far
                // apart" and never co-occur. `occurrences` is sorted by
                // `start`, and `j > i`, so this is also already in
                // non-decreasing order as `j` grows, which is what makes
                // the early `break` below valid.
                let distance = j - i;
                if distance > window {
                    break;
                }
                if a.start == b.start {
                    // Same span, different candidate length: not a
                    // genuine co-occurrence.
                    continue;
                }
                let comp_a = composition_ids[&a.composition_hash];
                let comp_b = composition_ids[&b.composition_hash];
                if comp_a == comp_b {
                    continue;
                }
                let weight = 1.0 / distance as f64;
                let identity_hash = hash(
                    &[comp_a.as_bytes().as_slice(), comp_b.as_bytes().as_slice()].concat(),
                )
                .0;
                let centroid_a = self
                    .substrate
                    .physicality
                    .get(comp_a)
                    .map(|p| p.centroid)
                    .unwrap_or(substrate_geometry::POLE);
                let centroid_b = self
                    .substrate
                    .physicality
                    .get(comp_b)
                    .map(|p| p.centroid)
                    .unwrap_or(substrate_geometry::POLE);
                let (relation, created) = self.substrate.relations.get_or_create(
                    identity_hash,
                    &[centroid_a, centroid_b],
                    Tier::Relation(2),
                )?;
                if created {
                    relations_created += 1;
                    self.substrate
                        .relations
                        .append_sequence(relation.id, &[(comp_a, 0, 1), (comp_b, 1, 1)])?;
                }
                self.substrate
                    .evidence
                    .attach_evidence(relation.id, content.id, 0, a.start as u32, weight, source_identifier, 0);
                let rating = self.substrate.ratings.observe(relation.id, 1.0, weight);
                log.emit(Event::Rating(crate::log::RatingEvent {
                    relation_id: relation.id,
                    outcome: 1.0,
                    base_elo_after: rating.base_elo,
                    consensus_elo_after: rating.consensus_elo,
                    observations_after: rating.observations,
                }));
            }
        }

        let original_bytes = bytes.len();
        let stored_bytes = compositions_created * 16 + relations_created * 16;
        let compression_ratio = if stored_bytes == 0 {
            1.0
        } else {
            original_bytes as f64 / stored_bytes as f64
        };

        let report = IngestReport {
            atoms_processed: codepoints.len(),
            compositions_created,
            relations_created,
            original_bytes,
            stored_bytes,
            compression_ratio,
        };
        log.emit(Event::Ingest(IngestEvent {
            source_identifier: source_identifier.to_string(),
            atoms_processed: report.atoms_processed,
            compositions_created: report.compositions_created,
            relations_created: report.relations_created,
            original_bytes: report.original_bytes,
            stored_bytes: report.stored_bytes,
            compression_ratio: report.compression_ratio,
        }));
        Ok(report)
    }

    /// Surgical deletion (spec.md §4.9/P-DELETE): purge every evidence row
    /// whose content came from `source_identifier`, recompute ratings for
    /// every touched relation from its remaining evidence, and prune any
    /// relation left with zero evidence.
    pub fn purge_source(&self, source_identifier: &str) -> Result<usize> {
        let content_ids: std::collections::HashSet<Id128> = self
            .substrate
            .content
            .ids_for_source(source_identifier)
            .into_iter()
            .collect();
        if content_ids.is_empty() {
            return Ok(0);
        }
        let (touched, emptied) = self.substrate.evidence.purge_by_content(&content_ids);
        let emptied_set: std::collections::HashSet<Id128> = emptied.iter().copied().collect();
        for relation_id in &emptied {
            self.substrate.relations.remove(*relation_id);
            self.substrate.ratings.remove(*relation_id);
        }
        // Relations that still have evidence get a full recompute so their
        // rating reflects only the surviving (non-purged) observations.
        for relation_id in touched {
            if emptied_set.contains(&relation_id) {
                continue;
            }
            let remaining = self.substrate.evidence.for_relation(relation_id);
            self.substrate
                .ratings
                .recompute_from_evidence(relation_id, &remaining);
        }
        Ok(emptied_set.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn seeded_engine() -> Substrate {
        let engine = Substrate::new(EngineConfig::default()).unwrap();
        let chars: Vec<u32> = "the cat sat on mat".chars().map(|c| c as u32).collect();
        engine.seed_atoms(chars).unwrap();
        engine
    }

    #[test]
    fn ingest_resolves_unknown_codepoint_before_any_write() {
        let engine = seeded_engine();
        let ingestor = Ingestor::new(&engine);
        let err = ingestor
            .ingest("xyz123".as_bytes(), "doc-1", "text/plain", &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(engine.compositions.len(), 0);
    }

    #[test]
    fn ingest_creates_compositions_and_relations() {
        let engine = seeded_engine();
        let ingestor = Ingestor::new(&engine);
        let report = ingestor
            .ingest(
                "the cat sat on the mat".as_bytes(),
                "doc-1",
                "text/plain",
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(report.compositions_created > 0);
        assert_eq!(report.atoms_processed, "the cat sat on the mat".chars().count());
    }

    #[test]
    fn reingest_same_bytes_creates_no_new_compositions() {
        let engine = seeded_engine();
        let ingestor = Ingestor::new(&engine);
        let text = "the cat sat on the mat".as_bytes();
        let first = ingestor.ingest(text, "doc-1", "text/plain", &CancellationToken::new()).unwrap();
        let before = engine.evidence.len();
        let second = ingestor.ingest(text, "doc-1", "text/plain", &CancellationToken::new()).unwrap();
        assert_eq!(second.compositions_created, 0);
        assert!(first.compositions_created > 0);
        assert_eq!(engine.evidence.len(), before * 2);
    }

    #[test]
    fn purge_source_prunes_emptied_relations() {
        let engine = seeded_engine();
        let ingestor = Ingestor::new(&engine);
        ingestor
            .ingest(
                "the cat sat on the mat".as_bytes(),
                "doc-1",
                "text/plain",
                &CancellationToken::new(),
            )
            .unwrap();
        let relations_before = engine.relations.len();
        assert!(relations_before > 0);
        let pruned = ingestor.purge_source("doc-1").unwrap();
        assert_eq!(pruned, relations_before);
        assert_eq!(engine.relations.len(), 0);
    }
}
