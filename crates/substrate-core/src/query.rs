//! Query (spec.md §4.10, component C10): semantic retrieval.
//!
//! Three operations over the relation graph: `find_related` (plain
//! relevance ranking), `find_gravitational_truth` ("truths cluster,
//! lies scatter" — quality × frequency × spatial concentration), and
//! `answer_question` (keyword extraction + cross-keyword aggregation).

use crate::engine::Substrate;
use crate::error::{Error, Result};
use crate::hash::hash;
use crate::id::Id128;
use substrate_geometry::geodesic;

/// Hash a piece of text the same way [`crate::ngram`] hashes a
/// composition: concatenated 4-byte-LE codepoints (spec.md §3).
fn text_hash(text: &str) -> [u8; 16] {
    let bytes: Vec<u8> = text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect();
    hash(&bytes).0
}

/// Reconstruct the text of a composition from its atom sequence.
pub(crate) fn composition_text(substrate: &Substrate, composition_id: Id128) -> Result<String> {
    let edges = substrate.compositions.sequence_of(composition_id);
    if edges.is_empty() {
        return Err(Error::NotFound(format!("composition sequence for {composition_id}")));
    }
    let mut ordered = edges;
    ordered.sort_by_key(|e| e.ordinal);
    let mut out = String::with_capacity(ordered.len());
    for edge in ordered {
        // Every sequence edge's atom id carries its codepoint tagged into
        // the low byte; the atom store is the source of truth, so resolve
        // through it by hash lookup via the physicality-less fast path:
        // we keep a codepoint cache on AtomStore keyed by id via hash.
        let codepoint = substrate
            .atoms
            .lookup_by_id(edge.atom_id)
            .ok_or_else(|| Error::NotFound(format!("atom {}", edge.atom_id)))?
            .codepoint;
        out.push(char::from_u32(codepoint).unwrap_or('\u{FFFD}'));
    }
    Ok(out)
}

/// Resolve `text` to the composition it was hashed from.
pub(crate) fn resolve_composition(substrate: &Substrate, text: &str) -> Result<Id128> {
    substrate
        .compositions
        .lookup_by_hash(text_hash(text))
        .map(|c| c.id)
        .ok_or_else(|| Error::NotFound(format!("composition for text {text:?}")))
}

/// The composition(s) that co-occur with `composition_id` across its
/// outgoing/incoming relations, one entry per (relation, other-composition)
/// pair.
fn neighbor_relations(substrate: &Substrate, composition_id: Id128) -> Vec<(Id128, Id128)> {
    let mut out = Vec::new();
    for relation_id in substrate.relations.relations_containing(composition_id) {
        for edge in substrate.relations.sequence_of(relation_id) {
            if edge.composition_id != composition_id {
                out.push((relation_id, edge.composition_id));
            }
        }
    }
    out
}

/// One `find_related` result.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedCandidate {
    pub text: String,
    pub composition_id: Id128,
    pub relation_id: Id128,
    pub consensus_elo: f64,
    pub observations: u64,
}

/// One `find_gravitational_truth` result.
#[derive(Debug, Clone, PartialEq)]
pub struct GravitationalCandidate {
    pub text: String,
    pub composition_id: Id128,
    pub relation_id: Id128,
    pub base_elo: f64,
    pub observations: u64,
    pub cluster_density: usize,
    pub score: f64,
}

/// `answer_question`'s result.
#[derive(Debug, Clone, PartialEq)]
pub struct QaAnswer {
    pub text: String,
    pub score: f64,
    pub supporting_keywords: usize,
}

pub struct QueryEngine<'a> {
    substrate: &'a Substrate,
}

impl<'a> QueryEngine<'a> {
    #[must_use]
    pub fn new(substrate: &'a Substrate) -> Self {
        Self { substrate }
    }

    /// Resolve `text` to a composition and rank its relation neighbours
    /// by `consensus_elo DESC, observations DESC` (spec.md §4.10).
    pub fn find_related(&self, text: &str, limit: usize) -> Result<Vec<RelatedCandidate>> {
        let composition_id = resolve_composition(self.substrate, text)?;
        let mut candidates: Vec<RelatedCandidate> = neighbor_relations(self.substrate, composition_id)
            .into_iter()
            .filter_map(|(relation_id, other_id)| {
                let rating = self.substrate.ratings.get(relation_id)?;
                let text = composition_text(self.substrate, other_id).ok()?;
                Some(RelatedCandidate {
                    text,
                    composition_id: other_id,
                    relation_id,
                    consensus_elo: rating.consensus_elo,
                    observations: rating.observations,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.consensus_elo
                .partial_cmp(&a.consensus_elo)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.observations.cmp(&a.observations))
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// "Truths cluster, lies scatter" (spec.md §4.10): restrict to
    /// relations with `base_elo >= min_base_elo`, score each surviving
    /// neighbour by `base_elo · log2(observations+1) · cluster_density`,
    /// where `cluster_density` counts how many other surviving candidates
    /// (including itself) fall within `gravitational_radius` radians on
    /// S³.
    pub fn find_gravitational_truth(
        &self,
        text: &str,
        min_base_elo: f64,
        limit: usize,
    ) -> Result<Vec<GravitationalCandidate>> {
        let composition_id = resolve_composition(self.substrate, text)?;
        let radius = self.substrate.config.gravitational_radius;

        struct Survivor {
            composition_id: Id128,
            relation_id: Id128,
            base_elo: f64,
            observations: u64,
            centroid: [f64; 4],
        }

        let survivors: Vec<Survivor> = neighbor_relations(self.substrate, composition_id)
            .into_iter()
            .filter_map(|(relation_id, other_id)| {
                let rating = self.substrate.ratings.get(relation_id)?;
                if rating.base_elo < min_base_elo {
                    return None;
                }
                let centroid = self.substrate.physicality.get(other_id)?.centroid;
                Some(Survivor {
                    composition_id: other_id,
                    relation_id,
                    base_elo: rating.base_elo,
                    observations: rating.observations,
                    centroid,
                })
            })
            .collect();

        let mut scored: Vec<GravitationalCandidate> = survivors
            .iter()
            .filter_map(|s| {
                let cluster_density = survivors
                    .iter()
                    .filter(|other| geodesic(s.centroid, other.centroid) <= radius)
                    .count();
                let score = s.base_elo * (1.0 + s.observations as f64).log2() * cluster_density as f64;
                let text = composition_text(self.substrate, s.composition_id).ok()?;
                Some(GravitationalCandidate {
                    text,
                    composition_id: s.composition_id,
                    relation_id: s.relation_id,
                    base_elo: s.base_elo,
                    observations: s.observations,
                    cluster_density,
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Extract keywords from `question` (lowercased, depunctuated,
    /// stopwords stripped), run [`Self::find_related`] per keyword, and
    /// aggregate confidence across candidates; a keyword capitalized in
    /// the original question doubles the score of any candidate whose
    /// text shares that capitalization (a cheap proper-noun signal).
    /// Returns the argmax candidate.
    pub fn answer_question(&self, question: &str) -> Result<QaAnswer> {
        let tokens: Vec<&str> = question.split_whitespace().collect();
        let mut scores: std::collections::HashMap<String, (f64, usize)> =
            std::collections::HashMap::new();

        for token in &tokens {
            let depunctuated: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            if depunctuated.is_empty() {
                continue;
            }
            let lower = depunctuated.to_lowercase();
            if is_stopword(&lower) {
                continue;
            }
            let is_proper_noun = depunctuated
                .chars()
                .next()
                .is_some_and(char::is_uppercase);

            let Ok(related) = self.find_related(&lower, 8) else {
                continue;
            };
            for candidate in related {
                let mut confidence = candidate.consensus_elo.max(0.1);
                if is_proper_noun
                    && candidate
                        .text
                        .chars()
                        .next()
                        .is_some_and(char::is_uppercase)
                {
                    confidence *= 2.0;
                }
                let entry = scores.entry(candidate.text.clone()).or_insert((0.0, 0));
                entry.0 += confidence;
                entry.1 += 1;
            }
        }

        scores
            .into_iter()
            .max_by(|a, b| a.1.0.partial_cmp(&b.1.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(text, (score, supporting_keywords))| QaAnswer {
                text,
                score,
                supporting_keywords,
            })
            .ok_or_else(|| Error::NotFound(format!("no answer candidates for question {question:?}")))
    }
}

/// A short, fixed stopword list (English function words) — the engine
/// never consults an external corpus for this (spec.md §1 scopes Unicode
/// reference-data ingestion out).
fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in",
        "on", "at", "for", "with", "by", "from", "and", "or", "but", "what", "who", "whom",
        "whose", "which", "that", "this", "these", "those", "do", "does", "did", "has", "have",
        "had", "it", "its", "as",
    ];
    STOPWORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::config::EngineConfig;
    use crate::ingest::Ingestor;

    fn seeded_engine() -> Substrate {
        let engine = Substrate::new(EngineConfig::default()).unwrap();
        let corpus = "Moby Dick captain Ahab sailed the sea near Moby Dick captain Ahab";
        let chars: Vec<u32> = corpus.chars().map(|c| c as u32).collect();
        engine.seed_atoms(chars).unwrap();
        engine
    }

    #[test]
    fn find_related_requires_a_known_composition() {
        let engine = seeded_engine();
        let query = QueryEngine::new(&engine);
        let err = query.find_related("zzzzz", 5).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn gravitational_truth_prefers_high_quality_clustered_candidates() {
        let engine = seeded_engine();
        let ingestor = Ingestor::new(&engine);
        for _ in 0..3 {
            ingestor
                .ingest(
                    "Moby Dick captain Ahab".as_bytes(),
                    "doc",
                    "text/plain",
                    &CancellationToken::new(),
                )
                .unwrap();
        }
        let query = QueryEngine::new(&engine);
        let results = query.find_gravitational_truth("captain", 1500.0, 5).unwrap();
        assert!(!results.is_empty());
        for window in results.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }
}
