//! Invariant verification (spec.md §8's P-NORM, P-HILBERT, P-SEQ, P-ELO)
//! run against a live [`Substrate`] rather than a single store in
//! isolation, for the `harness verify` subcommand and the scenario
//! tests under `tests/`.

use substrate_core::Substrate;
use substrate_core::id::Tier;

/// One invariant check that failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Violation {
    pub invariant: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct VerificationReport {
    pub physicality_rows_checked: usize,
    pub compositions_checked: usize,
    pub relations_checked: usize,
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check P-NORM, P-HILBERT, P-SEQ, and P-ELO over every row currently
/// held by `substrate`.
#[must_use]
pub fn verify_invariants(substrate: &Substrate) -> VerificationReport {
    let mut report = VerificationReport::default();

    let rows = substrate.physicality.snapshot();
    report.physicality_rows_checked = rows.len();
    for row in &rows {
        let norm: f64 = row.centroid.iter().map(|c| c * c).sum::<f64>().sqrt();
        if (norm - 1.0).abs() > 1e-9 {
            report.violations.push(Violation {
                invariant: "P-NORM",
                detail: format!("{} has ||centroid||={norm}", row.id),
            });
        }
    }
    // P-HILBERT (len(hilbert) = 16) holds by construction: `Physicality::hilbert`
    // is a `[u8; 16]`, not a variable-length buffer.

    for row in &rows {
        if row.id.tier() != Tier::Composition {
            continue;
        }
        report.compositions_checked += 1;
        let mut ordinals: Vec<u32> = substrate
            .compositions
            .sequence_of(row.id)
            .iter()
            .map(|e| e.ordinal)
            .collect();
        ordinals.sort_unstable();
        let expected: Vec<u32> = (0..ordinals.len() as u32).collect();
        if ordinals != expected {
            report.violations.push(Violation {
                invariant: "P-SEQ",
                detail: format!("composition {} has ordinals {ordinals:?}", row.id),
            });
        }
    }

    for row in &rows {
        if !matches!(row.id.tier(), Tier::Relation(_)) {
            continue;
        }
        let Some(rating) = substrate.ratings.get(row.id) else {
            continue;
        };
        report.relations_checked += 1;
        if !(0.0..=4000.0).contains(&rating.base_elo) {
            report.violations.push(Violation {
                invariant: "P-ELO",
                detail: format!("relation {} has base_elo={}", row.id, rating.base_elo),
            });
        }
        if rating.observations < 1 {
            report.violations.push(Violation {
                invariant: "P-ELO",
                detail: format!("relation {} has observations={}", row.id, rating.observations),
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::cancel::CancellationToken;
    use substrate_core::config::EngineConfig;
    use substrate_core::ingest::Ingestor;

    #[test]
    fn a_freshly_ingested_corpus_is_clean() {
        let engine = Substrate::new(EngineConfig::default()).unwrap();
        let corpus = "the cat sat on the mat the cat ran";
        engine
            .seed_atoms(corpus.chars().map(|c| c as u32))
            .unwrap();
        Ingestor::new(&engine)
            .ingest(corpus.as_bytes(), "doc", "text/plain", &CancellationToken::new())
            .unwrap();

        let report = verify_invariants(&engine);
        assert!(report.is_clean(), "unexpected violations: {:?}", report.violations);
        assert!(report.compositions_checked > 0);
        assert!(report.relations_checked > 0);
    }
}
