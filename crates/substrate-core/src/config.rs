//! Engine configuration (spec.md §6's configuration table).
//!
//! `EngineConfig` is passed by value into each handle at construction —
//! there is no ambient/global configuration (spec.md §9).

use serde::{Deserialize, Serialize};

/// Tunables for ingestion, rating, and walk generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on composition length during n-gram extraction.
    pub ngram_max_n: usize,
    /// Minimum intra-ingest repetitions to consider a composition.
    pub ngram_min_occ: u32,
    /// Log-likelihood cutoff (nats) for n-gram significance.
    pub ngram_llr_threshold: f64,
    /// Max token distance for co-occurrence pair emission.
    pub cooccurrence_window: usize,
    /// ELO update sensitivity.
    pub rating_k_factor: f64,
    /// Initial `base_elo` for newly created relations.
    pub rating_base_default: f64,
    /// Cluster radius (radians on S³) for gravitational-truth scoring.
    pub gravitational_radius: f64,
    /// Initial walk energy.
    pub walk_energy: f64,
    /// Per-step walk energy decay base.
    pub walk_decay: f64,
    /// Softmax temperature for neighbor sampling.
    pub walk_temperature: f64,
    /// Hard stop on walk output length.
    pub walk_max_tokens: usize,
    /// `α` weight on `consensus_elo` in the walk's neighbor-weight formula.
    pub walk_alpha: f64,
    /// `β` decay rate on geodesic distance in the walk's neighbor-weight formula.
    pub walk_beta: f64,
    /// Items (or walk steps) between cancellation-token checks.
    pub check_interval: usize,
    /// Visited-set eviction cap for long walks (spec.md §9).
    pub walk_visited_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ngram_max_n: 7,
            ngram_min_occ: 2,
            ngram_llr_threshold: 3.0,
            cooccurrence_window: 5,
            rating_k_factor: 32.0,
            rating_base_default: 1500.0,
            gravitational_radius: 0.05,
            walk_energy: 1.0,
            walk_decay: 0.05,
            walk_temperature: 0.7,
            walk_max_tokens: 200,
            walk_alpha: 0.3,
            walk_beta: 1.0,
            check_interval: 1024,
            walk_visited_cap: 4096,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration, returning `InvalidInput` on an
    /// out-of-range value.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if self.ngram_max_n < 3 {
            return Err(Error::InvalidInput(
                "ngram_max_n must be >= 3".to_string(),
            ));
        }
        if self.rating_base_default < 0.0 || self.rating_base_default > 4000.0 {
            return Err(Error::InvalidInput(
                "rating_base_default must be in [0, 4000]".to_string(),
            ));
        }
        if self.walk_temperature <= 0.0 {
            return Err(Error::InvalidInput(
                "walk_temperature must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let c = EngineConfig::default();
        assert_eq!(c.ngram_max_n, 7);
        assert_eq!(c.ngram_min_occ, 2);
        assert_eq!(c.cooccurrence_window, 5);
        assert_eq!(c.rating_k_factor, 32.0);
        assert_eq!(c.rating_base_default, 1500.0);
        assert_eq!(c.gravitational_radius, 0.05);
        assert_eq!(c.walk_max_tokens, 200);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_base_elo() {
        let mut c = EngineConfig::default();
        c.rating_base_default = 5000.0;
        assert!(c.validate().is_err());
    }
}
