//! WalkEngine (spec.md §4.11, component C11): energy-bounded stochastic
//! traversal of the relation graph, used for text generation.
//!
//! State is current composition, accumulated text, remaining energy,
//! a size-capped visited set (cycles are broken per-walk, not by
//! mutating the graph — spec.md §9), and an RNG seeded from the seed
//! composition's hash so a walk from the same prompt with the same
//! graph state is reproducible (spec.md's NON-GOALS explicitly waive
//! bit-exact reproduction of any *particular* RNG stream, not
//! reproducibility of this engine's own walks).

use crate::cancel::{CancellationToken, should_check};
use crate::engine::Substrate;
use crate::error::{Error, Result};
use crate::id::Id128;
use crate::query::{composition_text, resolve_composition};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::collections::VecDeque;
use substrate_geometry::geodesic;

/// Why a walk stopped (spec.md §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Energy reached zero.
    Energy,
    /// `max_tokens` output length was reached.
    Length,
    /// The newly appended fragment contained `stop_text`.
    Stop,
    /// The current composition has no outgoing relation.
    DeadEnd,
    /// The streaming callback requested cancellation, or the
    /// cancellation token was observed.
    Cancelled,
}

/// Per-call overrides of the walk defaults in [`crate::config::EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct WalkParams {
    pub energy: Option<f64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f64>,
    /// Nucleus-sampling cutoff: if set, only the smallest prefix of
    /// neighbours (sorted by weight) whose cumulative softmax mass
    /// reaches `top_p` is sampled from.
    pub top_p: Option<f64>,
    /// Stop the walk once the appended fragment contains this substring.
    pub stop_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkResult {
    pub text: String,
    pub finish_reason: FinishReason,
    pub steps: usize,
    pub energy_remaining: f64,
}

struct Neighbor {
    composition_id: Id128,
    weight: f64,
}

pub struct WalkEngine<'a> {
    substrate: &'a Substrate,
}

impl<'a> WalkEngine<'a> {
    #[must_use]
    pub fn new(substrate: &'a Substrate) -> Self {
        Self { substrate }
    }

    fn outgoing_neighbors(&self, composition_id: Id128, alpha: f64, beta: f64) -> Vec<Neighbor> {
        let Some(phys) = self.substrate.physicality.get(composition_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for relation_id in self.substrate.relations.relations_containing(composition_id) {
            let Some(rating) = self.substrate.ratings.get(relation_id) else {
                continue;
            };
            for edge in self.substrate.relations.sequence_of(relation_id) {
                if edge.composition_id == composition_id {
                    continue;
                }
                let Some(neighbor_phys) = self.substrate.physicality.get(edge.composition_id) else {
                    continue;
                };
                let distance = geodesic(phys.centroid, neighbor_phys.centroid);
                let weight = (rating.base_elo + alpha * rating.consensus_elo) * (-beta * distance).exp();
                out.push(Neighbor {
                    composition_id: edge.composition_id,
                    weight,
                });
            }
        }
        out
    }

    /// Temperature-softmax sample one neighbour, optionally truncated to
    /// the smallest nucleus whose cumulative mass reaches `top_p`.
    fn sample(neighbors: &[Neighbor], temperature: f64, top_p: Option<f64>, rng: &mut StdRng) -> usize {
        let max_weight = neighbors.iter().map(|n| n.weight).fold(f64::MIN, f64::max);
        let mut exps: Vec<(usize, f64)> = neighbors
            .iter()
            .enumerate()
            .map(|(i, n)| (i, ((n.weight - max_weight) / temperature.max(1e-6)).exp()))
            .collect();
        exps.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let total: f64 = exps.iter().map(|(_, w)| w).sum();
        let nucleus: Vec<(usize, f64)> = match top_p {
            Some(p) if p > 0.0 && p < 1.0 && total > 0.0 => {
                let mut cumulative = 0.0;
                let mut kept = Vec::new();
                for (idx, w) in &exps {
                    kept.push((*idx, *w));
                    cumulative += w / total;
                    if cumulative >= p {
                        break;
                    }
                }
                kept
            }
            _ => exps,
        };

        let nucleus_total: f64 = nucleus.iter().map(|(_, w)| w).sum();
        if nucleus_total <= 0.0 {
            return nucleus.first().map(|(i, _)| *i).unwrap_or(0);
        }
        let mut draw = rng.r#gen::<f64>() * nucleus_total;
        for (idx, w) in &nucleus {
            draw -= w;
            if draw <= 0.0 {
                return *idx;
            }
        }
        nucleus.last().map(|(i, _)| *i).unwrap_or(0)
    }

    /// Run a walk from `prompt` to completion, with no intermediate
    /// callback. See [`Self::run_streaming`] for incremental output.
    pub fn run(&self, prompt: &str, params: &WalkParams, cancel: &CancellationToken) -> Result<WalkResult> {
        self.run_streaming(prompt, params, cancel, &mut |_fragment| true)
    }

    /// Run a walk from `prompt`, invoking `on_fragment` with each newly
    /// appended text fragment after every step. If `on_fragment` returns
    /// `false`, the walk stops cooperatively with [`FinishReason::Cancelled`]
    /// and the partial text accumulated so far (spec.md §4.11).
    pub fn run_streaming(
        &self,
        prompt: &str,
        params: &WalkParams,
        cancel: &CancellationToken,
        on_fragment: &mut dyn FnMut(&str) -> bool,
    ) -> Result<WalkResult> {
        let config = self.substrate.config;
        let mut current = resolve_composition(self.substrate, prompt)?;
        let seed_hash = self
            .substrate
            .physicality
            .get(current)
            .map(|p| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&p.hilbert[0..8]);
                u64::from_be_bytes(bytes)
            })
            .unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(seed_hash);

        let mut energy = params.energy.unwrap_or(config.walk_energy);
        let max_tokens = params.max_tokens.unwrap_or(config.walk_max_tokens);
        let temperature = params.temperature.unwrap_or(config.walk_temperature);
        let decay = config.walk_decay;
        let alpha = config.walk_alpha;
        let beta = config.walk_beta;

        let mut text = composition_text(self.substrate, current).unwrap_or_default();
        if !on_fragment(&text) {
            return Ok(WalkResult {
                text,
                finish_reason: FinishReason::Cancelled,
                steps: 0,
                energy_remaining: energy,
            });
        }

        let mut visited: VecDeque<Id128> = VecDeque::new();
        visited.push_back(current);

        let mut steps = 0usize;
        let finish_reason = loop {
            if should_check(steps, config.check_interval.max(1)) && cancel.is_cancelled() {
                break FinishReason::Cancelled;
            }
            if energy <= 0.0 {
                break FinishReason::Energy;
            }
            if text.chars().count() >= max_tokens {
                break FinishReason::Length;
            }

            let neighbors: Vec<Neighbor> = self
                .outgoing_neighbors(current, alpha, beta)
                .into_iter()
                .filter(|n| !visited.contains(&n.composition_id))
                .collect();
            if neighbors.is_empty() {
                break FinishReason::DeadEnd;
            }

            let chosen_idx = Self::sample(&neighbors, temperature, params.top_p, &mut rng);
            let next = neighbors[chosen_idx].composition_id;

            let fragment = composition_text(self.substrate, next).unwrap_or_default();
            text.push_str(&fragment);
            steps += 1;
            energy -= decay * (1.0 + steps as f64 / max_tokens.max(1) as f64);

            visited.push_back(next);
            if visited.len() > config.walk_visited_cap {
                visited.pop_front();
            }
            current = next;

            if !on_fragment(&fragment) {
                break FinishReason::Cancelled;
            }
            if let Some(stop_text) = &params.stop_text {
                if !stop_text.is_empty() && fragment.contains(stop_text.as_str()) {
                    break FinishReason::Stop;
                }
            }
        };

        Ok(WalkResult {
            text,
            finish_reason,
            steps,
            energy_remaining: energy.max(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::config::EngineConfig;
    use crate::ingest::Ingestor;

    fn seeded_engine_with_corpus(corpus: &str) -> Substrate {
        let engine = Substrate::new(EngineConfig::default()).unwrap();
        let chars: Vec<u32> = corpus.chars().map(|c| c as u32).collect();
        engine.seed_atoms(chars).unwrap();
        let ingestor = Ingestor::new(&engine);
        ingestor
            .ingest(corpus.as_bytes(), "doc", "text/plain", &CancellationToken::new())
            .unwrap();
        engine
    }

    #[test]
    fn walk_terminates_within_bound_with_low_energy() {
        let engine = seeded_engine_with_corpus("the cat sat on the mat the cat ran");
        let walk = WalkEngine::new(&engine);
        let params = WalkParams {
            energy: Some(0.1),
            max_tokens: Some(5),
            ..Default::default()
        };
        let result = walk.run("the", &params, &CancellationToken::new()).unwrap();
        assert!(result.steps <= 5);
        assert!(matches!(
            result.finish_reason,
            FinishReason::Energy | FinishReason::Length | FinishReason::DeadEnd
        ));
    }

    #[test]
    fn walk_streaming_can_be_cancelled_by_callback() {
        let engine = seeded_engine_with_corpus("the cat sat on the mat the cat ran the dog sat");
        let walk = WalkEngine::new(&engine);
        let params = WalkParams {
            energy: Some(10.0),
            max_tokens: Some(200),
            ..Default::default()
        };
        let mut calls = 0;
        let result = walk
            .run_streaming("the", &params, &CancellationToken::new(), &mut |_frag| {
                calls += 1;
                calls < 2
            })
            .unwrap();
        assert_eq!(result.finish_reason, FinishReason::Cancelled);
    }

    #[test]
    fn unknown_prompt_composition_is_not_found() {
        let engine = seeded_engine_with_corpus("the cat sat");
        let walk = WalkEngine::new(&engine);
        let err = walk
            .run("zzzzzzzzzz", &WalkParams::default(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
