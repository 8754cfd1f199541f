//! NgramExtractor (spec.md §4.7, component C7): composition discovery.
//!
//! Finds significant contiguous atom n-grams (`3 <= n <= ngram_max_n`) in
//! an ingested codepoint sequence. Operates on codepoints directly (not
//! atom ids) since the Composition content hash is defined over
//! concatenated 4-byte-LE codepoints (spec.md §3); `Ingestion` (C8)
//! resolves each codepoint back to its `Id128` via `AtomStore` when it
//! builds `CompositionSequenceEdge` rows.

use crate::config::EngineConfig;
use crate::hash::{H16, hash};
use std::collections::HashMap;

/// A contiguous n-gram that crossed the significance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct NgramCandidate {
    pub codepoints: Vec<u32>,
    pub hash: H16,
    pub occurrences: u32,
}

fn ngram_hash(codepoints: &[u32]) -> H16 {
    let mut bytes = Vec::with_capacity(codepoints.len() * 4);
    for cp in codepoints {
        bytes.extend_from_slice(&cp.to_le_bytes());
    }
    hash(&bytes)
}

fn is_subsequence(longer: &[u32], shorter: &[u32]) -> bool {
    if shorter.len() > longer.len() {
        return false;
    }
    longer.windows(shorter.len()).any(|w| w == shorter)
}

/// Whether `codepoints` contains a whitespace atom, i.e. spans a word
/// boundary rather than staying within one token.
fn crosses_word_boundary(codepoints: &[u32]) -> bool {
    codepoints
        .iter()
        .any(|&cp| char::from_u32(cp).is_some_and(char::is_whitespace))
}

/// Extract every significant contiguous n-gram from `codepoints`.
///
/// Candidate windows that contain whitespace are never considered:
/// composition discovery is word/token-boundary aware, so a composition
/// never spans more than one whitespace-delimited token (spec.md §4.7's
/// "contiguous atom n-grams" are scoped to a token's atoms). Without this,
/// the combinatorial field of space-spanning windows over any token
/// sequence (e.g. "in Ahab", "he cat ") would vastly outnumber the
/// single-token candidates and — worse — would be eligible to subsume
/// them, dissolving every word-level composition into whichever
/// multi-word span it happened to take part in and leaving no
/// word-to-word Relations to ever form.
///
/// Significance: `occurrences >= config.ngram_min_occ` OR the n-gram's
/// joint frequency exceeds the product of its atoms' marginal
/// frequencies by at least `config.ngram_llr_threshold` nats. Ties on
/// length are broken by preferring a longer significant n-gram over a
/// shorter one it fully covers, when the longer one's count is at least
/// 80% of the shorter's (spec.md §4.7).
#[must_use]
pub fn extract_significant_ngrams(codepoints: &[u32], config: &EngineConfig) -> Vec<NgramCandidate> {
    let len = codepoints.len();
    if len < 3 {
        return Vec::new();
    }

    let mut unigram_counts: HashMap<u32, u32> = HashMap::new();
    for &cp in codepoints {
        *unigram_counts.entry(cp).or_insert(0) += 1;
    }
    let total = len as f64;

    let max_n = config.ngram_max_n.max(3).min(len);
    let mut counts: HashMap<Vec<u32>, u32> = HashMap::new();
    for n in 3..=max_n {
        for start in 0..=(len - n) {
            let slice = &codepoints[start..start + n];
            if crosses_word_boundary(slice) {
                continue;
            }
            *counts.entry(slice.to_vec()).or_insert(0) += 1;
        }
    }

    let mut significant: Vec<NgramCandidate> = counts
        .into_iter()
        .filter_map(|(gram, occurrences)| {
            let expected: f64 = total
                * gram
                    .iter()
                    .map(|cp| f64::from(unigram_counts[cp]) / total)
                    .product::<f64>();
            let llr = if expected > 0.0 {
                f64::from(occurrences) * (f64::from(occurrences) / expected).ln()
            } else {
                f64::INFINITY
            };
            let is_significant =
                occurrences >= config.ngram_min_occ || llr >= config.ngram_llr_threshold;
            is_significant.then(|| NgramCandidate {
                hash: ngram_hash(&gram),
                codepoints: gram,
                occurrences,
            })
        })
        .collect();

    significant.sort_by(|a, b| b.codepoints.len().cmp(&a.codepoints.len()));

    let mut keep = vec![true; significant.len()];
    for i in 0..significant.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..significant.len() {
            if !keep[j] {
                continue;
            }
            let (longer, shorter) = (&significant[i], &significant[j]);
            if shorter.codepoints.len() < longer.codepoints.len()
                && is_subsequence(&longer.codepoints, &shorter.codepoints)
                && f64::from(longer.occurrences) >= 0.8 * f64::from(shorter.occurrences)
            {
                keep[j] = false;
            }
        }
    }

    significant
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codepoints(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn empty_and_short_sequences_produce_nothing() {
        let config = EngineConfig::default();
        assert!(extract_significant_ngrams(&[], &config).is_empty());
        assert!(extract_significant_ngrams(&[1, 2], &config).is_empty());
    }

    #[test]
    fn repeated_trigram_is_significant_by_occurrence() {
        let config = EngineConfig::default();
        // "aaa" repeated gives the trigram [a,a,a] occurrences >= 2.
        let seq = codepoints("aaaaaaaaaa");
        let out = extract_significant_ngrams(&seq, &config);
        assert!(out.iter().any(|c| c.codepoints == vec!['a' as u32; 3]));
    }

    #[test]
    fn distinct_hashes_for_distinct_content() {
        let a = ngram_hash(&[1, 2, 3]);
        let b = ngram_hash(&[1, 2, 4]);
        assert_ne!(a, b);
    }

    #[test]
    fn same_content_hashes_identically() {
        assert_eq!(ngram_hash(&[10, 20, 30]), ngram_hash(&[10, 20, 30]));
    }

    #[test]
    fn longer_covering_ngram_suppresses_shorter_within_one_word() {
        // "catfish" (len 7) and the "cat" (len 3) it contains both occur
        // 3 times, with no whitespace in the longer candidate, so the
        // 80%-coverage rule suppresses "cat" in favor of "catfish".
        let config = EngineConfig::default();
        let seq = codepoints("catfish catfish catfish");
        let out = extract_significant_ngrams(&seq, &config);
        assert!(out.iter().any(|c| c.codepoints == codepoints("catfish")));
        assert!(
            !out.iter().any(|c| c.codepoints == codepoints("cat")),
            "\"cat\" should have been suppressed by the covering \"catfish\" candidate, got {out:?}"
        );
    }

    #[test]
    fn space_spanning_ngram_does_not_suppress_word_like_candidates() {
        // A space-spanning n-gram crossing "the"/"cat" must never eat
        // either word-like composition, even if it recurs just as often.
        let config = EngineConfig::default();
        let seq = codepoints("the cat the cat the cat");
        let out = extract_significant_ngrams(&seq, &config);
        assert!(
            out.iter().any(|c| c.codepoints == codepoints("the")),
            "\"the\" should survive despite space-spanning n-grams covering it, got {out:?}"
        );
        assert!(
            out.iter().any(|c| c.codepoints == codepoints("cat")),
            "\"cat\" should survive despite space-spanning n-grams covering it, got {out:?}"
        );
    }
}
