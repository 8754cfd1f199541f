//! Content-addressed 128-bit hashing (spec.md §4.1).
//!
//! BLAKE3 truncated to 128 bits. Batch mode spreads work across a small
//! scoped-thread pool once the input count crosses a threshold — the only
//! concurrency primitive this crate uses outside `parking_lot` locks
//! (spec.md §5: "multi-threaded parallelism for CPU-bound hot paths...
//! backed by a fixed worker pool sized to available hardware parallelism").

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed 16-byte content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct H16(pub [u8; 16]);

/// Below this input count, batch hashing runs on the calling thread —
/// spinning up threads for a handful of short slices would cost more than
/// it saves.
const BATCH_PARALLEL_THRESHOLD: usize = 100;

impl H16 {
    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase 32-character hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex string, accepting optional hyphens, rejecting any
    /// input whose hex-nibble count (ignoring hyphens) isn't exactly 32.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let stripped: String = s.chars().filter(|c| *c != '-').collect();
        if stripped.len() != 32 {
            return Err(Error::InvalidInput(format!(
                "hash hex must decode to 16 bytes, got {} nibbles",
                stripped.len()
            )));
        }
        let bytes = hex::decode(&stripped)
            .map_err(|e| Error::InvalidInput(format!("invalid hex: {e}")))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| Error::InvalidInput("hash must be 16 bytes".to_string()))?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for H16 {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Self::parse_hex(&s)
    }
}

impl From<H16> for String {
    fn from(h: H16) -> Self {
        h.to_hex()
    }
}

impl fmt::Debug for H16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H16({})", self.to_hex())
    }
}

impl fmt::Display for H16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// BLAKE3, truncated to the first 128 bits of the output.
#[must_use]
pub fn hash(bytes: &[u8]) -> H16 {
    let full = blake3::hash(bytes);
    let mut out = [0u8; 16];
    out.copy_from_slice(&full.as_bytes()[0..16]);
    H16(out)
}

/// Hash a single Unicode scalar value (its codepoint encoded as 4-byte
/// little-endian, per spec.md §3's Atom field definition).
#[must_use]
pub fn hash_codepoint(codepoint: u32) -> H16 {
    hash(&codepoint.to_le_bytes())
}

/// Hash each of `inputs` independently. Parallelises across a scoped
/// thread pool sized to available hardware parallelism once
/// `inputs.len()` crosses [`BATCH_PARALLEL_THRESHOLD`]; otherwise runs
/// sequentially on the calling thread. Output order matches input order.
#[must_use]
pub fn hash_batch(inputs: &[&[u8]]) -> Vec<H16> {
    if inputs.len() < BATCH_PARALLEL_THRESHOLD {
        return inputs.iter().map(|b| hash(b)).collect();
    }

    let worker_count = std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
        .min(inputs.len());

    let mut out: Vec<Option<H16>> = vec![None; inputs.len()];
    let chunk_size = inputs.len().div_ceil(worker_count);

    std::thread::scope(|scope| {
        for (chunk_idx, (input_chunk, out_chunk)) in inputs
            .chunks(chunk_size)
            .zip(out.chunks_mut(chunk_size))
            .enumerate()
        {
            let _ = chunk_idx;
            scope.spawn(move || {
                for (slot, input) in out_chunk.iter_mut().zip(input_chunk) {
                    *slot = Some(hash(input));
                }
            });
        }
    });

    out.into_iter()
        .map(|o| o.expect("every slot filled by a worker"))
        .collect()
}
