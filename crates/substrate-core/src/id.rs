//! 128-bit identifiers with tier parity (spec.md §3).
//!
//! Bit 0 (the low bit of the last byte, big-endian) encodes tier parity
//! (`1` = Atom, `0` = Composition/Relation); bits 1–7 of that same byte
//! encode the tier level (`0` = atom, `1` = composition, `2+` =
//! relation-of-relations). The remaining 120 bits come from the content
//! hash. This makes tier membership testable without a join: the bit
//! layout is enforced once, at construction, not re-derived at every read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier level of an [`Id128`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Atom,
    Composition,
    /// Relation nesting depth `>= 2` ("relation-of-relations").
    Relation(u8),
}

impl Tier {
    fn level(self) -> u8 {
        match self {
            Tier::Atom => 0,
            Tier::Composition => 1,
            Tier::Relation(depth) => depth.max(2),
        }
    }

    fn is_atom(self) -> bool {
        matches!(self, Tier::Atom)
    }

    fn from_level(level: u8) -> Self {
        match level {
            0 => Tier::Atom,
            1 => Tier::Composition,
            depth => Tier::Relation(depth),
        }
    }
}

/// A 128-bit content-addressed identifier, tagged with tier parity/level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id128([u8; 16]);

impl Id128 {
    /// Build an id for `tier`, taking the top 120 bits from `hash` and
    /// overwriting the low byte with the tier's parity/level tag. This is
    /// the single call site where the bit layout is enforced.
    #[must_use]
    pub fn for_tier(tier: Tier, hash: [u8; 16]) -> Self {
        let mut bytes = hash;
        let level = tier.level() & 0x7F;
        let parity: u8 = u8::from(tier.is_atom());
        bytes[15] = (level << 1) | parity;
        Self(bytes)
    }

    /// Raw 16 bytes, big-endian.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Reconstruct from raw bytes (e.g. read back from the host store).
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// `true` if this id tags an Atom (tier parity bit 0 is `1`).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        self.0[15] & 1 == 1
    }

    /// Tier level encoded in bits 1-7 of the low byte.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.0[15] >> 1
    }

    /// Decode the full [`Tier`] from the level bits.
    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::from_level(self.level())
    }

    /// Lowercase 32-hex-character rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id128({})", self.to_hex())
    }
}

impl fmt::Display for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
