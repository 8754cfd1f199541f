//! Row types for the persisted layout (spec.md §3, §6).
//!
//! These mirror the nine logical tables 1:1. `substrate-store`'s reference
//! adapter stores them as ordered maps keyed by primary key; the ABI and
//! host-store boundaries pass the `Id128`/`H16`/`[f64; 4]` fields as raw
//! bytes/arrays.

use crate::id::Id128;
use serde::{Deserialize, Serialize};

/// One Unicode scalar value. Immutable once seeded (spec.md §3 Invariant A1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub id: Id128,
    pub codepoint: u32,
    pub hash: [u8; 16],
    pub physicality_id: Id128,
}

/// An n-gram of atoms promoted to a first-class node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub id: Id128,
    pub hash: [u8; 16],
    pub physicality_id: Id128,
}

/// Ordered edge `Composition -> Atom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionSequenceEdge {
    pub composition_id: Id128,
    pub atom_id: Id128,
    pub ordinal: u32,
    pub occurrences: u32,
}

/// A first-class edge over two or more compositions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Id128,
    pub physicality_id: Id128,
}

/// Ordered edge `Relation -> Composition`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationSequenceEdge {
    pub relation_id: Id128,
    pub composition_id: Id128,
    pub ordinal: u32,
    pub occurrences: u32,
}

/// The geometric facet shared by atoms, compositions, and relations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physicality {
    pub id: Id128,
    pub hilbert: [u8; 16],
    pub centroid: [f64; 4],
    /// Optional polyline in ℝ⁴ — not populated by the engine today, but
    /// present in the persisted layout for trajectory-tracking callers.
    pub trajectory: Option<Vec<[f64; 4]>>,
}

/// Dual-ELO rating attached to a Relation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationRating {
    pub relation_id: Id128,
    pub base_elo: f64,
    pub consensus_elo: f64,
    pub observations: u64,
    pub k_factor: f64,
}

/// Provenance record linking a relation to the content event that
/// produced or confirmed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEvidence {
    pub id: u64,
    pub relation_id: Id128,
    pub content_id: Id128,
    pub source_type: i16,
    pub position: u32,
    pub weight: f64,
    /// Unix-epoch seconds; stamped by the caller (the core never reads
    /// the system clock — see DESIGN.md for why).
    pub created: i64,
}

/// Raw provenance record: one row per ingested byte stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: Id128,
    pub hash: [u8; 16],
    pub size: u64,
    pub mime: String,
    pub source_identifier: String,
}
