//! # substrate-geometry
//!
//! S³ vector geometry for the semantic substrate engine.
//!
//! Every Atom, Composition, and Relation carries a position on the unit
//! hypersphere in ℝ⁴ (S³). This crate provides the vector algebra
//! (`vector`), a locality-preserving 128-bit spatial index over that
//! space (`hilbert`), a deterministic quasi-uniform point sequence used
//! to seed new positions (`fibonacci`), and axis-aligned bounding boxes
//! for the spatial index's internal node geometry (`bbox`).
//!
//! No `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod bbox;
pub mod fibonacci;
pub mod hilbert;
pub mod vector;

pub use bbox::BBox4;
pub use fibonacci::{hash_to_point, point_on_s3};
pub use hilbert::{Hilbert16, decode, encode, hamming, mask_entity_tag, with_entity_tag};
pub use vector::{
    GEODESIC_MAX, POLE, Vec4, centroid, dot, euclidean, geodesic, geodesic_acos, geodesic_chord,
    norm, normalize,
};
