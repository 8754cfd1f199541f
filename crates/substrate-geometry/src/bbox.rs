//! Axis-aligned bounding boxes in ℝ⁴.
//!
//! `BBox4` is the node geometry consumed by the host store's spatial
//! index (spec.md §9's "Spatial index" design note): this crate
//! contributes the arithmetic, the index implementation itself lives in
//! the external store.

use crate::vector::{Vec4, euclidean};

/// Axis-aligned bounding box over ℝ⁴.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox4 {
    pub min: Vec4,
    pub max: Vec4,
}

impl BBox4 {
    /// A box containing exactly one point.
    #[must_use]
    pub fn from_point(p: Vec4) -> Self {
        Self { min: p, max: p }
    }

    /// The smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut min = self.min;
        let mut max = self.max;
        for i in 0..4 {
            min[i] = min[i].min(other.min[i]);
            max[i] = max[i].max(other.max[i]);
        }
        Self { min, max }
    }

    /// Expand `self` just enough to contain `p`.
    #[must_use]
    pub fn expand(&self, p: Vec4) -> Self {
        self.union(&Self::from_point(p))
    }

    /// Whether `p` lies within the box on every axis.
    #[must_use]
    pub fn contains(&self, p: Vec4) -> bool {
        (0..4).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Area (hypervolume) of the box's diagonal, used by `picksplit`-style
    /// node-splitting heuristics in the external index.
    #[must_use]
    pub fn volume(&self) -> f64 {
        (0..4)
            .map(|i| (self.max[i] - self.min[i]).max(0.0))
            .product()
    }

    /// Euclidean distance from `p` to the closest face of the box; `0.0`
    /// when `p` is interior (or on the boundary).
    #[must_use]
    pub fn distance_point(&self, p: Vec4) -> f64 {
        let mut closest = [0.0; 4];
        for i in 0..4 {
            closest[i] = p[i].clamp(self.min[i], self.max[i]);
        }
        euclidean(p, closest)
    }
}
