//! Vector algebra on S³, the unit hypersphere in ℝ⁴.

use std::f64::consts::PI;

/// A point in ℝ⁴, usually (but not necessarily) unit-norm.
pub type Vec4 = [f64; 4];

/// The canonical pole returned whenever normalization or centroid
/// computation hits a degenerate (near-zero-norm) input.
pub const POLE: Vec4 = [1.0, 0.0, 0.0, 0.0];

/// Below this norm a vector is treated as the zero vector.
const NORM_EPSILON: f64 = 1e-12;

/// Dot product of two 4-vectors.
#[must_use]
pub fn dot(a: Vec4, b: Vec4) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Euclidean (chord) distance between two points in ℝ⁴.
#[must_use]
pub fn euclidean(a: Vec4, b: Vec4) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];
    dot(d, d).sqrt()
}

/// L2 norm of a 4-vector.
#[must_use]
pub fn norm(v: Vec4) -> f64 {
    dot(v, v).sqrt()
}

/// Normalize `v` to unit length. Returns the canonical pole `(1,0,0,0)`
/// when `‖v‖ < 1e-12`, per spec.
#[must_use]
pub fn normalize(v: Vec4) -> Vec4 {
    let n = norm(v);
    if n < NORM_EPSILON {
        return POLE;
    }
    [v[0] / n, v[1] / n, v[2] / n, v[3] / n]
}

/// Geodesic (great-circle arc) distance between two points on S³, in
/// `[0, π]`.
///
/// Uses `acos(clamp(dot, -1, 1))` away from antipodal pairs, and the
/// numerically stable `2*asin(‖a-b‖/2)` form near `|dot| >= 0.999`,
/// where `acos`'s derivative is ill-conditioned. Both formulations are
/// exposed individually via [`geodesic_acos`] and [`geodesic_chord`] so
/// callers (and tests) can compare them directly.
#[must_use]
pub fn geodesic(a: Vec4, b: Vec4) -> f64 {
    let d = dot(a, b).clamp(-1.0, 1.0);
    if d.abs() < 0.999 {
        geodesic_acos(a, b)
    } else {
        geodesic_chord(a, b)
    }
}

/// `acos(clamp(dot(a,b), -1, 1))`.
#[must_use]
pub fn geodesic_acos(a: Vec4, b: Vec4) -> f64 {
    dot(a, b).clamp(-1.0, 1.0).acos()
}

/// `2 * asin(euclidean(a,b) / 2)`, stable near antipodal/identical pairs.
#[must_use]
pub fn geodesic_chord(a: Vec4, b: Vec4) -> f64 {
    2.0 * (euclidean(a, b) / 2.0).clamp(-1.0, 1.0).asin()
}

/// Componentwise sum of `points`, then normalize.
///
/// Falls back to the first input (normalized) on an exact zero-sum, and
/// to the canonical pole on empty input.
#[must_use]
pub fn centroid(points: &[Vec4]) -> Vec4 {
    let Some(first) = points.first() else {
        return POLE;
    };
    let mut sum = [0.0; 4];
    for p in points {
        sum[0] += p[0];
        sum[1] += p[1];
        sum[2] += p[2];
        sum[3] += p[3];
    }
    if norm(sum) < NORM_EPSILON {
        return normalize(*first);
    }
    normalize(sum)
}

/// Upper bound on the geodesic range, exposed for callers that need to
/// validate results without re-deriving π.
pub const GEODESIC_MAX: f64 = PI;
