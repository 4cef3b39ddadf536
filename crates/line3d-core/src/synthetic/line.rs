//! Synthetic samples along 3D segments.
//!
//! Points are ordered deterministically from `a` to `b`.

use super::noise::UniformNoise3;
use crate::{PointError, Pt3, Real, UncertainPoint3};

/// `n` evenly spaced points from `a` to `b` (both included).
///
/// `n == 1` yields `a`.
pub fn segment_points(a: &Pt3, b: &Pt3, n: usize) -> Vec<Pt3> {
    let d = b - a;
    let denom = n.saturating_sub(1).max(1) as Real;
    (0..n).map(|i| a + d * (i as Real / denom)).collect()
}

/// Evenly spaced points with deterministic noise orthogonal to the segment.
pub fn noisy_segment_points(a: &Pt3, b: &Pt3, n: usize, noise: &UniformNoise3) -> Vec<Pt3> {
    let d = b - a;
    segment_points(a, b, n)
        .into_iter()
        .enumerate()
        .map(|(i, p)| p + noise.sample_orthogonal(i, &d))
        .collect()
}

/// Wrap positions as uncertain points with isotropic standard deviation `sigma`.
pub fn isotropic_points(points: &[Pt3], sigma: Real) -> Result<Vec<UncertainPoint3>, PointError> {
    points
        .iter()
        .map(|p| UncertainPoint3::isotropic(*p, sigma))
        .collect()
}
