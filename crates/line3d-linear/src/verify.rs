//! Support test for candidate lines.
//!
//! A line proposed from two samples can collect many inliers that all sit
//! near one of its ends. Such a line is unsupported along most of its length
//! and its direction is unreliable. The verifier projects the points onto
//! the line, splits the span between the two extremal projections into
//! equal cells and requires a minimum fraction of cells to be occupied.

use line3d_core::{extremal_indices, project_point_to_line, LinePoint, Pt3, Real, EPS};
use serde::{Deserialize, Serialize};

/// Options for [`verify_line_support`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyOptions {
    /// Number of equal-width cells along the supported span.
    pub num_cells: usize,
    /// A line is accepted when the occupied fraction of cells exceeds this value.
    pub min_support_ratio: Real,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            num_cells: 10,
            min_support_ratio: 0.6,
        }
    }
}

/// Fraction of occupied cells for `positions` along the line `(a, b)`.
///
/// The cell count is `min(num_cells, positions.len())`, so a set of `k`
/// points can occupy every cell. Returns `None` when the line or the
/// projected span is degenerate.
pub fn line_support_ratio(positions: &[&Pt3], a: &Pt3, b: &Pt3, num_cells: usize) -> Option<Real> {
    let dir = b - a;
    if dir.norm() < EPS {
        return None;
    }

    // Extremities of the points along the line direction
    let (imin, imax) = extremal_indices(positions.iter().copied(), a, &dir)?;
    let c = project_point_to_line(positions[imin], a, b);
    let d = project_point_to_line(positions[imax], a, b);
    let cd = d - c;
    let cd_len2 = cd.norm_squared();
    if cd_len2.sqrt() < EPS {
        return None;
    }

    let cells = num_cells.min(positions.len()).max(1);
    let mut counts = vec![0usize; cells];
    for x in positions {
        let lambda = ((*x - c).dot(&cd) / cd_len2).clamp(0.0, 1.0);
        let idx = if lambda >= 1.0 {
            cells - 1
        } else {
            ((lambda * cells as Real).floor() as usize).min(cells - 1)
        };
        counts[idx] += 1;
    }

    let occupied = counts.iter().filter(|&&n| n > 0).count();
    Some(occupied as Real / cells as Real)
}

/// Decide whether `points` support the line `(a, b)` along its length.
pub fn verify_line_support<P: LinePoint>(points: &[P], a: &Pt3, b: &Pt3, opts: &VerifyOptions) -> bool {
    let positions: Vec<&Pt3> = points.iter().map(|p| p.position()).collect();
    accept(&positions, a, b, opts)
}

/// Same as [`verify_line_support`] for the subset `indices` of `data`.
pub fn verify_inlier_support<P: LinePoint>(
    data: &[P],
    indices: &[usize],
    a: &Pt3,
    b: &Pt3,
    opts: &VerifyOptions,
) -> bool {
    let positions: Vec<&Pt3> = indices.iter().map(|&i| data[i].position()).collect();
    accept(&positions, a, b, opts)
}

fn accept(positions: &[&Pt3], a: &Pt3, b: &Pt3, opts: &VerifyOptions) -> bool {
    line_support_ratio(positions, a, b, opts.num_cells)
        .is_some_and(|ratio| ratio > opts.min_support_ratio)
}
