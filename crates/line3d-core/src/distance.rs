//! Point-to-line distances for lines given by two points.
//!
//! Two metrics are supported:
//!
//! - Euclidean distance for plain positions,
//! - Mahalanobis distance for [`UncertainPoint3`] samples.
//!
//! The Mahalanobis path never inverts a covariance. Both line points are
//! mapped into the sample's whitened frame with `W`; the residual of the
//! Euclidean closest-point problem there is the Mahalanobis residual, and
//! its norm the Mahalanobis distance.
//!
//! [`LinePoint`] abstracts over the metric so the extraction code is written
//! once for both kinds of input.

use serde::{Deserialize, Serialize};

use crate::{Pt3, Real, UncertainPoint3, Vec3, EPS};

/// Distance metric used to classify a point against a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Plain Euclidean distance (metres).
    Euclidean,
    /// Mahalanobis distance under the point's own covariance (unitless).
    Mahalanobis,
}

/// Euclidean distance from `x` to the infinite line through `a` and `b`.
///
/// Returns `None` when `a` and `b` coincide.
pub fn point_line_distance(x: &Pt3, a: &Pt3, b: &Pt3) -> Option<Real> {
    let ab = b - a;
    let len = ab.norm();
    if len < EPS {
        return None;
    }
    let ax = x - a;
    let along = ax.dot(&ab) / len;
    Some((ax.norm_squared() - along * along).abs().sqrt())
}

/// Whitened endpoints `(qa, qb)` of the line `(a, b)` in the local frame of `p`.
#[inline]
fn whitened_line(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> (Vec3, Vec3) {
    (p.whiten(&(a - p.position())), p.whiten(&(b - p.position())))
}

/// Closest-point ratio `t` on the whitened line `qa + t (qb - qa)` to the origin.
#[inline]
fn whitened_ratio(qa: &Vec3, qb: &Vec3) -> Option<Real> {
    let d = qb - qa;
    let dd = d.norm_squared();
    if !(dd > 0.0) || !dd.is_finite() {
        return None;
    }
    Some(-qa.dot(&d) / dd)
}

/// Mahalanobis residual vector between the random point `p` and the line `(a, b)`.
///
/// The vector is expressed in the whitened frame of `p`; it is the offset of
/// the closest line point from `p` after whitening. Returns `None` when the
/// line is degenerate.
pub fn mahalanobis_vector(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> Option<Vec3> {
    let (qa, qb) = whitened_line(p, a, b);
    let t = whitened_ratio(&qa, &qb)?;
    Some(qa + (qb - qa) * t)
}

/// Mahalanobis distance between the random point `p` and the line `(a, b)`.
pub fn mahalanobis_distance(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> Option<Real> {
    mahalanobis_vector(p, a, b).map(|v| v.norm())
}

/// Ratio `t` such that `a + t (b - a)` is the Mahalanobis-closest line point to `p`.
///
/// Whitening is linear, so the same ratio parametrises the closest point in
/// the world frame.
pub fn closest_ratio_mahalanobis(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> Option<Real> {
    let (qa, qb) = whitened_line(p, a, b);
    whitened_ratio(&qa, &qb)
}

/// The line point closest to `p` under `p`'s Mahalanobis metric, in world frame.
pub fn closest_point_mahalanobis(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> Option<Pt3> {
    let v = mahalanobis_vector(p, a, b)?;
    Some(p.position() + p.unwhiten(&v))
}

/// A datum that can be classified against a line given by two points.
pub trait LinePoint: Clone {
    /// Metric used by [`LinePoint::line_distance`].
    const METRIC: DistanceMetric;

    /// Position of the datum in world coordinates.
    fn position(&self) -> &Pt3;

    /// Distance to the line through `a` and `b`.
    ///
    /// Degenerate lines yield `Real::INFINITY`, so the datum is never an inlier.
    fn line_distance(&self, a: &Pt3, b: &Pt3) -> Real;
}

impl LinePoint for Pt3 {
    const METRIC: DistanceMetric = DistanceMetric::Euclidean;

    fn position(&self) -> &Pt3 {
        self
    }

    fn line_distance(&self, a: &Pt3, b: &Pt3) -> Real {
        point_line_distance(self, a, b).unwrap_or(Real::INFINITY)
    }
}

impl LinePoint for UncertainPoint3 {
    const METRIC: DistanceMetric = DistanceMetric::Mahalanobis;

    fn position(&self) -> &Pt3 {
        UncertainPoint3::position(self)
    }

    fn line_distance(&self, a: &Pt3, b: &Pt3) -> Real {
        mahalanobis_distance(self, a, b).unwrap_or(Real::INFINITY)
    }
}
