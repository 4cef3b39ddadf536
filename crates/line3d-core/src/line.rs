//! Line segment results.
//!
//! A [`Line3d`] is what the extraction pipeline hands to downstream mapping
//! code: two endpoints bounding the observed support, the inliers that
//! support it, and (after maximum-likelihood refinement) the covariance of
//! the endpoints.

use serde::{Deserialize, Serialize};

use crate::{Mat3, Mat6, PointError, Pt3, Real, UncertainPoint3, Vec3};

/// A 3D segment given by its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment3 {
    /// First endpoint.
    pub a: Pt3,
    /// Second endpoint.
    pub b: Pt3,
}

impl Segment3 {
    pub fn new(a: Pt3, b: Pt3) -> Self {
        Self { a, b }
    }

    /// Unnormalised direction `b - a`.
    pub fn direction(&self) -> Vec3 {
        self.b - self.a
    }

    pub fn length(&self) -> Real {
        self.direction().norm()
    }
}

/// Posterior covariance of the two endpoints of a refined line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndpointCovariance {
    /// Covariance of endpoint `a` (top-left 3×3 block of `joint`).
    pub a: Mat3,
    /// Covariance of endpoint `b` (bottom-right 3×3 block of `joint`).
    pub b: Mat3,
    /// Full 6×6 covariance of `[a; b]`.
    pub joint: Mat6,
}

impl EndpointCovariance {
    /// Split a 6×6 joint covariance into endpoint blocks.
    pub fn from_joint(joint: Mat6) -> Self {
        Self {
            a: joint.fixed_view::<3, 3>(0, 0).into_owned(),
            b: joint.fixed_view::<3, 3>(3, 3).into_owned(),
            joint,
        }
    }
}

/// A (possibly empty) 3D line with its supporting inliers.
///
/// An empty line (`segment == None`) is the "no line found" outcome; it is a
/// normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line3d<P> {
    /// Endpoints, `None` when no line was found.
    pub segment: Option<Segment3>,
    /// Owned copies of the inlier points.
    pub inliers: Vec<P>,
    /// Indices of the inliers in the caller's point set.
    pub inlier_indices: Vec<usize>,
    /// Endpoint covariance, only present after MLE refinement.
    pub covariance: Option<EndpointCovariance>,
}

impl<P> Default for Line3d<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> Line3d<P> {
    /// The "no line found" result.
    pub fn empty() -> Self {
        Self {
            segment: None,
            inliers: Vec::new(),
            inlier_indices: Vec::new(),
            covariance: None,
        }
    }

    /// Build an unrefined line from its endpoints and inliers.
    pub fn new(segment: Segment3, inliers: Vec<P>, inlier_indices: Vec<usize>) -> Self {
        debug_assert_eq!(inliers.len(), inlier_indices.len());
        Self {
            segment: Some(segment),
            inliers,
            inlier_indices,
            covariance: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_none()
    }

    /// Number of inliers.
    pub fn len(&self) -> usize {
        self.inliers.len()
    }

    pub fn is_refined(&self) -> bool {
        self.covariance.is_some()
    }

    /// Endpoints as uncertain points, available once the covariance is known.
    pub fn endpoint_points(&self) -> Option<Result<(UncertainPoint3, UncertainPoint3), PointError>> {
        let segment = self.segment?;
        let cov = self.covariance?;
        Some(
            UncertainPoint3::new(segment.a, cov.a)
                .and_then(|a| UncertainPoint3::new(segment.b, cov.b).map(|b| (a, b))),
        )
    }
}
