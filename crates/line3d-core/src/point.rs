//! 3D points with anisotropic Gaussian uncertainty.
//!
//! An [`UncertainPoint3`] stores its covariance together with the symmetric
//! eigendecomposition `Σ = U · diag(λ) · Uᵗ`, computed once at construction.
//! The pre-scaled whitening matrix `W = diag(1/√λ) · Uᵗ` maps offsets from
//! the point into a local frame where the noise is isotropic with unit
//! variance, so Mahalanobis quantities reduce to Euclidean ones there.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DepthNoiseModel, Mat3, PinholeIntrinsics, Pt3, Real, Vec3};

/// Errors raised when building an [`UncertainPoint3`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PointError {
    #[error("covariance is not symmetric positive definite (smallest eigenvalue {min_eigenvalue})")]
    NotPositiveDefinite { min_eigenvalue: Real },

    #[error("covariance contains non-finite entries")]
    NonFinite,
}

/// A 3D sample with a symmetric positive definite covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncertainPointRepr", into = "UncertainPointRepr")]
pub struct UncertainPoint3 {
    position: Pt3,
    covariance: Mat3,
    rotation: Mat3,
    sqrt_eigenvalues: Vec3,
    whitening: Mat3,
}

impl UncertainPoint3 {
    /// Build a point from its position and covariance.
    ///
    /// The covariance is symmetrised before decomposition; an error is
    /// returned when it is not positive definite.
    pub fn new(position: Pt3, covariance: Mat3) -> Result<Self, PointError> {
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(PointError::NonFinite);
        }
        let covariance = (covariance + covariance.transpose()) * 0.5;
        let eigen = covariance.symmetric_eigen();
        let min_eigenvalue = eigen.eigenvalues.min();
        if !(min_eigenvalue > 0.0) {
            return Err(PointError::NotPositiveDefinite { min_eigenvalue });
        }

        let rotation = eigen.eigenvectors;
        let sqrt_eigenvalues = eigen.eigenvalues.map(Real::sqrt);
        let mut whitening = rotation.transpose();
        for (mut row, s) in whitening.row_iter_mut().zip(sqrt_eigenvalues.iter()) {
            row /= *s;
        }

        Ok(Self {
            position,
            covariance,
            rotation,
            sqrt_eigenvalues,
            whitening,
        })
    }

    /// Point with isotropic standard deviation `sigma` on every axis.
    pub fn isotropic(position: Pt3, sigma: Real) -> Result<Self, PointError> {
        Self::new(position, Mat3::identity() * (sigma * sigma))
    }

    /// Point measured by a depth camera, with covariance from the sensor model.
    pub fn from_depth_sensor(
        position: Pt3,
        intrinsics: &PinholeIntrinsics,
        noise: &DepthNoiseModel,
    ) -> Result<Self, PointError> {
        Self::new(position, noise.point_covariance(&position, intrinsics))
    }

    /// Position of the sample.
    pub fn position(&self) -> &Pt3 {
        &self.position
    }

    /// Covariance of the sample.
    pub fn covariance(&self) -> &Mat3 {
        &self.covariance
    }

    /// Orthonormal eigenvector basis `U` (columns) of the covariance.
    pub fn rotation(&self) -> &Mat3 {
        &self.rotation
    }

    /// Per-axis standard deviations `√λ` in the eigenvector basis.
    pub fn sqrt_eigenvalues(&self) -> &Vec3 {
        &self.sqrt_eigenvalues
    }

    /// Whitening matrix `W = diag(1/√λ) · Uᵗ`.
    pub fn whitening(&self) -> &Mat3 {
        &self.whitening
    }

    /// Information matrix `Σ⁻¹ = Wᵗ W`.
    pub fn information(&self) -> Mat3 {
        self.whitening.transpose() * self.whitening
    }

    /// Map a world-frame offset into the whitened local frame.
    #[inline]
    pub fn whiten(&self, v: &Vec3) -> Vec3 {
        self.whitening * v
    }

    /// Map a whitened offset back to a world-frame offset.
    #[inline]
    pub fn unwhiten(&self, w: &Vec3) -> Vec3 {
        self.rotation * w.component_mul(&self.sqrt_eigenvalues)
    }

    /// Squared Mahalanobis distance from this sample to a point `x`.
    pub fn mahalanobis_sq_to(&self, x: &Pt3) -> Real {
        self.whiten(&(x - self.position)).norm_squared()
    }
}

#[derive(Serialize, Deserialize)]
struct UncertainPointRepr {
    position: Pt3,
    covariance: Mat3,
}

impl TryFrom<UncertainPointRepr> for UncertainPoint3 {
    type Error = PointError;

    fn try_from(repr: UncertainPointRepr) -> Result<Self, Self::Error> {
        Self::new(repr.position, repr.covariance)
    }
}

impl From<UncertainPoint3> for UncertainPointRepr {
    fn from(p: UncertainPoint3) -> Self {
        Self {
            position: p.position,
            covariance: p.covariance,
        }
    }
}
