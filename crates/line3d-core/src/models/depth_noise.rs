use serde::{Deserialize, Serialize};

use crate::{Mat3, PinholeIntrinsics, Pt3, Real};

/// Measurement noise of a depth camera.
///
/// Image sampling noise is isotropic in pixels; depth noise is a fixed
/// quadratic polynomial of the depth, calibrated once offline:
///
/// ```text
/// sigma_d(z) = c2 z^2 + c1 z + c0
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthNoiseModel {
    /// Standard deviation of an image sample point (pixels).
    pub pixel_sigma: Real,
    /// Quadratic coefficient of the depth standard deviation (1/m).
    pub c2: Real,
    /// Linear coefficient of the depth standard deviation.
    pub c1: Real,
    /// Constant term of the depth standard deviation (m).
    pub c0: Real,
}

impl Default for DepthNoiseModel {
    /// Structured-light (Kinect-class) calibration.
    fn default() -> Self {
        Self {
            pixel_sigma: 1.0,
            c2: 2.73e-3,
            c1: 7.4e-4,
            c0: -5.8e-4,
        }
    }
}

impl DepthNoiseModel {
    /// Standard deviation of a depth measurement at depth `z` (metres).
    pub fn depth_sigma(&self, z: Real) -> Real {
        self.c2 * z * z + self.c1 * z + self.c0
    }

    /// Covariance of a back-projected 3D point.
    ///
    /// Pixel and depth noise `diag(s_px^2, s_px^2, s_d(z)^2)` is propagated
    /// through the local back-projection Jacobian of `intrinsics`.
    pub fn point_covariance(&self, p: &Pt3, intrinsics: &PinholeIntrinsics) -> Mat3 {
        let j = intrinsics.backprojection_jacobian(p);
        let s_px2 = self.pixel_sigma * self.pixel_sigma;
        let s_d = self.depth_sigma(p.z);
        let noise = Mat3::from_diagonal(&crate::Vec3::new(s_px2, s_px2, s_d * s_d));
        j * noise * j.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_sigma_grows_with_depth() {
        let noise = DepthNoiseModel::default();
        let s1 = noise.depth_sigma(1.0);
        let s3 = noise.depth_sigma(3.0);
        assert!(s1 > 0.0);
        assert!(s3 > s1);
        assert!((s1 - (2.73e-3 + 7.4e-4 - 5.8e-4)).abs() < 1e-15);
    }

    #[test]
    fn covariance_is_symmetric_and_depth_dominated() {
        let noise = DepthNoiseModel::default();
        let k = PinholeIntrinsics::default();
        let p = Pt3::new(0.0, 0.0, 2.0);
        let cov = noise.point_covariance(&p, &k);

        assert!((cov - cov.transpose()).norm() < 1e-15);
        // On the optical axis the depth direction is decoupled from x/y.
        let sd = noise.depth_sigma(2.0);
        assert!((cov[(2, 2)] - sd * sd).abs() < 1e-15);
        let sx = 2.0 / k.fx;
        assert!((cov[(0, 0)] - sx * sx).abs() < 1e-15);
        assert!(cov[(2, 2)] > cov[(0, 0)]);
    }
}
