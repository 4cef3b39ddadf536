use serde::{Deserialize, Serialize};

use crate::{Mat3, Pt3, Real};

/// Pinhole intrinsics of the depth camera that produced the 3D samples.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeIntrinsics {
    /// Focal length in pixels along X.
    pub fx: Real,
    /// Focal length in pixels along Y.
    pub fy: Real,
    /// Principal point X coordinate in pixels.
    pub cx: Real,
    /// Principal point Y coordinate in pixels.
    pub cy: Real,
}

impl Default for PinholeIntrinsics {
    /// Nominal 640×480 structured-light sensor.
    fn default() -> Self {
        Self {
            fx: 525.0,
            fy: 525.0,
            cx: 319.5,
            cy: 239.5,
        }
    }
}

impl PinholeIntrinsics {
    /// Jacobian of the back-projection `(u, v, d) -> (x, y, z)` evaluated at
    /// the camera-frame point `p`.
    ///
    /// With `x = (u - cx) d / fx`, `y = (v - cy) d / fy`, `z = d`:
    ///
    /// ```text
    /// J = [ z/fx   0    x/z ]
    ///     [  0    z/fy  y/z ]
    ///     [  0     0     1  ]
    /// ```
    pub fn backprojection_jacobian(&self, p: &Pt3) -> Mat3 {
        Mat3::new(
            p.z / self.fx,
            0.0,
            p.x / p.z,
            0.0,
            p.z / self.fy,
            p.y / p.z,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Back-project a pixel with metric depth into the camera frame.
    pub fn backproject(&self, u: Real, v: Real, depth: Real) -> Pt3 {
        Pt3::new(
            (u - self.cx) * depth / self.fx,
            (v - self.cy) * depth / self.fy,
            depth,
        )
    }

    /// Project a camera-frame point to pixel coordinates, `None` behind the camera.
    pub fn project(&self, p: &Pt3) -> Option<(Real, Real)> {
        if p.z <= 0.0 {
            return None;
        }
        Some((
            self.fx * p.x / p.z + self.cx,
            self.fy * p.y / p.z + self.cy,
        ))
    }
}
