//! Sensor models used to attach uncertainty to 3D samples.
//!
//! A depth camera measures a pixel `(u, v)` and a depth `d`. Both are noisy;
//! the resulting 3D point covariance is obtained by propagating the
//! measurement noise through the back-projection Jacobian:
//!
//! `cov(p) = J(p) · diag(s_px^2, s_px^2, s_d(z)^2) · J(p)^T`
//!
//! Parameter structs are serde-serialisable so they can live in JSON
//! configuration next to the extraction thresholds.

mod depth_noise;
mod intrinsics;

pub use depth_noise::*;
pub use intrinsics::*;
