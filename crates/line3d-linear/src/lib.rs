//! Closed-form 3D line estimation.
//!
//! - [`fit_line_svd`]: principal direction of a point set,
//! - [`verify_line_support`]: rejects lines whose inliers bunch up at one end,
//! - [`ransac_line`] / [`extract_line`]: robust extraction over any
//!   [`line3d_core::LinePoint`], followed by the iterative [`refit_line`].

mod extract;
mod fit;
mod refit;
mod verify;

pub use extract::*;
pub use fit::*;
pub use refit::*;
pub use verify::*;
