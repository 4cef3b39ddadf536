//! Non-linear refinement of 3D lines built on `levenberg-marquardt`.
//!
//! The crate separates the solver interface ([`NllsProblem`],
//! [`NllsSolverBackend`]) from the line problem so the residual and Jacobian
//! code can be tested without running a solver.
//!
//! - [`problems::line_mle`]: scalar MLE residuals and whitened vector residuals,
//! - [`posterior_covariance`]: Gauss-Newton endpoint covariance,
//! - [`refine_line_mle`]: end-to-end refinement of a [`line3d_core::Line3d`].

mod backend_lm;
mod covariance;
pub mod problems;
mod refine;
mod traits;

pub use backend_lm::LmBackend;
pub use covariance::posterior_covariance;
pub use problems::line_mle::{LineAnchors, LineMleProblem};
pub use refine::{refine_line_mle, MleOptions, MleReport, MleStatus};
pub use traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
