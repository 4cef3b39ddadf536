use line3d_core::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Dense least-squares objective `0.5 * |r(x)|²`.
pub trait NllsProblem {
    /// Length of `x`.
    fn num_params(&self) -> usize;
    /// Length of `r(x)`.
    fn num_residuals(&self) -> usize;

    /// Residuals for the current parameters.
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real>;
    /// Jacobian of [`residuals`](Self::residuals), `num_residuals × num_params`.
    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real>;

    /// Objective value `0.5 * |r(x)|²`.
    fn cost(&self, x: &DVector<Real>) -> Real {
        0.5 * self.residuals(x).norm_squared()
    }
}

/// Stopping criteria shared by solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Iteration cap. [`LmBackend`](crate::LmBackend) turns it into a residual
    /// evaluation cap of `max_iters * (n + 1)`.
    pub max_iters: usize,
    /// Relative cost decrease below which the solve stops.
    pub ftol: Real,
    /// Bound on the cosine between residual and Jacobian columns.
    pub gtol: Real,
    /// Relative step size below which the solve stops.
    pub xtol: Real,
    /// Absolute cost `0.5 * |r|²` below which the problem counts as solved.
    ///
    /// Checked before the solve and on its result; it does not stop the
    /// Levenberg-Marquardt loop early.
    pub min_error: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-10,
            gtol: 1e-10,
            xtol: 1e-10,
            min_error: 0.0,
        }
    }
}

/// Summary of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    /// Residual evaluations performed; zero when the start was already solved.
    pub iterations: usize,
    pub initial_cost: Real,
    pub final_cost: Real,
    pub converged: bool,
}

/// Minimiser for an [`NllsProblem`].
pub trait NllsSolverBackend {
    /// Minimise from `x0`, returning the final parameters with a report.
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        start: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}
