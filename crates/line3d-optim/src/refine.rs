//! MLE refinement of an extracted line.
//!
//! Runs Levenberg-Marquardt on [`LineMleProblem`] starting from the extracted
//! endpoints and attaches the posterior endpoint covariance to the line.

use line3d_core::{stack_points, Line3d, Real, Segment3, UncertainPoint3};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::backend_lm::LmBackend;
use crate::covariance::posterior_covariance;
use crate::problems::line_mle::{pack, unpack, LineMleProblem};
use crate::{NllsSolverBackend, SolveOptions};

/// Options for [`refine_line_mle`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MleOptions {
    pub solve: SolveOptions,
}

impl Default for MleOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions {
                max_iters: 200,
                ftol: 1e-15,
                gtol: 1e-10,
                xtol: 1e-20,
                min_error: 1e-20,
            },
        }
    }
}

/// Outcome class of a refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MleStatus {
    Converged,
    /// The solver stopped early; the line holds its last estimate.
    NotConverged,
    /// Fewer than two usable inliers; the line was left untouched.
    InsufficientData,
}

/// Diagnostics of [`refine_line_mle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MleReport {
    pub status: MleStatus,
    /// Residual evaluations spent by the solver.
    pub iterations: usize,
    /// `0.5 * |r|²` at the extracted endpoints.
    pub initial_cost: Real,
    /// `0.5 * |r|²` at the returned endpoints.
    pub final_cost: Real,
    /// Whether the line now carries an endpoint covariance.
    pub covariance_available: bool,
}

impl MleReport {
    fn insufficient() -> Self {
        Self {
            status: MleStatus::InsufficientData,
            iterations: 0,
            initial_cost: 0.0,
            final_cost: 0.0,
            covariance_available: false,
        }
    }
}

/// Refine the endpoints of `line` by maximum likelihood.
///
/// On return the segment holds the refined endpoints and `covariance` the
/// posterior endpoint covariance (or `None` when it is not computable).
pub fn refine_line_mle(line: &mut Line3d<UncertainPoint3>, opts: &MleOptions) -> MleReport {
    let Some(segment) = line.segment else {
        return MleReport::insufficient();
    };
    let Some(problem) = LineMleProblem::new(&line.inliers, &segment) else {
        debug!(
            "refine_line_mle: {} inliers do not define two anchors",
            line.inliers.len()
        );
        return MleReport::insufficient();
    };
    let anchors = problem.anchors();

    let x0 = pack(&segment.a, &segment.b);
    let (x, solve) = LmBackend.solve(&problem, x0, &opts.solve);

    let finite = x.iter().all(|v| v.is_finite());
    let (a, b) = if finite { unpack(&x) } else { (segment.a, segment.b) };
    let converged = solve.converged && finite;
    if !converged {
        warn!(
            "refine_line_mle: not converged after {} evaluations (cost {:.3e} -> {:.3e})",
            solve.iterations, solve.initial_cost, solve.final_cost
        );
    }

    let covariance = posterior_covariance(&line.inliers, anchors, &stack_points(&a, &b));
    let covariance_available = covariance.is_some();
    if !covariance_available {
        warn!("refine_line_mle: endpoint covariance not available");
    }

    line.segment = Some(Segment3::new(a, b));
    line.covariance = covariance;

    MleReport {
        status: if converged {
            MleStatus::Converged
        } else {
            MleStatus::NotConverged
        },
        iterations: solve.iterations,
        initial_cost: solve.initial_cost,
        final_cost: if finite { solve.final_cost } else { solve.initial_cost },
        covariance_available,
    }
}
