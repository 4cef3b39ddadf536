use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use line3d_core::Real;
use log::debug;
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

/// Adapter exposing an [`NllsProblem`] to `levenberg-marquardt`.
///
/// Non-finite residuals or Jacobians are reported as evaluation failures.
struct LmWrapper<'a, P: NllsProblem> {
    problem: &'a P,
    params: DVector<Real>,
}

impl<P: NllsProblem> LeastSquaresProblem<Real, Dyn, Dyn> for LmWrapper<'_, P> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        let r = self.problem.residuals(&self.params);
        r.iter().all(|v| v.is_finite()).then_some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        let j = self.problem.jacobian(&self.params);
        j.iter().all(|v| v.is_finite()).then_some(j)
    }
}

/// Levenberg-Marquardt backend (MINPACK port from `levenberg-marquardt`).
#[derive(Debug, Default, Clone)]
pub struct LmBackend;

impl NllsSolverBackend for LmBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport) {
        let initial_cost = problem.cost(&x0);
        if initial_cost <= opts.min_error {
            return (
                x0,
                SolveReport {
                    iterations: 0,
                    initial_cost,
                    final_cost: initial_cost,
                    converged: true,
                },
            );
        }

        let lm = LevenbergMarquardt::new()
            .with_ftol(opts.ftol)
            .with_xtol(opts.xtol)
            .with_gtol(opts.gtol)
            .with_patience(opts.max_iters.max(1));

        let (solved, report) = lm.minimize(LmWrapper {
            problem,
            params: x0,
        });
        let final_cost = report.objective_function;
        debug!(
            "lm: {:?} after {} evaluations, cost {:.3e} -> {:.3e}",
            report.termination, report.number_of_evaluations, initial_cost, final_cost
        );

        (
            solved.params,
            SolveReport {
                iterations: report.number_of_evaluations,
                initial_cost,
                final_cost,
                converged: report.termination.was_successful() || final_cost <= opts.min_error,
            },
        )
    }
}
