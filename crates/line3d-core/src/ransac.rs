//! Hypothesise-and-verify consensus search over an arbitrary [`Estimator`].
//!
//! [`ransac`] seeds its own generator from [`RansacOptions::seed`];
//! [`ransac_with_rng`] draws from a generator owned by the caller.
//!
//! The loop does not panic on failure: when no consensus is found the
//! returned [`RansacResult`] has `success == false` and `model == None`.
//!
//! A candidate replaces the current best only when its consensus set is
//! strictly larger **and** it passes [`Estimator::verify`]. A larger but
//! implausible consensus set therefore never displaces a smaller verified
//! one, and ties keep the earlier candidate.

use log::trace;
use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::Real;

/// Tunables of the consensus loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacOptions {
    /// Maximum number of iterations, degenerate draws included.
    pub max_iters: usize,
    /// Inlier residual threshold; a datum is an inlier when `residual < thresh`.
    pub thresh: Real,
    /// Smallest consensus set that may become the best candidate.
    pub min_inliers: usize,
    /// Stop early once the best consensus set exceeds this fraction of the data.
    pub stop_inlier_ratio: Option<Real>,
    /// Seed for the generator created by [`ransac`].
    pub seed: u64,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 100,
            thresh: 1.0,
            min_inliers: 2,
            stop_inlier_ratio: None,
            seed: 0,
        }
    }
}

/// Best verified candidate of a consensus search.
///
/// `model` is `None` and `inliers` is empty unless `success` is set.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// Whether a verified consensus set was found.
    pub success: bool,
    /// Hypothesis with the largest verified consensus set.
    pub model: Option<M>,
    /// Indices of inlier data points, in input order.
    pub inliers: Vec<usize>,
    /// RMS of the inlier residuals.
    pub inlier_rms: Real,
    /// Iterations spent, degenerate draws included.
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            success: false,
            model: None,
            inliers: Vec::new(),
            inlier_rms: Real::INFINITY,
            iters: 0,
        }
    }
}

/// Model hypothesis, scoring and plausibility hooks for [`ransac`].
///
/// Methods take `&self` so an estimator can carry its own configuration.
pub trait Estimator {
    type Datum;
    type Model;

    /// Size of a minimal sample.
    const MIN_SAMPLES: usize;

    /// Hypothesis from the minimal sample at `sample_indices`, or `None`.
    fn fit(&self, data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Non-negative score of `datum` against `model`, compared with
    /// [`RansacOptions::thresh`].
    fn residual(&self, model: &Self::Model, datum: &Self::Datum) -> Real;

    /// Reject a draw before fitting. No draw is degenerate by default.
    fn is_degenerate(&self, _data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Veto a candidate that would replace the current best.
    fn verify(&self, _data: &[Self::Datum], _model: &Self::Model, _inliers: &[usize]) -> bool {
        true
    }
}

fn rms(vals: &[Real]) -> Real {
    match vals.len() {
        0 => Real::INFINITY,
        n => (vals.iter().map(|v| v * v).sum::<Real>() / n as Real).sqrt(),
    }
}

/// Run RANSAC with a generator seeded from `opts.seed`.
///
/// Two calls with the same data and options return the same result.
pub fn ransac<E: Estimator>(
    estimator: &E,
    data: &[E::Datum],
    opts: &RansacOptions,
) -> RansacResult<E::Model> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    ransac_with_rng(estimator, data, opts, &mut rng)
}

/// Consensus search drawing samples from `rng`.
///
/// Returns a [`RansacResult`] with `success == false` when there is
/// insufficient data or no verified consensus set within the iteration
/// budget.
pub fn ransac_with_rng<E, R>(
    estimator: &E,
    data: &[E::Datum],
    opts: &RansacOptions,
    rng: &mut R,
) -> RansacResult<E::Model>
where
    E: Estimator,
    R: Rng + ?Sized,
{
    let mut best = RansacResult::<E::Model>::default();
    let n = data.len();
    if E::MIN_SAMPLES == 0 || n < E::MIN_SAMPLES {
        return best;
    }

    let indices: Vec<usize> = (0..n).collect();
    let mut sample = Vec::with_capacity(E::MIN_SAMPLES);
    let mut inliers = Vec::with_capacity(n);
    let mut residuals = Vec::with_capacity(n);

    let mut iters = 0;
    while iters < opts.max_iters {
        iters += 1;
        // distinct indices, no replacement
        sample.clear();
        sample.extend(indices.choose_multiple(rng, E::MIN_SAMPLES).copied());

        if estimator.is_degenerate(data, &sample) {
            continue;
        }
        let Some(model) = estimator.fit(data, &sample) else {
            continue;
        };

        inliers.clear();
        residuals.clear();
        for (i, r) in data.iter().map(|d| estimator.residual(&model, d)).enumerate() {
            if r < opts.thresh {
                inliers.push(i);
                residuals.push(r);
            }
        }

        if inliers.len() < opts.min_inliers || inliers.len() <= best.inliers.len() {
            continue;
        }

        if !estimator.verify(data, &model, &inliers) {
            trace!(
                "ransac: candidate with {} inliers rejected by verification",
                inliers.len()
            );
            continue;
        }

        best.success = true;
        best.model = Some(model);
        best.inliers.clone_from(&inliers);
        best.inlier_rms = rms(&residuals);

        if let Some(ratio) = opts.stop_inlier_ratio {
            if best.inliers.len() as Real > ratio * n as Real {
                break;
            }
        }
    }

    best.iters = iters;
    best
}
