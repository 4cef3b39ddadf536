//! Robust line extraction: RANSAC on point pairs followed by an SVD refit.
//!
//! The same code path serves plain positions (Euclidean distance) and
//! uncertain points (Mahalanobis distance); the metric comes from
//! [`LinePoint::METRIC`].

use std::marker::PhantomData;

use line3d_core::{
    ransac_with_rng, DistanceMetric, Estimator, Line3d, LinePoint, RansacOptions, Real, Segment3,
    EPS,
};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::refit::{refit_line, Refit};
use crate::verify::{verify_inlier_support, VerifyOptions};

/// Options for [`extract_line`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Inlier threshold in metres for plain positions.
    pub euclidean_threshold: Real,
    /// Inlier threshold on the Mahalanobis distance for uncertain points.
    pub mahalanobis_threshold: Real,
    /// Upper bound on RANSAC draws, further capped by the number of point pairs.
    pub max_ransac_iters: usize,
    /// Mahalanobis only: stop once the best set exceeds this fraction of the points.
    pub early_exit_inlier_ratio: Real,
    /// Seed for [`extract_line_seeded`].
    pub seed: u64,
    /// Coverage test applied to each candidate consensus set.
    pub verify: VerifyOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            euclidean_threshold: 0.02,
            mahalanobis_threshold: 1.5,
            max_ransac_iters: 100,
            early_exit_inlier_ratio: 0.9,
            seed: 0x5EED_11E3,
            verify: VerifyOptions::default(),
        }
    }
}

impl ExtractOptions {
    /// Inlier threshold for `metric`.
    pub fn threshold(&self, metric: DistanceMetric) -> Real {
        match metric {
            DistanceMetric::Euclidean => self.euclidean_threshold,
            DistanceMetric::Mahalanobis => self.mahalanobis_threshold,
        }
    }

    /// RANSAC engine options for `n_points` data of the given metric.
    pub fn ransac_options(&self, metric: DistanceMetric, n_points: usize) -> RansacOptions {
        RansacOptions {
            max_iters: max_ransac_iterations(self.max_ransac_iters, n_points),
            thresh: self.threshold(metric),
            min_inliers: LINE_MIN_SAMPLES,
            stop_inlier_ratio: match metric {
                DistanceMetric::Euclidean => None,
                DistanceMetric::Mahalanobis => Some(self.early_exit_inlier_ratio),
            },
            seed: self.seed,
        }
    }
}

const LINE_MIN_SAMPLES: usize = 2;

/// Iteration budget: `min(cap, n (n - 1) / 2)`.
///
/// Sampling is with replacement across iterations, so the pair count only
/// bounds the budget; it does not guarantee every pair is visited.
pub fn max_ransac_iterations(cap: usize, n_points: usize) -> usize {
    let pairs = n_points.saturating_mul(n_points.saturating_sub(1)) / 2;
    cap.min(pairs)
}

/// RANSAC estimator proposing the line through two sampled points.
#[derive(Debug, Clone)]
pub struct LineEstimator<P> {
    verify: VerifyOptions,
    _marker: PhantomData<fn() -> P>,
}

impl<P> LineEstimator<P> {
    pub fn new(verify: VerifyOptions) -> Self {
        Self {
            verify,
            _marker: PhantomData,
        }
    }
}

impl<P: LinePoint> Estimator for LineEstimator<P> {
    type Datum = P;
    type Model = Segment3;

    const MIN_SAMPLES: usize = LINE_MIN_SAMPLES;

    fn fit(&self, data: &[P], sample_indices: &[usize]) -> Option<Segment3> {
        let a = data.get(sample_indices[0])?.position();
        let b = data.get(sample_indices[1])?.position();
        Some(Segment3::new(*a, *b))
    }

    fn residual(&self, model: &Segment3, datum: &P) -> Real {
        datum.line_distance(&model.a, &model.b)
    }

    fn is_degenerate(&self, data: &[P], sample_indices: &[usize]) -> bool {
        let a = data[sample_indices[0]].position();
        let b = data[sample_indices[1]].position();
        (b - a).norm() < EPS
    }

    fn verify(&self, data: &[P], model: &Segment3, inliers: &[usize]) -> bool {
        verify_inlier_support(data, inliers, &model.a, &model.b, &self.verify)
    }
}

/// Best verified RANSAC hypothesis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RansacLine {
    /// The sampled point pair, `None` when no hypothesis was accepted.
    pub segment: Option<Segment3>,
    /// Indices of the consensus set, ascending.
    pub inliers: Vec<usize>,
    /// Iterations performed.
    pub iters: usize,
    /// Effective iteration budget.
    pub max_iters: usize,
}

/// Find the largest verified consensus set of a line through two sampled points.
pub fn ransac_line<P, R>(points: &[P], opts: &ExtractOptions, rng: &mut R) -> RansacLine
where
    P: LinePoint,
    R: Rng + ?Sized,
{
    let ransac_opts = opts.ransac_options(P::METRIC, points.len());
    let estimator = LineEstimator::<P>::new(opts.verify);
    let res = ransac_with_rng(&estimator, points, &ransac_opts, rng);

    RansacLine {
        segment: res.model.filter(|_| res.success),
        inliers: res.inliers,
        iters: res.iters,
        max_iters: ransac_opts.max_iters,
    }
}

/// An extracted line together with per-stage diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLine<P> {
    /// Endpoints and inliers; empty when no line was found.
    pub line: Line3d<P>,
    /// RANSAC iterations performed.
    pub ransac_iters: usize,
    /// Size of the RANSAC consensus set before refitting.
    pub ransac_inliers: usize,
    /// Refit outcome, `None` when RANSAC found nothing.
    pub refit: Option<Refit>,
}

impl<P> ExtractedLine<P> {
    fn empty(ransac_iters: usize) -> Self {
        Self {
            line: Line3d::empty(),
            ransac_iters,
            ransac_inliers: 0,
            refit: None,
        }
    }
}

/// Extract the dominant line from `points`.
///
/// Runs [`ransac_line`], grows the consensus set with [`refit_line`] and
/// takes the inliers with extremal projections as endpoints. Fewer than two
/// points, or no verified hypothesis, yield an empty line.
pub fn extract_line<P, R>(points: &[P], opts: &ExtractOptions, rng: &mut R) -> ExtractedLine<P>
where
    P: LinePoint,
    R: Rng + ?Sized,
{
    let ransac = ransac_line(points, opts, rng);
    let Some(seed_line) = ransac.segment else {
        debug!(
            "extract_line: no line among {} points after {} iterations",
            points.len(),
            ransac.iters
        );
        return ExtractedLine::empty(ransac.iters);
    };

    let refit = refit_line(points, &ransac.inliers, &seed_line, opts.threshold(P::METRIC));
    let Some(segment) = refit.endpoints(points) else {
        return ExtractedLine::empty(ransac.iters);
    };

    debug!(
        "extract_line: {} points, ransac {} inliers in {}/{} iterations, refit {:?}",
        points.len(),
        ransac.inliers.len(),
        ransac.iters,
        ransac.max_iters,
        refit.history
    );

    let inliers: Vec<P> = refit.inliers.iter().map(|&i| points[i].clone()).collect();
    ExtractedLine {
        line: Line3d::new(segment, inliers, refit.inliers.clone()),
        ransac_iters: ransac.iters,
        ransac_inliers: ransac.inliers.len(),
        refit: Some(refit),
    }
}

/// [`extract_line`] with a generator seeded from `opts.seed`.
pub fn extract_line_seeded<P: LinePoint>(points: &[P], opts: &ExtractOptions) -> ExtractedLine<P> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    extract_line(points, opts, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use line3d_core::synthetic::line;
    use line3d_core::{Mat3, Pt3, UncertainPoint3};

    fn axis_points(n: usize) -> Vec<Pt3> {
        line::segment_points(&Pt3::new(0.0, 0.0, 0.0), &Pt3::new(0.0, 0.0, 1.0), n)
    }

    fn same_pair(seg: &Segment3, p: &Pt3, q: &Pt3) -> bool {
        (seg.a == *p && seg.b == *q) || (seg.a == *q && seg.b == *p)
    }

    #[test]
    fn iteration_budget_is_capped_by_pair_count() {
        assert_eq!(max_ransac_iterations(100, 0), 0);
        assert_eq!(max_ransac_iterations(100, 1), 0);
        assert_eq!(max_ransac_iterations(100, 2), 1);
        assert_eq!(max_ransac_iterations(100, 4), 6);
        assert_eq!(max_ransac_iterations(100, 30), 100);

        let pts = axis_points(4);
        let res = ransac_line(&pts, &ExtractOptions::default(), &mut StdRng::seed_from_u64(1));
        assert!(res.iters <= 6, "iters={}", res.iters);
        assert_eq!(res.max_iters, 6);
    }

    #[test]
    fn exact_line_keeps_every_point() {
        let pts = axis_points(15);
        let out = extract_line_seeded(&pts, &ExtractOptions::default());
        let seg = out.line.segment.expect("line found");

        assert_eq!(out.line.inlier_indices, (0..15).collect::<Vec<_>>());
        assert_eq!(out.line.inliers, pts);
        assert!(same_pair(&seg, &pts[0], &pts[14]), "segment={seg:?}");
        for p in &pts {
            assert!(p.line_distance(&seg.a, &seg.b) < 1e-12);
        }
    }

    #[test]
    fn two_points_return_the_pair() {
        let p = Pt3::new(0.2, 0.1, 1.5);
        let q = Pt3::new(0.3, 0.1, 1.5);
        let out = extract_line_seeded(&[p, q], &ExtractOptions::default());
        let seg = out.line.segment.expect("line found");
        assert!(same_pair(&seg, &p, &q));
        assert_eq!(out.line.len(), 2);
        assert_eq!(out.ransac_iters, 1);

        let up = UncertainPoint3::isotropic(p, 1e-3).expect("valid sigma");
        let uq = UncertainPoint3::isotropic(q, 1e-3).expect("valid sigma");
        let out = extract_line_seeded(&[up, uq], &ExtractOptions::default());
        let seg = out.line.segment.expect("line found");
        assert!(same_pair(&seg, &p, &q));
    }

    #[test]
    fn too_few_or_coincident_points_give_empty_line() {
        let opts = ExtractOptions::default();
        assert!(extract_line_seeded::<Pt3>(&[], &opts).line.is_empty());
        assert!(extract_line_seeded(&[Pt3::new(1.0, 0.0, 0.0)], &opts).line.is_empty());

        let p = Pt3::new(0.0, 0.0, 2.0);
        let out = extract_line_seeded(&[p; 6], &opts);
        assert!(out.line.is_empty());
        assert!(out.line.inliers.is_empty());
        assert!(out.refit.is_none());
        assert_eq!(out.ransac_iters, 15);
    }

    #[test]
    fn outliers_are_rejected_with_both_metrics() {
        let mut pts = axis_points(12);
        pts.push(Pt3::new(0.4, 0.0, 0.3));
        pts.push(Pt3::new(-0.3, 0.2, 0.8));

        let out = extract_line_seeded(&pts, &ExtractOptions::default());
        assert_eq!(out.line.inlier_indices, (0..12).collect::<Vec<_>>());

        let upts = line::isotropic_points(&pts, 2e-3).expect("valid sigma");
        let out = extract_line_seeded(&upts, &ExtractOptions::default());
        assert_eq!(out.line.inlier_indices, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn anisotropic_covariance_changes_membership() {
        // Points 5 mm off the axis along x; uncertain along x, tight along y.
        let mut positions = axis_points(10);
        positions.push(Pt3::new(0.005, 0.0, 0.5));
        positions.push(Pt3::new(0.0, 0.005, 0.55));
        let cov = Mat3::from_diagonal(&line3d_core::Vec3::new(1e-4, 1e-8, 1e-4));
        let pts: Vec<UncertainPoint3> = positions
            .iter()
            .map(|p| UncertainPoint3::new(*p, cov).expect("SPD"))
            .collect();

        let out = extract_line_seeded(&pts, &ExtractOptions::default());
        let idx = &out.line.inlier_indices;
        assert!(idx.contains(&10), "x offset is within the x uncertainty");
        assert!(!idx.contains(&11), "y offset is far in Mahalanobis terms");
        assert_eq!(idx.len(), 11);
    }

    #[test]
    fn early_exit_only_for_uncertain_points() {
        let pts = axis_points(20);
        let opts = ExtractOptions::default();

        let euclidean = extract_line_seeded(&pts, &opts);
        assert_eq!(euclidean.line.len(), 20);
        assert_eq!(euclidean.ransac_iters, 100);

        let upts = line::isotropic_points(&pts, 1e-3).expect("valid sigma");
        let mahalanobis = extract_line_seeded(&upts, &opts);
        assert_eq!(mahalanobis.line.len(), 20);
        assert_eq!(
            mahalanobis.ransac_iters, 1,
            "full consensus on the first draw should stop the search"
        );
    }

    #[test]
    fn same_seed_same_line() {
        let mut pts = axis_points(20);
        pts.push(Pt3::new(0.5, 0.5, 0.5));
        let opts = ExtractOptions::default();
        let a = extract_line(&pts, &opts, &mut StdRng::seed_from_u64(9));
        let b = extract_line(&pts, &opts, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
