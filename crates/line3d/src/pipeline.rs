//! End-to-end extraction: RANSAC, iterative refit and MLE refinement.

use line3d_core::synthetic::noise::derive_seed;
use line3d_core::{
    DepthNoiseModel, Line3d, LinePoint, PinholeIntrinsics, PointError, Pt3, UncertainPoint3,
};
use line3d_linear::{extract_line_seeded, ExtractOptions, ExtractedLine, Refit};
use line3d_optim::{refine_line_mle, MleReport};
use log::debug;

use crate::LineExtractionConfig;

/// A refined line with the diagnostics of every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedLine {
    /// Refined endpoints, inliers and endpoint covariance.
    pub line: Line3d<UncertainPoint3>,
    /// RANSAC iterations performed.
    pub ransac_iters: usize,
    /// Size of the RANSAC consensus set before refitting.
    pub ransac_inliers: usize,
    /// Refit outcome, `None` when no line was found.
    pub refit: Option<Refit>,
    /// Outcome of the maximum-likelihood stage.
    pub mle: MleReport,
}

/// Extract the dominant line, seeding the sampler with `config.extract.seed`.
///
/// Plain [`Pt3`] input is classified by Euclidean distance and
/// [`UncertainPoint3`] input by Mahalanobis distance.
pub fn extract_line<P: LinePoint>(points: &[P], config: &LineExtractionConfig) -> ExtractedLine<P> {
    extract_line_seeded(points, &config.extract)
}

/// Extract a line from uncertain points and refine it by maximum likelihood.
///
/// When no line is found the MLE stage reports
/// [`MleStatus::InsufficientData`](line3d_optim::MleStatus::InsufficientData).
pub fn extract_and_refine(points: &[UncertainPoint3], config: &LineExtractionConfig) -> RefinedLine {
    refine(extract_line_seeded(points, &config.extract), config)
}

fn refine(extracted: ExtractedLine<UncertainPoint3>, config: &LineExtractionConfig) -> RefinedLine {
    let ExtractedLine {
        mut line,
        ransac_iters,
        ransac_inliers,
        refit,
    } = extracted;
    let mle = refine_line_mle(&mut line, &config.mle);
    debug!(
        "extract_and_refine: {} inliers, mle {:?} cost {:.3e} -> {:.3e}",
        line.len(),
        mle.status,
        mle.initial_cost,
        mle.final_cost
    );
    RefinedLine {
        line,
        ransac_iters,
        ransac_inliers,
        refit,
        mle,
    }
}

/// Options for request `index` of a batch: the configured seed mixed with the index.
fn request_options(config: &LineExtractionConfig, index: usize) -> ExtractOptions {
    ExtractOptions {
        seed: derive_seed(config.extract.seed, index),
        ..config.extract.clone()
    }
}

/// Extract one line per request.
///
/// Requests are independent and run in parallel with the `parallel` feature.
/// Results are in request order and do not depend on scheduling.
pub fn extract_many<P, S>(requests: &[S], config: &LineExtractionConfig) -> Vec<ExtractedLine<P>>
where
    P: LinePoint + Send + Sync,
    S: AsRef<[P]> + Sync,
{
    map_requests(requests, |i, pts| {
        extract_line_seeded(pts, &request_options(config, i))
    })
}

/// [`extract_and_refine`] over independent requests.
pub fn extract_and_refine_many<S>(requests: &[S], config: &LineExtractionConfig) -> Vec<RefinedLine>
where
    S: AsRef<[UncertainPoint3]> + Sync,
{
    map_requests(requests, |i, pts| {
        refine(extract_line_seeded(pts, &request_options(config, i)), config)
    })
}

#[cfg(feature = "parallel")]
fn map_requests<P, S, T, F>(requests: &[S], f: F) -> Vec<T>
where
    P: Sync,
    S: AsRef<[P]> + Sync,
    T: Send,
    F: Fn(usize, &[P]) -> T + Sync + Send,
{
    use rayon::prelude::*;

    requests
        .par_iter()
        .enumerate()
        .map(|(i, r)| f(i, r.as_ref()))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn map_requests<P, S, T, F>(requests: &[S], f: F) -> Vec<T>
where
    S: AsRef<[P]>,
    F: Fn(usize, &[P]) -> T,
{
    requests
        .iter()
        .enumerate()
        .map(|(i, r)| f(i, r.as_ref()))
        .collect()
}

/// Attach depth-sensor covariances to camera-frame positions.
///
/// # Errors
///
/// Fails when a position yields a covariance that is not positive definite,
/// for instance a point at zero depth.
pub fn uncertain_points(
    positions: &[Pt3],
    intrinsics: &PinholeIntrinsics,
    noise: &DepthNoiseModel,
) -> Result<Vec<UncertainPoint3>, PointError> {
    positions
        .iter()
        .map(|p| UncertainPoint3::from_depth_sensor(*p, intrinsics, noise))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use line3d_core::synthetic::line;
    use line3d_optim::MleStatus;

    fn axis(n: usize) -> Vec<Pt3> {
        line::segment_points(&Pt3::new(0.0, 0.0, 1.0), &Pt3::new(0.0, 0.2, 2.0), n)
    }

    #[test]
    fn request_seeds_differ_but_are_stable() {
        let config = LineExtractionConfig::default();
        let a = request_options(&config, 0).seed;
        let b = request_options(&config, 1).seed;
        assert_ne!(a, b);
        assert_eq!(a, request_options(&config, 0).seed);
    }

    #[test]
    fn batch_matches_sequential_calls() {
        let config = LineExtractionConfig::default();
        let mut noisy = axis(15);
        noisy.push(Pt3::new(0.5, 0.0, 1.5));
        let requests = vec![axis(10), noisy, vec![Pt3::new(0.0, 0.0, 1.0)]];

        let batch = extract_many(&requests, &config);
        assert_eq!(batch.len(), 3);
        for (i, (pts, got)) in requests.iter().zip(&batch).enumerate() {
            let expected = extract_line_seeded(pts, &request_options(&config, i));
            assert_eq!(got, &expected, "request {i}");
        }
        assert!(batch[2].line.is_empty());
    }

    #[test]
    fn empty_extraction_reports_insufficient_data() {
        let config = LineExtractionConfig::default();
        let p = UncertainPoint3::isotropic(Pt3::new(0.0, 0.0, 1.0), 1e-3).unwrap();
        let out = extract_and_refine(&[p], &config);
        assert!(out.line.is_empty());
        assert_eq!(out.mle.status, MleStatus::InsufficientData);
    }

    #[test]
    fn zero_depth_points_are_rejected() {
        let res = uncertain_points(
            &[Pt3::new(0.0, 0.0, 0.0)],
            &PinholeIntrinsics::default(),
            &DepthNoiseModel::default(),
        );
        assert!(res.is_err());
    }
}
