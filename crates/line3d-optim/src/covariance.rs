//! Posterior covariance of refined endpoints.

use line3d_core::{split_points, EndpointCovariance, Mat6, UncertainPoint3, Vec6};
use log::trace;

use crate::problems::line_mle::{LineAnchors, LineMleProblem};

/// Endpoint covariance `H⁻¹` with `H = Σ JᵢᵗJᵢ` over whitened vector residuals.
///
/// Returns `None` when a residual is undefined (collapsed line), when `H`
/// is singular, or when its inverse is not finite. The inverse is
/// symmetrised before it is split into endpoint blocks.
pub fn posterior_covariance(
    points: &[UncertainPoint3],
    anchors: LineAnchors,
    params: &Vec6,
) -> Option<EndpointCovariance> {
    let (a, b) = split_points(params);
    let problem = LineMleProblem::with_anchors(points, anchors);

    let mut h = Mat6::zeros();
    for i in 0..points.len() {
        let (_, j) = problem.vector_residual(i, &a, &b)?;
        h += j.transpose() * j;
    }

    let Some(inv) = h.try_inverse() else {
        trace!("posterior_covariance: singular information matrix");
        return None;
    };
    if !inv.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(EndpointCovariance::from_joint((inv + inv.transpose()) * 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use line3d_core::{stack_points, Mat3, Pt3, Real, Vec3};

    fn isotropic(p: Pt3, sigma: Real) -> UncertainPoint3 {
        UncertainPoint3::isotropic(p, sigma).unwrap()
    }

    #[test]
    fn two_anchors_give_their_own_covariances() {
        let ca = Mat3::from_diagonal(&Vec3::new(1e-6, 4e-6, 9e-6));
        let cb = Mat3::from_diagonal(&Vec3::new(2e-6, 2e-6, 5e-6));
        let pa = UncertainPoint3::new(Pt3::new(0.0, 0.0, 1.0), ca).unwrap();
        let pb = UncertainPoint3::new(Pt3::new(0.1, 0.0, 1.0), cb).unwrap();
        let params = stack_points(pa.position(), pb.position());

        let cov = posterior_covariance(&[pa, pb], LineAnchors { a: 0, b: 1 }, &params)
            .expect("invertible");
        assert!((cov.a - ca).amax() < 1e-15, "a block: {}", cov.a);
        assert!((cov.b - cb).amax() < 1e-15, "b block: {}", cov.b);
        assert!(cov.joint.fixed_view::<3, 3>(0, 3).amax() < 1e-15);
    }

    #[test]
    fn line_points_shrink_the_endpoint_covariance() {
        let pts: Vec<UncertainPoint3> = (0..10)
            .map(|i| isotropic(Pt3::new(0.0, 0.0, 1.0 + 0.1 * i as Real), 1e-3))
            .collect();
        let params = stack_points(pts[0].position(), pts[9].position());
        let cov = posterior_covariance(&pts, LineAnchors { a: 0, b: 9 }, &params)
            .expect("invertible");

        // Symmetric positive semi-definite.
        assert!((cov.joint - cov.joint.transpose()).amax() < 1e-18);
        let eig = cov.joint.symmetric_eigen();
        assert!(eig.eigenvalues.min() > 0.0, "eigenvalues: {}", eig.eigenvalues);

        // Lateral uncertainty drops below the anchor's own variance; the
        // direction along the line is only constrained by the anchor.
        assert!(cov.a[(0, 0)] < 1e-6, "lateral variance: {:e}", cov.a[(0, 0)]);
        assert!((cov.a[(2, 2)] - 1e-6).abs() < 1e-12, "axial variance: {:e}", cov.a[(2, 2)]);
    }

    #[test]
    fn collapsed_line_has_no_covariance() {
        let pts: Vec<UncertainPoint3> = (0..3)
            .map(|i| isotropic(Pt3::new(0.0, 0.0, 1.0 + 0.1 * i as Real), 1e-3))
            .collect();
        let p = *pts[0].position();
        let params = stack_points(&p, &p);
        assert!(posterior_covariance(&pts, LineAnchors { a: 0, b: 2 }, &params).is_none());
    }
}
