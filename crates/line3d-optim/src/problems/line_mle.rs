//! Maximum-likelihood estimate of a 3D line from uncertain inliers.
//!
//! The parameters are the two endpoints `x = [A; B]`. The endpoints are tied
//! to the two extremal inliers (the anchors) by their Mahalanobis quadratic
//! forms, and every other inlier contributes its Mahalanobis distance to the
//! infinite line `AB`.
//!
//! Two residual layouts are exposed:
//!
//! - the scalar residuals minimised by the solver (one row per inlier),
//! - whitened 3-vector residuals whose Gauss-Newton Hessian `JᵗJ` gives the
//!   posterior covariance of `[A; B]`.

use line3d_core::{
    extremal_indices, split_points, stack_points, Mat3, Mat3x6, Pt3, Real, Segment3,
    UncertainPoint3, Vec3, Vec6, EPS,
};
use nalgebra::{DMatrix, DVector, RowSVector};

use crate::NllsProblem;

/// Number of optimisation parameters (two stacked 3D points).
pub const LINE_PARAMS: usize = 6;

type Row6 = RowSVector<Real, LINE_PARAMS>;

/// Indices of the inliers that anchor the endpoints `A` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAnchors {
    /// Inlier whose quadratic form pins endpoint `A`.
    pub a: usize,
    /// Inlier whose quadratic form pins endpoint `B`.
    pub b: usize,
}

impl LineAnchors {
    /// Inliers with the smallest (`a`) and largest (`b`) projection on `B - A`.
    ///
    /// Returns `None` for fewer than two points, a degenerate segment, or
    /// when a single inlier is extremal in both directions.
    pub fn select(points: &[UncertainPoint3], segment: &Segment3) -> Option<Self> {
        let dir = segment.direction();
        if points.len() < 2 || dir.norm() < EPS {
            return None;
        }
        let (a, b) = extremal_indices(points.iter().map(|p| p.position()), &segment.a, &dir)?;
        (a != b).then_some(Self { a, b })
    }
}

/// Scalar-residual MLE problem over `[A; B]`.
#[derive(Debug, Clone)]
pub struct LineMleProblem<'a> {
    points: &'a [UncertainPoint3],
    anchors: LineAnchors,
}

impl<'a> LineMleProblem<'a> {
    /// Build the problem for `points` starting from `initial`.
    pub fn new(points: &'a [UncertainPoint3], initial: &Segment3) -> Option<Self> {
        let anchors = LineAnchors::select(points, initial)?;
        Some(Self { points, anchors })
    }

    pub fn with_anchors(points: &'a [UncertainPoint3], anchors: LineAnchors) -> Self {
        debug_assert!(anchors.a < points.len() && anchors.b < points.len());
        Self { points, anchors }
    }

    pub fn anchors(&self) -> LineAnchors {
        self.anchors
    }

    pub fn points(&self) -> &'a [UncertainPoint3] {
        self.points
    }

    /// Starting parameters: the anchor positions.
    pub fn anchor_params(&self) -> Vec6 {
        stack_points(
            self.points[self.anchors.a].position(),
            self.points[self.anchors.b].position(),
        )
    }

    /// Residual of inlier `i` and its gradient with respect to `[A; B]`.
    fn residual_row(&self, i: usize, a: &Pt3, b: &Pt3) -> (Real, Row6) {
        let p = &self.points[i];
        let mut grad = Row6::zeros();
        if i == self.anchors.a {
            let (r, g) = anchor_quadratic_form(p, a);
            grad.fixed_columns_mut::<3>(0).copy_from(&g);
            (r, grad)
        } else if i == self.anchors.b {
            let (r, g) = anchor_quadratic_form(p, b);
            grad.fixed_columns_mut::<3>(3).copy_from(&g);
            (r, grad)
        } else if let Some((m, jm)) = line_point_jacobian(p, a, b) {
            let norm = m.norm();
            if norm > 0.0 {
                grad = m.transpose() * jm / norm;
            }
            (norm, grad)
        } else {
            // Collapsed line: fall back to the distance to `A`.
            let q = p.whiten(&(a - p.position()));
            let norm = q.norm();
            if norm > 0.0 {
                let g = q.transpose() * p.whitening() / norm;
                grad.fixed_columns_mut::<3>(0).copy_from(&g);
            }
            (norm, grad)
        }
    }

    /// Whitened vector residual of inlier `i` and its `3×6` Jacobian.
    ///
    /// `None` when a line point is evaluated against a collapsed line.
    pub fn vector_residual(&self, i: usize, a: &Pt3, b: &Pt3) -> Option<(Vec3, Mat3x6)> {
        let p = &self.points[i];
        let mut j = Mat3x6::zeros();
        if i == self.anchors.a {
            j.fixed_view_mut::<3, 3>(0, 0).copy_from(&(-p.whitening()));
            Some((p.whiten(&(p.position() - a)), j))
        } else if i == self.anchors.b {
            j.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-p.whitening()));
            Some((p.whiten(&(p.position() - b)), j))
        } else {
            line_point_jacobian(p, a, b)
        }
    }
}

impl NllsProblem for LineMleProblem<'_> {
    fn num_params(&self) -> usize {
        LINE_PARAMS
    }

    /// One row per inlier, zero-padded up to the parameter count.
    fn num_residuals(&self) -> usize {
        self.points.len().max(LINE_PARAMS)
    }

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let (a, b) = unpack(x);
        let mut r = DVector::zeros(self.num_residuals());
        for i in 0..self.points.len() {
            r[i] = self.residual_row(i, &a, &b).0;
        }
        r
    }

    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let (a, b) = unpack(x);
        let mut j = DMatrix::zeros(self.num_residuals(), LINE_PARAMS);
        for i in 0..self.points.len() {
            let (_, row) = self.residual_row(i, &a, &b);
            j.row_mut(i).copy_from(&row);
        }
        j
    }
}

/// `[A; B]` from a dynamic parameter vector.
pub fn unpack(x: &DVector<Real>) -> (Pt3, Pt3) {
    debug_assert_eq!(x.len(), LINE_PARAMS);
    split_points(&Vec6::from_column_slice(x.as_slice()))
}

/// Dynamic parameter vector from `[A; B]`.
pub fn pack(a: &Pt3, b: &Pt3) -> DVector<Real> {
    DVector::from_column_slice(stack_points(a, b).as_slice())
}

/// `(X - p)ᵗ Σ⁻¹ (X - p)` and its gradient `2 (X - p)ᵗ Σ⁻¹`.
fn anchor_quadratic_form(p: &UncertainPoint3, x: &Pt3) -> (Real, RowSVector<Real, 3>) {
    let q = p.whiten(&(x - p.position()));
    let grad = q.transpose() * p.whitening() * 2.0;
    (q.norm_squared(), grad)
}

/// Whitened offset `m` from `p` to the line `(a, b)` and `∂m/∂[a; b]`.
///
/// With `q = W(a - p)`, `d = W(b - a)` and `P = I - d dᵗ/|d|²` the residual
/// is `m = P q`. Writing `F = ∂(d dᵗq / |d|²)/∂d`, the Jacobian is
/// `[(P + F) W, -F W]`.
pub fn line_point_jacobian(p: &UncertainPoint3, a: &Pt3, b: &Pt3) -> Option<(Vec3, Mat3x6)> {
    if (b - a).norm() < EPS {
        return None;
    }
    let w = p.whitening();
    let q = w * (a - p.position());
    let d = w * (b - a);
    let dd = d.norm_squared();
    if !(dd > 0.0) || !dd.is_finite() {
        return None;
    }

    let dq = d.dot(&q);
    let proj = Mat3::identity() - d * d.transpose() / dd;
    let m = proj * q;
    let f = (Mat3::identity() * dq + d * q.transpose()) / dd
        - d * d.transpose() * (2.0 * dq / (dd * dd));

    let mut j = Mat3x6::zeros();
    j.fixed_view_mut::<3, 3>(0, 0).copy_from(&((proj + f) * w));
    j.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-f * w));
    Some((m, j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use line3d_core::{mahalanobis_vector, Mat3};
    use nalgebra::Rotation3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_point(rng: &mut StdRng, center: Pt3) -> UncertainPoint3 {
        let r = Rotation3::from_euler_angles(
            rng.random_range(-3.0..3.0),
            rng.random_range(-1.5..1.5),
            rng.random_range(-3.0..3.0),
        );
        let s = Vec3::new(
            rng.random_range(1e-3..5e-3),
            rng.random_range(1e-3..5e-3),
            rng.random_range(2e-3..2e-2),
        );
        let cov = r.matrix() * Mat3::from_diagonal(&s.component_mul(&s)) * r.matrix().transpose();
        let offset = Vec3::new(
            rng.random_range(-0.01..0.01),
            rng.random_range(-0.01..0.01),
            rng.random_range(-0.01..0.01),
        );
        UncertainPoint3::new(center + offset, cov).expect("SPD covariance")
    }

    fn sample_problem(rng: &mut StdRng) -> Vec<UncertainPoint3> {
        (0..8)
            .map(|i| random_point(rng, Pt3::new(0.1 * i as Real, 0.05, 1.0 + 0.02 * i as Real)))
            .collect()
    }

    fn numeric_jacobian<F: Fn(&DVector<Real>) -> DVector<Real>>(f: F, x: &DVector<Real>) -> DMatrix<Real> {
        let h = 1e-7;
        let r0 = f(x);
        let mut j = DMatrix::zeros(r0.len(), x.len());
        for k in 0..x.len() {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[k] += h;
            xm[k] -= h;
            let col = (f(&xp) - f(&xm)) / (2.0 * h);
            j.set_column(k, &col);
        }
        j
    }

    fn max_rel_err(analytic: &DMatrix<Real>, numeric: &DMatrix<Real>) -> Real {
        let scale = numeric.amax().max(1.0);
        (analytic - numeric).amax() / scale
    }

    #[test]
    fn line_residual_matches_core_distance() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = Pt3::new(0.0, 0.0, 1.0);
        let b = Pt3::new(0.5, 0.1, 1.3);
        for _ in 0..50 {
            let p = random_point(&mut rng, Pt3::new(0.2, 0.05, 1.1));
            let (m, _) = line_point_jacobian(&p, &a, &b).expect("non-degenerate line");
            let core = mahalanobis_vector(&p, &a, &b).expect("non-degenerate line");
            assert!((m - core).norm() < 1e-9 * core.norm().max(1.0), "m={m} core={core}");
        }
    }

    #[test]
    fn scalar_jacobian_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..10 {
            let points = sample_problem(&mut rng);
            let seg = Segment3::new(*points[0].position(), *points[7].position());
            let problem = LineMleProblem::new(&points, &seg).expect("anchors");
            assert_eq!(problem.anchors(), LineAnchors { a: 0, b: 7 });

            // Perturb away from the anchors so every gradient is non-trivial.
            let mut x = pack(&seg.a, &seg.b);
            for k in 0..LINE_PARAMS {
                x[k] += rng.random_range(-5e-3..5e-3);
            }

            let analytic = problem.jacobian(&x);
            let numeric = numeric_jacobian(|x| problem.residuals(x), &x);
            let err = max_rel_err(&analytic, &numeric);
            assert!(err < 1e-4, "scalar jacobian mismatch: {err:.3e}");
        }
    }

    #[test]
    fn vector_jacobian_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(29);
        let points = sample_problem(&mut rng);
        let seg = Segment3::new(*points[0].position(), *points[7].position());
        let problem = LineMleProblem::new(&points, &seg).expect("anchors");
        let x = pack(&Pt3::new(0.003, 0.048, 0.998), &Pt3::new(0.702, 0.055, 1.141));

        for i in 0..points.len() {
            let f = |x: &DVector<Real>| {
                let (a, b) = unpack(x);
                let (r, _) = problem.vector_residual(i, &a, &b).expect("valid line");
                DVector::from_column_slice(r.as_slice())
            };
            let (a, b) = unpack(&x);
            let (_, j) = problem.vector_residual(i, &a, &b).expect("valid line");
            let analytic = DMatrix::from_column_slice(3, LINE_PARAMS, j.as_slice());
            let numeric = numeric_jacobian(f, &x);
            let err = max_rel_err(&analytic, &numeric);
            assert!(err < 1e-4, "vector jacobian mismatch for point {i}: {err:.3e}");
        }
    }

    #[test]
    fn anchors_follow_the_segment_direction() {
        let points: Vec<UncertainPoint3> = (0..5)
            .map(|i| UncertainPoint3::isotropic(Pt3::new(0.0, 0.0, i as Real * 0.1), 1e-3).unwrap())
            .collect();
        let up = Segment3::new(Pt3::new(0.0, 0.0, 0.0), Pt3::new(0.0, 0.0, 0.4));
        let down = Segment3::new(up.b, up.a);
        assert_eq!(LineAnchors::select(&points, &up), Some(LineAnchors { a: 0, b: 4 }));
        assert_eq!(LineAnchors::select(&points, &down), Some(LineAnchors { a: 4, b: 0 }));
        assert_eq!(LineAnchors::select(&points[..1], &up), None);
    }

    #[test]
    fn residual_rows_are_padded() {
        let points: Vec<UncertainPoint3> = [Pt3::new(0.0, 0.0, 1.0), Pt3::new(0.1, 0.0, 1.0)]
            .iter()
            .map(|p| UncertainPoint3::isotropic(*p, 1e-3).unwrap())
            .collect();
        let seg = Segment3::new(*points[0].position(), *points[1].position());
        let problem = LineMleProblem::new(&points, &seg).expect("anchors");
        let x = pack(&seg.a, &seg.b);
        assert_eq!(problem.residuals(&x).len(), LINE_PARAMS);
        assert_eq!(problem.jacobian(&x).shape(), (LINE_PARAMS, LINE_PARAMS));
        assert_eq!(problem.cost(&x), 0.0);
    }
}
