//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental types used throughout the workspace
//! together with a few small helpers for lines given by two points.

use nalgebra::{Matrix3, Matrix6, Point3, SMatrix, Vector3, Vector6};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 6D vector with [`Real`] components (two stacked 3D points).
pub type Vec6 = Vector6<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 6×6 matrix with [`Real`] entries.
pub type Mat6 = Matrix6<Real>;
/// 3×6 matrix with [`Real`] entries (Jacobian of a 3-vector wrt two points).
pub type Mat3x6 = SMatrix<Real, 3, 6>;

/// Length below which two points are treated as coincident.
pub const EPS: Real = 1e-6;

/// Orthogonal projection of `x` onto the infinite line through `a` and `b`.
///
/// The caller is responsible for ensuring that `a != b`.
pub fn project_point_to_line(x: &Pt3, a: &Pt3, b: &Pt3) -> Pt3 {
    let ab = b - a;
    let ax = x - a;
    a + ab * (ab.dot(&ax) / ab.dot(&ab))
}

/// Signed position of `x` along `direction`, measured from `origin`.
///
/// `direction` does not need to be normalised; the value is only used for
/// ordering points along a line.
#[inline]
pub fn projection_along(x: &Pt3, origin: &Pt3, direction: &Vec3) -> Real {
    (x - origin).dot(direction)
}

/// Indices of the items with the smallest and largest projection along
/// `direction`, or `None` for an empty iterator.
///
/// Ties keep the first occurrence.
pub fn extremal_indices<'a, I>(positions: I, origin: &Pt3, direction: &Vec3) -> Option<(usize, usize)>
where
    I: IntoIterator<Item = &'a Pt3>,
{
    let mut best: Option<(usize, Real, usize, Real)> = None;
    for (i, p) in positions.into_iter().enumerate() {
        let s = projection_along(p, origin, direction);
        best = Some(match best {
            None => (i, s, i, s),
            Some((imin, smin, imax, smax)) => {
                let (imin, smin) = if s < smin { (i, s) } else { (imin, smin) };
                let (imax, smax) = if s > smax { (i, s) } else { (imax, smax) };
                (imin, smin, imax, smax)
            }
        });
    }
    best.map(|(imin, _, imax, _)| (imin, imax))
}

/// Stack two points into a 6-vector `[a; b]`.
pub fn stack_points(a: &Pt3, b: &Pt3) -> Vec6 {
    Vec6::new(a.x, a.y, a.z, b.x, b.y, b.z)
}

/// Split a 6-vector `[a; b]` back into its two points.
pub fn split_points(v: &Vec6) -> (Pt3, Pt3) {
    (Pt3::new(v[0], v[1], v[2]), Pt3::new(v[3], v[4], v[5]))
}
