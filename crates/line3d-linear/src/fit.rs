//! Closed-form 3D line fit (principal component of the point cloud).

use line3d_core::{Pt3, Real, Vec3, EPS};
use nalgebra::DMatrix;

/// Line through `centroid` along the unit vector `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    /// Mean of the fitted points.
    pub centroid: Pt3,
    /// Unit direction (dominant right singular vector).
    pub direction: Vec3,
}

impl LineFit {
    /// A second point on the line, one unit along the direction.
    pub fn second_point(&self) -> Pt3 {
        self.centroid + self.direction
    }
}

/// Fit a 3D line to points via SVD of the mean-centred positions.
///
/// # Algorithm
///
/// 1. Compute the centroid of the points
/// 2. Stack the centred points as rows of an `N×3` matrix
/// 3. The right singular vector of the largest singular value is the direction
///
/// Returns `None` for fewer than 2 points or when all points coincide.
pub fn fit_line_svd<'a, I>(points: I) -> Option<LineFit>
where
    I: IntoIterator<Item = &'a Pt3>,
{
    let pts: Vec<&Pt3> = points.into_iter().collect();
    let n = pts.len();
    if n < 2 {
        return None;
    }

    let mut centroid = Vec3::zeros();
    for p in &pts {
        centroid += p.coords;
    }
    centroid /= n as Real;

    let mut a = DMatrix::<Real>::zeros(n, 3);
    for (i, p) in pts.iter().enumerate() {
        let c = p.coords - centroid;
        a[(i, 0)] = c.x;
        a[(i, 1)] = c.y;
        a[(i, 2)] = c.z;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let imax = svd.singular_values.imax();
    if svd.singular_values[imax] < EPS {
        return None;
    }

    let direction = Vec3::new(v_t[(imax, 0)], v_t[(imax, 1)], v_t[(imax, 2)]).normalize();
    Some(LineFit {
        centroid: Pt3::from(centroid),
        direction,
    })
}
