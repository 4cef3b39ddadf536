//! Iterative SVD refit of a RANSAC consensus set.
//!
//! Starting from the RANSAC inliers, the line is re-estimated by SVD on the
//! current inlier set and every input point is reclassified against it. The
//! new set is adopted only when it is strictly larger, so the loop ends in at
//! most `N` rounds and the inlier count never decreases.

use line3d_core::{extremal_indices, LinePoint, Pt3, Real, Segment3, Vec3};

use crate::fit::fit_line_svd;

/// Outcome of [`refit_line`].
#[derive(Debug, Clone, PartialEq)]
pub struct Refit {
    /// Indices (into the input points) of the adopted inlier set, ascending.
    pub inliers: Vec<usize>,
    /// A point on the line that produced `inliers`.
    pub origin: Pt3,
    /// Direction of the line that produced `inliers`.
    pub direction: Vec3,
    /// Inlier count after each adoption, starting with the seed count.
    pub history: Vec<usize>,
}

impl Refit {
    /// Number of refits that enlarged the inlier set.
    pub fn improvements(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    /// Inliers with the smallest and largest projection on the adopted line.
    pub fn endpoints<P: LinePoint>(&self, points: &[P]) -> Option<Segment3> {
        let (imin, imax) = extremal_indices(
            self.inliers.iter().map(|&i| points[i].position()),
            &self.origin,
            &self.direction,
        )?;
        Some(Segment3::new(
            *points[self.inliers[imin]].position(),
            *points[self.inliers[imax]].position(),
        ))
    }
}

/// Grow `seed_inliers` by alternating SVD fits and reclassification.
///
/// `seed_line` is the line that produced `seed_inliers`; it stays the
/// reference for endpoint selection when no refit enlarges the set.
/// A point is an inlier when `line_distance < threshold`.
pub fn refit_line<P: LinePoint>(
    points: &[P],
    seed_inliers: &[usize],
    seed_line: &Segment3,
    threshold: Real,
) -> Refit {
    let mut refit = Refit {
        inliers: seed_inliers.to_vec(),
        origin: seed_line.a,
        direction: seed_line.direction(),
        history: vec![seed_inliers.len()],
    };

    loop {
        let Some(fit) =
            fit_line_svd(refit.inliers.iter().map(|&i| points[i].position()))
        else {
            break;
        };

        let b = fit.second_point();
        let candidate: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.line_distance(&fit.centroid, &b) < threshold)
            .map(|(i, _)| i)
            .collect();

        if candidate.len() <= refit.inliers.len() {
            break;
        }

        refit.inliers = candidate;
        refit.origin = fit.centroid;
        refit.direction = fit.direction;
        refit.history.push(refit.inliers.len());
    }

    refit
}

#[cfg(test)]
mod tests {
    use super::*;
    use line3d_core::synthetic::{line, noise::UniformNoise3};

    fn noisy_axis(n: usize) -> Vec<Pt3> {
        let noise = UniformNoise3 {
            seed: 11,
            max_abs: 1e-3,
        };
        line::noisy_segment_points(&Pt3::new(0.0, 0.0, 0.0), &Pt3::new(0.0, 0.0, 1.0), n, &noise)
    }

    #[test]
    fn grows_a_partial_seed_to_the_full_set() {
        let pts = noisy_axis(20);
        // Seed from two neighbouring points with a slightly tilted line.
        let seed = Segment3::new(pts[0], pts[1]);
        let refit = refit_line(&pts, &[0, 1], &seed, 0.01);

        assert_eq!(refit.inliers, (0..20).collect::<Vec<_>>());
        assert_eq!(refit.history.first(), Some(&2));
        assert_eq!(refit.history.last(), Some(&20));
        assert!(refit.improvements() >= 1);
        assert!(
            refit.history.windows(2).all(|w| w[0] < w[1]),
            "history={:?}",
            refit.history
        );

        let seg = refit.endpoints(&pts).expect("non-empty inliers");
        let (lo, hi) = if seg.a.z < seg.b.z { (seg.a, seg.b) } else { (seg.b, seg.a) };
        assert_eq!(lo, pts[0]);
        assert_eq!(hi, pts[19]);
    }

    #[test]
    fn outliers_stay_out() {
        let mut pts = noisy_axis(15);
        pts.push(Pt3::new(0.5, 0.0, 0.5));
        pts.push(Pt3::new(0.0, -0.5, 0.2));
        let seed = Segment3::new(pts[0], pts[14]);
        let seed_inliers: Vec<usize> = (0..15).collect();
        let refit = refit_line(&pts, &seed_inliers, &seed, 0.01);

        assert_eq!(refit.inliers, seed_inliers);
        assert_eq!(refit.history, vec![15]);
        // Without an improvement the seed line is kept.
        assert_eq!(refit.origin, seed.a);
        assert_eq!(refit.direction, seed.direction());
    }

    #[test]
    fn coincident_seed_terminates() {
        let p = Pt3::new(0.0, 0.0, 1.0);
        let pts = vec![p, p, p];
        let seed = Segment3::new(p, Pt3::new(0.0, 0.0, 2.0));
        let refit = refit_line(&pts, &[0, 1, 2], &seed, 0.01);
        assert_eq!(refit.history, vec![3]);
    }

    #[test]
    fn works_with_uncertain_points() {
        let pts = line::isotropic_points(&noisy_axis(20), 1e-3).expect("valid sigma");
        let seed = Segment3::new(*pts[0].position(), *pts[19].position());
        let refit = refit_line(&pts, &[0, 19], &seed, 4.0);
        assert_eq!(refit.inliers.len(), 20);
        assert_eq!(refit.history, vec![2, 20]);
    }
}
