//! Deterministic noise helpers for synthetic datasets.
//!
//! The functions here avoid `thread_rng` and do not depend on the internal
//! algorithm of `rand` RNGs. This keeps synthetic datasets stable across
//! versions and platforms.

use crate::{Real, Vec3};

/// Deterministic uniform 3D noise in `[-max_abs, +max_abs]` per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformNoise3 {
    /// Base seed controlling the pseudo-random sequence.
    pub seed: u64,
    /// Maximum absolute per-axis noise (metres).
    pub max_abs: Real,
}

impl Default for UniformNoise3 {
    fn default() -> Self {
        Self {
            seed: 0,
            max_abs: 0.0,
        }
    }
}

impl UniformNoise3 {
    /// Sample a deterministic 3D noise vector for a given point index.
    #[inline]
    pub fn sample(&self, point_idx: usize) -> Vec3 {
        let max_abs = self.max_abs.abs();
        if max_abs == 0.0 {
            return Vec3::zeros();
        }

        let key = mix_key(self.seed, point_idx);
        let u = u64_to_unit_f64(splitmix64(key));
        let v = u64_to_unit_f64(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
        let w = u64_to_unit_f64(splitmix64(key ^ 0xD6E8_FEB8_6659_FD93));

        // Map [0, 1) -> [-max_abs, +max_abs].
        Vec3::new(u - 0.5, v - 0.5, w - 0.5) * (2.0 * max_abs)
    }

    /// Noise vector restricted to the plane orthogonal to `direction`.
    ///
    /// Each component stays within `max_abs` of the unrestricted sample's
    /// bound; the norm is at most `sqrt(3) * max_abs`.
    pub fn sample_orthogonal(&self, point_idx: usize, direction: &Vec3) -> Vec3 {
        let n = self.sample(point_idx);
        let d = direction.normalize();
        n - d * n.dot(&d)
    }
}

/// Stable per-request seed derived from a base seed and a request index.
#[inline]
pub fn derive_seed(seed: u64, index: usize) -> u64 {
    splitmix64(mix_key(seed, index))
}

#[inline]
fn mix_key(seed: u64, point_idx: usize) -> u64 {
    // SplitMix64 stream selection via a stable integer mix.
    seed ^ (point_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn u64_to_unit_f64(x: u64) -> Real {
    // Convert the top 53 bits to a double in [0, 1).
    let mantissa = x >> 11;
    (mantissa as Real) * (1.0 / ((1u64 << 53) as Real))
}
