//! Deterministic synthetic data generation helpers.
//!
//! This module provides small, reusable building blocks for constructing
//! synthetic line-extraction problems used in tests and benchmarks:
//! - evenly spaced samples along a segment,
//! - deterministic pseudo-random noise utilities,
//! - isotropic uncertain-point wrappers.
//!
//! The helpers are intentionally lightweight and deterministic (explicit
//! seeds; stable point ordering).
//!
//! # Example
//!
//! ```
//! use line3d_core::{synthetic::{line, noise::UniformNoise3}, Pt3};
//!
//! let noise = UniformNoise3 { seed: 3, max_abs: 1e-3 };
//! let pts = line::noisy_segment_points(
//!     &Pt3::new(0.0, 0.0, 0.0),
//!     &Pt3::new(0.0, 0.0, 1.0),
//!     20,
//!     &noise,
//! );
//! assert_eq!(pts.len(), 20);
//! ```

pub mod line;
pub mod noise;
