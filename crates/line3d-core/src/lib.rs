//! Core math and geometry primitives for `line3d`.
//!
//! This crate provides the foundational building blocks used by all other
//! crates in the workspace:
//!
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, and friends),
//! - depth-sensor noise models producing per-point covariances,
//! - [`UncertainPoint3`] with a cached whitening decomposition,
//! - Euclidean and Mahalanobis point-to-line distances and the
//!   [`LinePoint`] metric abstraction,
//! - [`Line3d`] result types,
//! - a deterministic, model-agnostic RANSAC engine.
//!
//! # Modules
//!
//! - \[`math`\]: basic type aliases and line helpers.
//! - \[`models`\]: camera intrinsics and depth noise.
//! - \[`distance`\]: point-to-line distance primitives.
//! - \[`ransac`\]: generic robust estimation helpers.
//! - \[`synthetic`\]: deterministic synthetic data helpers (tests/benchmarks).
//!
//! # Example
//!
//! ```
//! use line3d_core::{mahalanobis_distance, DepthNoiseModel, PinholeIntrinsics, Pt3, UncertainPoint3};
//!
//! let k = PinholeIntrinsics::default();
//! let noise = DepthNoiseModel::default();
//! let p = UncertainPoint3::from_depth_sensor(Pt3::new(0.1, 0.0, 2.0), &k, &noise).unwrap();
//!
//! let a = Pt3::new(0.0, 0.0, 1.0);
//! let b = Pt3::new(0.0, 0.0, 3.0);
//! let d = mahalanobis_distance(&p, &a, &b).unwrap();
//! assert!(d > 0.0);
//! ```

/// Point-to-line distances and the metric abstraction.
pub mod distance;
/// Line segment results.
mod line;
/// Linear algebra type aliases and helpers.
pub mod math;
/// Sensor intrinsics and noise models.
pub mod models;
/// Uncertain 3D points.
mod point;
/// Generic RANSAC engine and traits.
pub mod ransac;
/// Deterministic synthetic data generation helpers.
pub mod synthetic;

pub use distance::*;
pub use line::*;
pub use math::*;
pub use models::*;
pub use point::*;
pub use ransac::*;
