//! Probabilistic 3D line extraction from depth-sensor points.
//!
//! Given 3D points believed to lie on a line, the pipeline
//!
//! 1. finds the largest well-supported consensus set with RANSAC over point
//!    pairs (Euclidean distance for plain positions, Mahalanobis distance for
//!    points with covariances),
//! 2. grows that set by alternating SVD line fits and reclassification,
//! 3. refines the endpoints by maximum likelihood and attaches their
//!    posterior covariance.
//!
//! # Example
//!
//! ```
//! use line3d::prelude::*;
//!
//! let intrinsics = PinholeIntrinsics::default();
//! let noise = DepthNoiseModel::default();
//! let positions: Vec<Pt3> = (0..20)
//!     .map(|i| Pt3::new(0.1, -0.05, 1.0 + 0.05 * i as f64))
//!     .collect();
//! let points = uncertain_points(&positions, &intrinsics, &noise).unwrap();
//!
//! let out = extract_and_refine(&points, &LineExtractionConfig::default());
//! assert_eq!(out.line.len(), 20);
//! assert_eq!(out.mle.status, MleStatus::Converged);
//! assert!(out.line.covariance.is_some());
//! ```
//!
//! Configuration is a single serde structure, see [`LineExtractionConfig`].

mod config;
mod pipeline;

pub use config::LineExtractionConfig;
pub use pipeline::{
    extract_and_refine, extract_and_refine_many, extract_line, extract_many, uncertain_points,
    RefinedLine,
};

/// Core types: points, covariances, distances, result types and RANSAC.
pub mod core {
    pub use line3d_core::*;
}

/// Closed-form stages: line fit, verifier, RANSAC extractor and refit.
pub mod linear {
    pub use line3d_linear::*;
}

/// Maximum-likelihood refinement and least-squares backends.
pub mod optim {
    pub use line3d_optim::*;
}

/// Convenient re-exports for common use cases.
pub mod prelude {
    pub use crate::core::{
        DepthNoiseModel, DistanceMetric, EndpointCovariance, Line3d, LinePoint, PinholeIntrinsics,
        Pt3, Real, Segment3, UncertainPoint3, Vec3,
    };
    pub use crate::linear::{ExtractOptions, ExtractedLine, VerifyOptions};
    pub use crate::optim::{MleOptions, MleReport, MleStatus};
    pub use crate::{
        extract_and_refine, extract_and_refine_many, extract_line, extract_many,
        uncertain_points, LineExtractionConfig, RefinedLine,
    };
}
