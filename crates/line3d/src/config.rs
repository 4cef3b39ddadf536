//! Single configuration structure for the extraction pipeline.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use line3d_linear::ExtractOptions;
use line3d_optim::MleOptions;
use serde::{Deserialize, Serialize};

/// All tunables of [`extract_line`](crate::extract_line) and
/// [`extract_and_refine`](crate::extract_and_refine).
///
/// Every field has a default, so a JSON document only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineExtractionConfig {
    pub extract: ExtractOptions,
    pub mle: MleOptions,
}

impl LineExtractionConfig {
    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("failed to parse line extraction config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let e = &self.extract;
        ensure!(
            e.euclidean_threshold.is_finite() && e.euclidean_threshold > 0.0,
            "extract.euclidean_threshold must be positive, got {}",
            e.euclidean_threshold
        );
        ensure!(
            e.mahalanobis_threshold.is_finite() && e.mahalanobis_threshold > 0.0,
            "extract.mahalanobis_threshold must be positive, got {}",
            e.mahalanobis_threshold
        );
        ensure!(
            e.early_exit_inlier_ratio > 0.0 && e.early_exit_inlier_ratio <= 1.0,
            "extract.early_exit_inlier_ratio must be in (0, 1], got {}",
            e.early_exit_inlier_ratio
        );
        ensure!(e.verify.num_cells >= 1, "extract.verify.num_cells must be at least 1");
        ensure!(
            (0.0..1.0).contains(&e.verify.min_support_ratio),
            "extract.verify.min_support_ratio must be in [0, 1), got {}",
            e.verify.min_support_ratio
        );

        let s = &self.mle.solve;
        for (name, value) in [
            ("ftol", s.ftol),
            ("gtol", s.gtol),
            ("xtol", s.xtol),
            ("min_error", s.min_error),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "mle.solve.{name} must be non-negative, got {value}"
            );
        }
        ensure!(s.max_iters >= 1, "mle.solve.max_iters must be at least 1");
        Ok(())
    }
}
