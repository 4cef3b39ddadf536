//! Problem builders for the non-linear least squares backends.

pub mod line_mle;
