//! Built-in estimators.
//!
//! - Line fitting (2-point minimal sample)
//! - Homography estimation (4-point minimal sample)

pub mod homography;
pub mod line;

pub use homography::HomographyEstimator;
pub use line::LineEstimator;
