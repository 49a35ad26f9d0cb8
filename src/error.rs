//! Error types for the fitting and clustering engines.
//!
//! Only precondition violations are errors. Non-convergence and degenerate
//! samples are reported through result flags instead.

use thiserror::Error;

/// Precondition failures of a robust fitting run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need at least {sample_size} points to fit a model, got {points}")]
    InsufficientPoints { points: usize, sample_size: usize },
    #[error("sample size must be at least 1")]
    InvalidSampleSize,
    #[error("max distance must be finite and non-negative, got {0}")]
    InvalidMaxDistance(f64),
    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
    #[error("max trials must be at least 1")]
    InvalidMaxTrials,
    #[error("max skip trials must be at least 1")]
    InvalidMaxSkipTrials,
    #[error("expected {expected} columns per point, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("paired point sets differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Precondition and data-quality failures of a clustering run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("number of clusters must be at least 1")]
    InvalidClusterCount,
    #[error("cannot form {clusters} clusters from {features} features")]
    InsufficientFeatures { features: usize, clusters: usize },
    #[error("feature vectors must have at least one dimension")]
    EmptyFeatureDimension,
    #[error("max iterations must be at least 1")]
    InvalidMaxIterations,
    #[error("number of trials must be at least 1")]
    InvalidNumTrials,
    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    #[error("all features contain non-finite values")]
    NoValidFeatures,
    #[error("only {valid} finite features remain, fewer than the {clusters} requested clusters")]
    TooFewValidFeatures { valid: usize, clusters: usize },
    #[error("initial centers have {actual} columns, features have {expected}")]
    CenterDimensionMismatch { expected: usize, actual: usize },
    #[error("nearest neighbor index failure: {0}")]
    Index(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_counts() {
        let err = FitError::InsufficientPoints {
            points: 1,
            sample_size: 2,
        };
        assert_eq!(
            err.to_string(),
            "need at least 2 points to fit a model, got 1"
        );

        let err = ClusterError::TooFewValidFeatures {
            valid: 3,
            clusters: 5,
        };
        assert!(err.to_string().contains("only 3 finite features"));
    }
}
