//! High-level Rust API.
//!
//! Thin wrappers that build the engines with their default collaborators
//! (uniform sampler, brute-force index) for the common cases.

use rand::Rng;

use crate::core::{Estimator, Msac, RobustFit};
use crate::error::{ClusterError, FitError};
use crate::estimators::{HomographyEstimator, LineEstimator};
use crate::kmeans::{ApproxKMeans, BruteForceIndex, KMeansResult, NearestNeighborIndex};
use crate::models::{Homography, Line};
use crate::settings::{KMeansSettings, MsacSettings};
use crate::types::{DataMatrix, FeatureMatrix};
use crate::utils::seeded_rng;

/// Fit any [`Estimator`] to `data` with MSAC.
///
/// The sampler is seeded from `settings.seed` when present.
pub fn fit_robust<E: Estimator>(
    data: &DataMatrix,
    settings: &MsacSettings,
    estimator: E,
) -> Result<RobustFit<E::Model>, FitError> {
    Msac::new(settings.clone(), estimator).run(data)
}

/// Fit a 2D line to the first two columns of `points` (Nx2 or wider).
///
/// `settings.max_distance` is the perpendicular distance below which a point
/// counts as an inlier.
pub fn estimate_line(
    points: &DataMatrix,
    settings: &MsacSettings,
) -> Result<RobustFit<Line>, FitError> {
    if points.ncols() < 2 {
        return Err(FitError::DimensionMismatch {
            expected: 2,
            actual: points.ncols(),
        });
    }
    fit_robust(points, settings, LineEstimator::new())
}

/// Estimate a homography mapping `points1` onto `points2` (both Nx2).
///
/// `settings.max_distance` bounds the symmetric transfer error in pixels.
pub fn estimate_homography(
    points1: &DataMatrix,
    points2: &DataMatrix,
    settings: &MsacSettings,
) -> Result<RobustFit<Homography>, FitError> {
    for points in [points1, points2] {
        if points.ncols() != 2 {
            return Err(FitError::DimensionMismatch {
                expected: 2,
                actual: points.ncols(),
            });
        }
    }
    if points1.nrows() != points2.nrows() {
        return Err(FitError::LengthMismatch {
            left: points1.nrows(),
            right: points2.nrows(),
        });
    }

    // Combine into data matrix: [x1, y1, x2, y2]
    let n = points1.nrows();
    let mut data = DataMatrix::zeros(n, 4);
    for i in 0..n {
        data[(i, 0)] = points1[(i, 0)];
        data[(i, 1)] = points1[(i, 1)];
        data[(i, 2)] = points2[(i, 0)];
        data[(i, 3)] = points2[(i, 1)];
    }

    fit_robust(&data, settings, HomographyEstimator::new())
}

/// Cluster `features` into `k` groups with an exact brute-force index.
///
/// The random generator is seeded from `settings.seed` when present.
pub fn cluster(
    features: &FeatureMatrix,
    k: usize,
    settings: &KMeansSettings,
) -> Result<KMeansResult, ClusterError> {
    let mut rng = seeded_rng(settings.seed);
    cluster_with(features, k, settings, &mut BruteForceIndex::new(), &mut rng)
}

/// Cluster with a caller-supplied index and random generator.
pub fn cluster_with<I, R>(
    features: &FeatureMatrix,
    k: usize,
    settings: &KMeansSettings,
    index: &mut I,
    rng: &mut R,
) -> Result<KMeansResult, ClusterError>
where
    I: NearestNeighborIndex + ?Sized,
    R: Rng + ?Sized,
{
    ApproxKMeans::new(settings.clone()).cluster(features, k, index, rng)
}
