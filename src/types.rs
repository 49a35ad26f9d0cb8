//! Core shared matrix types.
//!
//! Points and features are stored one per row. Paired (stereo) correspondences
//! are laid out as concatenated columns, e.g. `[x1, y1, x2, y2]`.

use nalgebra::DMatrix;

/// Dynamic `f64` matrix holding the point set of a robust fitting run.
///
/// Each row is one point; estimators decide how many columns they read.
pub type DataMatrix = DMatrix<f64>;

/// Dynamic `f32` matrix holding feature vectors for clustering.
///
/// Descriptors are single precision; accumulations over them are done in `f64`.
pub type FeatureMatrix = DMatrix<f32>;
