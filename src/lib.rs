//! # Consensus - Robust Fitting and Approximate Clustering
//!
//! `consensus` provides two numerical engines used by calibration and
//! vision pipelines:
//!
//! - an MSAC (M-estimator sample consensus) fitter that recovers a model from
//!   noisy data with outliers, for any model you can fit and evaluate;
//! - an approximate K-Means engine that clusters feature descriptors through
//!   a pluggable nearest-neighbor index.
//!
//! ## Quick Start
//!
//! ```rust
//! use consensus::{estimate_line, MsacSettings};
//! use nalgebra::DMatrix;
//!
//! // Five points on y = x and one outlier
//! let points = DMatrix::from_row_slice(
//!     6,
//!     2,
//!     &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 1.0, 9.0],
//! );
//!
//! let settings = MsacSettings::new(0.1, 0.99, 100).with_seed(0);
//! let fit = estimate_line(&points, &settings).unwrap();
//! assert!(fit.found);
//! assert_eq!(fit.inlier_count(), 5);
//! ```
//!
//! ```rust
//! use consensus::{cluster, KMeansSettings};
//! use nalgebra::DMatrix;
//!
//! let features = DMatrix::<f32>::from_row_slice(4, 1, &[0.0, 0.5, 10.0, 10.5]);
//! let result = cluster(&features, 2, &KMeansSettings::default().with_seed(1)).unwrap();
//! assert_eq!(result.cluster_sizes(), vec![2, 2]);
//! ```
//!
//! ## Extending the Library
//!
//! - **[`Estimator`](core::Estimator)**: implement this to fit new model
//!   types, or wrap three closures with [`FnEstimator`](core::FnEstimator)
//! - **[`Sampler`](core::Sampler)**: implement this for custom minimal-sample
//!   strategies
//! - **[`NearestNeighborIndex`](kmeans::NearestNeighborIndex)**: implement
//!   this to plug another search structure into K-Means
//!
//! ### Example: Custom Estimator
//!
//! ```rust
//! use consensus::core::{Estimator, Msac};
//! use consensus::settings::MsacSettings;
//! use consensus::types::DataMatrix;
//!
//! // Robust mean of 1-D data
//! struct Constant;
//!
//! impl Estimator for Constant {
//!     type Model = f64;
//!
//!     fn sample_size(&self) -> usize {
//!         1
//!     }
//!
//!     fn fit(&self, data: &DataMatrix, sample: &[usize]) -> Vec<f64> {
//!         let sum: f64 = sample.iter().map(|&i| data[(i, 0)]).sum();
//!         vec![sum / sample.len() as f64]
//!     }
//!
//!     fn evaluate(&self, model: &f64, data: &DataMatrix) -> Vec<f64> {
//!         data.column(0).iter().map(|v| (v - model).abs()).collect()
//!     }
//!
//!     fn is_valid(&self, model: &f64) -> bool {
//!         model.is_finite()
//!     }
//! }
//!
//! let data = DataMatrix::from_column_slice(5, 1, &[1.0, 1.1, 0.9, 1.0, 40.0]);
//! let settings = MsacSettings::new(0.5, 0.99, 50).with_seed(2);
//! let fit = Msac::new(settings, Constant).run(&data).unwrap();
//! assert_eq!(fit.inlier_count(), 4);
//! ```
//!
//! ## Modules
//!
//! - **[`api`](api)**: High-level entry points for common tasks
//! - **[`core`](core)**: Core traits and the `Msac` engine
//! - **[`estimators`](estimators)**: Built-in line and homography estimators
//! - **[`kmeans`](kmeans)**: Approximate K-Means and nearest-neighbor indexes
//! - **[`models`](models)**: Geometric model types
//! - **[`samplers`](samplers)**: Built-in sampling strategies
//! - **[`scoring`](scoring)**: Truncated MSAC loss
//! - **[`settings`](settings)**: Configuration types for both engines

pub mod api;
pub mod core;
pub mod error;
pub mod estimators;
pub mod kmeans;
pub mod models;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

// Re-export high-level API
pub use api::{cluster, cluster_with, estimate_homography, estimate_line, fit_robust};

// Re-export core traits and results for easy access
pub use core::{Estimator, FnEstimator, Msac, RobustFit, Sampler};
pub use error::{ClusterError, FitError};
pub use kmeans::{ApproxKMeans, KMeansResult, NearestNeighborIndex};

// Re-export settings for convenience
pub use settings::{Initialization, KMeansSettings, MsacSettings};
