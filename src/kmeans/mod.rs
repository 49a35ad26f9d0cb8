//! Approximate K-Means clustering.
//!
//! Each iteration assigns every feature to its nearest center through a
//! [`NearestNeighborIndex`], then recomputes centers as member means. Empty
//! clusters are refilled from the worst-assigned features, and a trial stops
//! once the relative change in compactness (sum of squared distances) drops
//! to the configured threshold.
//!
//! ```rust
//! use consensus::kmeans::{ApproxKMeans, BruteForceIndex};
//! use consensus::settings::KMeansSettings;
//! use consensus::types::FeatureMatrix;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let features = FeatureMatrix::from_row_slice(4, 2, &[0.0, 0.0, 0.1, 0.1, 10.0, 10.0, 10.1, 10.1]);
//! let mut index = BruteForceIndex::new();
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = ApproxKMeans::new(KMeansSettings::default())
//!     .cluster(&features, 2, &mut index, &mut rng)
//!     .unwrap();
//! assert_eq!(result.assignments[0], result.assignments[1]);
//! assert_ne!(result.assignments[0], result.assignments[2]);
//! ```

mod assign;
pub mod index;
mod init;
mod update;

use std::ops::Range;

use log::{debug, info, warn};
use rand::Rng;

use crate::error::ClusterError;
use crate::settings::{Initialization, KMeansSettings};
use crate::types::FeatureMatrix;

pub use index::{BruteForceIndex, NearestNeighborIndex, UsearchIndex};

/// Finite feature rows in row-major order.
pub(crate) struct Rows {
    pub values: Vec<f32>,
    pub dims: usize,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.values.len() / self.dims
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.dims..(i + 1) * self.dims]
    }
}

pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum()
}

/// Exact nearest center by linear scan; ties go to the lowest label.
pub(crate) fn exact_nearest(query: &[f32], centers: &[f32], dims: usize) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (label, center) in centers.chunks_exact(dims).enumerate() {
        let d = squared_distance(query, center);
        if d < best.1 {
            best = (label, d);
        }
    }
    best
}

/// Split `0..n` into at most `chunks` contiguous ranges of near-equal size.
pub(crate) fn chunk_ranges(n: usize, chunks: usize) -> Vec<Range<usize>> {
    let chunks = chunks.clamp(1, n.max(1));
    let size = n.div_ceil(chunks).max(1);
    (0..n)
        .step_by(size)
        .map(|start| start..(start + size).min(n))
        .collect()
}

fn relative_change(previous: f64, current: f64) -> f64 {
    if previous == current {
        return 0.0;
    }
    (previous - current).abs() / current.max(f64::MIN_POSITIVE)
}

/// Outcome of a clustering run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// `K × D` cluster centers.
    pub centers: FeatureMatrix,
    /// Cluster of every input row; `None` for rows dropped as non-finite.
    pub assignments: Vec<Option<usize>>,
    /// Squared distance of every input row to its center.
    pub distances: Vec<Option<f64>>,
    /// Sum of squared distances over the assigned rows.
    pub compactness: f64,
    /// Iterations run by the retained trial.
    pub iterations: usize,
    /// Whether the retained trial met the threshold before `max_iterations`.
    pub converged: bool,
    /// Input rows dropped because they contained non-finite values.
    pub dropped: Vec<usize>,
}

impl KMeansResult {
    /// Number of rows assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centers.nrows()];
        for label in self.assignments.iter().flatten() {
            sizes[*label] += 1;
        }
        sizes
    }
}

struct Trial {
    centers: Vec<f32>,
    labels: Vec<usize>,
    distances: Vec<f64>,
    compactness: f64,
    iterations: usize,
    converged: bool,
}

/// Approximate K-Means engine configured once and reused across calls.
#[derive(Debug, Clone, Default)]
pub struct ApproxKMeans {
    pub settings: KMeansSettings,
}

impl ApproxKMeans {
    pub fn new(settings: KMeansSettings) -> Self {
        Self { settings }
    }

    /// Cluster the rows of `features` into `k` groups.
    ///
    /// Runs `settings.num_trials` independently seeded trials and keeps the
    /// most compact one.
    pub fn cluster<I, R>(
        &self,
        features: &FeatureMatrix,
        k: usize,
        index: &mut I,
        rng: &mut R,
    ) -> Result<KMeansResult, ClusterError>
    where
        I: NearestNeighborIndex + ?Sized,
        R: Rng + ?Sized,
    {
        let (rows, retained, dropped) = self.prepare(features, k)?;

        let mut best: Option<Trial> = None;
        for trial in 0..self.settings.num_trials {
            let centers = match self.settings.initialization {
                Initialization::Random => init::random_centers(&rows, k, rng),
                Initialization::KMeansPlusPlus => init::plus_plus_centers(&rows, k, rng),
            };
            let result = self.run_trial(&rows, k, centers, index)?;
            debug!(
                "k-means trial {}/{}: compactness {:.6e} after {} iterations",
                trial + 1,
                self.settings.num_trials,
                result.compactness,
                result.iterations
            );
            if best
                .as_ref()
                .map_or(true, |b| result.compactness < b.compactness)
            {
                best = Some(result);
            }
        }

        // num_trials >= 1 is validated in prepare.
        let best = best.ok_or(ClusterError::InvalidNumTrials)?;
        Ok(self.finish(features.nrows(), rows.dims, best, &retained, dropped))
    }

    /// Continue clustering from caller-provided `initial` centers (one trial,
    /// no seeding).
    pub fn cluster_from<I>(
        &self,
        features: &FeatureMatrix,
        initial: &FeatureMatrix,
        index: &mut I,
    ) -> Result<KMeansResult, ClusterError>
    where
        I: NearestNeighborIndex + ?Sized,
    {
        let k = initial.nrows();
        if initial.ncols() != features.ncols() {
            return Err(ClusterError::CenterDimensionMismatch {
                expected: features.ncols(),
                actual: initial.ncols(),
            });
        }
        let (rows, retained, dropped) = self.prepare(features, k)?;

        let mut centers = Vec::with_capacity(k * rows.dims);
        for row in initial.row_iter() {
            centers.extend(row.iter());
        }
        let trial = self.run_trial(&rows, k, centers, index)?;
        Ok(self.finish(features.nrows(), rows.dims, trial, &retained, dropped))
    }

    /// Validate inputs and collect the finite rows.
    fn prepare(
        &self,
        features: &FeatureMatrix,
        k: usize,
    ) -> Result<(Rows, Vec<usize>, Vec<usize>), ClusterError> {
        self.settings.validate()?;
        if k == 0 {
            return Err(ClusterError::InvalidClusterCount);
        }
        let n = features.nrows();
        let dims = features.ncols();
        if dims == 0 {
            return Err(ClusterError::EmptyFeatureDimension);
        }
        if n < k {
            return Err(ClusterError::InsufficientFeatures {
                features: n,
                clusters: k,
            });
        }

        let mut values = Vec::with_capacity(n * dims);
        let mut retained = Vec::with_capacity(n);
        let mut dropped = Vec::new();
        for (i, row) in features.row_iter().enumerate() {
            if row.iter().all(|v| v.is_finite()) {
                values.extend(row.iter());
                retained.push(i);
            } else {
                dropped.push(i);
            }
        }

        if retained.is_empty() {
            return Err(ClusterError::NoValidFeatures);
        }
        if retained.len() < k {
            return Err(ClusterError::TooFewValidFeatures {
                valid: retained.len(),
                clusters: k,
            });
        }
        if !dropped.is_empty() {
            warn!(
                "dropping {} of {n} features with non-finite values",
                dropped.len()
            );
        }

        Ok((Rows { values, dims }, retained, dropped))
    }

    fn run_trial<I>(
        &self,
        rows: &Rows,
        k: usize,
        mut centers: Vec<f32>,
        index: &mut I,
    ) -> Result<Trial, ClusterError>
    where
        I: NearestNeighborIndex + ?Sized,
    {
        let dims = rows.dims;
        let use_parallel = self.settings.use_parallel;
        let mut labels: Option<Vec<usize>> = None;
        let mut previous = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        for iteration in 1..=self.settings.max_iterations {
            index.build(&FeatureMatrix::from_row_slice(k, dims, &centers))?;
            let assignment =
                assign::assign(rows, &centers, &*index, labels.as_deref(), use_parallel);
            let mut current_labels = assignment.labels;
            let mut distances = assignment.distances;

            let mut sums = update::accumulate(rows, &current_labels, k, use_parallel);
            let repaired =
                update::repair_empty_clusters(rows, &mut current_labels, &mut distances, &mut sums);
            centers = sums.centers();

            let compactness: f64 = distances.iter().sum();
            let change = relative_change(previous, compactness);
            iterations = iteration;
            labels = Some(current_labels);

            if self.settings.verbose {
                info!(
                    "k-means iteration {iteration}: compactness {compactness:.6e}, relative change {change:.3e}, repaired {repaired}"
                );
            } else {
                debug!(
                    "k-means iteration {iteration}: compactness {compactness:.6e}, relative change {change:.3e}, repaired {repaired}"
                );
            }

            if change <= self.settings.threshold {
                converged = true;
                break;
            }
            previous = compactness;
        }

        if !converged {
            warn!(
                "k-means stopped at max_iterations ({}) before reaching threshold {}",
                self.settings.max_iterations, self.settings.threshold
            );
        }

        let labels = labels.unwrap_or_default();
        // Final distances against the updated centers.
        let distances: Vec<f64> = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                squared_distance(rows.row(i), &centers[label * dims..(label + 1) * dims])
            })
            .collect();
        let compactness = distances.iter().sum();

        Ok(Trial {
            centers,
            labels,
            distances,
            compactness,
            iterations,
            converged,
        })
    }

    fn finish(
        &self,
        n: usize,
        dims: usize,
        trial: Trial,
        retained: &[usize],
        dropped: Vec<usize>,
    ) -> KMeansResult {
        let mut assignments = vec![None; n];
        let mut distances = vec![None; n];
        for (pos, &row) in retained.iter().enumerate() {
            assignments[row] = Some(trial.labels[pos]);
            distances[row] = Some(trial.distances[pos]);
        }
        let k = trial.centers.len() / dims;

        KMeansResult {
            centers: FeatureMatrix::from_row_slice(k, dims, &trial.centers),
            assignments,
            distances,
            compactness: trial.compactness,
            iterations: trial.iterations,
            converged: trial.converged,
            dropped,
        }
    }
}
