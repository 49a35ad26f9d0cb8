//! Configuration types for the fitting and clustering engines.
//!
//! Settings are plain value types owned by the caller. Each carries a
//! `validate` method so that bad configuration is rejected before any work
//! starts.

use crate::error::{ClusterError, FitError};

/// Configuration of an MSAC run.
#[derive(Debug, Clone, PartialEq)]
pub struct MsacSettings {
    /// Residual threshold separating inliers from outliers. Residuals above it
    /// contribute exactly this value to the accumulated distance.
    pub max_distance: f64,
    /// Desired probability in (0, 1) that at least one outlier-free sample is drawn.
    pub confidence: f64,
    /// Upper bound on scored trials. The adaptive bound can only lower it.
    pub max_trials: usize,
    /// Upper bound on trials whose candidate models were all invalid.
    pub max_skip_trials: usize,
    /// Refit the best model from all of its inliers once sampling stops.
    pub recompute_from_inliers: bool,
    /// Fixed seed for reproducible runs. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for MsacSettings {
    fn default() -> Self {
        Self::new(1.0, 0.99, 1000)
    }
}

impl MsacSettings {
    /// Build settings with `max_skip_trials` set to ten times `max_trials`.
    pub fn new(max_distance: f64, confidence: f64, max_trials: usize) -> Self {
        Self {
            max_distance,
            confidence,
            max_trials,
            max_skip_trials: max_trials.saturating_mul(10),
            recompute_from_inliers: false,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_recompute_from_inliers(mut self, recompute: bool) -> Self {
        self.recompute_from_inliers = recompute;
        self
    }

    pub fn with_max_skip_trials(mut self, max_skip_trials: usize) -> Self {
        self.max_skip_trials = max_skip_trials;
        self
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(FitError::InvalidMaxDistance(self.max_distance));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(FitError::InvalidConfidence(self.confidence));
        }
        if self.max_trials == 0 {
            return Err(FitError::InvalidMaxTrials);
        }
        if self.max_skip_trials == 0 {
            return Err(FitError::InvalidMaxSkipTrials);
        }
        Ok(())
    }
}

/// Center seeding strategy for K-Means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Initialization {
    /// K distinct points drawn uniformly.
    Random,
    /// D²-weighted seeding (Arthur & Vassilvitskii).
    #[default]
    KMeansPlusPlus,
}

/// Configuration of an approximate K-Means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansSettings {
    pub max_iterations: usize,
    /// Relative compactness change at or below which a trial stops.
    pub threshold: f64,
    /// Independent restarts; the most compact result is kept.
    pub num_trials: usize,
    pub initialization: Initialization,
    /// Split assignment and center summation across the rayon pool.
    pub use_parallel: bool,
    /// Report per-iteration progress at info level instead of debug.
    pub verbose: bool,
    /// Seed used by [`crate::api::cluster`]. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for KMeansSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            threshold: 1e-4,
            num_trials: 1,
            initialization: Initialization::default(),
            use_parallel: rayon::current_num_threads() > 1,
            verbose: false,
            seed: None,
        }
    }
}

impl KMeansSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn with_initialization(mut self, initialization: Initialization) -> Self {
        self.initialization = initialization;
        self
    }

    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidMaxIterations);
        }
        if self.num_trials == 0 {
            return Err(ClusterError::InvalidNumTrials);
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ClusterError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
