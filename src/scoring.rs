//! Truncated MSAC loss.
//!
//! Each residual contributes `min(residual, max_distance)` to the score, so a
//! single gross outlier can never dominate. Non-finite residuals count as
//! outliers.

/// Score of one model hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsacScore {
    /// Sum of truncated residuals; lower is better.
    pub accumulated_distance: f64,
    /// Residuals strictly below the threshold.
    pub inlier_count: usize,
}

/// Truncated-loss scoring at a fixed inlier threshold.
#[derive(Debug, Clone, Copy)]
pub struct MsacScoring {
    max_distance: f64,
}

impl MsacScoring {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    fn truncate(&self, residual: f64) -> f64 {
        if residual.is_finite() {
            residual.min(self.max_distance)
        } else {
            self.max_distance
        }
    }

    pub fn score(&self, residuals: &[f64]) -> MsacScore {
        let mut accumulated_distance = 0.0;
        let mut inlier_count = 0usize;
        for &r in residuals {
            accumulated_distance += self.truncate(r);
            if self.is_inlier(r) {
                inlier_count += 1;
            }
        }
        MsacScore {
            accumulated_distance,
            inlier_count,
        }
    }

    pub fn is_inlier(&self, residual: f64) -> bool {
        residual < self.max_distance
    }

    pub fn inlier_mask(&self, residuals: &[f64]) -> Vec<bool> {
        residuals.iter().map(|&r| self.is_inlier(r)).collect()
    }
}
