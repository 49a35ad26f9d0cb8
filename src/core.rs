//! Core MSAC traits and the robust fitting loop.
//!
//! The engine is generic over an [`Estimator`] strategy (fit / evaluate /
//! validate) and a [`Sampler`]. It never inspects the model it is fitting.

use std::marker::PhantomData;

use log::{debug, trace, warn};

use crate::error::FitError;
use crate::samplers::UniformRandomSampler;
use crate::scoring::{MsacScore, MsacScoring};
use crate::settings::MsacSettings;
use crate::types::DataMatrix;

/// Strategy producing and judging model hypotheses.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Number of points in a minimal sample.
    fn sample_size(&self) -> usize;

    /// Fit candidate models to the rows listed in `sample`.
    ///
    /// Minimal samples may produce several candidates; an empty vector is
    /// treated like an invalid model. Also called with the full inlier set
    /// when refinement is enabled.
    fn fit(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model>;

    /// Residual of every row of `data` under `model`, in the units of
    /// [`MsacSettings::max_distance`].
    fn evaluate(&self, model: &Self::Model, data: &DataMatrix) -> Vec<f64>;

    /// Structural sanity check (rank, normalisation, finiteness).
    fn is_valid(&self, model: &Self::Model) -> bool;
}

/// Sampler responsible for drawing minimal samples from the data.
pub trait Sampler {
    /// Draw `sample_size` row indices into `out_indices`.
    ///
    /// Returns `false` if a sample could not be drawn.
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool;
}

/// [`Estimator`] assembled from three closures.
///
/// ```rust
/// use consensus::core::{Estimator, FnEstimator};
/// use consensus::types::DataMatrix;
///
/// // Fit a constant to 1-D data: the model is the sampled value itself.
/// let estimator = FnEstimator::new(
///     1,
///     |data: &DataMatrix, sample: &[usize]| vec![data[(sample[0], 0)]],
///     |model: &f64, data: &DataMatrix| data.column(0).iter().map(|v| (v - model).abs()).collect(),
///     |model: &f64| model.is_finite(),
/// );
/// assert_eq!(estimator.sample_size(), 1);
/// ```
pub struct FnEstimator<M, F, V, C> {
    sample_size: usize,
    fit_fn: F,
    eval_fn: V,
    check_fn: C,
    _model: PhantomData<fn() -> M>,
}

impl<M, F, V, C> FnEstimator<M, F, V, C>
where
    M: Clone,
    F: Fn(&DataMatrix, &[usize]) -> Vec<M>,
    V: Fn(&M, &DataMatrix) -> Vec<f64>,
    C: Fn(&M) -> bool,
{
    pub fn new(sample_size: usize, fit_fn: F, eval_fn: V, check_fn: C) -> Self {
        Self {
            sample_size,
            fit_fn,
            eval_fn,
            check_fn,
            _model: PhantomData,
        }
    }
}

impl<M, F, V, C> Estimator for FnEstimator<M, F, V, C>
where
    M: Clone,
    F: Fn(&DataMatrix, &[usize]) -> Vec<M>,
    V: Fn(&M, &DataMatrix) -> Vec<f64>,
    C: Fn(&M) -> bool,
{
    type Model = M;

    fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn fit(&self, data: &DataMatrix, sample: &[usize]) -> Vec<M> {
        (self.fit_fn)(data, sample)
    }

    fn evaluate(&self, model: &M, data: &DataMatrix) -> Vec<f64> {
        (self.eval_fn)(model, data)
    }

    fn is_valid(&self, model: &M) -> bool {
        (self.check_fn)(model)
    }
}

/// Adaptive trial bound from the current inlier ratio.
///
/// Follows `N = log(1 - confidence) / log(1 - inlier_ratio^sample_size)`.
pub struct RansacTerminationCriterion {
    /// Desired confidence in (0, 1).
    pub confidence: f64,
}

impl RansacTerminationCriterion {
    /// Number of trials needed to draw one all-inlier sample with the
    /// configured confidence. `usize::MAX` when the ratio is too small to
    /// give a meaningful bound.
    pub fn required_trials(&self, inlier_ratio: f64, sample_size: usize) -> usize {
        let inlier_ratio = inlier_ratio.clamp(0.0, 1.0);
        let p_good_sample = inlier_ratio.powi(sample_size as i32);
        if p_good_sample < f64::EPSILON {
            return usize::MAX;
        }
        if p_good_sample >= 1.0 {
            return 1;
        }

        let log_one_minus_conf = (1.0 - self.confidence).ln();
        let log_one_minus_p = (1.0 - p_good_sample).ln();
        if !log_one_minus_conf.is_finite() || !log_one_minus_p.is_finite() || log_one_minus_p >= 0.0
        {
            return usize::MAX;
        }

        let required = (log_one_minus_conf / log_one_minus_p).ceil().max(1.0);
        if required >= usize::MAX as f64 {
            usize::MAX
        } else {
            required as usize
        }
    }
}

/// Outcome of a robust fitting run.
#[derive(Debug, Clone)]
pub struct RobustFit<M> {
    /// Whether a valid model with enough inliers was found.
    pub found: bool,
    /// The best model; `None` whenever `found` is `false`.
    pub model: Option<M>,
    /// One flag per input row; all `false` when nothing was found.
    pub inliers: Vec<bool>,
    /// Sampling stopped because too many trials produced only invalid models.
    pub reached_skip_limit: bool,
    /// Every allowed trial ran without the adaptive bound ever shrinking.
    pub reached_max_trials: bool,
    /// Scored trials performed.
    pub trials: usize,
    /// Trials skipped because every candidate model was invalid.
    pub skipped_trials: usize,
    /// Accumulated truncated distance of the returned model.
    pub best_distance: f64,
}

impl<M> RobustFit<M> {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&is_inlier| is_inlier).count()
    }

    /// Row indices of the inliers.
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.inliers
            .iter()
            .enumerate()
            .filter_map(|(i, &is_inlier)| is_inlier.then_some(i))
            .collect()
    }
}

struct Candidate<M> {
    model: M,
    residuals: Vec<f64>,
    score: MsacScore,
}

/// MSAC engine: samples minimal sets, scores candidates with a truncated
/// loss and keeps the model with the lowest accumulated distance.
pub struct Msac<E, S = UniformRandomSampler>
where
    E: Estimator,
    S: Sampler,
{
    pub settings: MsacSettings,
    pub estimator: E,
    pub sampler: S,
    default_model: Option<E::Model>,

    /// Best accumulated distance after each improvement of the last run.
    pub best_distance_history: Vec<f64>,
}

impl<E> Msac<E, UniformRandomSampler>
where
    E: Estimator,
{
    /// Engine with a uniform sampler seeded from `settings.seed`.
    pub fn new(settings: MsacSettings, estimator: E) -> Self {
        let sampler = match settings.seed {
            Some(seed) => UniformRandomSampler::from_seed(seed),
            None => UniformRandomSampler::new(),
        };
        Self::with_sampler(settings, estimator, sampler)
    }
}

impl<E, S> Msac<E, S>
where
    E: Estimator,
    S: Sampler,
{
    pub fn with_sampler(settings: MsacSettings, estimator: E, sampler: S) -> Self {
        Self {
            settings,
            estimator,
            sampler,
            default_model: None,
            best_distance_history: Vec::new(),
        }
    }

    /// Model reported when no sampled candidate beats the worst-case distance.
    pub fn with_default_model(mut self, model: E::Model) -> Self {
        self.default_model = Some(model);
        self
    }

    /// Run MSAC on `data`.
    ///
    /// Errors only on invalid settings or too few rows; failing to find a
    /// model is reported through [`RobustFit::found`].
    pub fn run(&mut self, data: &DataMatrix) -> Result<RobustFit<E::Model>, FitError> {
        self.settings.validate()?;
        let sample_size = self.estimator.sample_size();
        if sample_size == 0 {
            return Err(FitError::InvalidSampleSize);
        }
        let n = data.nrows();
        if n < sample_size {
            return Err(FitError::InsufficientPoints {
                points: n,
                sample_size,
            });
        }

        let scoring = MsacScoring::new(self.settings.max_distance);
        let termination = RansacTerminationCriterion {
            confidence: self.settings.confidence,
        };
        let max_skip_trials = self.settings.max_skip_trials;

        let mut best_distance = self.settings.max_distance * n as f64;
        let mut best_model = self.default_model.clone();
        let mut best_inliers = vec![false; n];
        let mut best_inlier_count = 0usize;

        let mut max_trials = self.settings.max_trials;
        let mut trial = 1usize;
        let mut skipped = 0usize;
        let mut sample = vec![0usize; sample_size];
        self.best_distance_history.clear();

        while trial <= max_trials && skipped < max_skip_trials {
            if !self.sampler.sample(data, sample_size, &mut sample) {
                skipped += 1;
                continue;
            }

            let models = self.estimator.fit(data, &sample);
            let Some(candidate) = self.select_candidate(data, models, &scoring) else {
                skipped += 1;
                continue;
            };

            if candidate.score.accumulated_distance < best_distance {
                best_distance = candidate.score.accumulated_distance;
                best_inliers = scoring.inlier_mask(&candidate.residuals);
                best_inlier_count = candidate.score.inlier_count;
                best_model = Some(candidate.model);
                self.best_distance_history.push(best_distance);

                let inlier_ratio = best_inlier_count as f64 / n as f64;
                let required = termination.required_trials(inlier_ratio, sample_size);
                max_trials = max_trials.min(required);
                trace!(
                    "trial {trial}: distance {best_distance:.6}, {best_inlier_count} inliers, budget {max_trials}"
                );
            }

            trial += 1;
        }

        let trials = trial - 1;
        let reached_skip_limit = skipped >= max_skip_trials;
        let reached_max_trials =
            max_trials == self.settings.max_trials && trials >= self.settings.max_trials;
        if reached_max_trials {
            warn!(
                "MSAC used all {} trials; the model may be unreliable, consider raising max_trials or max_distance",
                self.settings.max_trials
            );
        }
        if reached_skip_limit {
            warn!("MSAC stopped after {skipped} trials produced no valid model");
        }

        let mut found = best_model
            .as_ref()
            .is_some_and(|model| self.estimator.is_valid(model))
            && best_inlier_count > 0
            && best_inlier_count >= sample_size;

        if found && self.settings.recompute_from_inliers {
            let inlier_indices: Vec<usize> = best_inliers
                .iter()
                .enumerate()
                .filter_map(|(i, &is_inlier)| is_inlier.then_some(i))
                .collect();
            let refit = self.estimator.fit(data, &inlier_indices);
            match self.select_candidate(data, refit, &scoring) {
                Some(candidate) if candidate.score.inlier_count > 0 => {
                    best_distance = candidate.score.accumulated_distance;
                    best_inliers = scoring.inlier_mask(&candidate.residuals);
                    best_inlier_count = candidate.score.inlier_count;
                    best_model = Some(candidate.model);
                }
                _ => {
                    debug!("refit from {} inliers produced no valid model", inlier_indices.len());
                    found = false;
                }
            }
        }

        debug!(
            "MSAC finished: found={found}, trials={trials}, skipped={skipped}, inliers={best_inlier_count}/{n}"
        );

        if !found {
            return Ok(RobustFit {
                found,
                model: None,
                inliers: vec![false; n],
                reached_skip_limit,
                reached_max_trials,
                trials,
                skipped_trials: skipped,
                best_distance,
            });
        }

        Ok(RobustFit {
            found,
            model: best_model,
            inliers: best_inliers,
            reached_skip_limit,
            reached_max_trials,
            trials,
            skipped_trials: skipped,
            best_distance,
        })
    }

    /// Pick the valid candidate with the lowest accumulated distance.
    fn select_candidate(
        &self,
        data: &DataMatrix,
        models: Vec<E::Model>,
        scoring: &MsacScoring,
    ) -> Option<Candidate<E::Model>> {
        let n = data.nrows();
        let mut best: Option<Candidate<E::Model>> = None;

        for model in models {
            if !self.estimator.is_valid(&model) {
                continue;
            }
            let residuals = self.estimator.evaluate(&model, data);
            if residuals.len() != n {
                debug!(
                    "discarding candidate: {} residuals for {n} points",
                    residuals.len()
                );
                continue;
            }
            let score = scoring.score(&residuals);
            let better = best
                .as_ref()
                .map_or(true, |b| score.accumulated_distance < b.score.accumulated_distance);
            if better {
                best = Some(Candidate {
                    model,
                    residuals,
                    score,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-column data; the model is a constant and residuals are absolute offsets.
    fn constant_estimator() -> FnEstimator<
        f64,
        impl Fn(&DataMatrix, &[usize]) -> Vec<f64>,
        impl Fn(&f64, &DataMatrix) -> Vec<f64>,
        impl Fn(&f64) -> bool,
    > {
        FnEstimator::new(
            1,
            |data: &DataMatrix, sample: &[usize]| {
                let sum: f64 = sample.iter().map(|&i| data[(i, 0)]).sum();
                vec![sum / sample.len() as f64]
            },
            |model: &f64, data: &DataMatrix| {
                data.column(0).iter().map(|v| (v - model).abs()).collect()
            },
            |model: &f64| model.is_finite(),
        )
    }

    fn constant_data() -> DataMatrix {
        // Eight points near 5.0 and two gross outliers.
        DataMatrix::from_column_slice(
            10,
            1,
            &[5.0, 5.01, 4.99, 5.02, 4.98, 5.0, 5.01, 4.99, 40.0, -30.0],
        )
    }

    #[test]
    fn required_trials_matches_formula() {
        let criterion = RansacTerminationCriterion { confidence: 0.99 };
        // w = 0.5, s = 2: log(0.01) / log(0.75) = 16.008 -> 17
        assert_eq!(criterion.required_trials(0.5, 2), 17);
        assert_eq!(criterion.required_trials(1.0, 4), 1);
        assert_eq!(criterion.required_trials(0.0, 2), usize::MAX);
    }

    #[test]
    fn required_trials_shrinks_with_better_ratio() {
        let criterion = RansacTerminationCriterion { confidence: 0.999 };
        let low = criterion.required_trials(0.3, 4);
        let high = criterion.required_trials(0.8, 4);
        assert!(high < low);
    }

    #[test]
    fn msac_fits_constant_and_rejects_outliers() {
        let data = constant_data();
        let settings = MsacSettings::new(0.1, 0.99, 100).with_seed(3);
        let mut msac = Msac::new(settings, constant_estimator());
        let fit = msac.run(&data).unwrap();

        assert!(fit.found);
        assert!((fit.model.unwrap() - 5.0).abs() < 0.05);
        assert_eq!(fit.inlier_count(), 8);
        assert!(!fit.inliers[8] && !fit.inliers[9]);
    }

    #[test]
    fn insufficient_points_is_an_error() {
        let data = DataMatrix::zeros(1, 1);
        let estimator = FnEstimator::new(
            2,
            |_: &DataMatrix, _: &[usize]| -> Vec<f64> { panic!("fit must not be called") },
            |_: &f64, data: &DataMatrix| vec![0.0; data.nrows()],
            |_: &f64| true,
        );
        let mut msac = Msac::new(MsacSettings::default(), estimator);
        let err = msac.run(&data).unwrap_err();
        assert_eq!(
            err,
            FitError::InsufficientPoints {
                points: 1,
                sample_size: 2
            }
        );
    }

    #[test]
    fn invalid_models_hit_skip_limit_without_error() {
        let data = constant_data();
        let estimator = FnEstimator::new(
            1,
            |_: &DataMatrix, _: &[usize]| vec![f64::NAN],
            |model: &f64, data: &DataMatrix| vec![*model; data.nrows()],
            |model: &f64| model.is_finite(),
        );
        let settings = MsacSettings::new(0.1, 0.99, 20).with_seed(1);
        let mut msac = Msac::new(settings, estimator);
        let fit = msac.run(&data).unwrap();

        assert!(!fit.found);
        assert!(fit.model.is_none());
        assert!(fit.reached_skip_limit);
        assert_eq!(fit.trials, 0);
        assert_eq!(fit.skipped_trials, 200);
        assert!(fit.inliers.iter().all(|&v| !v));
    }

    #[test]
    fn lowest_distance_candidate_wins_in_multi_model_fit() {
        let data = constant_data();
        // Every sample proposes a bad candidate first and the true one second.
        let estimator = FnEstimator::new(
            1,
            |data: &DataMatrix, sample: &[usize]| vec![100.0, data[(sample[0], 0)]],
            |model: &f64, data: &DataMatrix| {
                data.column(0).iter().map(|v| (v - model).abs()).collect()
            },
            |model: &f64| model.is_finite(),
        );
        let settings = MsacSettings::new(0.1, 0.99, 50).with_seed(11);
        let fit = Msac::new(settings, estimator).run(&data).unwrap();
        assert!(fit.found);
        assert!((fit.model.unwrap() - 5.0).abs() < 0.05);
    }

    #[test]
    fn best_distance_history_is_non_increasing() {
        let data = constant_data();
        let settings = MsacSettings::new(0.1, 0.99, 200).with_seed(5);
        let mut msac = Msac::new(settings, constant_estimator());
        msac.run(&data).unwrap();

        assert!(!msac.best_distance_history.is_empty());
        for pair in msac.best_distance_history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn refinement_refits_from_all_inliers() {
        let data = constant_data();
        let settings = MsacSettings::new(0.1, 0.99, 100)
            .with_seed(9)
            .with_recompute_from_inliers(true);
        let fit = Msac::new(settings, constant_estimator()).run(&data).unwrap();

        assert!(fit.found);
        // Mean of the eight inliers.
        assert!((fit.model.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(fit.inlier_count(), 8);
    }

    #[test]
    fn failed_refinement_reports_not_found() {
        let data = constant_data();
        // Minimal samples fit fine, larger samples yield an invalid model.
        let estimator = FnEstimator::new(
            1,
            |data: &DataMatrix, sample: &[usize]| {
                if sample.len() == 1 {
                    vec![data[(sample[0], 0)]]
                } else {
                    vec![f64::INFINITY]
                }
            },
            |model: &f64, data: &DataMatrix| {
                data.column(0).iter().map(|v| (v - model).abs()).collect()
            },
            |model: &f64| model.is_finite(),
        );
        let settings = MsacSettings::new(0.1, 0.99, 100)
            .with_seed(2)
            .with_recompute_from_inliers(true);
        let fit = Msac::new(settings, estimator).run(&data).unwrap();
        assert!(!fit.found);
        assert!(fit.model.is_none());
        assert_eq!(fit.inlier_count(), 0);
    }

    #[test]
    fn exhausting_the_budget_sets_advisory_flag() {
        // A zero threshold never beats the initial worst-case distance of 0,
        // so the adaptive bound never shrinks.
        let data = constant_data();
        let settings = MsacSettings::new(0.0, 0.99, 30).with_seed(4);
        let fit = Msac::new(settings, constant_estimator()).run(&data).unwrap();

        assert!(fit.reached_max_trials);
        assert!(!fit.reached_skip_limit);
        assert_eq!(fit.trials, 30);
        assert!(!fit.found);
    }

    #[test]
    fn default_model_without_inliers_is_not_found() {
        let data = constant_data();
        let estimator = FnEstimator::new(
            1,
            |_: &DataMatrix, _: &[usize]| Vec::<f64>::new(),
            |model: &f64, data: &DataMatrix| {
                data.column(0).iter().map(|v| (v - model).abs()).collect()
            },
            |model: &f64| model.is_finite(),
        );
        let settings = MsacSettings::new(0.1, 0.99, 5).with_seed(8);
        let fit = Msac::new(settings, estimator)
            .with_default_model(5.0)
            .run(&data)
            .unwrap();
        assert!(!fit.found);
        assert!(fit.reached_skip_limit);
    }
}
