//! The parallel Monte Carlo engine.
//!
//! Each trial is a pure function of (process, note, per-trial random
//! substream) and shares no mutable state with any other trial, so the
//! batch fans out over a dedicated rayon pool. Trial i draws from
//! `PathRng::from_seed(base_seed + i)` - reproducible and race-free by
//! construction, and the reduction (mean, percentiles) is
//! order-independent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use note_core::error::ConfigError;
use note_core::math::CorrelationMatrix;
use note_core::rng::{CorrelatedNormals, PathRng};
use note_core::Path;
use note_models::simulate::{simulate_fx_legs, PathStepper};
use note_models::{FxInterventionProcess, StochasticProcess};
use rayon::prelude::*;
use tracing::{info, warn};

use super::config::MonteCarloConfig;
use super::error::SimulationError;
use super::result::SimulationResult;
use crate::note::NoteConfig;
use crate::payoff::{EvalError, PathOutcome, PayoffEvaluator};

/// Shared early-abort handle for a running batch.
///
/// Completed trials remain valid after a cancellation; the aggregator
/// reports statistics over whatever subset finished.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the batch to stop dispatching further trials.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Parallel Monte Carlo pricing engine.
///
/// # Examples
///
/// ```rust
/// use note_models::{GbmProcess, ProcessParameters};
/// use note_pricing::mc::{MonteCarloConfig, MonteCarloEngine};
/// use note_pricing::note::{CappedKnockInNote, NoteConfig};
/// use note_pricing::payoff::PayoffEvaluator;
///
/// let params = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap();
/// let process = GbmProcess::new(params);
/// let evaluator = PayoffEvaluator::new(NoteConfig::CappedKnockIn(CappedKnockInNote {
///     principal: 100.0,
///     cap_return: 0.30,
///     knock_in_return: 0.20,
///     initial_margin: 10.0,
///     maintenance_margin: 5.0,
/// }))
/// .unwrap();
///
/// let config = MonteCarloConfig::builder()
///     .num_paths(2_000)
///     .seed(42)
///     .build()
///     .unwrap();
/// let engine = MonteCarloEngine::new(config).unwrap();
/// let result = engine.price_note(&process, &evaluator).unwrap();
/// assert_eq!(result.completed(), 2_000);
/// ```
pub struct MonteCarloEngine {
    config: MonteCarloConfig,
    pool: rayon::ThreadPool,
    cancel: CancelToken,
}

impl MonteCarloEngine {
    /// Builds the engine and its worker pool.
    ///
    /// The pool is sized to `config.workers()` when set, otherwise to the
    /// machine's available CPU parallelism.
    ///
    /// # Errors
    ///
    /// Propagates configuration validation failures.
    pub fn new(config: MonteCarloConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let workers = config.workers().unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ConfigError::Inconsistent {
                detail: format!("failed to build worker pool: {e}"),
            })?;
        Ok(Self {
            config,
            pool,
            cancel: CancelToken::new(),
        })
    }

    /// The batch configuration.
    #[inline]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// A handle for requesting an early abort of the running batch.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Prices a single-underlying note: M independent simulate-then-
    /// evaluate trials.
    ///
    /// The margin family is evaluated fused with the simulator so a forced
    /// liquidation stops path generation at the terminal step.
    ///
    /// # Errors
    ///
    /// See [`SimulationError`].
    pub fn price_note<P>(
        &self,
        process: &P,
        evaluator: &PayoffEvaluator,
    ) -> Result<SimulationResult, SimulationError>
    where
        P: StochasticProcess + Sync,
    {
        let discount_factor = self.discount_factor(process.parameters().horizon);
        self.run_trials(discount_factor, |_, rng, keep_path| {
            let stepper = PathStepper::new(process, rng);
            let (outcome, path) = evaluator.evaluate_stepped(stepper)?;
            Ok((outcome, keep_path.then_some(path)))
        })
    }

    /// Prices a multi-leg FX arbitrage note over correlated legs.
    ///
    /// Leg-set consistency (count, step alignment, correlation dimension)
    /// is checked before the first trial; a non-positive-definite
    /// correlation matrix degrades to uncorrelated sampling with a
    /// warning.
    ///
    /// # Errors
    ///
    /// See [`SimulationError`].
    pub fn price_fx_note(
        &self,
        legs: &[FxInterventionProcess],
        correlation: Option<&CorrelationMatrix>,
        evaluator: &PayoffEvaluator,
    ) -> Result<SimulationResult, SimulationError> {
        let expected_legs = match evaluator.config() {
            NoteConfig::FxArbitrage(cfg) => cfg.legs,
            other => {
                return Err(ConfigError::Inconsistent {
                    detail: format!(
                        "price_fx_note requires an fx_arbitrage note, got '{}'",
                        other.family()
                    ),
                }
                .into())
            }
        };
        if legs.len() != expected_legs {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "note expects {} legs, {} processes supplied",
                    expected_legs,
                    legs.len()
                ),
            }
            .into());
        }
        let n_steps = legs[0].parameters().n_steps;
        if legs.iter().any(|leg| leg.parameters().n_steps != n_steps) {
            return Err(ConfigError::Inconsistent {
                detail: "all FX legs must share the same step count".to_string(),
            }
            .into());
        }
        let sampler = match correlation {
            Some(matrix) => {
                if matrix.dim() != legs.len() {
                    return Err(ConfigError::Inconsistent {
                        detail: format!(
                            "correlation dimension ({}) does not match leg count ({})",
                            matrix.dim(),
                            legs.len()
                        ),
                    }
                    .into());
                }
                CorrelatedNormals::new(matrix)
            }
            None => CorrelatedNormals::independent(legs.len()),
        };

        let discount_factor = self.discount_factor(legs[0].parameters().horizon);
        self.run_trials(discount_factor, |_, rng, keep_path| {
            let paths = simulate_fx_legs(legs, &sampler, rng)
                .map_err(|e| EvalError::LegSimulation {
                    detail: e.to_string(),
                })?;
            let outcome = evaluator.evaluate_legs(&paths)?;
            let example = keep_path.then(|| paths.into_iter().next()).flatten();
            Ok((outcome, example))
        })
    }

    /// Runs M independent trials of an arbitrary simulate-then-evaluate
    /// closure.
    ///
    /// The closure receives the trial index, its private substream and
    /// whether it should return its path for the bounded example-path
    /// export.
    ///
    /// # Errors
    ///
    /// See [`SimulationError`].
    pub fn run_trials<F>(
        &self,
        discount_factor: f64,
        trial: F,
    ) -> Result<SimulationResult, SimulationError>
    where
        F: Fn(usize, &mut PathRng, bool) -> Result<(PathOutcome, Option<Path>), EvalError> + Sync,
    {
        let requested = self.config.num_paths();
        let base_seed = self.config.seed().unwrap_or(0);
        let keep = self.config.example_paths();
        let cancel = &self.cancel;

        let raw: Vec<Option<Result<(PathOutcome, Option<Path>), EvalError>>> =
            self.pool.install(|| {
                (0..requested)
                    .into_par_iter()
                    .map(|i| {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        let mut rng = PathRng::from_seed(base_seed.wrapping_add(i as u64));
                        Some(trial(i, &mut rng, i < keep))
                    })
                    .collect()
            });

        let mut payoffs = Vec::with_capacity(requested);
        let mut outcomes = Vec::with_capacity(requested);
        let mut example_paths = Vec::with_capacity(keep);
        let mut failed = 0usize;
        let mut cancelled = 0usize;

        for entry in raw {
            match entry {
                None => cancelled += 1,
                Some(Err(_)) => failed += 1,
                Some(Ok((outcome, path))) => {
                    payoffs.push(outcome.payoff);
                    outcomes.push(outcome);
                    if let Some(path) = path {
                        if example_paths.len() < keep {
                            example_paths.push(path);
                        }
                    }
                }
            }
        }

        let attempted = requested - cancelled;
        if payoffs.is_empty() {
            return Err(SimulationError::NoCompletedTrials { requested });
        }

        let threshold = self.config.max_failure_fraction();
        if attempted > 0 && failed as f64 / attempted as f64 > threshold {
            return Err(SimulationError::AggregationIntegrity {
                failed,
                attempted,
                threshold,
            });
        }
        if failed > 0 {
            warn!(
                failed,
                attempted, "excluded failed trials from aggregation"
            );
        }

        info!(
            requested,
            completed = payoffs.len(),
            failed,
            cancelled,
            "Monte Carlo batch complete"
        );

        Ok(SimulationResult::new(
            payoffs,
            outcomes,
            example_paths,
            requested,
            failed,
            cancelled,
            discount_factor,
        ))
    }

    fn discount_factor(&self, horizon: f64) -> f64 {
        self.config
            .discount_rate()
            .map(|r| (-r * horizon).exp())
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{CappedKnockInNote, FxArbitrageNote};
    use approx::assert_relative_eq;
    use note_models::{GbmProcess, ProcessParameters};

    fn capped_evaluator() -> PayoffEvaluator {
        PayoffEvaluator::new(NoteConfig::CappedKnockIn(CappedKnockInNote {
            principal: 100.0,
            cap_return: 0.30,
            knock_in_return: 0.20,
            initial_margin: 10.0,
            maintenance_margin: 5.0,
        }))
        .unwrap()
    }

    fn engine(num_paths: usize, seed: u64) -> MonteCarloEngine {
        let config = MonteCarloConfig::builder()
            .num_paths(num_paths)
            .seed(seed)
            .build()
            .unwrap();
        MonteCarloEngine::new(config).unwrap()
    }

    fn gbm() -> GbmProcess {
        GbmProcess::new(ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap())
    }

    #[test]
    fn test_reproducible_payoff_sequence() {
        let process = gbm();
        let evaluator = capped_evaluator();
        let a = engine(500, 42).price_note(&process, &evaluator).unwrap();
        let b = engine(500, 42).price_note(&process, &evaluator).unwrap();
        assert_eq!(a.payoffs(), b.payoffs());
    }

    #[test]
    fn test_different_seeds_differ() {
        let process = gbm();
        let evaluator = capped_evaluator();
        let a = engine(500, 42).price_note(&process, &evaluator).unwrap();
        let b = engine(500, 43).price_note(&process, &evaluator).unwrap();
        assert_ne!(a.payoffs(), b.payoffs());
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let process = gbm();
        let evaluator = capped_evaluator();

        let serial = MonteCarloEngine::new(
            MonteCarloConfig::builder()
                .num_paths(300)
                .seed(42)
                .workers(1)
                .build()
                .unwrap(),
        )
        .unwrap();
        let parallel = MonteCarloEngine::new(
            MonteCarloConfig::builder()
                .num_paths(300)
                .seed(42)
                .workers(4)
                .build()
                .unwrap(),
        )
        .unwrap();

        let a = serial.price_note(&process, &evaluator).unwrap();
        let b = parallel.price_note(&process, &evaluator).unwrap();
        assert_eq!(a.payoffs(), b.payoffs());
        assert_eq!(a.expected_value(), b.expected_value());
    }

    #[test]
    fn test_example_paths_bounded() {
        let process = gbm();
        let evaluator = capped_evaluator();
        let result = engine(100, 42).price_note(&process, &evaluator).unwrap();
        assert_eq!(result.example_paths().len(), 4);
        for path in result.example_paths() {
            assert!(path.len() >= 2);
        }
    }

    #[test]
    fn test_cancel_before_run_yields_no_trials() {
        let process = gbm();
        let evaluator = capped_evaluator();
        let eng = engine(100, 42);
        eng.cancel_token().cancel();
        let err = eng.price_note(&process, &evaluator).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NoCompletedTrials { requested: 100 }
        ));
    }

    #[test]
    fn test_cancel_mid_run_keeps_partial_results() {
        let eng = MonteCarloEngine::new(
            MonteCarloConfig::builder()
                .num_paths(10_000)
                .seed(42)
                .workers(1)
                .build()
                .unwrap(),
        )
        .unwrap();
        let token = eng.cancel_token();

        let result = eng
            .run_trials(1.0, |i, _rng, _keep| {
                if i == 50 {
                    token.cancel();
                }
                Ok((
                    PathOutcome {
                        payoff: i as f64,
                        ..PathOutcome::default()
                    },
                    None,
                ))
            })
            .unwrap();

        assert!(result.completed() >= 1);
        assert!(result.cancelled() > 0, "later trials were skipped");
        assert_eq!(result.completed() + result.cancelled(), 10_000);
    }

    #[test]
    fn test_failed_trials_are_excluded_not_zeroed() {
        let eng = engine(100, 42);
        let result = eng
            .run_trials(1.0, |i, _rng, _keep| {
                // One failure in 100 sits exactly on the default threshold.
                if i == 7 {
                    Err(EvalError::NonFinitePayoff)
                } else {
                    Ok((
                        PathOutcome {
                            payoff: 10.0,
                            ..PathOutcome::default()
                        },
                        None,
                    ))
                }
            })
            .unwrap();

        assert_eq!(result.completed(), 99);
        assert_eq!(result.failed(), 1);
        // The excluded trial must not bias the mean towards zero.
        assert_relative_eq!(result.expected_value(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_failure_threshold_escalates() {
        let eng = engine(100, 42);
        let err = eng
            .run_trials(1.0, |i, _rng, _keep| {
                if i % 10 == 0 {
                    Err(EvalError::NonFinitePayoff)
                } else {
                    Ok((PathOutcome::default(), None))
                }
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::AggregationIntegrity { failed: 10, .. }
        ));
    }

    #[test]
    fn test_fx_note_leg_validation_fails_fast() {
        let evaluator = PayoffEvaluator::new(NoteConfig::FxArbitrage(FxArbitrageNote {
            notional: 1_000.0,
            legs: 3,
            fee_per_trade: 0.001,
            knock_in_threshold: 0.002,
            knock_out_threshold: 0.0005,
        }))
        .unwrap();
        let params = ProcessParameters::new(1.0, 0.0, 0.01, 30.0 / 252.0, 30).unwrap();
        let legs = vec![FxInterventionProcess::new(params, 0.01).unwrap(); 2];
        let err = engine(10, 42)
            .price_fx_note(&legs, None, &evaluator)
            .unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }

    #[test]
    fn test_fx_note_end_to_end() {
        let evaluator = PayoffEvaluator::new(NoteConfig::FxArbitrage(FxArbitrageNote {
            notional: 1_000_000.0,
            legs: 3,
            fee_per_trade: 0.0005,
            knock_in_threshold: 0.002,
            knock_out_threshold: 0.0005,
        }))
        .unwrap();
        let params = ProcessParameters::new(1.0, 0.0, 0.008, 30.0 / 252.0, 30).unwrap();
        let legs = vec![FxInterventionProcess::new(params, 0.01).unwrap(); 3];
        let matrix = CorrelationMatrix::new(
            &[1.0, 0.3, 0.1, 0.3, 1.0, 0.2, 0.1, 0.2, 1.0],
            3,
        )
        .unwrap();

        let result = engine(2_000, 42)
            .price_fx_note(&legs, Some(&matrix), &evaluator)
            .unwrap();
        assert_eq!(result.completed(), 2_000);
        let trigger_rate = result.trigger_probability();
        assert!((0.0..=1.0).contains(&trigger_rate));
        // Loop profits are small fractions of notional.
        assert!(result.expected_value().abs() < 100_000.0);
    }

    #[test]
    fn test_discount_rate_applied() {
        let process = gbm();
        let evaluator = capped_evaluator();
        let config = MonteCarloConfig::builder()
            .num_paths(500)
            .seed(42)
            .discount_rate(0.05)
            .build()
            .unwrap();
        let discounted = MonteCarloEngine::new(config)
            .unwrap()
            .price_note(&process, &evaluator)
            .unwrap();
        let undiscounted = engine(500, 42).price_note(&process, &evaluator).unwrap();

        let df = (-0.05_f64).exp();
        assert_relative_eq!(
            discounted.expected_value(),
            undiscounted.expected_value() * df,
            epsilon = 1e-9
        );
    }
}
