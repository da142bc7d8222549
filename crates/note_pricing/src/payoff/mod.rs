//! Path-dependent payoff evaluation.
//!
//! [`PayoffEvaluator`] is the single evaluator over every note family; the
//! shared pool/margin/knock-in mechanics live in [`margin`] and the
//! family-specific triggers in [`triggers`]. Construction validates the
//! note configuration - an inconsistent note never reaches a simulation.

mod margin;
mod triggers;

use note_core::error::ConfigError;
use note_core::math::curvature;
use note_core::Path;
use note_models::simulate::PathStepper;
use note_models::StochasticProcess;
use serde::Serialize;
use thiserror::Error;

use crate::note::NoteConfig;

use self::margin::MachineStatus;

/// Per-path evaluation error.
///
/// These are trial-level failures: the Monte Carlo engine excludes and
/// counts the affected trial rather than aborting the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The note family needs a volatility track the path does not carry.
    #[error("note family '{family}' requires a volatility track on the path")]
    MissingVolTrack {
        /// Offending note family.
        family: &'static str,
    },

    /// Wrong number of FX legs supplied.
    #[error("expected {expected} FX legs, got {got}")]
    LegCountMismatch {
        /// Legs the note was configured with.
        expected: usize,
        /// Legs actually supplied.
        got: usize,
    },

    /// The note family is evaluated through a different entry point.
    #[error("note family '{family}' is evaluated over {expected}")]
    WrongEntryPoint {
        /// Offending note family.
        family: &'static str,
        /// What the family evaluates over.
        expected: &'static str,
    },

    /// Leg simulation failed inside a trial.
    #[error("FX leg simulation failed: {detail}")]
    LegSimulation {
        /// Underlying setup failure.
        detail: String,
    },

    /// The evaluation produced a non-finite payoff.
    #[error("evaluation produced a non-finite payoff")]
    NonFinitePayoff,
}

/// Scalar payoff plus diagnostic metadata for one evaluated path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PathOutcome {
    /// Final payoff in currency units.
    pub payoff: f64,
    /// Knock-in flag (sticky).
    pub knocked_in: bool,
    /// Forced liquidation / knock-out flag.
    pub knocked_out: bool,
    /// Family-specific trigger flag.
    pub triggered: bool,
    /// Step index at which the trigger fired.
    pub trigger_day: Option<usize>,
    /// Step index at which the position exited (liquidation or knock-out).
    pub exit_day: Option<usize>,
    /// Maximum peak-to-trough drawdown over the evaluated path (fraction).
    pub max_drawdown: f64,
    /// Pool balance left after evaluation.
    pub pool_final: f64,
}

/// Path-dependent payoff evaluator for one configured note.
#[derive(Clone, Debug)]
pub struct PayoffEvaluator {
    config: NoteConfig,
    decay_armed: bool,
}

impl PayoffEvaluator {
    /// Validates the note configuration and builds the evaluator.
    ///
    /// For the curvature family the decay index of the value function is
    /// computed once here.
    ///
    /// # Errors
    ///
    /// Propagates any [`ConfigError`] from validation.
    pub fn new(config: NoteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let decay_armed = match &config {
            NoteConfig::CurvatureDecay(cfg) => {
                curvature::is_decay_triggered(cfg.decay_index(), cfg.decay_threshold)
            }
            _ => false,
        };
        Ok(Self {
            config,
            decay_armed,
        })
    }

    /// The validated note configuration.
    #[inline]
    pub fn config(&self) -> &NoteConfig {
        &self.config
    }

    /// Whether the curvature family's decay trigger is armed (always
    /// `false` for other families).
    #[inline]
    pub fn decay_armed(&self) -> bool {
        self.decay_armed
    }

    /// Evaluates a finished single-asset path.
    ///
    /// # Errors
    ///
    /// Trial-level failures only; see [`EvalError`].
    pub fn evaluate(&self, path: &Path) -> Result<PathOutcome, EvalError> {
        let outcome = match &self.config {
            NoteConfig::CappedKnockIn(cfg) => margin::evaluate_path(cfg, path),
            NoteConfig::TickJump(cfg) => triggers::evaluate_tick_jump(cfg, path),
            NoteConfig::CurvatureDecay(cfg) => {
                triggers::evaluate_curvature(cfg, self.decay_armed, path)
            }
            NoteConfig::DualTrigger(cfg) => triggers::evaluate_dual_trigger(cfg, path)?,
            NoteConfig::FxArbitrage(_) => {
                return Err(EvalError::WrongEntryPoint {
                    family: "fx_arbitrage",
                    expected: "correlated FX legs",
                })
            }
        };
        Self::check_finite(outcome)
    }

    /// Evaluates a set of correlated FX legs (FX arbitrage family only).
    ///
    /// # Errors
    ///
    /// Trial-level failures only; see [`EvalError`].
    pub fn evaluate_legs(&self, legs: &[Path]) -> Result<PathOutcome, EvalError> {
        match &self.config {
            NoteConfig::FxArbitrage(cfg) => {
                Self::check_finite(triggers::evaluate_fx_legs(cfg, legs)?)
            }
            _ => Err(EvalError::WrongEntryPoint {
                family: self.config.family(),
                expected: "a single simulated path",
            }),
        }
    }

    /// Evaluates jointly with the simulator, pulling one step at a time.
    ///
    /// For the margin family the hard terminal state stops path generation
    /// immediately; other families drain the stepper and evaluate the
    /// finished path. Returns the (possibly truncated) path alongside the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Trial-level failures only; see [`EvalError`].
    pub fn evaluate_stepped<P: StochasticProcess>(
        &self,
        mut stepper: PathStepper<'_, P>,
    ) -> Result<(PathOutcome, Path), EvalError> {
        match &self.config {
            NoteConfig::CappedKnockIn(cfg) => {
                let mut machine = margin::MarginMachine::new(cfg, stepper.current_price());
                while let Some(price) = stepper.step() {
                    if machine.on_price(price) == MachineStatus::Liquidated {
                        break;
                    }
                }
                let outcome = Self::check_finite(machine.finish())?;
                Ok((outcome, stepper.into_path()))
            }
            NoteConfig::FxArbitrage(_) => Err(EvalError::WrongEntryPoint {
                family: "fx_arbitrage",
                expected: "correlated FX legs",
            }),
            _ => {
                while stepper.step().is_some() {}
                let path = stepper.into_path();
                let outcome = self.evaluate(&path)?;
                Ok((outcome, path))
            }
        }
    }

    fn check_finite(outcome: PathOutcome) -> Result<PathOutcome, EvalError> {
        if outcome.payoff.is_finite() {
            Ok(outcome)
        } else {
            Err(EvalError::NonFinitePayoff)
        }
    }
}
