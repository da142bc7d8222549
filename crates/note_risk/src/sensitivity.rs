//! One-parameter sensitivity sweeps.
//!
//! Re-runs a (typically smaller) Monte Carlo batch for each candidate
//! value of one parameter, holding everything else fixed, and returns the
//! response curve in input order.

use note_core::error::ConfigError;
use note_models::{GbmProcess, ProcessParameters};
use note_pricing::mc::{MonteCarloConfig, MonteCarloEngine, SimulationError};
use note_pricing::note::NoteConfig;
use note_pricing::payoff::PayoffEvaluator;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The parameter varied by a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    /// Process volatility σ.
    Volatility,
    /// Process drift μ.
    Drift,
    /// Continuous discount rate.
    DiscountRate,
    /// Cap return of a capped knock-in note.
    CapReturn,
    /// Knock-in threshold of a capped knock-in note.
    KnockInReturn,
    /// Tick size of a tick-jump note.
    TickSize,
}

impl SweepParameter {
    /// Parameter name for logging and report labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Volatility => "volatility",
            Self::Drift => "drift",
            Self::DiscountRate => "discount_rate",
            Self::CapReturn => "cap_return",
            Self::KnockInReturn => "knock_in_return",
            Self::TickSize => "tick_size",
        }
    }
}

/// Sweep failures.
#[derive(Error, Debug)]
pub enum SensitivityError {
    /// A substituted value produced an invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A batch failed for one candidate value.
    #[error("batch failed at {parameter}={value}: {source}")]
    Batch {
        /// Parameter being swept.
        parameter: &'static str,
        /// Candidate value at which the batch failed.
        value: f64,
        /// Underlying simulation error.
        source: SimulationError,
    },

    /// The parameter does not apply to the configured note family.
    #[error("parameter '{parameter}' does not apply to note family '{family}'")]
    UnsupportedParameter {
        /// Parameter being swept.
        parameter: &'static str,
        /// Note family that rejected it.
        family: &'static str,
    },
}

/// One point of a response curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// The substituted parameter value.
    pub value: f64,
    /// Discounted expected payout at that value.
    pub expected_payout: f64,
    /// 95% VaR (5th percentile of the payoff distribution).
    pub var_95: f64,
}

/// Re-runs the engine across a grid of one varying parameter.
#[derive(Clone, Debug)]
pub struct SensitivityRunner {
    mc_config: MonteCarloConfig,
}

impl SensitivityRunner {
    /// Creates a runner with the batch configuration used for every
    /// candidate value.
    pub fn new(mc_config: MonteCarloConfig) -> Self {
        Self { mc_config }
    }

    /// Runs the sweep, preserving the order of `values`.
    ///
    /// Each candidate re-validates the substituted configuration, rebuilds
    /// the engine and prices the note under a GBM underlying.
    ///
    /// # Errors
    ///
    /// Fails on the first candidate whose configuration is invalid, whose
    /// parameter does not apply to the note family, or whose batch fails.
    pub fn run(
        &self,
        base_params: ProcessParameters,
        base_note: &NoteConfig,
        parameter: SweepParameter,
        values: &[f64],
    ) -> Result<Vec<SensitivityPoint>, SensitivityError> {
        let mut curve = Vec::with_capacity(values.len());
        for &value in values {
            let (params, note, mc_config) =
                substitute(base_params, base_note, &self.mc_config, parameter, value)?;

            let process = GbmProcess::new(params);
            let evaluator = PayoffEvaluator::new(note)?;
            let engine = MonteCarloEngine::new(mc_config)?;
            let result = engine.price_note(&process, &evaluator).map_err(|source| {
                SensitivityError::Batch {
                    parameter: parameter.name(),
                    value,
                    source,
                }
            })?;

            debug!(
                parameter = parameter.name(),
                value,
                expected = result.expected_value(),
                "sweep point complete"
            );
            curve.push(SensitivityPoint {
                value,
                expected_payout: result.expected_value(),
                var_95: result.value_at_risk(5.0),
            });
        }
        Ok(curve)
    }
}

fn substitute(
    base_params: ProcessParameters,
    base_note: &NoteConfig,
    base_mc: &MonteCarloConfig,
    parameter: SweepParameter,
    value: f64,
) -> Result<(ProcessParameters, NoteConfig, MonteCarloConfig), SensitivityError> {
    let mut params = base_params;
    let mut note = base_note.clone();
    let mut mc_config = base_mc.clone();

    match parameter {
        SweepParameter::Volatility => {
            params = ProcessParameters::new(
                base_params.s0,
                base_params.mu,
                value,
                base_params.horizon,
                base_params.n_steps,
            )?;
            params.price_floor = base_params.price_floor;
        }
        SweepParameter::Drift => {
            params = ProcessParameters::new(
                base_params.s0,
                value,
                base_params.sigma,
                base_params.horizon,
                base_params.n_steps,
            )?;
            params.price_floor = base_params.price_floor;
        }
        SweepParameter::DiscountRate => {
            mc_config = base_mc.with_discount_rate(value);
            mc_config.validate()?;
        }
        SweepParameter::CapReturn => match &mut note {
            NoteConfig::CappedKnockIn(cfg) => cfg.cap_return = value,
            other => {
                return Err(SensitivityError::UnsupportedParameter {
                    parameter: parameter.name(),
                    family: other.family(),
                })
            }
        },
        SweepParameter::KnockInReturn => match &mut note {
            NoteConfig::CappedKnockIn(cfg) => cfg.knock_in_return = value,
            other => {
                return Err(SensitivityError::UnsupportedParameter {
                    parameter: parameter.name(),
                    family: other.family(),
                })
            }
        },
        SweepParameter::TickSize => match &mut note {
            NoteConfig::TickJump(cfg) => cfg.tick_size = value,
            other => {
                return Err(SensitivityError::UnsupportedParameter {
                    parameter: parameter.name(),
                    family: other.family(),
                })
            }
        },
    }

    Ok((params, note, mc_config))
}
