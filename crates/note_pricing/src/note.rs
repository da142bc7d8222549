//! Note configurations.
//!
//! Every note family is a variant of [`NoteConfig`]; the shared
//! pool/margin/knock-in mechanics live in the payoff state machine and each
//! family selects the subset it uses. Validation is performed once at
//! evaluator construction - an inconsistent configuration is rejected
//! before the first path is simulated, never discovered mid-batch.

use note_core::error::{require_finite, require_non_negative, require_positive, ConfigError};
use note_core::math::curvature;
use serde::{Deserialize, Serialize};

/// Capped knock-in note with margin-pool mechanics.
///
/// Excess return above the cap is banked into a pool which backstops
/// margin shortfalls later in the path; an unbackstopped shortfall forces
/// liquidation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CappedKnockInNote {
    /// Invested principal.
    pub principal: f64,
    /// Return cap (fraction, e.g. 0.30).
    pub cap_return: f64,
    /// Knock-in threshold (fraction, strictly below the cap).
    pub knock_in_return: f64,
    /// Initial margin as an absolute equity amount.
    pub initial_margin: f64,
    /// Maintenance margin as an absolute equity amount (strictly below the
    /// initial margin).
    pub maintenance_margin: f64,
}

impl CappedKnockInNote {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        require_positive("principal", self.principal)?;
        require_finite("cap_return", self.cap_return)?;
        require_finite("knock_in_return", self.knock_in_return)?;
        require_positive("initial_margin", self.initial_margin)?;
        require_non_negative("maintenance_margin", self.maintenance_margin)?;
        if self.cap_return <= self.knock_in_return {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "cap_return ({}) must exceed knock_in_return ({})",
                    self.cap_return, self.knock_in_return
                ),
            });
        }
        if self.maintenance_margin >= self.initial_margin {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "maintenance_margin ({}) must be below initial_margin ({})",
                    self.maintenance_margin, self.initial_margin
                ),
            });
        }
        Ok(())
    }
}

/// Tick-jump note: pays a fixed amount when a cascade of consecutive
/// declines drives equity through the margin line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickJumpNote {
    /// Minimum per-step decline (in price units) counting towards the
    /// cascade.
    pub tick_size: f64,
    /// Number of consecutive qualifying declines required.
    pub tick_threshold: usize,
    /// Margin ratio defining the line `initial_equity * (1 - margin_ratio)`.
    pub margin_ratio: f64,
    /// Initial equity backing the position.
    pub initial_equity: f64,
    /// Fixed payout on trigger.
    pub payout: f64,
}

impl TickJumpNote {
    /// The equity line whose breach (within a cascade) triggers the note.
    #[inline]
    pub fn margin_line(&self) -> f64 {
        self.initial_equity * (1.0 - self.margin_ratio)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        require_positive("tick_size", self.tick_size)?;
        if self.tick_threshold < 2 {
            return Err(ConfigError::invalid(
                "tick_threshold",
                "must be at least 2",
                self.tick_threshold as f64,
            ));
        }
        require_positive("initial_equity", self.initial_equity)?;
        require_non_negative("payout", self.payout)?;
        if !(0.0..1.0).contains(&self.margin_ratio) || self.margin_ratio == 0.0 {
            return Err(ConfigError::invalid(
                "margin_ratio",
                "must be in (0, 1)",
                self.margin_ratio,
            ));
        }
        Ok(())
    }
}

/// Curvature-decay note: the decay index of a value function (weighted
/// higher-order derivative contributions) arms the note; a path whose
/// realised drawdown exceeds the risk threshold collects the fixed payout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvatureDecayNote {
    /// Underlying price grid for the value function.
    pub grid: Vec<f64>,
    /// Value function sampled on the grid.
    pub values: Vec<f64>,
    /// Price perturbation scaling each derivative order's contribution.
    pub delta_s: f64,
    /// The note arms when the decay index falls to or below this threshold.
    pub decay_threshold: f64,
    /// Per-path drawdown (fraction) above which an armed note pays out.
    pub var_threshold: f64,
    /// Fixed payout when armed and the drawdown threshold is breached.
    pub fixed_payout: f64,
}

impl CurvatureDecayNote {
    /// Minimum grid length needed for a fifth derivative to be meaningful.
    const MIN_GRID: usize = 8;

    /// The decay index of the configured value function.
    pub fn decay_index(&self) -> f64 {
        curvature::decay_index(&self.grid, &self.values, self.delta_s)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.len() != self.values.len() {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "grid ({}) and values ({}) lengths differ",
                    self.grid.len(),
                    self.values.len()
                ),
            });
        }
        if self.grid.len() < Self::MIN_GRID {
            return Err(ConfigError::invalid(
                "grid",
                "needs at least 8 points for fifth-order differences",
                self.grid.len() as f64,
            ));
        }
        require_positive("delta_s", self.delta_s)?;
        require_finite("decay_threshold", self.decay_threshold)?;
        require_non_negative("fixed_payout", self.fixed_payout)?;
        if !(0.0..=1.0).contains(&self.var_threshold) {
            return Err(ConfigError::invalid(
                "var_threshold",
                "must be a fraction in [0, 1]",
                self.var_threshold,
            ));
        }
        Ok(())
    }
}

/// Dual-trigger note on a stochastic-volatility underlying.
///
/// Both triggers (terminal price above the barrier and realised volatility
/// above the volatility trigger) switch the note into a lookback
/// participation payoff; exactly one pays a fixed coupon; neither returns
/// a capital floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualTriggerNote {
    /// Invested principal.
    pub principal: f64,
    /// Price barrier K₁.
    pub barrier_level: f64,
    /// Volatility trigger θ.
    pub vol_trigger: f64,
    /// Participation rate applied to the lookback payoff.
    pub participation_rate: f64,
    /// Coupon (fraction of principal) when exactly one trigger fires.
    pub coupon_rate: f64,
    /// Fraction of principal returned when neither trigger fires.
    pub capital_floor: f64,
}

impl DualTriggerNote {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        require_positive("principal", self.principal)?;
        require_positive("barrier_level", self.barrier_level)?;
        require_positive("vol_trigger", self.vol_trigger)?;
        require_positive("participation_rate", self.participation_rate)?;
        require_non_negative("coupon_rate", self.coupon_rate)?;
        if !(0.0..=1.0).contains(&self.capital_floor) {
            return Err(ConfigError::invalid(
                "capital_floor",
                "must be a fraction in [0, 1]",
                self.capital_floor,
            ));
        }
        Ok(())
    }
}

/// Multi-leg FX arbitrage note.
///
/// A closed currency loop of `legs` conversions; the daily loop profit
/// (fees included) knocks the position in above `knock_in_threshold` and
/// exits it when profit decays below `knock_out_threshold`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FxArbitrageNote {
    /// Notional converted around the loop.
    pub notional: f64,
    /// Number of conversion legs (>= 2).
    pub legs: usize,
    /// Proportional fee per conversion.
    pub fee_per_trade: f64,
    /// Profit fraction that knocks the position in.
    pub knock_in_threshold: f64,
    /// Profit fraction below which a knocked-in position exits.
    pub knock_out_threshold: f64,
}

impl FxArbitrageNote {
    /// Total fee drag around the loop: `(1 - fee)^legs`.
    #[inline]
    pub fn fee_factor(&self) -> f64 {
        (1.0 - self.fee_per_trade).powi(self.legs as i32)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        require_positive("notional", self.notional)?;
        if self.legs < 2 {
            return Err(ConfigError::invalid(
                "legs",
                "a loop needs at least 2 legs",
                self.legs as f64,
            ));
        }
        if !(0.0..1.0).contains(&self.fee_per_trade) {
            return Err(ConfigError::invalid(
                "fee_per_trade",
                "must be a fraction in [0, 1)",
                self.fee_per_trade,
            ));
        }
        require_finite("knock_in_threshold", self.knock_in_threshold)?;
        require_finite("knock_out_threshold", self.knock_out_threshold)?;
        if self.knock_out_threshold >= self.knock_in_threshold {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "knock_out_threshold ({}) must be below knock_in_threshold ({})",
                    self.knock_out_threshold, self.knock_in_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Tagged note configuration, one variant per note family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum NoteConfig {
    /// Capped knock-in note with margin-pool mechanics.
    CappedKnockIn(CappedKnockInNote),
    /// Tick-cascade margin-breach note.
    TickJump(TickJumpNote),
    /// Curvature-decay friction note.
    CurvatureDecay(CurvatureDecayNote),
    /// Dual price/volatility trigger note.
    DualTrigger(DualTriggerNote),
    /// Multi-leg FX arbitrage note.
    FxArbitrage(FxArbitrageNote),
}

impl NoteConfig {
    /// Validates the configuration, failing fast on any inconsistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::CappedKnockIn(cfg) => cfg.validate(),
            Self::TickJump(cfg) => cfg.validate(),
            Self::CurvatureDecay(cfg) => cfg.validate(),
            Self::DualTrigger(cfg) => cfg.validate(),
            Self::FxArbitrage(cfg) => cfg.validate(),
        }
    }

    /// Family name for logging and reports.
    pub fn family(&self) -> &'static str {
        match self {
            Self::CappedKnockIn(_) => "capped_knock_in",
            Self::TickJump(_) => "tick_jump",
            Self::CurvatureDecay(_) => "curvature_decay",
            Self::DualTrigger(_) => "dual_trigger",
            Self::FxArbitrage(_) => "fx_arbitrage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped_note() -> CappedKnockInNote {
        CappedKnockInNote {
            principal: 100.0,
            cap_return: 0.30,
            knock_in_return: 0.20,
            initial_margin: 10.0,
            maintenance_margin: 5.0,
        }
    }

    #[test]
    fn test_capped_note_valid() {
        assert!(capped_note().validate().is_ok());
    }

    #[test]
    fn test_capped_note_margin_ordering() {
        let mut note = capped_note();
        note.maintenance_margin = 10.0;
        assert!(note.validate().is_err());
        note.maintenance_margin = 11.0;
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_capped_note_cap_above_knock_in() {
        let mut note = capped_note();
        note.cap_return = 0.20;
        assert!(note.validate().is_err());
        note.cap_return = 0.10;
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_tick_note_validation() {
        let note = TickJumpNote {
            tick_size: 0.5,
            tick_threshold: 3,
            margin_ratio: 0.1,
            initial_equity: 10_000.0,
            payout: 1_000.0,
        };
        assert!(note.validate().is_ok());
        assert!((note.margin_line() - 9_000.0).abs() < 1e-9);

        let mut bad = note.clone();
        bad.tick_threshold = 1;
        assert!(bad.validate().is_err());

        let mut bad = note.clone();
        bad.margin_ratio = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = note;
        bad.margin_ratio = 1.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_curvature_note_validation() {
        let grid: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let values: Vec<f64> = grid.iter().map(|&s| s * 0.5).collect();
        let note = CurvatureDecayNote {
            grid: grid.clone(),
            values,
            delta_s: 1.0,
            decay_threshold: 0.1,
            var_threshold: 0.5,
            fixed_payout: 10_000.0,
        };
        assert!(note.validate().is_ok());

        let mut bad = note.clone();
        bad.values.pop();
        assert!(bad.validate().is_err());

        let mut bad = note.clone();
        bad.var_threshold = 1.5;
        assert!(bad.validate().is_err());

        let mut bad = note;
        bad.grid.truncate(4);
        bad.values.truncate(4);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_fx_note_validation() {
        let note = FxArbitrageNote {
            notional: 1_000_000.0,
            legs: 4,
            fee_per_trade: 0.001,
            knock_in_threshold: 0.002,
            knock_out_threshold: 0.0005,
        };
        assert!(note.validate().is_ok());
        assert!((note.fee_factor() - 0.999_f64.powi(4)).abs() < 1e-12);

        let mut bad = note.clone();
        bad.legs = 1;
        assert!(bad.validate().is_err());

        let mut bad = note;
        bad.knock_out_threshold = 0.01;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_note_config_dispatch() {
        let config = NoteConfig::CappedKnockIn(capped_note());
        assert!(config.validate().is_ok());
        assert_eq!(config.family(), "capped_knock_in");
    }

    #[test]
    fn test_note_config_serde_round_trip() {
        let config = NoteConfig::TickJump(TickJumpNote {
            tick_size: 0.5,
            tick_threshold: 3,
            margin_ratio: 0.1,
            initial_equity: 10_000.0,
            payout: 1_000.0,
        });
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"family\":\"tick_jump\""));
        let back: NoteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
