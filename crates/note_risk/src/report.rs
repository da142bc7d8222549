//! Serialisable risk report.
//!
//! [`RiskReport`] is the stable schema consumed by external reporting
//! layers (CSV writers, HTML renderers, dashboards). It is a plain data
//! record: every ratio is a fraction, every monetary figure is discounted
//! the way the underlying result was.

use note_pricing::SimulationResult;
use serde::{Deserialize, Serialize};

/// Maximum number of raw payoffs embedded in a report.
pub const MAX_SAMPLE_PAYOFFS: usize = 100;

/// Aggregate risk report over one Monte Carlo batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Note family the batch priced.
    pub family: String,
    /// Discounted mean payout.
    pub mean_payout: f64,
    /// 95% VaR (5th percentile of the payoff distribution).
    pub var_95: f64,
    /// 99% VaR (1st percentile of the payoff distribution).
    pub var_99: f64,
    /// 95% CVaR (mean of the tail at or below the 95% VaR cutoff).
    pub cvar_95: f64,
    /// Fraction of paths whose family trigger fired.
    pub trigger_probability: f64,
    /// Fraction of paths that knocked out.
    pub knockout_probability: f64,
    /// Mean per-path maximum drawdown (fraction).
    pub avg_max_drawdown: f64,
    /// Trials requested.
    pub requested: usize,
    /// Trials that completed and entered the aggregation.
    pub completed: usize,
    /// Trials excluded after per-trial failures.
    pub failed: usize,
    /// A bounded sample of raw payoffs for distribution rendering.
    pub sample_payoffs: Vec<f64>,
}

impl RiskReport {
    /// Builds the report from a simulation result.
    pub fn from_result(family: &str, result: &SimulationResult) -> Self {
        let sample_payoffs = result
            .payoffs()
            .iter()
            .copied()
            .take(MAX_SAMPLE_PAYOFFS)
            .collect();
        Self {
            family: family.to_string(),
            mean_payout: result.expected_value(),
            var_95: result.value_at_risk(5.0),
            var_99: result.value_at_risk(1.0),
            cvar_95: result.conditional_value_at_risk(5.0),
            trigger_probability: result.trigger_probability(),
            knockout_probability: result.knockout_probability(),
            avg_max_drawdown: result.avg_max_drawdown(),
            requested: result.requested(),
            completed: result.completed(),
            failed: result.failed(),
            sample_payoffs,
        }
    }
}
