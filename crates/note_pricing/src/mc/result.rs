//! Aggregate simulation results and derived statistics.

use note_core::math::stats;
use note_core::Path;
use tracing::warn;

use crate::payoff::PathOutcome;

/// Trigger-timing statistics over the completed trials.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerStats {
    /// Fraction of paths whose family trigger fired.
    pub trigger_rate: f64,
    /// Mean trigger step over triggered paths.
    pub avg_trigger_day: f64,
    /// Mean holding period (exit minus trigger step) over paths that both
    /// triggered and exited, when any exist.
    pub avg_holding_period: Option<f64>,
}

/// The aggregate output of one Monte Carlo batch.
///
/// Owns the per-trial payoffs (in trial order, completed trials only) and
/// their diagnostic outcomes; all derived statistics are computed over the
/// completed subset and disclosed alongside `requested`/`completed`.
/// Ratio outputs are plain fractions.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    payoffs: Vec<f64>,
    sorted_payoffs: Vec<f64>,
    outcomes: Vec<PathOutcome>,
    example_paths: Vec<Path>,
    requested: usize,
    failed: usize,
    cancelled: usize,
    discount_factor: f64,
}

impl SimulationResult {
    pub(crate) fn new(
        payoffs: Vec<f64>,
        outcomes: Vec<PathOutcome>,
        example_paths: Vec<Path>,
        requested: usize,
        failed: usize,
        cancelled: usize,
        discount_factor: f64,
    ) -> Self {
        let mut sorted_payoffs = payoffs.clone();
        sorted_payoffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            payoffs,
            sorted_payoffs,
            outcomes,
            example_paths,
            requested,
            failed,
            cancelled,
            discount_factor,
        }
    }

    /// Per-trial payoffs in trial order (undiscounted, completed trials
    /// only). Bit-identical across runs with the same seed.
    #[inline]
    pub fn payoffs(&self) -> &[f64] {
        &self.payoffs
    }

    /// Per-trial diagnostic outcomes, parallel to [`Self::payoffs`].
    #[inline]
    pub fn outcomes(&self) -> &[PathOutcome] {
        &self.outcomes
    }

    /// Trials requested.
    #[inline]
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Trials that completed and entered the aggregation.
    #[inline]
    pub fn completed(&self) -> usize {
        self.payoffs.len()
    }

    /// Trials excluded after a per-trial failure.
    #[inline]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Trials skipped after an early abort.
    #[inline]
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    /// The discount factor applied to monetary statistics.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Discounted mean payoff.
    pub fn expected_value(&self) -> f64 {
        stats::mean(&self.payoffs) * self.discount_factor
    }

    /// Discounted standard error of the mean payoff.
    pub fn std_error(&self) -> f64 {
        stats::sample_std_error(&self.payoffs) * self.discount_factor
    }

    /// Discounted p-th percentile of the payoff distribution (linear
    /// interpolation between order statistics). `p = 5` is the 95% VaR
    /// level.
    pub fn value_at_risk(&self, p: f64) -> f64 {
        stats::percentile(&self.sorted_payoffs, p) * self.discount_factor
    }

    /// Discounted mean of payoffs at or below the p-th percentile.
    ///
    /// Returns `NaN` (logged) when no payoff falls in the tail - the rest
    /// of the result remains valid.
    pub fn conditional_value_at_risk(&self, p: f64) -> f64 {
        let cutoff = stats::percentile(&self.sorted_payoffs, p);
        match stats::tail_mean(&self.sorted_payoffs, cutoff) {
            Some(tail) => tail * self.discount_factor,
            None => {
                warn!(
                    percentile = p,
                    completed = self.completed(),
                    "no payoffs in the CVaR tail; reporting NaN for this statistic"
                );
                f64::NAN
            }
        }
    }

    /// Fraction of completed paths whose family trigger fired.
    pub fn trigger_probability(&self) -> f64 {
        self.fraction(|o| o.triggered)
    }

    /// Fraction of completed paths that knocked out (forced liquidation or
    /// arbitrage exit).
    pub fn knockout_probability(&self) -> f64 {
        self.fraction(|o| o.knocked_out)
    }

    /// Fraction of completed paths that knocked in.
    pub fn knock_in_probability(&self) -> f64 {
        self.fraction(|o| o.knocked_in)
    }

    /// Mean per-path maximum drawdown (fraction).
    pub fn avg_max_drawdown(&self) -> f64 {
        if self.outcomes.is_empty() {
            return f64::NAN;
        }
        self.outcomes.iter().map(|o| o.max_drawdown).sum::<f64>() / self.outcomes.len() as f64
    }

    /// Trigger-timing statistics, or `None` when no path triggered.
    pub fn trigger_stats(&self) -> Option<TriggerStats> {
        let trigger_days: Vec<f64> = self
            .outcomes
            .iter()
            .filter(|o| o.triggered)
            .filter_map(|o| o.trigger_day.map(|d| d as f64))
            .collect();
        if trigger_days.is_empty() {
            return None;
        }

        let holding: Vec<f64> = self
            .outcomes
            .iter()
            .filter(|o| o.triggered)
            .filter_map(|o| match (o.trigger_day, o.exit_day) {
                (Some(t), Some(e)) if e >= t => Some((e - t) as f64),
                _ => None,
            })
            .collect();

        Some(TriggerStats {
            trigger_rate: self.trigger_probability(),
            avg_trigger_day: stats::mean(&trigger_days),
            avg_holding_period: if holding.is_empty() {
                None
            } else {
                Some(stats::mean(&holding))
            },
        })
    }

    /// The bounded set of raw paths retained for external visualisation.
    #[inline]
    pub fn example_paths(&self) -> &[Path] {
        &self.example_paths
    }

    fn fraction(&self, predicate: impl Fn(&PathOutcome) -> bool) -> f64 {
        if self.outcomes.is_empty() {
            return f64::NAN;
        }
        self.outcomes.iter().filter(|&o| predicate(o)).count() as f64
            / self.outcomes.len() as f64
    }
}
