//! Simulated path container.
//!
//! A [`Path`] holds the N+1 prices produced by one simulation run, plus an
//! optional parallel track of instantaneous volatilities for stochastic-vol
//! models. Paths are created by the simulator, consumed once by a payoff
//! evaluation, and discarded - except for a small bounded number retained as
//! example paths for external visualisation.

use crate::math::stats;

/// An ordered sequence of simulated prices (and optionally volatilities).
///
/// Immutable once produced. `values[0]` is the initial price; for a path
/// terminated early (forced liquidation) the sequence is shorter than the
/// configured step count.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    values: Vec<f64>,
    vols: Option<Vec<f64>>,
}

impl Path {
    /// Creates a price-only path.
    pub fn new(values: Vec<f64>) -> Self {
        debug_assert!(!values.is_empty(), "a path has at least its initial value");
        Self { values, vols: None }
    }

    /// Creates a path with a parallel instantaneous-volatility track.
    pub fn with_vols(values: Vec<f64>, vols: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), vols.len());
        Self {
            values,
            vols: Some(vols),
        }
    }

    /// The simulated prices, initial value first.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The instantaneous-volatility track, if the model produced one.
    #[inline]
    pub fn vols(&self) -> Option<&[f64]> {
        self.vols.as_deref()
    }

    /// Number of recorded values (steps + 1 for a full path).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the path holds only its initial value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }

    /// Initial price.
    #[inline]
    pub fn initial(&self) -> f64 {
        self.values[0]
    }

    /// Last recorded price (terminal, or the liquidation instant for an
    /// early-terminated path).
    #[inline]
    pub fn terminal(&self) -> f64 {
        *self.values.last().expect("path is never empty")
    }

    /// Minimum recorded price.
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Maximum recorded price.
    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Total return over the path as a plain fraction: `(S_T - S_0) / S_0`.
    #[inline]
    pub fn total_return(&self) -> f64 {
        (self.terminal() - self.initial()) / self.initial()
    }

    /// Maximum peak-to-trough drawdown as a fraction of the running peak.
    pub fn max_drawdown(&self) -> f64 {
        stats::max_drawdown(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_path_accessors() {
        let path = Path::new(vec![100.0, 105.0, 95.0, 110.0]);
        assert_eq!(path.len(), 4);
        assert_eq!(path.initial(), 100.0);
        assert_eq!(path.terminal(), 110.0);
        assert_eq!(path.min(), 95.0);
        assert_eq!(path.max(), 110.0);
        assert_relative_eq!(path.total_return(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_path_with_vols() {
        let path = Path::with_vols(vec![100.0, 101.0], vec![0.2, 0.21]);
        assert_eq!(path.vols(), Some(&[0.2, 0.21][..]));
    }

    #[test]
    fn test_negative_return_is_a_fraction() {
        let path = Path::new(vec![100.0, 80.0]);
        assert_relative_eq!(path.total_return(), -0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_through_path() {
        // Peak 120, trough 90 afterwards: drawdown = 30 / 120 = 0.25.
        let path = Path::new(vec![100.0, 120.0, 90.0, 110.0]);
        assert_relative_eq!(path.max_drawdown(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_single_value_path() {
        let path = Path::new(vec![100.0]);
        assert!(path.is_empty());
        assert_eq!(path.terminal(), 100.0);
        assert_eq!(path.max_drawdown(), 0.0);
    }
}
