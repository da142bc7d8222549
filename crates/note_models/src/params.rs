//! Shared simulation parameters.

use note_core::error::{require_finite, require_non_negative, require_positive, ConfigError};

/// Default strictly-positive price floor.
///
/// Simulated prices are clamped here so downstream log/division operations
/// always see strict positivity.
pub const DEFAULT_PRICE_FLOOR: f64 = 0.01;

/// Immutable process configuration shared by every model variant.
///
/// `dt` is derived as `horizon / n_steps`.
///
/// # Examples
///
/// ```rust
/// use note_models::ProcessParameters;
///
/// let params = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap();
/// assert!((params.dt() - 1.0 / 252.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessParameters {
    /// Initial price S₀.
    pub s0: f64,
    /// Annualised drift μ.
    pub mu: f64,
    /// Annualised volatility σ (initial volatility for stochastic-vol
    /// models).
    pub sigma: f64,
    /// Time horizon T in years.
    pub horizon: f64,
    /// Number of time steps N.
    pub n_steps: usize,
    /// Strictly-positive clamp applied to every simulated price.
    pub price_floor: f64,
}

impl ProcessParameters {
    /// Creates validated parameters with the default price floor.
    ///
    /// # Errors
    ///
    /// Fails when `s0 <= 0`, `sigma < 0`, `horizon <= 0`, `n_steps == 0`
    /// or `mu` is not finite.
    pub fn new(
        s0: f64,
        mu: f64,
        sigma: f64,
        horizon: f64,
        n_steps: usize,
    ) -> Result<Self, ConfigError> {
        require_positive("s0", s0)?;
        require_finite("mu", mu)?;
        require_non_negative("sigma", sigma)?;
        require_positive("horizon", horizon)?;
        if n_steps == 0 {
            return Err(ConfigError::invalid("n_steps", "must be at least 1", 0.0));
        }
        Ok(Self {
            s0,
            mu,
            sigma,
            horizon,
            n_steps,
            price_floor: DEFAULT_PRICE_FLOOR,
        })
    }

    /// Overrides the price floor.
    ///
    /// # Errors
    ///
    /// The floor must be strictly positive and below the initial price.
    pub fn with_price_floor(mut self, floor: f64) -> Result<Self, ConfigError> {
        require_positive("price_floor", floor)?;
        if floor >= self.s0 {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "price_floor ({}) must be below the initial price ({})",
                    floor, self.s0
                ),
            });
        }
        self.price_floor = floor;
        Ok(self)
    }

    /// Step size `horizon / n_steps`.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.horizon / self.n_steps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_parameters() {
        let p = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap();
        assert_eq!(p.n_steps, 252);
        assert_eq!(p.price_floor, DEFAULT_PRICE_FLOOR);
    }

    #[test]
    fn test_rejects_non_positive_spot() {
        assert!(ProcessParameters::new(0.0, 0.05, 0.2, 1.0, 252).is_err());
        assert!(ProcessParameters::new(-1.0, 0.05, 0.2, 1.0, 252).is_err());
    }

    #[test]
    fn test_rejects_negative_volatility() {
        assert!(ProcessParameters::new(100.0, 0.05, -0.2, 1.0, 252).is_err());
    }

    #[test]
    fn test_rejects_zero_steps() {
        assert!(ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 0).is_err());
    }

    #[test]
    fn test_rejects_nan_drift() {
        assert!(ProcessParameters::new(100.0, f64::NAN, 0.2, 1.0, 252).is_err());
    }

    #[test]
    fn test_floor_override() {
        let p = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252)
            .unwrap()
            .with_price_floor(0.5)
            .unwrap();
        assert_eq!(p.price_floor, 0.5);
    }

    #[test]
    fn test_floor_must_stay_below_spot() {
        let p = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap();
        assert!(p.with_price_floor(100.0).is_err());
    }

    #[test]
    fn test_floor_must_be_positive() {
        let p = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap();
        assert!(p.with_price_floor(0.0).is_err());
    }
}
