//! Geometric Brownian Motion.
//!
//! The exact log-space solution is used for numerical stability:
//!
//! ```text
//! S(t+dt) = S(t) * exp((mu - 0.5*sigma^2)*dt + sigma*sqrt(dt)*z)
//! ```

use note_core::error::ConfigError;
use note_core::rng::PathRng;

use crate::params::ProcessParameters;
use crate::process::{PriceState, StochasticProcess};

/// Geometric Brownian Motion price process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GbmProcess {
    params: ProcessParameters,
}

impl GbmProcess {
    /// Creates a GBM process from validated parameters.
    pub fn new(params: ProcessParameters) -> Self {
        Self { params }
    }

    /// Convenience constructor validating the raw parameters.
    pub fn from_raw(
        s0: f64,
        mu: f64,
        sigma: f64,
        horizon: f64,
        n_steps: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(ProcessParameters::new(s0, mu, sigma, horizon, n_steps)?))
    }

    /// The deterministic log-space increment for a given shock.
    #[inline]
    pub(crate) fn log_increment(mu: f64, sigma: f64, dt: f64, z: f64) -> f64 {
        (mu - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * z
    }
}

impl StochasticProcess for GbmProcess {
    type State = PriceState;

    fn parameters(&self) -> &ProcessParameters {
        &self.params
    }

    fn initial_state(&self) -> Self::State {
        PriceState(self.params.s0)
    }

    fn evolve(&self, state: Self::State, dt: f64, rng: &mut PathRng) -> Self::State {
        let z = rng.gen_normal();
        let increment = Self::log_increment(self.params.mu, self.params.sigma, dt, z);
        PriceState((state.0 * increment.exp()).max(self.params.price_floor))
    }

    fn price(state: &Self::State) -> f64 {
        state.0
    }

    fn name() -> &'static str {
        "GBM"
    }
}
