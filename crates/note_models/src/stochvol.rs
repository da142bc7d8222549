//! Mean-reverting stochastic volatility.
//!
//! The volatility itself (not the variance) reverts to a long-run mean,
//! with a square-root diffusion term and a strictly-positive floor:
//!
//! ```text
//! sigma(t+dt) = max(floor, sigma + kappa*(theta - sigma)*dt
//!                          + xi*sqrt(sigma*dt)*w)
//! ```
//!
//! The *current* sigma drives the price increment at each step; the price
//! and volatility shocks are correlated by rho.

use note_core::error::{require_non_negative, require_positive, ConfigError};
use note_core::rng::PathRng;

use crate::gbm::GbmProcess;
use crate::params::ProcessParameters;
use crate::process::{PriceVolState, StochasticProcess};

/// Mean-reverting stochastic-volatility price process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StochVolProcess {
    params: ProcessParameters,
    kappa: f64,
    theta: f64,
    xi: f64,
    rho: f64,
    vol_floor: f64,
}

impl StochVolProcess {
    /// Creates a stochastic-volatility process.
    ///
    /// # Arguments
    ///
    /// * `params` - Shared simulation parameters; `params.sigma` is the
    ///   initial volatility
    /// * `kappa` - Mean-reversion speed (> 0)
    /// * `theta` - Long-run volatility (> 0)
    /// * `xi` - Volatility of volatility (>= 0)
    /// * `rho` - Price/vol shock correlation, in [-1, 1]
    /// * `vol_floor` - Strictly-positive volatility floor (a zero floor
    ///   would allow degenerate square roots)
    pub fn new(
        params: ProcessParameters,
        kappa: f64,
        theta: f64,
        xi: f64,
        rho: f64,
        vol_floor: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("kappa", kappa)?;
        require_positive("theta", theta)?;
        require_non_negative("xi", xi)?;
        if !(-1.0..=1.0).contains(&rho) {
            return Err(ConfigError::invalid("rho", "must be in [-1, 1]", rho));
        }
        require_positive("vol_floor", vol_floor)?;
        if params.sigma < vol_floor {
            return Err(ConfigError::Inconsistent {
                detail: format!(
                    "initial volatility ({}) below vol_floor ({})",
                    params.sigma, vol_floor
                ),
            });
        }
        Ok(Self {
            params,
            kappa,
            theta,
            xi,
            rho,
            vol_floor,
        })
    }

    /// The volatility floor.
    #[inline]
    pub fn vol_floor(&self) -> f64 {
        self.vol_floor
    }
}

impl StochasticProcess for StochVolProcess {
    type State = PriceVolState;

    fn parameters(&self) -> &ProcessParameters {
        &self.params
    }

    fn initial_state(&self) -> Self::State {
        PriceVolState {
            price: self.params.s0,
            vol: self.params.sigma,
        }
    }

    fn evolve(&self, state: Self::State, dt: f64, rng: &mut PathRng) -> Self::State {
        let z = rng.gen_normal();
        let z2 = rng.gen_normal();
        let w = self.rho * z + (1.0 - self.rho * self.rho).sqrt() * z2;

        let increment = GbmProcess::log_increment(self.params.mu, state.vol, dt, z);
        let price = (state.price * increment.exp()).max(self.params.price_floor);

        let vol = (state.vol
            + self.kappa * (self.theta - state.vol) * dt
            + self.xi * (state.vol * dt).sqrt() * w)
            .max(self.vol_floor);

        PriceVolState { price, vol }
    }

    fn price(state: &Self::State) -> f64 {
        state.price
    }

    fn instant_vol(state: &Self::State) -> Option<f64> {
        Some(state.vol)
    }

    fn name() -> &'static str {
        "StochVol"
    }
}
