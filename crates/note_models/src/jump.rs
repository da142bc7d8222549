//! Jump-diffusion price process.
//!
//! A GBM backbone with a compound-Poisson jump component. The jump sum for
//! a step is added in log-space, so jumps accumulate multiplicatively on
//! the price:
//!
//! ```text
//! S(t+dt) = S(t) * exp(gbm_increment + J),   J = sum of K ~ Po(lambda*dt)
//!                                                jumps from N(m, s^2)
//! ```

use note_core::error::{require_finite, require_non_negative, ConfigError};
use note_core::rng::PathRng;

use crate::gbm::GbmProcess;
use crate::params::ProcessParameters;
use crate::process::{PriceState, StochasticProcess};

/// Jump-diffusion price process (GBM plus compound-Poisson jumps).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpDiffusionProcess {
    params: ProcessParameters,
    intensity: f64,
    jump_mean: f64,
    jump_std: f64,
}

impl JumpDiffusionProcess {
    /// Creates a jump-diffusion process.
    ///
    /// # Arguments
    ///
    /// * `params` - Shared simulation parameters
    /// * `intensity` - Annualised jump intensity λ (jumps per year)
    /// * `jump_mean` - Mean log-jump size
    /// * `jump_std` - Log-jump size standard deviation
    ///
    /// # Errors
    ///
    /// Fails when `intensity < 0`, `jump_std < 0` or `jump_mean` is not
    /// finite.
    pub fn new(
        params: ProcessParameters,
        intensity: f64,
        jump_mean: f64,
        jump_std: f64,
    ) -> Result<Self, ConfigError> {
        require_non_negative("intensity", intensity)?;
        require_finite("jump_mean", jump_mean)?;
        require_non_negative("jump_std", jump_std)?;
        Ok(Self {
            params,
            intensity,
            jump_mean,
            jump_std,
        })
    }

    /// Annualised jump intensity λ.
    #[inline]
    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}

impl StochasticProcess for JumpDiffusionProcess {
    type State = PriceState;

    fn parameters(&self) -> &ProcessParameters {
        &self.params
    }

    fn initial_state(&self) -> Self::State {
        PriceState(self.params.s0)
    }

    fn evolve(&self, state: Self::State, dt: f64, rng: &mut PathRng) -> Self::State {
        let z = rng.gen_normal();
        let diffusion = GbmProcess::log_increment(self.params.mu, self.params.sigma, dt, z);
        let jump = rng.jump_sum(self.intensity * dt, self.jump_mean, self.jump_std);
        PriceState((state.0 * (diffusion + jump).exp()).max(self.params.price_floor))
    }

    fn price(state: &Self::State) -> f64 {
        state.0
    }

    fn name() -> &'static str {
        "JumpDiffusion"
    }
}
