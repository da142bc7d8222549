//! FX rate process with central-bank-style intervention drift.
//!
//! Large deviations from the initial rate meet growing resistance:
//!
//! ```text
//! intervention = -k * tanh(10 * (S - S0) / S0)
//! S(t+dt) = S(t) * exp((mu + intervention)*dt + sigma*sqrt(dt)*z)
//! ```
//!
//! The intervention term is bounded in [-k, k] by construction of tanh.

use note_core::error::{require_non_negative, ConfigError};
use note_core::rng::PathRng;

use crate::gbm::GbmProcess;
use crate::params::ProcessParameters;
use crate::process::{PriceState, StochasticProcess};

/// Steepness of the intervention response to relative deviation.
const INTERVENTION_SLOPE: f64 = 10.0;

/// Mean-reverting FX rate process with bounded intervention drift.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FxInterventionProcess {
    params: ProcessParameters,
    strength: f64,
}

impl FxInterventionProcess {
    /// Creates an FX process with intervention strength `k >= 0`.
    pub fn new(params: ProcessParameters, strength: f64) -> Result<Self, ConfigError> {
        require_non_negative("intervention_strength", strength)?;
        Ok(Self { params, strength })
    }

    /// The bounded intervention drift at a given rate level.
    #[inline]
    pub fn intervention_drift(&self, rate: f64) -> f64 {
        let deviation = (rate - self.params.s0) / self.params.s0;
        -self.strength * (INTERVENTION_SLOPE * deviation).tanh()
    }

    /// One step with an externally supplied shock.
    ///
    /// Used when several legs share a correlated draw; [`Self::evolve`]
    /// delegates here with an independent draw.
    pub fn evolve_with_shock(&self, state: PriceState, dt: f64, z: f64) -> PriceState {
        let mu = self.params.mu + self.intervention_drift(state.0);
        let increment = GbmProcess::log_increment(mu, self.params.sigma, dt, z);
        PriceState((state.0 * increment.exp()).max(self.params.price_floor))
    }
}

impl StochasticProcess for FxInterventionProcess {
    type State = PriceState;

    fn parameters(&self) -> &ProcessParameters {
        &self.params
    }

    fn initial_state(&self) -> Self::State {
        PriceState(self.params.s0)
    }

    fn evolve(&self, state: Self::State, dt: f64, rng: &mut PathRng) -> Self::State {
        let z = rng.gen_normal();
        self.evolve_with_shock(state, dt, z)
    }

    fn price(state: &Self::State) -> f64 {
        state.0
    }

    fn name() -> &'static str {
        "FxIntervention"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_process(strength: f64) -> FxInterventionProcess {
        let params = ProcessParameters::new(110.0, 0.0, 0.008, 30.0 / 252.0, 30).unwrap();
        FxInterventionProcess::new(params, strength).unwrap()
    }

    #[test]
    fn test_rejects_negative_strength() {
        let params = ProcessParameters::new(110.0, 0.0, 0.008, 1.0, 30).unwrap();
        assert!(FxInterventionProcess::new(params, -0.01).is_err());
    }

    #[test]
    fn test_intervention_is_bounded() {
        let process = test_process(0.01);
        for rate in [1.0, 50.0, 110.0, 200.0, 10_000.0] {
            let drift = process.intervention_drift(rate);
            assert!(drift.abs() <= 0.01 + 1e-15, "drift = {}", drift);
        }
    }

    #[test]
    fn test_intervention_opposes_deviation() {
        let process = test_process(0.01);
        // Above the anchor the drift pushes down, below it pushes up.
        assert!(process.intervention_drift(150.0) < 0.0);
        assert!(process.intervention_drift(80.0) > 0.0);
        assert_relative_eq!(process.intervention_drift(110.0), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_strength_matches_gbm() {
        let params = ProcessParameters::new(110.0, 0.0, 0.008, 1.0, 252).unwrap();
        let fx = FxInterventionProcess::new(params, 0.0).unwrap();
        let gbm = GbmProcess::new(params);

        let mut rng_fx = PathRng::from_seed(42);
        let mut rng_gbm = PathRng::from_seed(42);
        let mut s_fx = fx.initial_state();
        let mut s_gbm = gbm.initial_state();
        for _ in 0..252 {
            s_fx = fx.evolve(s_fx, params.dt(), &mut rng_fx);
            s_gbm = gbm.evolve(s_gbm, params.dt(), &mut rng_gbm);
        }
        assert_eq!(s_fx.0, s_gbm.0);
    }

    #[test]
    fn test_shock_variant_matches_rng_variant() {
        let process = test_process(0.01);
        let dt = process.parameters().dt();
        let mut rng = PathRng::from_seed(5);
        let z = rng.gen_normal();

        let direct = process.evolve_with_shock(process.initial_state(), dt, z);
        let mut rng = PathRng::from_seed(5);
        let via_rng = process.evolve(process.initial_state(), dt, &mut rng);
        assert_eq!(direct.0, via_rng.0);
    }
}
