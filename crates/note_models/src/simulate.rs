//! Path simulation: bulk generation and step-by-step pull.
//!
//! [`PathStepper`] advances one step per call so a payoff evaluator can
//! stop generation as soon as a hard terminal state (forced liquidation)
//! is reached; the values traversed so far become the truncated [`Path`].
//! [`simulate_path`] is the bulk form, implemented over the stepper.

use note_core::error::ConfigError;
use note_core::rng::{CorrelatedNormals, PathRng};
use note_core::Path;

use crate::fx::FxInterventionProcess;
use crate::process::StochasticProcess;

/// Pull-based path generator.
///
/// Records every traversed price (and volatility, for two-factor models)
/// so the partial path remains available after an early stop.
pub struct PathStepper<'a, P: StochasticProcess> {
    process: &'a P,
    rng: &'a mut PathRng,
    state: P::State,
    dt: f64,
    remaining: usize,
    values: Vec<f64>,
    vols: Option<Vec<f64>>,
}

impl<'a, P: StochasticProcess> PathStepper<'a, P> {
    /// Starts a new path at the process's initial state.
    pub fn new(process: &'a P, rng: &'a mut PathRng) -> Self {
        let params = process.parameters();
        let state = process.initial_state();
        let mut values = Vec::with_capacity(params.n_steps + 1);
        values.push(P::price(&state));
        let vols = P::instant_vol(&state).map(|v| {
            let mut track = Vec::with_capacity(params.n_steps + 1);
            track.push(v);
            track
        });
        Self {
            process,
            rng,
            state,
            dt: params.dt(),
            remaining: params.n_steps,
            values,
            vols,
        }
    }

    /// The most recently produced price.
    #[inline]
    pub fn current_price(&self) -> f64 {
        *self.values.last().expect("stepper records the initial price")
    }

    /// Steps remaining before the horizon.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Advances one step and returns the new price, or `None` at the
    /// horizon.
    pub fn step(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.state = self.process.evolve(self.state, self.dt, self.rng);
        let price = P::price(&self.state);
        self.values.push(price);
        if let (Some(track), Some(v)) = (self.vols.as_mut(), P::instant_vol(&self.state)) {
            track.push(v);
        }
        Some(price)
    }

    /// Finalises the (possibly truncated) path.
    pub fn into_path(self) -> Path {
        match self.vols {
            Some(vols) => Path::with_vols(self.values, vols),
            None => Path::new(self.values),
        }
    }
}

/// Simulates one full path of `process.parameters().n_steps` steps.
pub fn simulate_path<P: StochasticProcess>(process: &P, rng: &mut PathRng) -> Path {
    let mut stepper = PathStepper::new(process, rng);
    while stepper.step().is_some() {}
    stepper.into_path()
}

/// Simulates k FX legs driven by one correlated shock vector per step.
///
/// All legs must share the same step count; the sampler dimension must
/// equal the number of legs.
///
/// # Errors
///
/// Fails at construction time (before any draw) on mismatched step counts
/// or sampler dimension.
pub fn simulate_fx_legs(
    legs: &[FxInterventionProcess],
    sampler: &CorrelatedNormals,
    rng: &mut PathRng,
) -> Result<Vec<Path>, ConfigError> {
    if legs.is_empty() {
        return Err(ConfigError::Missing { name: "legs" });
    }
    if sampler.dim() != legs.len() {
        return Err(ConfigError::Inconsistent {
            detail: format!(
                "correlation dimension ({}) does not match leg count ({})",
                sampler.dim(),
                legs.len()
            ),
        });
    }
    let n_steps = legs[0].parameters().n_steps;
    if legs.iter().any(|leg| leg.parameters().n_steps != n_steps) {
        return Err(ConfigError::Inconsistent {
            detail: "all FX legs must share the same step count".to_string(),
        });
    }

    let mut states: Vec<_> = legs.iter().map(|leg| leg.initial_state()).collect();
    let mut tracks: Vec<Vec<f64>> = states
        .iter()
        .map(|s| {
            let mut track = Vec::with_capacity(n_steps + 1);
            track.push(s.0);
            track
        })
        .collect();

    for _ in 0..n_steps {
        let shocks = sampler.sample(rng);
        for (i, leg) in legs.iter().enumerate() {
            let dt = leg.parameters().dt();
            states[i] = leg.evolve_with_shock(states[i], dt, shocks[i]);
            tracks[i].push(states[i].0);
        }
    }

    Ok(tracks.into_iter().map(Path::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbm::GbmProcess;
    use crate::params::ProcessParameters;
    use crate::stochvol::StochVolProcess;
    use note_core::math::CorrelationMatrix;

    fn gbm() -> GbmProcess {
        GbmProcess::new(ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 252).unwrap())
    }

    #[test]
    fn test_full_path_length() {
        let process = gbm();
        let mut rng = PathRng::from_seed(42);
        let path = simulate_path(&process, &mut rng);
        assert_eq!(path.len(), 253);
        assert_eq!(path.initial(), 100.0);
    }

    #[test]
    fn test_bulk_matches_stepper() {
        let process = gbm();
        let mut rng_a = PathRng::from_seed(42);
        let bulk = simulate_path(&process, &mut rng_a);

        let mut rng_b = PathRng::from_seed(42);
        let mut stepper = PathStepper::new(&process, &mut rng_b);
        while stepper.step().is_some() {}
        assert_eq!(bulk, stepper.into_path());
    }

    #[test]
    fn test_early_stop_truncates_path() {
        let process = gbm();
        let mut rng = PathRng::from_seed(42);
        let mut stepper = PathStepper::new(&process, &mut rng);
        for _ in 0..10 {
            assert!(stepper.step().is_some());
        }
        let path = stepper.into_path();
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn test_stepper_exhausts_at_horizon() {
        let process =
            GbmProcess::new(ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 5).unwrap());
        let mut rng = PathRng::from_seed(42);
        let mut stepper = PathStepper::new(&process, &mut rng);
        for _ in 0..5 {
            assert!(stepper.step().is_some());
        }
        assert!(stepper.step().is_none());
        assert_eq!(stepper.remaining(), 0);
    }

    #[test]
    fn test_stochvol_path_carries_vol_track() {
        let params = ProcessParameters::new(100.0, 0.05, 0.2, 1.0, 100).unwrap();
        let process = StochVolProcess::new(params, 1.5, 0.25, 0.3, -0.5, 1e-4).unwrap();
        let mut rng = PathRng::from_seed(42);
        let path = simulate_path(&process, &mut rng);
        let vols = path.vols().expect("stochastic-vol path records its track");
        assert_eq!(vols.len(), path.len());
        assert!(vols.iter().all(|&v| v >= 1e-4));
    }

    #[test]
    fn test_fx_legs_share_shock_stream() {
        let params = ProcessParameters::new(1.0, 0.0, 0.01, 30.0 / 252.0, 30).unwrap();
        let legs: Vec<_> = (0..3)
            .map(|_| FxInterventionProcess::new(params, 0.01).unwrap())
            .collect();
        let matrix = CorrelationMatrix::new(
            &[1.0, 0.5, 0.2, 0.5, 1.0, 0.4, 0.2, 0.4, 1.0],
            3,
        )
        .unwrap();
        let sampler = CorrelatedNormals::new(&matrix);

        let mut rng = PathRng::from_seed(42);
        let paths = simulate_fx_legs(&legs, &sampler, &mut rng).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert_eq!(path.len(), 31);
        }
    }

    #[test]
    fn test_fx_legs_dimension_mismatch() {
        let params = ProcessParameters::new(1.0, 0.0, 0.01, 1.0, 30).unwrap();
        let legs = vec![FxInterventionProcess::new(params, 0.01).unwrap()];
        let sampler = CorrelatedNormals::independent(2);
        let mut rng = PathRng::from_seed(42);
        assert!(simulate_fx_legs(&legs, &sampler, &mut rng).is_err());
    }

    #[test]
    fn test_fx_legs_empty_rejected() {
        let sampler = CorrelatedNormals::independent(0);
        let mut rng = PathRng::from_seed(42);
        assert!(simulate_fx_legs(&[], &sampler, &mut rng).is_err());
    }
}
