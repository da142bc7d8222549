//! The stochastic process abstraction.
//!
//! Every model variant implements [`StochasticProcess`]: an initial state
//! plus a one-step transition driven by an injected [`PathRng`]. The
//! transition is deterministic given the generator stream, which is what
//! makes a whole run reproducible from a single seed.
//!
//! Dispatch over variants is enum-based at the call sites that need it;
//! `Box<dyn StochasticProcess>` is never used.

use note_core::rng::PathRng;

use crate::params::ProcessParameters;

/// Single-factor state: the price alone.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PriceState(pub f64);

/// Two-factor state for stochastic-volatility models.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PriceVolState {
    /// Current price.
    pub price: f64,
    /// Current instantaneous volatility.
    pub vol: f64,
}

/// One-step stochastic process model.
///
/// # Contract
///
/// - `evolve` consumes randomness only through the supplied [`PathRng`];
///   given the same stream, the transition is deterministic.
/// - Returned prices are clamped to the configured strictly-positive price
///   floor; stochastic-vol variants clamp volatility to its own floor.
pub trait StochasticProcess {
    /// Model-specific state (price-only or price + volatility).
    type State: Clone + Copy;

    /// Shared simulation parameters (initial price, horizon, step count,
    /// price floor).
    fn parameters(&self) -> &ProcessParameters;

    /// State at t = 0.
    fn initial_state(&self) -> Self::State;

    /// Advances the state by one step of size `dt`.
    fn evolve(&self, state: Self::State, dt: f64, rng: &mut PathRng) -> Self::State;

    /// Price component of a state.
    fn price(state: &Self::State) -> f64;

    /// Instantaneous volatility of a state, for models that track one.
    fn instant_vol(_state: &Self::State) -> Option<f64> {
        None
    }

    /// Model name for logging.
    fn name() -> &'static str;
}
