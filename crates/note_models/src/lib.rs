//! # note_models
//!
//! Stochastic process models and path simulation for the structured-note
//! engine:
//!
//! - [`GbmProcess`] - geometric Brownian motion (log-space exact step)
//! - [`JumpDiffusionProcess`] - GBM plus compound-Poisson jumps
//! - [`StochVolProcess`] - mean-reverting volatility feeding the price step
//! - [`FxInterventionProcess`] - FX rate with bounded intervention drift
//!
//! All models implement [`StochasticProcess`] and are driven by an
//! injected seeded generator; [`simulate::PathStepper`] supports
//! step-by-step pull so evaluation can terminate a path early.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fx;
pub mod gbm;
pub mod jump;
pub mod params;
pub mod process;
pub mod simulate;
pub mod stochvol;

pub use fx::FxInterventionProcess;
pub use gbm::GbmProcess;
pub use jump::JumpDiffusionProcess;
pub use params::ProcessParameters;
pub use process::{PriceState, PriceVolState, StochasticProcess};
pub use simulate::{simulate_fx_legs, simulate_path, PathStepper};
pub use stochvol::StochVolProcess;
