//! # note_pricing
//!
//! The pricing kernel for path-dependent structured notes:
//!
//! - [`note`] - tagged note configurations, validated at construction
//! - [`payoff`] - the shared knock-in / cap-pool / margin state machine
//!   plus family-specific triggers
//! - [`mc`] - the parallel Monte Carlo engine, trial-failure accounting
//!   and aggregate statistics
//!
//! Trials are embarrassingly parallel: each one derives a private random
//! substream from the base seed, so a whole batch is bit-reproducible
//! regardless of worker count.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod mc;
pub mod note;
pub mod payoff;

pub use mc::{MonteCarloConfig, MonteCarloEngine, SimulationError, SimulationResult};
pub use note::NoteConfig;
pub use payoff::{EvalError, PathOutcome, PayoffEvaluator};
