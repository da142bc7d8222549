//! Monte Carlo batch execution and aggregation.

mod config;
mod engine;
mod error;
mod result;

pub use config::{MonteCarloConfig, MonteCarloConfigBuilder, MAX_EXAMPLE_PATHS, MAX_PATHS};
pub use engine::{CancelToken, MonteCarloEngine};
pub use error::SimulationError;
pub use result::{SimulationResult, TriggerStats};
