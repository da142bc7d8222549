//! Mathematical building blocks: order statistics, correlation structure
//! and finite-difference curvature.

pub mod correlation;
pub mod curvature;
pub mod stats;

pub use correlation::{CholeskyFactor, CorrelationError, CorrelationMatrix};
