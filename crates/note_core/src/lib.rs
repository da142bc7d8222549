//! # note_core
//!
//! Numeric foundation for the structured-note Monte Carlo engine:
//!
//! - [`rng`] - seeded random sources, Poisson-jump draws and correlated
//!   normal sampling with a non-positive-definite fallback
//! - [`math`] - order statistics, correlation/Cholesky, finite-difference
//!   curvature
//! - [`path`] - the simulated path container
//! - [`error`] - construction-time configuration errors
//!
//! This crate has no knowledge of note products or pricing; those live in
//! the layers above.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod math;
pub mod path;
pub mod rng;

pub use error::ConfigError;
pub use path::Path;
pub use rng::{CorrelatedNormals, PathRng};
