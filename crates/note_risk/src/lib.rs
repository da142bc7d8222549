//! # note_risk
//!
//! Risk-layer utilities over the pricing kernel:
//!
//! - [`sensitivity`] - one-parameter response curves (re-run the engine
//!   across a value grid, all else fixed)
//! - [`report`] - the serialisable aggregate record consumed by external
//!   reporting layers

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod report;
pub mod sensitivity;

pub use report::RiskReport;
pub use sensitivity::{SensitivityError, SensitivityPoint, SensitivityRunner, SweepParameter};
