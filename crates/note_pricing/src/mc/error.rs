//! Batch-level simulation errors.

use note_core::error::ConfigError;
use thiserror::Error;

/// Fatal errors from a Monte Carlo batch.
///
/// Per-trial failures are excluded and counted rather than surfaced here;
/// the batch only fails when the excluded fraction breaches the configured
/// integrity threshold or nothing completed at all.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Invalid configuration (propagated from construction-time checks).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Too many trials failed for the aggregate statistics to be trusted.
    #[error(
        "aggregation integrity violated: {failed}/{attempted} trials failed \
         (threshold {threshold})"
    )]
    AggregationIntegrity {
        /// Trials excluded from aggregation.
        failed: usize,
        /// Trials attempted (requested minus cancelled).
        attempted: usize,
        /// Configured maximum failure fraction.
        threshold: f64,
    },

    /// No trial completed (e.g. the batch was cancelled before it started).
    #[error("no trials completed out of {requested} requested")]
    NoCompletedTrials {
        /// Trials requested.
        requested: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_error_display() {
        let err = SimulationError::AggregationIntegrity {
            failed: 200,
            attempted: 10_000,
            threshold: 0.01,
        };
        let msg = err.to_string();
        assert!(msg.contains("200/10000"));
        assert!(msg.contains("0.01"));
    }

    #[test]
    fn test_config_error_wraps() {
        let err: SimulationError =
            ConfigError::invalid("num_paths", "must be at least 1", 0.0).into();
        assert!(err.to_string().contains("num_paths"));
    }
}
