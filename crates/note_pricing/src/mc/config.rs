//! Monte Carlo batch configuration.

use note_core::error::ConfigError;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of example paths retained for diagnostics.
pub const MAX_EXAMPLE_PATHS: usize = 64;

/// Default fraction of failed trials tolerated before the batch aborts.
pub const DEFAULT_MAX_FAILURE_FRACTION: f64 = 0.01;

/// Immutable Monte Carlo batch configuration.
///
/// Use [`MonteCarloConfig::builder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use note_pricing::mc::MonteCarloConfig;
///
/// let config = MonteCarloConfig::builder()
///     .num_paths(10_000)
///     .seed(42)
///     .discount_rate(0.05)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_paths(), 10_000);
/// ```
#[derive(Clone, Debug)]
pub struct MonteCarloConfig {
    num_paths: usize,
    seed: Option<u64>,
    discount_rate: Option<f64>,
    workers: Option<usize>,
    max_failure_fraction: f64,
    example_paths: usize,
}

impl MonteCarloConfig {
    /// Creates a configuration builder.
    #[inline]
    pub fn builder() -> MonteCarloConfigBuilder {
        MonteCarloConfigBuilder::default()
    }

    /// Number of trials M.
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    /// Base seed; trial i derives its substream from `seed + i`.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Annualised continuous discount rate, if any.
    #[inline]
    pub fn discount_rate(&self) -> Option<f64> {
        self.discount_rate
    }

    /// Worker-thread count override (defaults to available parallelism).
    #[inline]
    pub fn workers(&self) -> Option<usize> {
        self.workers
    }

    /// Maximum tolerated fraction of failed trials.
    #[inline]
    pub fn max_failure_fraction(&self) -> f64 {
        self.max_failure_fraction
    }

    /// Number of raw paths retained for external visualisation.
    #[inline]
    pub fn example_paths(&self) -> usize {
        self.example_paths
    }

    /// Returns a copy with the discount rate substituted (used by
    /// parameter sweeps).
    pub fn with_discount_rate(&self, rate: f64) -> Self {
        let mut config = self.clone();
        config.discount_rate = Some(rate);
        config
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Fails on a zero or oversized path count, a non-finite discount
    /// rate, a failure fraction outside [0, 1] or an example-path count
    /// above [`MAX_EXAMPLE_PATHS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_paths == 0 || self.num_paths > MAX_PATHS {
            return Err(ConfigError::invalid(
                "num_paths",
                "must be in [1, 10_000_000]",
                self.num_paths as f64,
            ));
        }
        if let Some(rate) = self.discount_rate {
            if !rate.is_finite() {
                return Err(ConfigError::invalid(
                    "discount_rate",
                    "must be finite",
                    rate,
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.max_failure_fraction) {
            return Err(ConfigError::invalid(
                "max_failure_fraction",
                "must be a fraction in [0, 1]",
                self.max_failure_fraction,
            ));
        }
        if self.example_paths > MAX_EXAMPLE_PATHS {
            return Err(ConfigError::invalid(
                "example_paths",
                "bounded diagnostic export, at most 64",
                self.example_paths as f64,
            ));
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(ConfigError::invalid(
                    "workers",
                    "must be at least 1",
                    0.0,
                ));
            }
        }
        Ok(())
    }
}

/// Builder for [`MonteCarloConfig`].
#[derive(Clone, Debug)]
pub struct MonteCarloConfigBuilder {
    num_paths: Option<usize>,
    seed: Option<u64>,
    discount_rate: Option<f64>,
    workers: Option<usize>,
    max_failure_fraction: f64,
    example_paths: usize,
}

impl Default for MonteCarloConfigBuilder {
    fn default() -> Self {
        Self {
            num_paths: None,
            seed: None,
            discount_rate: None,
            workers: None,
            max_failure_fraction: DEFAULT_MAX_FAILURE_FRACTION,
            example_paths: 4,
        }
    }
}

impl MonteCarloConfigBuilder {
    /// Sets the number of trials (required).
    #[inline]
    pub fn num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = Some(num_paths);
        self
    }

    /// Sets the base seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the annualised continuous discount rate.
    #[inline]
    pub fn discount_rate(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    /// Overrides the worker-thread count.
    #[inline]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the maximum tolerated failed-trial fraction.
    #[inline]
    pub fn max_failure_fraction(mut self, fraction: f64) -> Self {
        self.max_failure_fraction = fraction;
        self
    }

    /// Sets how many raw paths are retained for diagnostics.
    #[inline]
    pub fn example_paths(mut self, count: usize) -> Self {
        self.example_paths = count;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// `num_paths` is financially material and must be set explicitly;
    /// everything else has defaults.
    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let num_paths = self
            .num_paths
            .ok_or(ConfigError::Missing { name: "num_paths" })?;
        let config = MonteCarloConfig {
            num_paths,
            seed: self.seed,
            discount_rate: self.discount_rate,
            workers: self.workers,
            max_failure_fraction: self.max_failure_fraction,
            example_paths: self.example_paths,
        };
        config.validate()?;
        Ok(config)
    }
}
