//! Evaluator configuration.

use crate::error::ConfigError;

/// Maximum number of worker threads.
pub const MAX_WORKERS: usize = 1024;

/// Default batch size below which scenarios are evaluated sequentially.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// Evaluator configuration.
///
/// Use [`EvaluatorConfigBuilder`] to construct validated instances. The
/// default uses one worker per logical CPU.
///
/// # Examples
///
/// ```rust
/// use pricer_kernel::EvaluatorConfig;
///
/// let config = EvaluatorConfig::builder()
///     .workers(4)
///     .parallel_threshold(16)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.workers(), 4);
/// assert_eq!(config.parallel_threshold(), 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluatorConfig {
    /// Number of worker threads in the evaluation pool.
    workers: usize,
    /// Batches smaller than this run on the calling thread.
    parallel_threshold: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, MAX_WORKERS),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EvaluatorConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> EvaluatorConfigBuilder {
        EvaluatorConfigBuilder::default()
    }

    /// Number of worker threads.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Minimum batch size for parallel evaluation.
    #[inline]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Same configuration with another worker count.
    ///
    /// Not validated here; [`EvaluatorConfig::validate`] and
    /// `Evaluator::new` reject out-of-range counts.
    #[inline]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidWorkerCount` if `workers` is 0 or greater than
    /// [`MAX_WORKERS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}

/// Builder for [`EvaluatorConfig`].
#[derive(Clone, Debug, Default)]
pub struct EvaluatorConfigBuilder {
    workers: Option<usize>,
    parallel_threshold: Option<usize>,
}

impl EvaluatorConfigBuilder {
    /// Sets the number of worker threads.
    ///
    /// # Arguments
    ///
    /// * `workers` - Worker count in [1, 1024]
    #[inline]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the minimum batch size for parallel evaluation.
    #[inline]
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = Some(threshold);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// See [`EvaluatorConfig::validate`].
    pub fn build(self) -> Result<EvaluatorConfig, ConfigError> {
        let defaults = EvaluatorConfig::default();
        let config = EvaluatorConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(defaults.parallel_threshold),
        };
        config.validate()?;
        Ok(config)
    }
}
