//! # Evaluator
//!
//! Replays recorded kernels against concrete input bindings.
//!
//! The evaluator owns a long-lived rayon thread pool sized from
//! [`EvaluatorConfig`]. A batch of scenarios shares one replay plan and is
//! distributed across the pool; each replay uses scratch buffers private to
//! its worker thread. Results keep the order of the input scenarios.
//!
//! ## Module Structure
//!
//! - `config`: worker count and parallel threshold
//! - `bindings`: placeholder to value maps
//! - `request`: output selection
//! - `results`: per-evaluation output values
//! - `plan`: live-node schedule and replay loop
//! - `scratch`: thread-local buffer reuse
//!
//! # Example
//!
//! ```rust
//! use pricer_kernel::{record, Evaluator, EvaluatorConfig, InputShape, OutputSpec, Outputs};
//!
//! let kernel = record(
//!     "affine",
//!     &InputShape::new().group("x", 2),
//!     &OutputSpec::single("y"),
//!     |inputs| {
//!         let x = inputs.group(0);
//!         Ok(Outputs::single("y", x[0] * 2.0 + x[1]))
//!     },
//! )
//! .unwrap();
//!
//! let evaluator = Evaluator::new(EvaluatorConfig::builder().workers(2).build().unwrap()).unwrap();
//! let bindings = kernel.bindings(&[[3.0, 4.0]]).unwrap();
//! let results = evaluator.evaluate(&kernel, &kernel.request_all(), &bindings).unwrap();
//! assert_eq!(results.scalar("y"), Some(10.0));
//! ```

mod bindings;
mod config;
mod plan;
mod request;
mod results;
mod scratch;

pub use bindings::InputBindings;
pub use config::{EvaluatorConfig, EvaluatorConfigBuilder, DEFAULT_PARALLEL_THRESHOLD, MAX_WORKERS};
pub use request::OutputRequest;
pub use results::{OutputValue, ResultMap};

use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, trace};

use crate::error::{ConfigError, KernelError, Result};
use crate::kernel::Kernel;
use plan::ReplayPlan;

/// Replays kernels on a dedicated worker pool.
pub struct Evaluator {
    config: EvaluatorConfig,
    pool: ThreadPool,
}

impl Evaluator {
    /// Creates an evaluator and its worker pool.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidWorkerCount` for an invalid configuration
    /// - `ConfigError::ThreadPool` if the pool cannot be created
    pub fn new(config: EvaluatorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers())
            .thread_name(|i| format!("kernel-eval-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        info!(
            workers = config.workers(),
            parallel_threshold = config.parallel_threshold(),
            "Evaluator ready"
        );
        Ok(Self { config, pool })
    }

    /// Evaluator with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Evaluator::new`].
    pub fn with_defaults() -> std::result::Result<Self, ConfigError> {
        Self::new(EvaluatorConfig::default())
    }

    /// Active configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Replays `kernel` once and returns the requested outputs.
    ///
    /// # Errors
    ///
    /// - `KernelError::Binding` for incomplete or foreign bindings, or a
    ///   handle of another kernel
    /// - `KernelError::Replay` for a malformed kernel
    pub fn evaluate(
        &self,
        kernel: &Kernel,
        request: &OutputRequest,
        bindings: &InputBindings,
    ) -> Result<ResultMap> {
        let start = Instant::now();
        let plan = ReplayPlan::build(kernel, request)?;
        let results = plan.run(kernel, bindings)?;
        trace!(
            kernel = kernel.name(),
            nodes = plan.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Evaluated kernel"
        );
        Ok(results)
    }

    /// Replays `kernel` once per scenario.
    ///
    /// Scenarios run in parallel on the worker pool unless the batch is
    /// smaller than the parallel threshold or the pool has one worker.
    /// Results are in scenario order.
    ///
    /// # Errors
    ///
    /// As for [`Evaluator::evaluate`]. Binding errors are wrapped in
    /// `BindingError::InScenario`; when several scenarios fail, the one with
    /// the lowest index is reported.
    pub fn evaluate_batch(
        &self,
        kernel: &Kernel,
        request: &OutputRequest,
        scenarios: &[InputBindings],
    ) -> Result<Vec<ResultMap>> {
        let _span = tracing::info_span!(
            "evaluate_batch",
            kernel = kernel.name(),
            scenarios = scenarios.len()
        )
        .entered();
        let start = Instant::now();
        let plan = ReplayPlan::build(kernel, request)?;

        let run = |(i, bindings): (usize, &InputBindings)| {
            plan.run(kernel, bindings)
                .map_err(|e| KernelError::from(e).in_scenario(i))
        };

        let parallel =
            self.config.workers() > 1 && scenarios.len() >= self.config.parallel_threshold();
        let outcomes: Vec<Result<ResultMap>> = if parallel {
            self.pool
                .install(|| scenarios.par_iter().enumerate().map(run).collect())
        } else {
            scenarios.iter().enumerate().map(run).collect()
        };
        let results = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        debug!(
            kernel = kernel.name(),
            scenarios = scenarios.len(),
            parallel,
            nodes = plan.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Evaluated batch"
        );
        Ok(results)
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
