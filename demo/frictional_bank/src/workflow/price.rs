//! Pricing workflow.
//!
//! Records the portfolio kernel once, prices one random scenario, then a
//! batch of scenarios on the worker pool, timing each phase.

use std::fmt;
use std::time::{Duration, Instant};

use pricer_kernel::{KernelStats, ResultMap};
use pricer_models::portfolio::Aggregation;
use tracing::info;

use super::{DemoWorkflow, ProgressCallback, Session, WorkflowStep};
use crate::config::DemoConfig;
use crate::error::DemoError;

/// Pricing workflow
#[derive(Debug, Default)]
pub struct PriceWorkflow;

impl PriceWorkflow {
    /// Create a new pricing workflow
    pub fn new() -> Self {
        Self
    }
}

/// Result of a pricing run.
#[derive(Debug, Clone)]
pub struct PriceReport {
    /// Aggregation of the priced outputs
    pub aggregation: Aggregation,
    /// Number of trades priced
    pub trades: usize,
    /// Kernel tape statistics
    pub stats: KernelStats,
    /// Time spent recording the kernel
    pub record_time: Duration,
    /// Outputs of the single scenario
    pub single: Vec<(String, f64)>,
    /// Time spent on the single scenario
    pub single_time: Duration,
    /// Output values of each batch scenario, in scenario order
    pub batch: Vec<Vec<(String, f64)>>,
    /// Time spent on the batch
    pub batch_time: Duration,
}

impl PriceReport {
    /// Mean of each output across the batch, in output order.
    pub fn batch_means(&self) -> Vec<(String, f64)> {
        let n = self.batch.len().max(1) as f64;
        let mut means: Vec<(String, f64)> = self
            .single
            .iter()
            .map(|(name, _)| (name.clone(), 0.0))
            .collect();
        for scenario in &self.batch {
            for ((_, acc), (_, value)) in means.iter_mut().zip(scenario) {
                *acc += value / n;
            }
        }
        means
    }
}

impl fmt::Display for PriceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Portfolio: {} trades ({})", self.trades, self.aggregation)?;
        writeln!(f, "Kernel:    {}", self.stats)?;
        writeln!(f, "Recording: {:.3} ms", millis(self.record_time))?;
        writeln!(f, "Single scenario ({:.3} ms):", millis(self.single_time))?;
        for (name, value) in &self.single {
            writeln!(f, "  {name:>5}  {value:>20.2}")?;
        }
        writeln!(
            f,
            "Batch of {} scenarios ({:.3} ms, {:.3} ms/scenario):",
            self.batch.len(),
            millis(self.batch_time),
            millis(self.batch_time) / self.batch.len().max(1) as f64
        )?;
        for (name, mean) in self.batch_means() {
            writeln!(f, "  {name:>5}  mean {mean:>15.2}")?;
        }
        Ok(())
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

/// Output values in the kernel's declared order.
fn values(results: &ResultMap) -> Vec<(String, f64)> {
    results
        .iter()
        .filter_map(|(name, value)| value.as_scalar().map(|v| (name.to_string(), v)))
        .collect()
}

impl DemoWorkflow for PriceWorkflow {
    type Report = PriceReport;

    fn name(&self) -> &str {
        "price"
    }

    fn run(
        &self,
        config: &DemoConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<PriceReport, DemoError> {
        let mut session = Session::start(config, progress.as_ref())?;
        let report = |step: WorkflowStep, fraction: f64| {
            if let Some(cb) = &progress {
                cb(step, fraction);
            }
        };

        report(WorkflowStep::PricingScenario, 0.4);
        let scenario = session.generator.scenario(&session.portfolio);
        let start = Instant::now();
        let single = session
            .portfolio
            .price(&session.engine, session.aggregation, &scenario)?;
        let single_time = start.elapsed();
        let single = values(&single);
        for name in session.kernel.output_names() {
            if !single.iter().any(|(n, _)| n == name) {
                return Err(DemoError::MissingOutput(name.clone()));
            }
        }

        report(WorkflowStep::PricingBatch, 0.6);
        let scenarios = session
            .generator
            .scenarios(&session.portfolio, config.scenarios);
        let start = Instant::now();
        let batch = session
            .portfolio
            .price_batch(&session.engine, session.aggregation, &scenarios)?;
        let batch_time = start.elapsed();
        info!(
            scenarios = batch.len(),
            workers = session.engine.evaluator().config().workers(),
            elapsed_ms = batch_time.as_millis() as u64,
            "Batch priced"
        );

        report(WorkflowStep::Completed, 1.0);
        Ok(PriceReport {
            aggregation: session.aggregation,
            trades: session.portfolio.len(),
            stats: *session.kernel.stats(),
            record_time: session.record_time,
            single,
            single_time,
            batch: batch.iter().map(values).collect(),
            batch_time,
        })
    }
}
