//! Demo workflow definitions and implementations.
//!
//! Provides the trait interface and implementations for demo workflows:
//! - Pricing: record the portfolio kernel, price one scenario and a batch
//! - Statistics: record the portfolio kernel and report its tape statistics

mod price;
mod stats;

pub use price::{PriceReport, PriceWorkflow};
pub use stats::{StatsReport, StatsWorkflow};

use std::sync::Arc;
use std::time::{Duration, Instant};

use pricer_kernel::{Engine, Kernel};
use pricer_models::portfolio::{Aggregation, Portfolio};
use tracing::info;

use crate::config::DemoConfig;
use crate::error::DemoError;
use crate::market::MarketGenerator;

/// Workflow processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Generating the random portfolio
    BuildingPortfolio,
    /// Recording the portfolio kernel
    Recording,
    /// Pricing a single scenario
    PricingScenario,
    /// Pricing the scenario batch
    PricingBatch,
    /// Workflow completed
    Completed,
}

impl WorkflowStep {
    /// Get the step name for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::BuildingPortfolio => "Building Portfolio",
            Self::Recording => "Recording Kernel",
            Self::PricingScenario => "Pricing Scenario",
            Self::PricingBatch => "Pricing Batch",
            Self::Completed => "Completed",
        }
    }
}

/// Progress callback type for reporting workflow progress
pub type ProgressCallback = Arc<dyn Fn(WorkflowStep, f64) + Send + Sync>;

/// Demo workflow trait
///
/// All demo workflows implement this trait for unified execution.
pub trait DemoWorkflow {
    /// Report produced by a successful run
    type Report;

    /// Get the workflow name
    fn name(&self) -> &str;

    /// Execute the workflow
    fn run(
        &self,
        config: &DemoConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<Self::Report, DemoError>;
}

/// Aggregation selected by the configuration.
pub fn aggregation(config: &DemoConfig) -> Aggregation {
    if config.per_currency {
        Aggregation::ByCurrency
    } else {
        Aggregation::Total
    }
}

/// State shared by every workflow once the kernel is recorded.
pub(crate) struct Session {
    pub(crate) engine: Engine,
    pub(crate) generator: MarketGenerator,
    pub(crate) portfolio: Portfolio,
    pub(crate) aggregation: Aggregation,
    pub(crate) kernel: Arc<Kernel>,
    pub(crate) record_time: Duration,
}

impl Session {
    /// Builds the portfolio and records its kernel.
    ///
    /// The per-currency demo uses random maturities, the total demo a
    /// fixed 10Y maturity.
    pub(crate) fn start(
        config: &DemoConfig,
        progress: Option<&ProgressCallback>,
    ) -> Result<Self, DemoError> {
        let report = |step: WorkflowStep, fraction: f64| {
            if let Some(cb) = progress {
                cb(step, fraction);
            }
        };

        report(WorkflowStep::BuildingPortfolio, 0.0);
        let aggregation = aggregation(config);
        let mut generator = MarketGenerator::new(config.seed);
        let portfolio = generator.portfolio(
            config.trades_per_curve,
            aggregation == Aggregation::ByCurrency,
        )?;
        info!(
            trades = portfolio.len(),
            curves = portfolio.curves().len(),
            seed = config.seed,
            "Portfolio built"
        );

        report(WorkflowStep::Recording, 0.2);
        let engine = Engine::new(config.evaluator.clone())?;
        let start = Instant::now();
        let kernel = portfolio.kernel(&engine, aggregation)?;
        let record_time = start.elapsed();
        info!(
            kernel = kernel.name(),
            stats = %kernel.stats(),
            elapsed_ms = record_time.as_millis() as u64,
            "Kernel recorded"
        );

        Ok(Self {
            engine,
            generator,
            portfolio,
            aggregation,
            kernel,
            record_time,
        })
    }
}
