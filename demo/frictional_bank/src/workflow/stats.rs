//! Kernel statistics workflow.

use std::fmt;
use std::time::Duration;

use pricer_kernel::KernelStats;
use pricer_models::portfolio::Aggregation;

use super::{DemoWorkflow, ProgressCallback, Session, WorkflowStep};
use crate::config::DemoConfig;
use crate::error::DemoError;

/// Records the portfolio kernel and reports its statistics
#[derive(Debug, Default)]
pub struct StatsWorkflow;

impl StatsWorkflow {
    /// Create a new statistics workflow
    pub fn new() -> Self {
        Self
    }
}

/// Kernel statistics of a recorded portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    /// Kernel name
    pub kernel: String,
    /// Aggregation of the outputs
    pub aggregation: Aggregation,
    /// Number of trades recorded
    pub trades: usize,
    /// Input group names and sizes
    pub input_groups: Vec<(String, usize)>,
    /// Declared outputs
    pub outputs: Vec<String>,
    /// Tape statistics
    pub stats: KernelStats,
    /// Time spent recording
    pub record_time: Duration,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kernel '{}' ({} trades)", self.kernel, self.trades)?;
        writeln!(f, "  recorded in {:.3} ms", self.record_time.as_secs_f64() * 1e3)?;
        for (name, len) in &self.input_groups {
            writeln!(f, "  input  {name:<6} {len} placeholders")?;
        }
        writeln!(f, "  output {}", self.outputs.join(", "))?;
        writeln!(f, "  operations {:>10}", self.stats.operations)?;
        writeln!(f, "  inputs     {:>10}", self.stats.inputs)?;
        writeln!(f, "  constants  {:>10}", self.stats.constants)?;
        writeln!(f, "  passive    {:>10}", self.stats.passive)?;
        writeln!(f, "  dead       {:>10}", self.stats.dead)?;
        Ok(())
    }
}

impl DemoWorkflow for StatsWorkflow {
    type Report = StatsReport;

    fn name(&self) -> &str {
        "stats"
    }

    fn run(
        &self,
        config: &DemoConfig,
        progress: Option<ProgressCallback>,
    ) -> Result<StatsReport, DemoError> {
        let session = Session::start(config, progress.as_ref())?;
        if let Some(cb) = &progress {
            cb(WorkflowStep::Completed, 1.0);
        }

        let kernel = &session.kernel;
        Ok(StatsReport {
            kernel: kernel.name().to_string(),
            aggregation: session.aggregation,
            trades: session.portfolio.len(),
            input_groups: kernel
                .input_groups()
                .iter()
                .map(|g| (g.name().to_string(), g.len()))
                .collect(),
            outputs: kernel.output_names().to_vec(),
            stats: *kernel.stats(),
            record_time: session.record_time,
        })
    }
}
