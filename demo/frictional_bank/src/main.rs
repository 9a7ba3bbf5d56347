//! FrictionalBank Demo CLI
//!
//! Entry point for running FrictionalBank demo scenarios.
//!
//! # Commands
//!
//! - `frictional-bank price` - Record the portfolio kernel and price scenarios
//! - `frictional-bank stats` - Record the portfolio kernel and print its statistics

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use frictional_bank::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// FrictionalBank record-once, price-many demo
#[derive(Parser)]
#[command(name = "frictional-bank")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the portfolio kernel, then price one scenario and a batch
    Price(RunArgs),

    /// Record the portfolio kernel and print tape statistics
    Stats(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Swaps booked on each curve
    #[arg(short, long)]
    trades: Option<usize>,

    /// Scenarios in the batch
    #[arg(short, long)]
    scenarios: Option<usize>,

    /// Worker threads in the evaluation pool
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for portfolio and scenario generation
    #[arg(long)]
    seed: Option<u64>,

    /// Report NPV per currency instead of one total
    #[arg(long)]
    per_currency: bool,
}

impl From<&RunArgs> for ConfigOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            trades_per_curve: args.trades,
            scenarios: args.scenarios,
            workers: args.workers,
            seed: args.seed,
            per_currency: args.per_currency,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let args = match &cli.command {
        Commands::Price(args) | Commands::Stats(args) => args,
    };
    let config = DemoConfig::resolve(cli.config.as_deref(), &ConfigOverrides::from(args))
        .context("loading demo configuration")?;

    // RUST_LOG wins over the configured level
    let level = config.log_level.to_lowercase();
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "frictional_bank={level},pricer_kernel={level},pricer_models={level}"
        ))
    })?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!(
        trades_per_curve = config.trades_per_curve,
        scenarios = config.scenarios,
        workers = config.evaluator.workers(),
        per_currency = config.per_currency,
        "FrictionalBank Demo Starting..."
    );

    match cli.command {
        Commands::Price(_) => {
            let workflow = PriceWorkflow::new();
            let report = workflow
                .run(&config, None)
                .with_context(|| format!("running {} workflow", workflow.name()))?;
            print!("{report}");
        }
        Commands::Stats(_) => {
            let workflow = StatsWorkflow::new();
            let report = workflow
                .run(&config, None)
                .with_context(|| format!("running {} workflow", workflow.name()))?;
            print!("{report}");
        }
    }

    Ok(())
}
