//! # FrictionalBank Demo
//!
//! FrictionalBank demonstrates the record-once, price-many workflow of the
//! Neutryx pricing kernel on a randomly generated OIS swap portfolio.
//!
//! ## Features
//!
//! - **Pricing**: record the portfolio kernel once, then price a single
//!   random rate scenario and a batch of scenarios on the worker pool
//! - **Statistics**: inspect the recorded tape (operations, constants,
//!   passive and dead nodes)
//!
//! ## Architecture
//!
//! This crate sits in the Demo layer, on top of the Pricer layer:
//! - `pricer_core`: currencies, tenors, day counts
//! - `pricer_kernel`: recording, kernel cache, evaluator
//! - `pricer_models`: OIS curves, swaps, portfolio pricing functions

pub mod config;
pub mod error;
pub mod market;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigOverrides, DemoConfig};
    pub use crate::error::DemoError;
    pub use crate::market::MarketGenerator;
    pub use crate::workflow::{
        DemoWorkflow, PriceReport, PriceWorkflow, ProgressCallback, StatsReport, StatsWorkflow,
        WorkflowStep,
    };
}
