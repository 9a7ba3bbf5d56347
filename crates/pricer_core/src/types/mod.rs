//! Core financial convention types.
//!
//! This module provides:
//! - `currency`: ISO 4217 currency codes for the overnight index markets
//! - `tenor`: Curve pillar tenors such as `1D`, `3M`, `10Y`
//! - `day_count`: Day count conventions used to turn tenors into year fractions
//! - `error`: Structured error types for parsing
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level.

pub mod currency;
pub mod day_count;
pub mod error;
pub mod tenor;

// Re-export commonly used types at module level
pub use currency::Currency;
pub use day_count::DayCount;
pub use error::{CurrencyError, TenorError};
pub use tenor::{Tenor, TenorUnit};
