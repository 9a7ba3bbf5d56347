//! # pricer_core: Foundation Types
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace, providing the small set
//! of market conventions shared by the kernel glue and the demo:
//! - Currency types: `Currency` (`types::currency`)
//! - Tenor pillars: `Tenor`, `TenorUnit` (`types::tenor`)
//! - Day count conventions: `DayCount` (`types::day_count`)
//! - Error types: `CurrencyError`, `TenorError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates:
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::types::{Currency, DayCount, Tenor};
//!
//! let tenor: Tenor = "6M".parse().unwrap();
//! assert!((tenor.year_fraction(DayCount::Act365Fixed) - 0.5).abs() < 1e-2);
//!
//! let usd = Currency::USD;
//! assert_eq!(usd.code(), "USD");
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for Currency, Tenor, DayCount

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod types;
