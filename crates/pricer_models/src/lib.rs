//! # pricer_models: OIS Curves and Portfolio Pricing Functions
//!
//! ## Layer 2 Role
//!
//! pricer_models holds the pricing functions that the kernel engine records
//! and replays. Nothing here knows about tapes: curves read their rates
//! through [`Quote`](pricer_kernel::Quote)s, and swap valuation is ordinary
//! arithmetic on [`Traced`](pricer_kernel::Traced) values.
//!
//! - Curves: [`CurveKind`](curves::CurveKind), [`OisCurve`](curves::OisCurve)
//!   (`curves`)
//! - Instruments: [`OisSwap`](instruments::OisSwap),
//!   [`SwapDirection`](instruments::SwapDirection) (`instruments`)
//! - Portfolios: [`Portfolio`](portfolio::Portfolio),
//!   [`Aggregation`](portfolio::Aggregation) (`portfolio`)
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_kernel::{Engine, EvaluatorConfig};
//! use pricer_models::curves::{CurveKind, OisCurve};
//! use pricer_models::instruments::{OisSwap, SwapDirection};
//! use pricer_models::portfolio::{Aggregation, Portfolio};
//!
//! let curves = CurveKind::ALL
//!     .iter()
//!     .map(|&kind| OisCurve::standard(kind, &[0.02; 10]).unwrap())
//!     .collect();
//! let mut portfolio = Portfolio::new(curves);
//! for curve in 0..3 {
//!     let swap = OisSwap::new(1e6, 0.02, "10Y".parse().unwrap(), SwapDirection::PayFixed).unwrap();
//!     portfolio.add_trade(curve, swap).unwrap();
//! }
//!
//! let engine = Engine::new(EvaluatorConfig::default()).unwrap();
//! let scenario = vec![vec![0.025; 10]; 3];
//! let by_ccy = portfolio
//!     .price(&engine, Aggregation::ByCurrency, &scenario)
//!     .unwrap();
//! assert!(by_ccy.scalar("EUR").unwrap() > 0.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for curve kinds and swap terms

#![deny(missing_docs)]

pub mod curves;
pub mod error;
pub mod instruments;
pub mod portfolio;

pub use error::{ModelError, ModelResult};
