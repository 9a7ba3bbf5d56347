//! Overnight index swap discount curves.
//!
//! This module provides:
//! - [`CurveKind`]: the closed set of overnight indices (SOFR, ESTR, SONIA)
//!   with their market conventions
//! - [`OisCurve`]: a zero-rate curve on tenor pillars whose rates are
//!   [`Quote`](pricer_kernel::Quote)s, so the curve can be recorded into a
//!   kernel and later replayed against scenario rates
//!
//! Curves are quote sources: each curve becomes one input group of the
//! recorded kernel, one placeholder per pillar.

mod kind;
mod ois;

pub use kind::CurveKind;
pub use ois::OisCurve;
