//! Interest rate instruments priced off [`OisCurve`](crate::curves::OisCurve).
//!
//! Instruments hold only trade terms. Valuation reads the curve through its
//! quotes, so the same `npv` code prices directly on market rates and
//! records a kernel when the quotes hold placeholders.

mod ois_swap;

pub use ois_swap::{OisSwap, SwapDirection};
