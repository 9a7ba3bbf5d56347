//! Fixed-for-overnight swap.
//!
//! The floating leg of an OIS compounds the overnight index, so on a
//! single-curve setup its value telescopes to `N * (1 - DF(T))`. The fixed
//! leg pays annually with the last period cut at maturity.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::Tenor;
//! use pricer_models::curves::{CurveKind, OisCurve};
//! use pricer_models::instruments::{OisSwap, SwapDirection};
//!
//! let curve = OisCurve::standard(CurveKind::Sofr, &[0.02; 10]).unwrap();
//! let maturity: Tenor = "5Y".parse().unwrap();
//! let swap = OisSwap::new(1_000_000.0, 0.02, maturity, SwapDirection::PayFixed).unwrap();
//!
//! let par = swap.par_rate(&curve).concrete().unwrap();
//! let at_par = swap.with_fixed_rate(par).unwrap();
//! assert!(at_par.npv(&curve).concrete().unwrap().abs() < 1e-6);
//! ```

use std::fmt;

use pricer_core::types::{DayCount, Tenor};
use pricer_kernel::Traced;

use crate::curves::OisCurve;
use crate::error::{ModelError, ModelResult};

/// Direction of the fixed leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwapDirection {
    /// Pay fixed, receive the overnight index.
    #[default]
    PayFixed,
    /// Receive fixed, pay the overnight index.
    ReceiveFixed,
}

impl SwapDirection {
    /// Sign applied to the pay-fixed value.
    ///
    /// - PayFixed: +1
    /// - ReceiveFixed: -1
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            SwapDirection::PayFixed => 1.0,
            SwapDirection::ReceiveFixed => -1.0,
        }
    }
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::PayFixed => write!(f, "PayFixed"),
            SwapDirection::ReceiveFixed => write!(f, "ReceiveFixed"),
        }
    }
}

/// Overnight index swap with an annual fixed leg.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OisSwap {
    notional: f64,
    fixed_rate: f64,
    maturity: Tenor,
    direction: SwapDirection,
}

impl OisSwap {
    /// Creates a swap.
    ///
    /// # Errors
    ///
    /// - `ModelError::InvalidNotional` unless `notional` is finite and positive
    /// - `ModelError::InvalidFixedRate` unless `fixed_rate` is finite
    pub fn new(
        notional: f64,
        fixed_rate: f64,
        maturity: Tenor,
        direction: SwapDirection,
    ) -> ModelResult<Self> {
        if !(notional.is_finite() && notional > 0.0) {
            return Err(ModelError::InvalidNotional(notional));
        }
        if !fixed_rate.is_finite() {
            return Err(ModelError::InvalidFixedRate(fixed_rate));
        }
        Ok(Self {
            notional,
            fixed_rate,
            maturity,
            direction,
        })
    }

    /// Same trade with another fixed rate.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidFixedRate` unless `fixed_rate` is finite.
    pub fn with_fixed_rate(&self, fixed_rate: f64) -> ModelResult<Self> {
        Self::new(self.notional, fixed_rate, self.maturity, self.direction)
    }

    /// Notional amount.
    #[inline]
    pub fn notional(&self) -> f64 {
        self.notional
    }

    /// Fixed coupon rate.
    #[inline]
    pub fn fixed_rate(&self) -> f64 {
        self.fixed_rate
    }

    /// Maturity tenor.
    #[inline]
    pub fn maturity(&self) -> Tenor {
        self.maturity
    }

    /// Fixed leg direction.
    #[inline]
    pub fn direction(&self) -> SwapDirection {
        self.direction
    }

    /// Fixed leg payment times and accrual fractions in `day_count`.
    ///
    /// Payments fall on each anniversary; the final one is at maturity, so
    /// a stub maturity such as `18M` gets a short last period.
    pub fn fixed_schedule(&self, day_count: DayCount) -> Vec<(f64, f64)> {
        let year = day_count.year_fraction_days(365.0);
        let end = self.maturity.year_fraction(day_count);
        let mut prev = 0.0;
        (1..=self.maturity.whole_years())
            .map(|i| {
                let t = (f64::from(i) * year).min(end);
                let accrual = t - prev;
                prev = t;
                (t, accrual)
            })
            .collect()
    }

    /// Fixed leg annuity `Σ τᵢ DF(tᵢ)`.
    pub fn annuity(&self, curve: &OisCurve) -> Traced {
        self.fixed_schedule(curve.day_count())
            .into_iter()
            .map(|(t, accrual)| curve.discount(t) * accrual)
            .sum()
    }

    /// Fixed rate at which the swap is worth zero.
    pub fn par_rate(&self, curve: &OisCurve) -> Traced {
        let end = self.maturity.year_fraction(curve.day_count());
        (1.0 - curve.discount(end)) / self.annuity(curve)
    }

    /// Present value `±N * ((1 - DF(T)) - K * annuity)`.
    ///
    /// Positive for a pay-fixed swap whose par rate is above the fixed rate.
    pub fn npv(&self, curve: &OisCurve) -> Traced {
        let end = self.maturity.year_fraction(curve.day_count());
        let floating = 1.0 - curve.discount(end);
        let fixed = self.annuity(curve) * self.fixed_rate;
        (floating - fixed) * (self.notional * self.direction.sign())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveKind;
    use approx::assert_relative_eq;

    fn tenor(s: &str) -> Tenor {
        s.parse().unwrap()
    }

    fn flat(kind: CurveKind, rate: f64) -> OisCurve {
        OisCurve::standard(kind, &[rate; 10]).unwrap()
    }

    #[test]
    fn test_invalid_terms() {
        assert_eq!(
            OisSwap::new(0.0, 0.01, tenor("1Y"), SwapDirection::PayFixed),
            Err(ModelError::InvalidNotional(0.0))
        );
        assert!(matches!(
            OisSwap::new(1.0, f64::NAN, tenor("1Y"), SwapDirection::PayFixed),
            Err(ModelError::InvalidFixedRate(_))
        ));
    }

    #[test]
    fn test_annual_schedule() {
        let swap = OisSwap::new(1.0, 0.01, tenor("3Y"), SwapDirection::PayFixed).unwrap();
        let schedule = swap.fixed_schedule(DayCount::Act365Fixed);
        assert_eq!(schedule, vec![(1.0, 1.0), (2.0, 1.0), (3.0, 1.0)]);
    }

    #[test]
    fn test_stub_schedule() {
        let swap = OisSwap::new(1.0, 0.01, tenor("18M"), SwapDirection::PayFixed).unwrap();
        let schedule = swap.fixed_schedule(DayCount::Act365Fixed);
        assert_eq!(schedule.len(), 2);
        assert_relative_eq!(schedule[1].0, 1.5, epsilon = 1e-12);
        assert_relative_eq!(schedule[1].1, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_short_swap_single_period() {
        let swap = OisSwap::new(1.0, 0.01, tenor("3M"), SwapDirection::PayFixed).unwrap();
        let schedule = swap.fixed_schedule(DayCount::Act360);
        assert_eq!(schedule.len(), 1);
        assert_relative_eq!(schedule[0].1, 91.25 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_npv_formula() {
        let curve = flat(CurveKind::Sonia, 0.02);
        let swap = OisSwap::new(1_000_000.0, 0.03, tenor("2Y"), SwapDirection::PayFixed).unwrap();

        let df1 = (-0.02f64).exp();
        let df2 = (-0.04f64).exp();
        let expected = 1_000_000.0 * ((1.0 - df2) - 0.03 * (df1 + df2));
        assert_relative_eq!(
            swap.npv(&curve).concrete().unwrap(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_direction_flips_sign() {
        let curve = flat(CurveKind::Sofr, 0.025);
        let pay = OisSwap::new(1e6, 0.01, tenor("10Y"), SwapDirection::PayFixed).unwrap();
        let receive = OisSwap::new(1e6, 0.01, tenor("10Y"), SwapDirection::ReceiveFixed).unwrap();

        let p = pay.npv(&curve).concrete().unwrap();
        let r = receive.npv(&curve).concrete().unwrap();
        assert!(p > 0.0);
        assert_relative_eq!(p, -r, max_relative = 1e-15);
    }

    #[test]
    fn test_par_rate_zeroes_npv() {
        let curve = OisCurve::standard(
            CurveKind::Estr,
            &[0.01, 0.01, 0.01, 0.01, 0.01, 0.02, 0.02, 0.025, 0.03, 0.035],
        )
        .unwrap();
        let swap = OisSwap::new(1e6, 0.0, tenor("7Y"), SwapDirection::ReceiveFixed).unwrap();
        let par = swap.par_rate(&curve).concrete().unwrap();
        let npv = swap.with_fixed_rate(par).unwrap().npv(&curve).concrete().unwrap();
        assert!(npv.abs() < 1e-6, "npv at par = {npv}");
    }
}
