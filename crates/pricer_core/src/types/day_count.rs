//! Day count conventions.

use std::fmt;

/// Day count convention used to convert a number of days into a year fraction.
///
/// # Examples
///
/// ```
/// use pricer_core::types::DayCount;
///
/// assert_eq!(DayCount::Act360.year_fraction_days(360.0), 1.0);
/// assert_eq!(DayCount::Act365Fixed.name(), "ACT/365F");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DayCount {
    /// Actual/360: actual_days / 360.0 (SOFR, ESTR)
    Act360,
    /// Actual/365 Fixed: actual_days / 365.0 (SONIA)
    Act365Fixed,
}

impl DayCount {
    /// Returns the standard convention name.
    pub fn name(&self) -> &'static str {
        match self {
            DayCount::Act360 => "ACT/360",
            DayCount::Act365Fixed => "ACT/365F",
        }
    }

    /// Days in the convention's year basis.
    #[inline]
    pub fn basis(&self) -> f64 {
        match self {
            DayCount::Act360 => 360.0,
            DayCount::Act365Fixed => 365.0,
        }
    }

    /// Year fraction for a period of `days` actual days.
    #[inline]
    pub fn year_fraction_days(&self, days: f64) -> f64 {
        days / self.basis()
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
