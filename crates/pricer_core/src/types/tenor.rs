//! Curve pillar tenors.
//!
//! A tenor is a positive count of calendar units (`1D`, `2W`, `3M`, `10Y`).
//! Tenors carry no calendar; conversion to a year fraction uses an
//! approximate day count per unit, which is all the demo curves need.

use std::fmt;
use std::str::FromStr;

use super::day_count::DayCount;
use super::error::TenorError;

/// Calendar unit of a tenor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TenorUnit {
    /// Days
    Day,
    /// Weeks
    Week,
    /// Months
    Month,
    /// Years
    Year,
}

impl TenorUnit {
    fn suffix(&self) -> char {
        match self {
            TenorUnit::Day => 'D',
            TenorUnit::Week => 'W',
            TenorUnit::Month => 'M',
            TenorUnit::Year => 'Y',
        }
    }
}

/// A curve pillar or instrument maturity such as `3M` or `10Y`.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{DayCount, Tenor, TenorUnit};
///
/// let tenor: Tenor = "10Y".parse().unwrap();
/// assert_eq!(tenor.count(), 10);
/// assert_eq!(tenor.unit(), TenorUnit::Year);
/// assert_eq!(tenor.to_string(), "10Y");
/// assert_eq!(tenor.year_fraction(DayCount::Act365Fixed), 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tenor {
    count: u32,
    unit: TenorUnit,
}

impl Tenor {
    /// The ten standard OIS curve pillars, 1D through 30Y.
    pub const STANDARD_PILLARS: [&'static str; 10] =
        ["1D", "1M", "3M", "6M", "1Y", "3Y", "5Y", "10Y", "20Y", "30Y"];

    /// Creates a tenor. Returns `None` for a zero count.
    pub fn new(count: u32, unit: TenorUnit) -> Option<Self> {
        (count > 0).then_some(Self { count, unit })
    }

    /// Parses [`Tenor::STANDARD_PILLARS`].
    pub fn standard_pillars() -> Vec<Tenor> {
        Self::STANDARD_PILLARS
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    /// Number of units.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Calendar unit.
    #[inline]
    pub fn unit(&self) -> TenorUnit {
        self.unit
    }

    /// Approximate number of actual days spanned by the tenor.
    pub fn approx_days(&self) -> f64 {
        let n = self.count as f64;
        match self.unit {
            TenorUnit::Day => n,
            TenorUnit::Week => 7.0 * n,
            TenorUnit::Month => n * 365.0 / 12.0,
            TenorUnit::Year => n * 365.0,
        }
    }

    /// Year fraction of the tenor under `day_count`.
    #[inline]
    pub fn year_fraction(&self, day_count: DayCount) -> f64 {
        day_count.year_fraction_days(self.approx_days())
    }

    /// Whole number of years, rounding partial years up (minimum 1).
    ///
    /// Used to lay out annual payment schedules.
    pub fn whole_years(&self) -> u32 {
        let years = self.approx_days() / 365.0;
        (years.ceil() as u32).max(1)
    }
}

impl FromStr for Tenor {
    type Err = TenorError;

    fn from_str(s: &str) -> Result<Self, TenorError> {
        let trimmed = s.trim();
        let unit_char = trimmed.chars().last().ok_or(TenorError::Empty)?;
        let unit = match unit_char.to_ascii_uppercase() {
            'D' => TenorUnit::Day,
            'W' => TenorUnit::Week,
            'M' => TenorUnit::Month,
            'Y' => TenorUnit::Year,
            other => {
                return Err(TenorError::UnknownUnit {
                    input: s.to_string(),
                    unit: other,
                })
            }
        };
        let count: u32 = trimmed[..trimmed.len() - unit_char.len_utf8()]
            .parse()
            .map_err(|_| TenorError::InvalidCount(s.to_string()))?;
        Tenor::new(count, unit).ok_or_else(|| TenorError::Zero(s.to_string()))
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_standard_pillars() {
        let pillars = Tenor::standard_pillars();
        assert_eq!(pillars.len(), 10);
        assert_eq!(pillars[0], Tenor::new(1, TenorUnit::Day).unwrap());
        assert_eq!(pillars[9], Tenor::new(30, TenorUnit::Year).unwrap());
    }

    #[test]
    fn test_pillars_are_increasing() {
        let pillars = Tenor::standard_pillars();
        for pair in pillars.windows(2) {
            assert!(pair[0].approx_days() < pair[1].approx_days());
        }
    }

    #[test]
    fn test_parse_lowercase() {
        let tenor: Tenor = "3m".parse().unwrap();
        assert_eq!(tenor, Tenor::new(3, TenorUnit::Month).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Tenor>(), Err(TenorError::Empty));
        assert_eq!(
            "Y".parse::<Tenor>(),
            Err(TenorError::InvalidCount("Y".to_string()))
        );
        assert_eq!("0M".parse::<Tenor>(), Err(TenorError::Zero("0M".to_string())));
        assert!(matches!(
            "5Q".parse::<Tenor>(),
            Err(TenorError::UnknownUnit { unit: 'Q', .. })
        ));
    }

    #[test]
    fn test_whole_years() {
        assert_eq!("1D".parse::<Tenor>().unwrap().whole_years(), 1);
        assert_eq!("18M".parse::<Tenor>().unwrap().whole_years(), 2);
        assert_eq!("10Y".parse::<Tenor>().unwrap().whole_years(), 10);
    }

    proptest! {
        #[test]
        fn prop_display_parse_round_trip(count in 1u32..500, unit_idx in 0usize..4) {
            let unit = [TenorUnit::Day, TenorUnit::Week, TenorUnit::Month, TenorUnit::Year][unit_idx];
            let tenor = Tenor::new(count, unit).unwrap();
            let parsed: Tenor = tenor.to_string().parse().unwrap();
            prop_assert_eq!(parsed, tenor);
        }
    }
}
