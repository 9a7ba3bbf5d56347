//! Overnight index identities and conventions.

use std::fmt;
use std::str::FromStr;

use pricer_core::types::{Currency, DayCount};

use crate::error::ModelError;

/// Overnight index a curve is built on.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{Currency, DayCount};
/// use pricer_models::curves::CurveKind;
///
/// let kind: CurveKind = "sonia".parse().unwrap();
/// assert_eq!(kind, CurveKind::Sonia);
/// assert_eq!(kind.currency(), Currency::GBP);
/// assert_eq!(kind.day_count(), DayCount::Act365Fixed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveKind {
    /// Secured Overnight Financing Rate (USD)
    Sofr,
    /// Euro Short-Term Rate (EUR)
    Estr,
    /// Sterling Overnight Index Average (GBP)
    Sonia,
}

impl CurveKind {
    /// Every supported index, in declaration order.
    pub const ALL: [CurveKind; 3] = [CurveKind::Sofr, CurveKind::Estr, CurveKind::Sonia];

    /// Currency of the index.
    pub fn currency(&self) -> Currency {
        match self {
            CurveKind::Sofr => Currency::USD,
            CurveKind::Estr => Currency::EUR,
            CurveKind::Sonia => Currency::GBP,
        }
    }

    /// Market name of the index, also used as the kernel input group name.
    pub fn index_name(&self) -> &'static str {
        match self {
            CurveKind::Sofr => "SOFR",
            CurveKind::Estr => "ESTR",
            CurveKind::Sonia => "SONIA",
        }
    }

    /// Accrual convention of the index.
    pub fn day_count(&self) -> DayCount {
        match self {
            CurveKind::Sofr | CurveKind::Estr => DayCount::Act360,
            CurveKind::Sonia => DayCount::Act365Fixed,
        }
    }

    /// Fixing calendar name.
    pub fn calendar_name(&self) -> &'static str {
        match self {
            CurveKind::Sofr => "UnitedStates/FederalReserve",
            CurveKind::Estr => "TARGET",
            CurveKind::Sonia => "UnitedKingdom",
        }
    }
}

impl FromStr for CurveKind {
    type Err = ModelError;

    /// Parses an index name (case-insensitive; `€STR` is accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOFR" | "USD" => Ok(CurveKind::Sofr),
            "ESTR" | "€STR" | "EUR" => Ok(CurveKind::Estr),
            "SONIA" | "GBP" => Ok(CurveKind::Sonia),
            _ => Err(ModelError::UnknownCurveKind(s.to_string())),
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index_name())
    }
}
