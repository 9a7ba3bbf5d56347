//! Currency types for the overnight index markets.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::currency::Currency;
//!
//! let gbp: Currency = "gbp".parse().unwrap();
//! assert_eq!(gbp, Currency::GBP);
//! assert_eq!(gbp.code(), "GBP");
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::CurrencyError;

/// ISO 4217 currency codes.
///
/// Static dispatch (enum-based) so that per-currency output keyspaces can be
/// declared up front and ordered deterministically.
///
/// # Examples
///
/// ```
/// use pricer_core::types::currency::Currency;
///
/// assert_eq!(Currency::USD.code(), "USD");
/// assert_eq!(Currency::ALL.len(), 3);
/// ```
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Currency {
    /// United States Dollar (SOFR market)
    USD,
    /// Euro (ESTR market)
    EUR,
    /// British Pound Sterling (SONIA market)
    GBP,
}

impl Currency {
    /// Every supported currency, in declaration order.
    pub const ALL: [Currency; 3] = [Currency::USD, Currency::EUR, Currency::GBP];

    /// Returns the ISO 4217 three-letter currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    /// Parses ISO 4217 currency code (case-insensitive).
    fn from_str(s: &str) -> Result<Self, CurrencyError> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_round_trip_through_code() {
        for ccy in Currency::ALL {
            let parsed: Currency = ccy.code().parse().unwrap();
            assert_eq!(parsed, ccy);
        }
    }

    #[test]
    fn test_currency_parse_case_insensitive() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!("Usd".parse::<Currency>().unwrap(), Currency::USD);
    }

    #[test]
    fn test_currency_parse_unknown() {
        let err = "JPY".parse::<Currency>().unwrap_err();
        assert_eq!(err, CurrencyError::UnknownCurrency("JPY".to_string()));
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(format!("{}", Currency::GBP), "GBP");
    }

    #[test]
    fn test_currency_ordering_is_declaration_order() {
        let mut ccys = vec![Currency::GBP, Currency::USD, Currency::EUR];
        ccys.sort();
        assert_eq!(ccys, Currency::ALL.to_vec());
    }
}
