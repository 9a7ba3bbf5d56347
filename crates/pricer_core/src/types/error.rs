//! Error types for parsing market conventions.
//!
//! This module provides:
//! - `CurrencyError`: Errors from currency parsing
//! - `TenorError`: Errors from tenor parsing

use thiserror::Error;

/// Currency-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::CurrencyError;
///
/// let err = CurrencyError::UnknownCurrency("XYZ".to_string());
/// assert_eq!(format!("{}", err), "Unknown currency: XYZ");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Unknown currency code.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// Tenor parsing errors.
///
/// # Examples
/// ```
/// use pricer_core::types::TenorError;
///
/// let err = TenorError::UnknownUnit { input: "3X".to_string(), unit: 'X' };
/// assert!(format!("{}", err).contains("3X"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenorError {
    /// The input string was empty.
    #[error("Empty tenor string")]
    Empty,

    /// The numeric part of the tenor could not be parsed.
    #[error("Invalid tenor count in '{0}'")]
    InvalidCount(String),

    /// The unit suffix is not one of D, W, M, Y.
    #[error("Unknown tenor unit '{unit}' in '{input}'")]
    UnknownUnit {
        /// The full input string
        input: String,
        /// The offending unit character
        unit: char,
    },

    /// Zero-length tenors are not valid pillars.
    #[error("Tenor must be positive: '{0}'")]
    Zero(String),
}
