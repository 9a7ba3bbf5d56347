//! Error types for curve, instrument and portfolio construction.

use pricer_core::types::TenorError;
use pricer_kernel::KernelError;
use thiserror::Error;

/// Errors raised by `pricer_models`.
///
/// # Examples
///
/// ```
/// use pricer_models::ModelError;
///
/// let err = ModelError::QuoteCount {
///     curve: "SOFR".to_string(),
///     tenors: 10,
///     rates: 9,
/// };
/// assert!(err.to_string().contains("10 tenors"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Number of rates differs from the number of pillars.
    #[error("Curve '{curve}': {tenors} tenors but {rates} rates")]
    QuoteCount {
        /// Curve index name
        curve: String,
        /// Number of pillars
        tenors: usize,
        /// Number of rates supplied
        rates: usize,
    },

    /// Curve index name not recognised.
    #[error("Unknown curve index '{0}': expected SOFR, ESTR or SONIA")]
    UnknownCurveKind(String),

    /// A curve was built without pillars.
    #[error("Curve '{0}' has no pillars")]
    EmptyCurve(String),

    /// Pillars are not strictly increasing in time.
    #[error("Curve '{curve}': pillar {tenor} is not after the previous pillar")]
    UnorderedPillars {
        /// Curve index name
        curve: String,
        /// Offending pillar
        tenor: String,
    },

    /// A trade references a curve outside the portfolio.
    #[error("Unknown curve index {index} (portfolio has {len} curves)")]
    UnknownCurve {
        /// Referenced index
        index: usize,
        /// Number of curves
        len: usize,
    },

    /// Notional must be finite and positive.
    #[error("Invalid notional: {0}")]
    InvalidNotional(f64),

    /// Fixed rate must be finite.
    #[error("Invalid fixed rate: {0}")]
    InvalidFixedRate(f64),

    /// Tenor parsing failed.
    #[error(transparent)]
    Tenor(#[from] TenorError),

    /// Recording or evaluating the portfolio kernel failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Result alias for `pricer_models`.
pub type ModelResult<T> = Result<T, ModelError>;
