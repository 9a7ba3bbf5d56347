//! Error types for the FrictionalBank demo.

use pricer_kernel::KernelError;
use pricer_models::ModelError;
use thiserror::Error;

/// Demo error type
#[derive(Debug, Error)]
pub enum DemoError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Portfolio construction or pricing error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Kernel engine error
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// A priced scenario lacks an expected output
    #[error("Missing output '{0}' in results")]
    MissingOutput(String),
}

impl From<pricer_kernel::ConfigError> for DemoError {
    fn from(err: pricer_kernel::ConfigError) -> Self {
        Self::Kernel(KernelError::from(err))
    }
}
