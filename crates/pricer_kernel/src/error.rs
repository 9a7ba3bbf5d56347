//! Error types for recording, binding, and replaying kernels.
//!
//! This module provides:
//! - `RecordingError`: tracing could not produce a valid tape
//! - `BindingError`: evaluation inputs or requested outputs are invalid
//! - `ReplayError`: a kernel's tape violates an internal invariant
//! - `ConfigError`: invalid evaluator configuration
//! - `KernelError`: union of the above for the engine-level API
//!
//! Recording and binding errors are recoverable by the caller. A
//! `ReplayError` signals an engine defect; it is logged where it is detected
//! and aborts only the affected evaluation.

use thiserror::Error;

use crate::kernel::OutputHandle;
use crate::traced::Placeholder;

/// Errors raised while tracing a function into a kernel.
///
/// A failed recording never reaches the kernel cache, so a later attempt on
/// the same key may retry.
///
/// # Examples
///
/// ```
/// use pricer_kernel::RecordingError;
///
/// let err = RecordingError::MissingOutput {
///     kernel: "price_portfolio".to_string(),
///     output: "EUR".to_string(),
/// };
/// assert!(err.to_string().contains("EUR"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// The traced function made a control-flow decision on a value derived
    /// from a placeholder, which has no concrete value during recording.
    #[error("Kernel '{kernel}': {operation} on an unresolved placeholder during recording")]
    BranchOnPlaceholder {
        /// Kernel being recorded
        kernel: String,
        /// Operation that needed a concrete value
        operation: &'static str,
    },

    /// A symbolic value from a different recording was used.
    #[error("Kernel '{kernel}': symbolic value belongs to another recording")]
    ForeignValue {
        /// Kernel being recorded
        kernel: String,
    },

    /// The traced function reported a failure.
    #[error("Kernel '{kernel}': traced function failed: {message}")]
    TracedFunction {
        /// Kernel being recorded (empty until attached by the recorder)
        kernel: String,
        /// Failure description
        message: String,
    },

    /// The traced function panicked.
    #[error("Kernel '{kernel}': traced function panicked: {message}")]
    Panicked {
        /// Kernel being recorded
        kernel: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// A recording was started while another one is active on this thread.
    #[error("Kernel '{kernel}': recording is already in progress on this thread")]
    Reentrant {
        /// Kernel whose recording was refused
        kernel: String,
    },

    /// The output specification declares no outputs.
    #[error("Kernel '{kernel}': no outputs declared")]
    EmptyOutputSpec {
        /// Kernel being recorded
        kernel: String,
    },

    /// The output specification declares the same name twice.
    #[error("Kernel '{kernel}': output '{output}' declared more than once")]
    DuplicateOutput {
        /// Kernel being recorded
        kernel: String,
        /// Duplicated output name
        output: String,
    },

    /// The traced function produced an output that was not declared.
    #[error("Kernel '{kernel}': output '{output}' was not declared")]
    UndeclaredOutput {
        /// Kernel being recorded
        kernel: String,
        /// Offending output name
        output: String,
    },

    /// The traced function did not produce a declared output.
    #[error("Kernel '{kernel}': declared output '{output}' was not produced")]
    MissingOutput {
        /// Kernel being recorded
        kernel: String,
        /// Missing output name
        output: String,
    },

    /// The recorded kernel's input structure differs from its cache key.
    #[error("Kernel '{kernel}': input shape {actual:?} does not match key shape {expected:?}")]
    ShapeMismatch {
        /// Kernel being recorded
        kernel: String,
        /// Group sizes named by the cache key
        expected: Vec<usize>,
        /// Group sizes of the recorded kernel
        actual: Vec<usize>,
    },
}

impl RecordingError {
    /// Creates a traced-function failure. The recorder attaches the kernel
    /// name when the error leaves the traced function.
    pub fn traced(message: impl Into<String>) -> Self {
        Self::TracedFunction {
            kernel: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn in_kernel(self, name: &str) -> Self {
        match self {
            Self::TracedFunction { kernel, message } if kernel.is_empty() => {
                Self::TracedFunction {
                    kernel: name.to_string(),
                    message,
                }
            }
            other => other,
        }
    }
}

/// Errors raised when evaluation inputs or requests are invalid.
///
/// Recoverable: fix the bindings and retry. The kernel is not affected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    /// A declared placeholder has no bound value.
    #[error("Unbound input: {placeholder}")]
    UnboundInput {
        /// Placeholder without a value
        placeholder: Placeholder,
    },

    /// A bound placeholder is not declared by the kernel.
    #[error("Unknown input: {placeholder}")]
    UnknownInput {
        /// Placeholder the kernel does not own
        placeholder: Placeholder,
    },

    /// A requested output handle does not belong to the kernel.
    #[error("Unknown output: {handle}")]
    UnknownOutput {
        /// Offending handle
        handle: OutputHandle,
    },

    /// A requested output name is not declared by the kernel.
    #[error("Unknown output name: '{0}'")]
    UnknownOutputName(String),

    /// A group of values does not match the placeholder group length.
    #[error("Input group '{group}' expects {expected} values, got {actual}")]
    GroupLength {
        /// Group name
        group: String,
        /// Number of placeholders in the group
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// The number of value groups does not match the kernel's input groups.
    #[error("Kernel declares {expected} input groups, got {actual}")]
    GroupCount {
        /// Number of declared groups
        expected: usize,
        /// Number of value groups supplied
        actual: usize,
    },

    /// A quote index is outside the quote source.
    #[error("Quote index {index} out of range for '{source_name}' with {len} quotes")]
    QuoteIndex {
        /// Quote source name
        source_name: String,
        /// Requested index
        index: usize,
        /// Number of quotes in the source
        len: usize,
    },

    /// A binding error for one scenario of a batch.
    #[error("Scenario {scenario}: {source}")]
    InScenario {
        /// Index of the scenario in the batch
        scenario: usize,
        /// Underlying error
        #[source]
        source: Box<BindingError>,
    },
}

/// Internal invariant violations detected before replay.
///
/// Never produced by kernels sealed by the recorder; reaching one of these
/// means the engine itself is defective.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// An operation references a node that is not recorded before it.
    #[error("Node {node} references node {operand} which is not recorded before it")]
    DanglingOperand {
        /// Referencing node
        node: usize,
        /// Referenced node
        operand: usize,
    },

    /// An input operation names a slot outside the declared inputs.
    #[error("Node {node} reads input slot {slot} but the tape declares {inputs} inputs")]
    InputSlot {
        /// Input node
        node: usize,
        /// Slot read by the node
        slot: usize,
        /// Number of declared inputs
        inputs: usize,
    },

    /// An output refers to a node outside the tape.
    #[error("Output '{output}' refers to node {node} outside a tape of {len} nodes")]
    OutputNode {
        /// Output name
        output: String,
        /// Referenced node
        node: usize,
        /// Tape length
        len: usize,
    },
}

/// Configuration error for the evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker count outside valid range [1, 1024].
    #[error("Invalid worker count {0}: must be in range [1, 1024]")]
    InvalidWorkerCount(usize),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Engine-level error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Recording failed
    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// Inputs or outputs were invalid
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Kernel invariant violated
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl KernelError {
    /// Attaches a batch scenario index to binding errors.
    pub(crate) fn in_scenario(self, scenario: usize) -> Self {
        match self {
            Self::Binding(source) => Self::Binding(BindingError::InScenario {
                scenario,
                source: Box::new(source),
            }),
            other => other,
        }
    }
}

/// Result alias for engine-level operations.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traced_error_gets_kernel_name() {
        let err = RecordingError::traced("curve failed").in_kernel("price");
        assert_eq!(
            err,
            RecordingError::TracedFunction {
                kernel: "price".to_string(),
                message: "curve failed".to_string(),
            }
        );
    }

    #[test]
    fn test_in_kernel_keeps_existing_name() {
        let err = RecordingError::TracedFunction {
            kernel: "inner".to_string(),
            message: "x".to_string(),
        };
        assert_eq!(err.clone().in_kernel("outer"), err);
    }

    #[test]
    fn test_scenario_index_wraps_binding_errors_only() {
        let err = KernelError::from(BindingError::UnknownOutputName("npv".to_string()));
        match err.in_scenario(3) {
            KernelError::Binding(BindingError::InScenario { scenario, source }) => {
                assert_eq!(scenario, 3);
                assert_eq!(*source, BindingError::UnknownOutputName("npv".to_string()));
            }
            other => panic!("Expected InScenario, got {:?}", other),
        }

        let err = KernelError::from(ConfigError::InvalidWorkerCount(0));
        assert!(matches!(err.in_scenario(1), KernelError::Config(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidWorkerCount(0);
        assert!(err.to_string().contains("Invalid worker count 0"));
    }

    #[test]
    fn test_replay_error_display() {
        let err = ReplayError::DanglingOperand { node: 2, operand: 5 };
        assert!(err.to_string().contains("Node 2"));
        assert!(err.to_string().contains("node 5"));
    }
}
