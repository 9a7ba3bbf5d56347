//! Evaluation results.

use std::sync::Arc;

use crate::kernel::OutputHandle;
use crate::traced::KernelId;

/// Value of one evaluated output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OutputValue {
    /// Scalar output
    Scalar(f64),
    /// Vector output, in recorded element order
    Vector(Vec<f64>),
}

impl OutputValue {
    /// The scalar value, if this is a scalar output.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            OutputValue::Scalar(v) => Some(*v),
            OutputValue::Vector(_) => None,
        }
    }

    /// The elements, if this is a vector output.
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            OutputValue::Scalar(_) => None,
            OutputValue::Vector(v) => Some(v),
        }
    }

    /// Sum of all elements (the value itself for scalars).
    pub fn total(&self) -> f64 {
        match self {
            OutputValue::Scalar(v) => *v,
            OutputValue::Vector(v) => v.iter().sum(),
        }
    }
}

/// Output values of one evaluation, keyed by output handle.
///
/// Holds only the requested outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMap {
    kernel: KernelId,
    names: Arc<[String]>,
    values: Vec<Option<OutputValue>>,
}

impl ResultMap {
    pub(crate) fn new(kernel: KernelId, names: Arc<[String]>) -> Self {
        let values = vec![None; names.len()];
        Self {
            kernel,
            names,
            values,
        }
    }

    pub(crate) fn insert(&mut self, handle: OutputHandle, value: OutputValue) {
        self.values[handle.index()] = Some(value);
    }

    /// Value for `handle`, if it was requested.
    pub fn get(&self, handle: OutputHandle) -> Option<&OutputValue> {
        if handle.kernel_id() != self.kernel {
            return None;
        }
        self.values.get(handle.index())?.as_ref()
    }

    /// Value of the output called `name`, if it was requested.
    pub fn get_named(&self, name: &str) -> Option<&OutputValue> {
        let index = self.names.iter().position(|n| n == name)?;
        self.values[index].as_ref()
    }

    /// Scalar value of the output called `name`.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get_named(name)?.as_scalar()
    }

    /// Elements of the vector output called `name`.
    pub fn vector(&self, name: &str) -> Option<&[f64]> {
        self.get_named(name)?.as_vector()
    }

    /// Whether `handle` has a value.
    pub fn contains(&self, handle: OutputHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of outputs present.
    pub fn len(&self) -> usize {
        self.values.iter().flatten().count()
    }

    /// Whether no outputs are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present outputs as `(name, value)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputValue)> + '_ {
        self.names
            .iter()
            .zip(&self.values)
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.as_str(), v)))
    }
}
