//! Placeholder to value bindings.

use std::collections::HashMap;

use crate::error::BindingError;
use crate::kernel::{InputGroup, Kernel};
use crate::traced::Placeholder;

/// Concrete values for a kernel's placeholders.
///
/// Resolution against a kernel requires exactly one value per declared
/// placeholder.
#[derive(Debug, Clone, Default)]
pub struct InputBindings {
    values: HashMap<Placeholder, f64>,
}

impl InputBindings {
    /// Creates an empty binding map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `capacity` bindings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Binds `value` to `placeholder`, returning the previous value.
    pub fn bind(&mut self, placeholder: Placeholder, value: f64) -> Option<f64> {
        self.values.insert(placeholder, value)
    }

    /// Binds `values` to the placeholders of `group`, in order.
    ///
    /// # Errors
    ///
    /// `BindingError::GroupLength` if the lengths differ. Nothing is bound
    /// in that case.
    pub fn bind_group(&mut self, group: &InputGroup, values: &[f64]) -> Result<(), BindingError> {
        if values.len() != group.len() {
            return Err(BindingError::GroupLength {
                group: group.name().to_string(),
                expected: group.len(),
                actual: values.len(),
            });
        }
        self.values
            .extend(group.placeholders().iter().copied().zip(values.iter().copied()));
        Ok(())
    }

    /// Bound value of `placeholder`.
    pub fn get(&self, placeholder: Placeholder) -> Option<f64> {
        self.values.get(&placeholder).copied()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes the bound values into `slots`, indexed by input slot.
    ///
    /// # Errors
    ///
    /// `BindingError::UnknownInput` for a binding the kernel does not
    /// declare (the lowest such placeholder is reported);
    /// `BindingError::UnboundInput` for the first placeholder without a
    /// value.
    pub(crate) fn resolve_into(&self, kernel: &Kernel, slots: &mut [f64]) -> Result<(), BindingError> {
        let n_inputs = kernel.input_count();
        let unknown = self
            .values
            .keys()
            .filter(|p| p.kernel_id() != kernel.id() || p.slot() >= n_inputs)
            .min();
        if let Some(&placeholder) = unknown {
            return Err(BindingError::UnknownInput { placeholder });
        }
        // Every key now belongs to the kernel, so a full count means full
        // coverage.
        if self.values.len() != n_inputs {
            let placeholder = kernel
                .placeholders()
                .find(|p| !self.values.contains_key(p));
            if let Some(placeholder) = placeholder {
                return Err(BindingError::UnboundInput { placeholder });
            }
        }
        for (&placeholder, &value) in &self.values {
            slots[placeholder.slot()] = value;
        }
        Ok(())
    }
}

impl FromIterator<(Placeholder, f64)> for InputBindings {
    fn from_iter<I: IntoIterator<Item = (Placeholder, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Placeholder, f64)> for InputBindings {
    fn extend<I: IntoIterator<Item = (Placeholder, f64)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{record, InputShape, OutputSpec, Outputs};
    use crate::traced::Traced;

    fn kernel() -> Kernel {
        record(
            "sum",
            &InputShape::new().group("a", 2).group("b", 1),
            &OutputSpec::single("y"),
            |inputs| {
                let total: Traced = (0..inputs.len())
                    .flat_map(|g| inputs.group(g).iter().copied())
                    .sum();
                Ok(Outputs::single("y", total))
            },
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_complete() {
        let kernel = kernel();
        let bindings = kernel.bindings(&[vec![1.0, 2.0], vec![3.0]]).unwrap();
        let mut slots = vec![0.0; 3];
        bindings.resolve_into(&kernel, &mut slots).unwrap();
        assert_eq!(slots, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_resolve_reports_first_unbound() {
        let kernel = kernel();
        let mut bindings = InputBindings::new();
        bindings.bind_group(&kernel.input_groups()[0], &[1.0, 2.0]).unwrap();
        let mut slots = vec![0.0; 3];
        let missing = kernel.input_groups()[1].placeholders()[0];
        assert_eq!(
            bindings.resolve_into(&kernel, &mut slots),
            Err(BindingError::UnboundInput {
                placeholder: missing
            })
        );
    }

    #[test]
    fn test_resolve_rejects_foreign_placeholder() {
        let kernel = kernel();
        let other = self::kernel();
        let foreign = other.input_groups()[0].placeholders()[0];

        let mut bindings = kernel.bindings(&[vec![1.0, 2.0], vec![3.0]]).unwrap();
        bindings.bind(foreign, 9.0);
        let mut slots = vec![0.0; 3];
        assert_eq!(
            bindings.resolve_into(&kernel, &mut slots),
            Err(BindingError::UnknownInput {
                placeholder: foreign
            })
        );
    }

    #[test]
    fn test_bind_group_length_mismatch() {
        let kernel = kernel();
        let mut bindings = InputBindings::new();
        let err = bindings
            .bind_group(&kernel.input_groups()[0], &[1.0])
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::GroupLength {
                group: "a".to_string(),
                expected: 2,
                actual: 1
            }
        );
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_rebinding_replaces_value() {
        let kernel = kernel();
        let p = kernel.input_groups()[0].placeholders()[0];
        let mut bindings = InputBindings::new();
        assert_eq!(bindings.bind(p, 1.0), None);
        assert_eq!(bindings.bind(p, 2.0), Some(1.0));
        assert_eq!(bindings.get(p), Some(2.0));
        assert_eq!(bindings.len(), 1);
    }
}
