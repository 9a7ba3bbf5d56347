//! Sealed, immutable kernels.
//!
//! A [`Kernel`] is the product of one recording: the tape, the placeholder
//! groups that feed it, and the named outputs it computes. Kernels are shared
//! read-only (`Arc<Kernel>`) between the cache and any number of concurrent
//! evaluations.

use std::fmt;
use std::sync::Arc;

use crate::error::{BindingError, ReplayError};
use crate::evaluator::{InputBindings, OutputRequest};
use crate::tape::{Op, Tape};
use crate::traced::{KernelId, Placeholder};

/// Named, ordered group of input placeholders (e.g. one per curve tenor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputGroup {
    name: String,
    placeholders: Vec<Placeholder>,
}

impl InputGroup {
    pub(crate) fn new(name: &str, placeholders: Vec<Placeholder>) -> Self {
        Self {
            name: name.to_string(),
            placeholders,
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholders in declaration order.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Number of placeholders.
    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

/// Identity of one output of one kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputHandle {
    kernel: KernelId,
    index: u32,
}

impl OutputHandle {
    /// Kernel that declares this output.
    pub fn kernel_id(&self) -> KernelId {
        self.kernel
    }

    /// Position among the kernel's declared outputs.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:y{}", self.kernel, self.index)
    }
}

/// Tape nodes holding one output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputSlot {
    name: String,
    nodes: Vec<u32>,
    vector: bool,
}

impl OutputSlot {
    pub(crate) fn scalar(name: &str, node: u32) -> Self {
        Self {
            name: name.to_string(),
            nodes: vec![node],
            vector: false,
        }
    }

    pub(crate) fn vector(name: &str, nodes: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            nodes,
            vector: true,
        }
    }

    pub(crate) fn nodes(&self) -> &[u32] {
        &self.nodes
    }

    pub(crate) fn is_vector(&self) -> bool {
        self.vector
    }
}

/// Node counts of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KernelStats {
    /// Tape length
    pub operations: usize,
    /// Declared scalar inputs
    pub inputs: usize,
    /// Constant nodes
    pub constants: usize,
    /// Declared outputs
    pub outputs: usize,
    /// Nodes that do not depend on any input
    pub passive: usize,
    /// Nodes with no path to any output
    pub dead: usize,
}

impl KernelStats {
    fn of(tape: &Tape, outputs: &[OutputSlot]) -> Self {
        let active = tape.active_mask();
        let live = tape.reachable_from(
            outputs
                .iter()
                .flat_map(|o| o.nodes.iter().map(|&n| n as usize))
                .filter(|&n| n < tape.len()),
        );
        Self {
            operations: tape.len(),
            inputs: tape.n_inputs(),
            constants: tape
                .ops()
                .iter()
                .filter(|op| matches!(op, Op::Const(_)))
                .count(),
            outputs: outputs.len(),
            passive: active.iter().filter(|&&a| !a).count(),
            dead: live.iter().filter(|&&l| !l).count(),
        }
    }
}

impl fmt::Display for KernelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} operations, {} inputs, {} constants, {} outputs, {} passive, {} dead",
            self.operations, self.inputs, self.constants, self.outputs, self.passive, self.dead
        )
    }
}

/// Immutable recorded computation.
#[derive(Debug)]
pub struct Kernel {
    id: KernelId,
    name: String,
    tape: Tape,
    groups: Vec<InputGroup>,
    outputs: Vec<OutputSlot>,
    output_names: Arc<[String]>,
    stats: KernelStats,
}

impl Kernel {
    pub(crate) fn new(
        id: KernelId,
        name: &str,
        tape: Tape,
        groups: Vec<InputGroup>,
        outputs: Vec<OutputSlot>,
    ) -> Self {
        let stats = KernelStats::of(&tape, &outputs);
        let output_names = outputs.iter().map(|o| o.name.clone()).collect();
        Self {
            id,
            name: name.to_string(),
            tape,
            groups,
            outputs,
            output_names,
            stats,
        }
    }

    /// Process-unique identity.
    pub fn id(&self) -> KernelId {
        self.id
    }

    /// Name given at recording.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Input groups in declaration order.
    pub fn input_groups(&self) -> &[InputGroup] {
        &self.groups
    }

    /// Input group by name.
    pub fn input_group(&self, name: &str) -> Option<&InputGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Group sizes in declaration order.
    pub fn input_shape(&self) -> Vec<usize> {
        self.groups.iter().map(InputGroup::len).collect()
    }

    /// Total number of placeholders.
    pub fn input_count(&self) -> usize {
        self.tape.n_inputs()
    }

    /// All placeholders in slot order.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.placeholders.iter().copied())
    }

    /// Handle of the output called `name`.
    pub fn output(&self, name: &str) -> Option<OutputHandle> {
        self.output_names
            .iter()
            .position(|n| n == name)
            .map(|index| self.handle(index))
    }

    /// Handles of all outputs in declaration order.
    pub fn output_handles(&self) -> Vec<OutputHandle> {
        (0..self.outputs.len()).map(|i| self.handle(i)).collect()
    }

    /// Name of the output behind `handle`, if it belongs to this kernel.
    pub fn output_name(&self, handle: OutputHandle) -> Option<&str> {
        self.owns(handle)
            .then(|| self.output_names[handle.index()].as_str())
    }

    /// Output names in declaration order.
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Request for every declared output.
    pub fn request_all(&self) -> OutputRequest {
        OutputRequest::new(self.output_handles())
    }

    /// Request for the named outputs.
    ///
    /// # Errors
    ///
    /// `BindingError::UnknownOutputName` for a name the kernel does not
    /// declare.
    pub fn request<S: AsRef<str>>(&self, names: &[S]) -> Result<OutputRequest, BindingError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.output(name)
                    .ok_or_else(|| BindingError::UnknownOutputName(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(OutputRequest::new)
    }

    /// Binds one slice of values per input group, in group order.
    ///
    /// # Errors
    ///
    /// `BindingError::GroupCount` if the number of slices differs from the
    /// number of groups; `BindingError::GroupLength` for a slice of the wrong
    /// length.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_kernel::{record, InputShape, OutputSpec, Outputs};
    ///
    /// let kernel = record(
    ///     "affine",
    ///     &InputShape::new().group("x", 2),
    ///     &OutputSpec::single("y"),
    ///     |inputs| Ok(Outputs::single("y", inputs.group(0)[0] * 2.0 + inputs.group(0)[1])),
    /// )
    /// .unwrap();
    ///
    /// let bindings = kernel.bindings(&[&[3.0, 4.0]]).unwrap();
    /// assert_eq!(bindings.len(), 2);
    /// ```
    pub fn bindings<V: AsRef<[f64]>>(&self, groups: &[V]) -> Result<InputBindings, BindingError> {
        if groups.len() != self.groups.len() {
            return Err(BindingError::GroupCount {
                expected: self.groups.len(),
                actual: groups.len(),
            });
        }
        let mut bindings = InputBindings::with_capacity(self.input_count());
        for (group, values) in self.groups.iter().zip(groups) {
            bindings.bind_group(group, values.as_ref())?;
        }
        Ok(bindings)
    }

    /// Node statistics.
    pub fn stats(&self) -> &KernelStats {
        &self.stats
    }

    /// Checks tape structure and output node bounds.
    ///
    /// # Errors
    ///
    /// The first [`ReplayError`] found.
    pub fn validate(&self) -> Result<(), ReplayError> {
        self.tape.validate()?;
        let len = self.tape.len();
        for slot in &self.outputs {
            if let Some(&node) = slot.nodes.iter().find(|&&n| n as usize >= len) {
                return Err(ReplayError::OutputNode {
                    output: slot.name.clone(),
                    node: node as usize,
                    len,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn owns(&self, handle: OutputHandle) -> bool {
        handle.kernel == self.id && handle.index() < self.outputs.len()
    }

    pub(crate) fn output_slot(&self, handle: OutputHandle) -> &OutputSlot {
        &self.outputs[handle.index()]
    }

    pub(crate) fn shared_output_names(&self) -> Arc<[String]> {
        Arc::clone(&self.output_names)
    }

    fn handle(&self, index: usize) -> OutputHandle {
        OutputHandle {
            kernel: self.id,
            index: index as u32,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        tape: Tape,
        groups: Vec<InputGroup>,
        outputs: Vec<OutputSlot>,
    ) -> Self {
        Self::new(KernelId::next(), "test", tape, groups, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{record, InputShape, OutputSpec, Outputs};
    use crate::tape::BinaryOp;

    fn two_output_kernel() -> Kernel {
        record(
            "two",
            &InputShape::new().group("x", 2),
            &OutputSpec::new(["sum", "parts"]),
            |inputs| {
                let x = inputs.group(0);
                Ok(Outputs::new()
                    .with("sum", x[0] + x[1])
                    .with("parts", vec![x[0], x[1] * 2.0]))
            },
        )
        .unwrap()
    }

    #[test]
    fn test_output_lookup() {
        let kernel = two_output_kernel();
        let sum = kernel.output("sum").unwrap();
        let parts = kernel.output("parts").unwrap();
        assert_eq!(sum.index(), 0);
        assert_eq!(parts.index(), 1);
        assert_eq!(kernel.output_name(parts), Some("parts"));
        assert!(kernel.output("missing").is_none());
        assert_eq!(kernel.output_handles(), vec![sum, parts]);
        assert!(kernel.output_slot(parts).is_vector());
    }

    #[test]
    fn test_foreign_handle_has_no_name() {
        let a = two_output_kernel();
        let b = two_output_kernel();
        let handle = b.output("sum").unwrap();
        assert_eq!(a.output_name(handle), None);
        assert!(!a.owns(handle));
    }

    #[test]
    fn test_request_by_name() {
        let kernel = two_output_kernel();
        assert_eq!(kernel.request(&["parts"]).unwrap().len(), 1);
        assert_eq!(
            kernel.request(&["nope"]).unwrap_err(),
            BindingError::UnknownOutputName("nope".to_string())
        );
    }

    #[test]
    fn test_stats() {
        let kernel = two_output_kernel();
        let stats = kernel.stats();
        // x0, x1, add, const 2, mul
        assert_eq!(stats.operations, 5);
        assert_eq!(stats.inputs, 2);
        assert_eq!(stats.constants, 1);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.passive, 1);
        assert_eq!(stats.dead, 0);
        assert!(stats.to_string().starts_with("5 operations"));
    }

    #[test]
    fn test_bindings_group_count() {
        let kernel = two_output_kernel();
        let err = kernel.bindings::<Vec<f64>>(&[]).unwrap_err();
        assert_eq!(
            err,
            BindingError::GroupCount {
                expected: 1,
                actual: 0
            }
        );
        assert!(matches!(
            kernel.bindings(&[vec![1.0]]),
            Err(BindingError::GroupLength { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_output_outside_tape() {
        let tape = Tape::from_parts(
            vec![
                Op::Input(0),
                Op::Binary {
                    op: BinaryOp::Add,
                    lhs: 0,
                    rhs: 0,
                },
            ],
            1,
        );
        let kernel = Kernel::from_parts(tape, vec![], vec![OutputSlot::scalar("y", 7)]);
        assert_eq!(
            kernel.validate(),
            Err(ReplayError::OutputNode {
                output: "y".to_string(),
                node: 7,
                len: 2
            })
        );
    }
}
