//! Replay plans.
//!
//! A plan fixes, for one kernel and one output request, which tape nodes are
//! executed. It is built once and shared by every scenario of a batch.

use tracing::error;

use super::bindings::InputBindings;
use super::request::OutputRequest;
use super::results::{OutputValue, ResultMap};
use super::scratch::ScratchPool;
use crate::error::{BindingError, KernelError};
use crate::kernel::{Kernel, OutputHandle};

/// Live-node schedule for one output request.
#[derive(Debug, Clone)]
pub(crate) struct ReplayPlan {
    /// Live nodes in recorded order
    schedule: Vec<u32>,
    outputs: Vec<OutputHandle>,
}

impl ReplayPlan {
    /// Validates the kernel and the request and computes the live nodes.
    ///
    /// # Errors
    ///
    /// - `KernelError::Replay` for a malformed kernel (logged as an engine
    ///   defect)
    /// - `BindingError::UnknownOutput` for a handle of another kernel
    pub(crate) fn build(kernel: &Kernel, request: &OutputRequest) -> Result<Self, KernelError> {
        if let Err(err) = kernel.validate() {
            error!(kernel = kernel.name(), error = %err, "Malformed kernel tape");
            return Err(err.into());
        }
        if let Some(&handle) = request.handles().iter().find(|h| !kernel.owns(**h)) {
            return Err(BindingError::UnknownOutput { handle }.into());
        }

        let roots = request
            .handles()
            .iter()
            .flat_map(|&h| kernel.output_slot(h).nodes().iter().map(|&n| n as usize));
        let live = kernel.tape().reachable_from(roots);
        let schedule = live
            .iter()
            .enumerate()
            .filter_map(|(node, &l)| l.then_some(node as u32))
            .collect();

        Ok(Self {
            schedule,
            outputs: request.handles().to_vec(),
        })
    }

    /// Number of nodes executed per replay.
    pub(crate) fn len(&self) -> usize {
        self.schedule.len()
    }

    /// Replays the live nodes against one set of bindings.
    ///
    /// # Errors
    ///
    /// `BindingError` if `bindings` does not cover the kernel's placeholders
    /// exactly.
    pub(crate) fn run(&self, kernel: &Kernel, bindings: &InputBindings) -> Result<ResultMap, BindingError> {
        let pool = ScratchPool::new();
        let mut inputs = pool.get_buffer(kernel.input_count());
        bindings.resolve_into(kernel, &mut inputs)?;

        let ops = kernel.tape().ops();
        let mut values = pool.get_buffer(ops.len());
        for &node in &self.schedule {
            let node = node as usize;
            let value = ops[node].eval(&values, &inputs);
            values[node] = value;
        }

        let mut results = ResultMap::new(kernel.id(), kernel.shared_output_names());
        for &handle in &self.outputs {
            let slot = kernel.output_slot(handle);
            let value = if slot.is_vector() {
                OutputValue::Vector(slot.nodes().iter().map(|&n| values[n as usize]).collect())
            } else {
                OutputValue::Scalar(values[slot.nodes()[0] as usize])
            };
            results.insert(handle, value);
        }
        Ok(results)
    }
}
