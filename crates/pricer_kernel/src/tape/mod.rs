//! # Tape
//!
//! The recorded computation graph: an ordered sequence of [`Op`]s where every
//! operand refers to an earlier node. A tape is produced by one recording
//! pass (see [`crate::recorder`]) and is immutable afterwards.
//!
//! ## Module Structure
//!
//! - `op`: operation definitions and their concrete semantics
//! - `builder`: the thread-local recording context that appends nodes

pub(crate) mod builder;
mod op;

pub use op::{BinaryOp, Op, UnaryOp};

use crate::error::ReplayError;

/// Immutable recorded computation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    ops: Vec<Op>,
    n_inputs: usize,
}

impl Tape {
    pub(crate) fn from_parts(ops: Vec<Op>, n_inputs: usize) -> Self {
        Self { ops, n_inputs }
    }

    /// Recorded operations in execution order.
    #[inline]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the tape has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of declared input slots.
    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Checks that every operand precedes its node and every input slot is
    /// declared.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReplayError`] found, scanning in node order.
    pub fn validate(&self) -> Result<(), ReplayError> {
        for (node, op) in self.ops.iter().enumerate() {
            if let Op::Input(slot) = *op {
                if slot as usize >= self.n_inputs {
                    return Err(ReplayError::InputSlot {
                        node,
                        slot: slot as usize,
                        inputs: self.n_inputs,
                    });
                }
            }
            for operand in op.operands().into_iter().flatten() {
                if operand as usize >= node {
                    return Err(ReplayError::DanglingOperand {
                        node,
                        operand: operand as usize,
                    });
                }
            }
        }
        Ok(())
    }

    /// Marks nodes whose value depends on at least one input.
    ///
    /// The complement is the set of passive nodes: values fixed at recording
    /// time. Assumes a validated tape.
    pub fn active_mask(&self) -> Vec<bool> {
        let mut active = vec![false; self.ops.len()];
        for (node, op) in self.ops.iter().enumerate() {
            active[node] = match op {
                Op::Input(_) => true,
                Op::Const(_) => false,
                _ => op
                    .operands()
                    .into_iter()
                    .flatten()
                    .any(|operand| active[operand as usize]),
            };
        }
        active
    }

    /// Marks nodes with a path to any of `roots`. Assumes a validated tape
    /// and in-range roots.
    pub fn reachable_from(&self, roots: impl IntoIterator<Item = usize>) -> Vec<bool> {
        let mut live = vec![false; self.ops.len()];
        for root in roots {
            live[root] = true;
        }
        // Operands precede their node, so one backward sweep suffices.
        for node in (0..self.ops.len()).rev() {
            if live[node] {
                for operand in self.ops[node].operands().into_iter().flatten() {
                    live[operand as usize] = true;
                }
            }
        }
        live
    }
}
