//! Thread-local recording context.
//!
//! A recording installs one [`TapeBuilder`] for the current thread for the
//! duration of a single [`crate::recorder::record`] call. Arithmetic on
//! symbolic [`Traced`] values appends nodes to that builder. Nothing outlives
//! the call: dropping the [`RecordingScope`] uninstalls the builder, also when
//! the traced function unwinds.
//!
//! Recordings on different threads never share state; a second recording on
//! the same thread while one is active is refused.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use super::op::{BinaryOp, Op, UnaryOp};
use super::Tape;
use crate::error::RecordingError;
use crate::traced::{KernelId, NodeRef, Placeholder, Traced};

/// Mutable tape under construction.
pub(crate) struct TapeBuilder {
    kernel: KernelId,
    name: String,
    ops: Vec<Op>,
    n_inputs: u32,
    violation: Option<RecordingError>,
}

impl TapeBuilder {
    fn new(kernel: KernelId, name: &str) -> Self {
        Self {
            kernel,
            name: name.to_string(),
            ops: Vec::new(),
            n_inputs: 0,
            violation: None,
        }
    }

    fn push(&mut self, op: Op) -> NodeRef {
        let node = self.ops.len() as u32;
        self.ops.push(op);
        NodeRef::new(self.kernel, node)
    }

    /// Declares a new input slot and returns its placeholder and value.
    pub(crate) fn push_input(&mut self) -> (Placeholder, Traced) {
        let slot = self.n_inputs;
        self.n_inputs += 1;
        let node = self.push(Op::Input(slot));
        (Placeholder::new(self.kernel, slot), Traced::Symbolic(node))
    }

    /// Resolves a traced value to a node index, recording constants.
    pub(crate) fn operand(&mut self, value: Traced) -> u32 {
        match value {
            Traced::Concrete(c) => self.push(Op::Const(c)).node(),
            Traced::Symbolic(r) if r.kernel() == self.kernel && (r.node() as usize) < self.ops.len() => {
                r.node()
            }
            Traced::Symbolic(_) => {
                self.poison(RecordingError::ForeignValue {
                    kernel: self.name.clone(),
                });
                self.push(Op::Const(f64::NAN)).node()
            }
        }
    }

    fn unary(&mut self, op: UnaryOp, arg: Traced) -> Traced {
        let arg = self.operand(arg);
        Traced::Symbolic(self.push(Op::Unary { op, arg }))
    }

    fn binary(&mut self, op: BinaryOp, lhs: Traced, rhs: Traced) -> Traced {
        let lhs = self.operand(lhs);
        let rhs = self.operand(rhs);
        Traced::Symbolic(self.push(Op::Binary { op, lhs, rhs }))
    }

    fn powi(&mut self, arg: Traced, exp: i32) -> Traced {
        let arg = self.operand(arg);
        Traced::Symbolic(self.push(Op::Powi { arg, exp }))
    }

    /// Keeps the first violation; later ones are consequences of it.
    fn poison(&mut self, err: RecordingError) {
        if self.violation.is_none() {
            self.violation = Some(err);
        }
    }

    pub(crate) fn take_violation(&mut self) -> Option<RecordingError> {
        self.violation.take()
    }

    pub(crate) fn take_tape(&mut self) -> Tape {
        Tape::from_parts(std::mem::take(&mut self.ops), self.n_inputs as usize)
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Rc<RefCell<TapeBuilder>>>> = const { RefCell::new(None) };
}

/// RAII handle for the active recording on this thread.
pub(crate) struct RecordingScope {
    builder: Rc<RefCell<TapeBuilder>>,
}

impl RecordingScope {
    /// Installs a fresh builder for `kernel`.
    ///
    /// # Errors
    ///
    /// `RecordingError::Reentrant` if this thread is already recording.
    pub(crate) fn begin(kernel: KernelId, name: &str) -> Result<Self, RecordingError> {
        if is_recording() {
            return Err(RecordingError::Reentrant {
                kernel: name.to_string(),
            });
        }
        let builder = Rc::new(RefCell::new(TapeBuilder::new(kernel, name)));
        ACTIVE.with(|active| *active.borrow_mut() = Some(Rc::clone(&builder)));
        Ok(Self { builder })
    }

    /// Direct access to the builder. Never held across user code.
    pub(crate) fn builder(&self) -> RefMut<'_, TapeBuilder> {
        self.builder.borrow_mut()
    }
}

impl Drop for RecordingScope {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().take());
    }
}

/// Whether a recording is active on this thread.
pub(crate) fn is_recording() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

fn with_active<R>(f: impl FnOnce(&mut TapeBuilder) -> R) -> Option<R> {
    ACTIVE.with(|active| {
        active
            .borrow()
            .as_ref()
            .map(|builder| f(&mut builder.borrow_mut()))
    })
}

#[cold]
#[inline(never)]
fn stale_symbolic() -> ! {
    panic!("symbolic value used outside of the recording that produced it")
}

pub(crate) fn record_unary(op: UnaryOp, arg: Traced) -> Traced {
    with_active(|b| b.unary(op, arg)).unwrap_or_else(|| stale_symbolic())
}

pub(crate) fn record_binary(op: BinaryOp, lhs: Traced, rhs: Traced) -> Traced {
    with_active(|b| b.binary(op, lhs, rhs)).unwrap_or_else(|| stale_symbolic())
}

pub(crate) fn record_powi(arg: Traced, exp: i32) -> Traced {
    with_active(|b| b.powi(arg, exp)).unwrap_or_else(|| stale_symbolic())
}

/// Flags a control-flow decision on a symbolic value.
///
/// Returns the error so callers with a `Result` can propagate it; the active
/// recording (if any) is poisoned either way.
pub(crate) fn flag_branch(operation: &'static str) -> RecordingError {
    with_active(|b| {
        let err = RecordingError::BranchOnPlaceholder {
            kernel: b.name.clone(),
            operation,
        };
        b.poison(err.clone());
        err
    })
    .unwrap_or(RecordingError::BranchOnPlaceholder {
        kernel: String::new(),
        operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_installs_and_removes_builder() {
        assert!(!is_recording());
        {
            let _scope = RecordingScope::begin(KernelId::next(), "t").unwrap();
            assert!(is_recording());
        }
        assert!(!is_recording());
    }

    #[test]
    fn test_nested_scope_is_refused() {
        let _scope = RecordingScope::begin(KernelId::next(), "outer").unwrap();
        let nested = RecordingScope::begin(KernelId::next(), "inner");
        assert!(matches!(
            nested,
            Err(RecordingError::Reentrant { ref kernel }) if kernel == "inner"
        ));
        // The refused attempt must not have removed the outer builder
        assert!(is_recording());
    }

    #[test]
    fn test_constants_become_const_nodes() {
        let scope = RecordingScope::begin(KernelId::next(), "t").unwrap();
        let (_, x) = scope.builder().push_input();
        let y = record_binary(BinaryOp::Mul, x, Traced::Concrete(2.0));
        assert!(y.is_symbolic());
        let tape = scope.builder().take_tape();
        assert_eq!(
            tape.ops(),
            &[
                Op::Input(0),
                Op::Const(2.0),
                Op::Binary {
                    op: BinaryOp::Mul,
                    lhs: 0,
                    rhs: 1
                }
            ]
        );
    }

    #[test]
    fn test_foreign_value_poisons_recording() {
        let foreign = {
            let scope = RecordingScope::begin(KernelId::next(), "first").unwrap();
            let (_, x) = scope.builder().push_input();
            x
        };
        let scope = RecordingScope::begin(KernelId::next(), "second").unwrap();
        let (_, y) = scope.builder().push_input();
        let _ = record_binary(BinaryOp::Add, foreign, y);
        assert_eq!(
            scope.builder().take_violation(),
            Some(RecordingError::ForeignValue {
                kernel: "second".to_string()
            })
        );
    }

    #[test]
    fn test_flag_branch_keeps_first_violation() {
        let scope = RecordingScope::begin(KernelId::next(), "t").unwrap();
        flag_branch("comparison");
        flag_branch("value");
        assert_eq!(
            scope.builder().take_violation(),
            Some(RecordingError::BranchOnPlaceholder {
                kernel: "t".to_string(),
                operation: "comparison"
            })
        );
    }

    #[test]
    #[should_panic(expected = "outside of the recording")]
    fn test_stale_symbolic_panics() {
        let stale = {
            let scope = RecordingScope::begin(KernelId::next(), "t").unwrap();
            let (_, x) = scope.builder().push_input();
            x
        };
        let _ = record_unary(UnaryOp::Exp, stale);
    }
}
