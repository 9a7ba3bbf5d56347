//! Traced scalar values and placeholders.
//!
//! [`Traced`] is the numeric type pricing code is written against. It is a
//! tagged variant: either a concrete `f64` or a symbolic reference to a node
//! of the tape currently being recorded.
//!
//! - Arithmetic on two concrete values is computed immediately.
//! - Arithmetic touching a symbolic value appends a node to the active tape.
//! - Comparing a symbolic value has no answer during recording; it poisons
//!   the recording, which then fails with
//!   [`RecordingError::BranchOnPlaceholder`].
//!
//! # Example
//!
//! ```rust
//! use pricer_kernel::{record, InputShape, OutputSpec, Outputs};
//!
//! let kernel = record(
//!     "affine",
//!     &InputShape::new().group("x", 2),
//!     &OutputSpec::single("y"),
//!     |inputs| {
//!         let x = inputs.group(0);
//!         Ok(Outputs::single("y", x[0] * 2.0 + x[1]))
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(kernel.input_count(), 2);
//! ```
//!
//! # Panics
//!
//! Arithmetic on a symbolic value after its recording has finished panics:
//! there is no tape left to append to.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::error::RecordingError;
use crate::tape::builder;
use crate::tape::{BinaryOp, UnaryOp};

static NEXT_KERNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a recorded kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(u64);

impl KernelId {
    pub(crate) fn next() -> Self {
        Self(NEXT_KERNEL_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw identifier.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

/// Symbolic stand-in for one scalar input of a kernel.
///
/// Created when an input is marked during recording; stable for the lifetime
/// of the owning kernel. Used as the key of [`crate::InputBindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placeholder {
    kernel: KernelId,
    slot: u32,
}

impl Placeholder {
    pub(crate) fn new(kernel: KernelId, slot: u32) -> Self {
        Self { kernel, slot }
    }

    /// Kernel that declared this placeholder.
    #[inline]
    pub fn kernel_id(&self) -> KernelId {
        self.kernel
    }

    /// Position of this placeholder among the kernel's inputs.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:x{}", self.kernel, self.slot)
    }
}

/// Reference to a tape node of a specific recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    kernel: KernelId,
    node: u32,
}

impl NodeRef {
    pub(crate) fn new(kernel: KernelId, node: u32) -> Self {
        Self { kernel, node }
    }

    /// Recording this node belongs to.
    #[inline]
    pub fn kernel(&self) -> KernelId {
        self.kernel
    }

    /// Node index on the tape.
    #[inline]
    pub fn node(&self) -> u32 {
        self.node
    }
}

/// Scalar value that is either concrete or recorded on a tape.
#[derive(Debug, Clone, Copy)]
pub enum Traced {
    /// Plain value.
    Concrete(f64),
    /// Value of a tape node in the active recording.
    Symbolic(NodeRef),
}

impl Traced {
    /// Concrete constant.
    #[inline]
    pub const fn constant(value: f64) -> Self {
        Traced::Concrete(value)
    }

    /// Whether the value is recorded on a tape.
    #[inline]
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Traced::Symbolic(_))
    }

    /// The concrete value, or `None` for symbolic values.
    ///
    /// A symbolic value has no value to branch on, so asking for one poisons
    /// the active recording just like [`Traced::try_value`]. Use
    /// [`Traced::is_symbolic`] to inspect a value without that effect.
    #[inline]
    pub fn concrete(&self) -> Option<f64> {
        match self {
            Traced::Concrete(v) => Some(*v),
            Traced::Symbolic(_) => {
                builder::flag_branch("concrete");
                None
            }
        }
    }

    /// The concrete value, for code that needs one to decide control flow.
    ///
    /// # Errors
    ///
    /// `RecordingError::BranchOnPlaceholder` for symbolic values. The active
    /// recording is poisoned as well, so ignoring the error still fails the
    /// recording.
    pub fn try_value(&self) -> Result<f64, RecordingError> {
        match self {
            Traced::Concrete(v) => Ok(*v),
            Traced::Symbolic(_) => Err(builder::flag_branch("value")),
        }
    }

    #[inline]
    fn unary(self, op: UnaryOp) -> Self {
        match self {
            Traced::Concrete(x) => Traced::Concrete(op.apply(x)),
            Traced::Symbolic(_) => builder::record_unary(op, self),
        }
    }

    #[inline]
    fn binary(self, op: BinaryOp, rhs: Traced) -> Self {
        match (self, rhs) {
            (Traced::Concrete(x), Traced::Concrete(y)) => Traced::Concrete(op.apply(x, y)),
            _ => builder::record_binary(op, self, rhs),
        }
    }

    /// e^self
    pub fn exp(self) -> Self {
        self.unary(UnaryOp::Exp)
    }

    /// Natural logarithm.
    pub fn ln(self) -> Self {
        self.unary(UnaryOp::Ln)
    }

    /// Square root.
    pub fn sqrt(self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        self.unary(UnaryOp::Abs)
    }

    /// self^exponent
    pub fn powf(self, exponent: impl Into<Traced>) -> Self {
        self.binary(BinaryOp::Pow, exponent.into())
    }

    /// self^n for an integer exponent.
    pub fn powi(self, n: i32) -> Self {
        match self {
            Traced::Concrete(x) => Traced::Concrete(x.powi(n)),
            Traced::Symbolic(_) => builder::record_powi(self, n),
        }
    }

    /// Maximum, recorded as a tape operation rather than a branch.
    pub fn max(self, other: impl Into<Traced>) -> Self {
        self.binary(BinaryOp::Max, other.into())
    }

    /// Minimum, recorded as a tape operation rather than a branch.
    pub fn min(self, other: impl Into<Traced>) -> Self {
        self.binary(BinaryOp::Min, other.into())
    }
}

impl Default for Traced {
    fn default() -> Self {
        Traced::Concrete(0.0)
    }
}

impl From<f64> for Traced {
    #[inline]
    fn from(value: f64) -> Self {
        Traced::Concrete(value)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl $trait for Traced {
            type Output = Traced;
            #[inline]
            fn $method(self, rhs: Traced) -> Traced {
                self.binary($op, rhs)
            }
        }

        impl $trait<f64> for Traced {
            type Output = Traced;
            #[inline]
            fn $method(self, rhs: f64) -> Traced {
                self.binary($op, Traced::Concrete(rhs))
            }
        }

        impl $trait<Traced> for f64 {
            type Output = Traced;
            #[inline]
            fn $method(self, rhs: Traced) -> Traced {
                Traced::Concrete(self).binary($op, rhs)
            }
        }

        impl $assign_trait for Traced {
            #[inline]
            fn $assign_method(&mut self, rhs: Traced) {
                *self = self.binary($op, rhs);
            }
        }

        impl $assign_trait<f64> for Traced {
            #[inline]
            fn $assign_method(&mut self, rhs: f64) {
                *self = self.binary($op, Traced::Concrete(rhs));
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, BinaryOp::Add);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, BinaryOp::Sub);
impl_binary_op!(Mul, mul, MulAssign, mul_assign, BinaryOp::Mul);
impl_binary_op!(Div, div, DivAssign, div_assign, BinaryOp::Div);

impl Neg for Traced {
    type Output = Traced;
    #[inline]
    fn neg(self) -> Traced {
        self.unary(UnaryOp::Neg)
    }
}

impl Sum for Traced {
    fn sum<I: Iterator<Item = Traced>>(iter: I) -> Traced {
        iter.fold(Traced::Concrete(0.0), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Traced> for Traced {
    fn sum<I: Iterator<Item = &'a Traced>>(iter: I) -> Traced {
        iter.copied().sum()
    }
}

impl PartialEq for Traced {
    fn eq(&self, other: &Traced) -> bool {
        match (self, other) {
            (Traced::Concrete(x), Traced::Concrete(y)) => x == y,
            _ => {
                builder::flag_branch("comparison");
                false
            }
        }
    }
}

impl PartialEq<f64> for Traced {
    fn eq(&self, other: &f64) -> bool {
        *self == Traced::Concrete(*other)
    }
}

impl PartialOrd for Traced {
    fn partial_cmp(&self, other: &Traced) -> Option<Ordering> {
        match (self, other) {
            (Traced::Concrete(x), Traced::Concrete(y)) => x.partial_cmp(y),
            _ => {
                builder::flag_branch("comparison");
                None
            }
        }
    }
}

impl PartialOrd<f64> for Traced {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.partial_cmp(&Traced::Concrete(*other))
    }
}
