//! Recorded tape operations.
//!
//! Operation semantics live here and nowhere else: the traced value type
//! folds concrete operands through [`UnaryOp::apply`] / [`BinaryOp::apply`],
//! and replay evaluates recorded nodes through the same functions. Recording
//! and replay therefore round identically.

/// Single-operand operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnaryOp {
    /// Negation (-x)
    Neg,
    /// Exponential function (e^x)
    Exp,
    /// Natural logarithm (ln(x))
    Ln,
    /// Square root
    Sqrt,
    /// Absolute value
    Abs,
}

impl UnaryOp {
    /// Evaluates the operation on a concrete value.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Exp => x.exp(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Abs => x.abs(),
        }
    }
}

/// Two-operand operation. Operand order is significant and preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction (lhs - rhs)
    Sub,
    /// Multiplication
    Mul,
    /// Division (lhs / rhs)
    Div,
    /// Power (lhs^rhs)
    Pow,
    /// Maximum, with `f64::max` NaN semantics
    Max,
    /// Minimum, with `f64::min` NaN semantics
    Min,
}

impl BinaryOp {
    /// Evaluates the operation on concrete values.
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
            BinaryOp::Max => lhs.max(rhs),
            BinaryOp::Min => lhs.min(rhs),
        }
    }
}

/// A node of the tape. Operands are indices of earlier nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Op {
    /// Reads the bound value of an input slot.
    Input(u32),
    /// Constant captured at recording time.
    Const(f64),
    /// Unary operation on one earlier node.
    Unary {
        /// Operation
        op: UnaryOp,
        /// Operand node
        arg: u32,
    },
    /// Binary operation on two earlier nodes.
    Binary {
        /// Operation
        op: BinaryOp,
        /// Left operand node
        lhs: u32,
        /// Right operand node
        rhs: u32,
    },
    /// Integer power of one earlier node.
    Powi {
        /// Operand node
        arg: u32,
        /// Exponent
        exp: i32,
    },
}

impl Op {
    /// Node indices this operation reads.
    #[inline]
    pub fn operands(&self) -> [Option<u32>; 2] {
        match *self {
            Op::Input(_) | Op::Const(_) => [None, None],
            Op::Unary { arg, .. } | Op::Powi { arg, .. } => [Some(arg), None],
            Op::Binary { lhs, rhs, .. } => [Some(lhs), Some(rhs)],
        }
    }

    /// Evaluates the operation against already computed node values.
    ///
    /// Callers guarantee operands are in bounds (see `Tape::validate`).
    #[inline(always)]
    pub(crate) fn eval(&self, values: &[f64], inputs: &[f64]) -> f64 {
        match *self {
            Op::Input(slot) => inputs[slot as usize],
            Op::Const(c) => c,
            Op::Unary { op, arg } => op.apply(values[arg as usize]),
            Op::Binary { op, lhs, rhs } => op.apply(values[lhs as usize], values[rhs as usize]),
            Op::Powi { arg, exp } => values[arg as usize].powi(exp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operand_order() {
        assert_eq!(BinaryOp::Sub.apply(5.0, 3.0), 2.0);
        assert_eq!(BinaryOp::Div.apply(6.0, 3.0), 2.0);
        assert_eq!(BinaryOp::Pow.apply(2.0, 3.0), 8.0);
    }

    #[test]
    fn test_max_min_nan_semantics() {
        assert_eq!(BinaryOp::Max.apply(f64::NAN, 1.0), 1.0);
        assert_eq!(BinaryOp::Min.apply(2.0, f64::NAN), 2.0);
    }

    #[test]
    fn test_unary_ops() {
        assert_eq!(UnaryOp::Neg.apply(1.5), -1.5);
        assert_eq!(UnaryOp::Exp.apply(0.0), 1.0);
        assert_eq!(UnaryOp::Ln.apply(1.0), 0.0);
        assert_eq!(UnaryOp::Sqrt.apply(9.0), 3.0);
        assert_eq!(UnaryOp::Abs.apply(-2.0), 2.0);
    }

    #[test]
    fn test_operands() {
        assert_eq!(Op::Const(1.0).operands(), [None, None]);
        assert_eq!(Op::Input(0).operands(), [None, None]);
        assert_eq!(
            Op::Unary {
                op: UnaryOp::Exp,
                arg: 3
            }
            .operands(),
            [Some(3), None]
        );
        assert_eq!(
            Op::Binary {
                op: BinaryOp::Add,
                lhs: 1,
                rhs: 2
            }
            .operands(),
            [Some(1), Some(2)]
        );
    }

    #[test]
    fn test_eval_reads_inputs_and_values() {
        let values = [2.0, 3.0];
        let inputs = [7.0];
        assert_eq!(Op::Input(0).eval(&values, &inputs), 7.0);
        assert_eq!(
            Op::Binary {
                op: BinaryOp::Mul,
                lhs: 0,
                rhs: 1
            }
            .eval(&values, &inputs),
            6.0
        );
        assert_eq!(Op::Powi { arg: 1, exp: 2 }.eval(&values, &inputs), 9.0);
    }
}
