//! The postfix stack machine.

use crate::{
    matrix::Matrix,
    ops::{self, OpError},
    parse::{Op, Token},
    trace::StepTrace,
};
use smol_str::SmolStr;
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// A value on the evaluation stack.
///
/// The label on a matrix value (for example `"(A + B)"` or `"A^t"`) is
/// display metadata used to title step snapshots; it never feeds back into
/// the arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum StackValue {
    Scalar(f64),
    Matrix { values: Matrix, label: SmolStr },
}

/// Possible errors while running a postfix sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The stack didn't end with exactly one value.
    InvalidExpression,
    /// An operator was applied with too few operands.
    StackUnderflow,
    UnknownMatrix(SmolStr),
    /// The operand kinds don't fit the operator (scalar ± matrix, transpose
    /// of a scalar, and so on).
    UnsupportedOperands { operation: &'static str },
    Op(OpError),
}

impl From<OpError> for EvalError {
    fn from(e: OpError) -> Self { EvalError::Op(e) }
}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::InvalidExpression => write!(f, "Malformed expression"),
            EvalError::StackUnderflow => {
                write!(f, "An operator is missing an operand")
            },
            EvalError::UnknownMatrix(name) => {
                write!(f, "Matrix \"{}\" not found", name)
            },
            EvalError::UnsupportedOperands { operation } => {
                write!(f, "Unsupported operand kinds for {}", operation)
            },
            EvalError::Op(inner) => Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Op(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Run a postfix token sequence against a dictionary of named matrices,
/// producing the final value and the trace of every step taken.
pub fn evaluate(
    postfix: &[Token],
    matrices: &HashMap<SmolStr, Matrix>,
) -> Result<(StackValue, StepTrace), EvalError> {
    let mut stack: Vec<StackValue> = Vec::new();
    let mut trace = StepTrace::new();

    for token in postfix {
        match token {
            Token::Number(value) => stack.push(StackValue::Scalar(*value)),
            Token::Identifier(name) => {
                let values = matrices
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownMatrix(name.clone()))?;

                stack.push(StackValue::Matrix {
                    values: values.clone(),
                    label: name.clone(),
                });
            },
            Token::Operator(op) => {
                apply_operator(*op, &mut stack, &mut trace)?
            },
            // leftovers from unmatched grouping are ignored
            Token::OpenParen | Token::CloseParen => {},
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok((value, trace)),
        _ => Err(EvalError::InvalidExpression),
    }
}

fn apply_operator(
    op: Op,
    stack: &mut Vec<StackValue>,
    trace: &mut StepTrace,
) -> Result<(), EvalError> {
    if op.arity() == 1 {
        return apply_transpose(stack, trace);
    }

    let right = pop(stack)?;
    let left = pop(stack)?;

    match op {
        Op::Plus => apply_elementwise(left, right, Op::Plus, stack, trace),
        Op::Minus => apply_elementwise(left, right, Op::Minus, stack, trace),
        Op::Times => apply_times(left, right, stack, trace),
        Op::Power => apply_power(left, right, stack, trace),
        Op::Divide => {
            Err(EvalError::UnsupportedOperands { operation: "division" })
        },
        Op::Transpose => unreachable!("Transpose is unary"),
    }
}

fn apply_transpose(
    stack: &mut Vec<StackValue>,
    trace: &mut StepTrace,
) -> Result<(), EvalError> {
    match pop(stack)? {
        StackValue::Matrix { values, label } => {
            let result = values.transposed();
            let name = format!("{}^t", label);

            trace.text(format!("Computing transpose of {}", label));
            trace.snapshot(name.clone(), &result);

            stack.push(StackValue::Matrix {
                values: result,
                label: name.into(),
            });
            Ok(())
        },
        StackValue::Scalar(_) => {
            Err(EvalError::UnsupportedOperands { operation: "transpose" })
        },
    }
}

fn apply_elementwise(
    left: StackValue,
    right: StackValue,
    op: Op,
    stack: &mut Vec<StackValue>,
    trace: &mut StepTrace,
) -> Result<(), EvalError> {
    let (verb, symbol, operation) = match op {
        Op::Plus => ("Adding", "+", "addition"),
        _ => ("Subtracting", "-", "subtraction"),
    };

    match (left, right) {
        (
            StackValue::Matrix { values: a, label: left },
            StackValue::Matrix { values: b, label: right },
        ) => {
            trace.text(format!(
                "{} matrices: {} {} {}",
                verb, left, symbol, right
            ));

            let result = match op {
                Op::Plus => ops::add(&a, &b, trace)?,
                _ => ops::subtract(&a, &b, trace)?,
            };

            stack.push(StackValue::Matrix {
                values: result,
                label: format!("({} {} {})", left, symbol, right).into(),
            });
            Ok(())
        },
        // scalar ± matrix has no broadcast interpretation here
        _ => Err(EvalError::UnsupportedOperands { operation }),
    }
}

fn apply_times(
    left: StackValue,
    right: StackValue,
    stack: &mut Vec<StackValue>,
    trace: &mut StepTrace,
) -> Result<(), EvalError> {
    match (left, right) {
        (StackValue::Scalar(x), StackValue::Scalar(y)) => {
            stack.push(StackValue::Scalar(x * y));
        },
        (StackValue::Scalar(k), StackValue::Matrix { values, label })
        | (StackValue::Matrix { values, label }, StackValue::Scalar(k)) => {
            trace.text(format!("Multiplying {} by scalar {}", label, k));

            let result = ops::scalar_multiply(&values, k);
            let name = format!("{}{}", k, label);
            trace.snapshot(name.clone(), &result);

            stack.push(StackValue::Matrix {
                values: result,
                label: name.into(),
            });
        },
        (
            StackValue::Matrix { values: a, label: left },
            StackValue::Matrix { values: b, label: right },
        ) => {
            trace.text(format!(
                "Multiplying matrices: {} · {}",
                left, right
            ));

            let result = ops::multiply(&a, &b, trace)?;
            let name = format!("{}·{}", left, right);
            trace.snapshot(name.clone(), &result);

            stack.push(StackValue::Matrix {
                values: result,
                label: name.into(),
            });
        },
    }

    Ok(())
}

fn apply_power(
    left: StackValue,
    right: StackValue,
    stack: &mut Vec<StackValue>,
    trace: &mut StepTrace,
) -> Result<(), EvalError> {
    match (left, right) {
        (StackValue::Matrix { values, label }, StackValue::Scalar(exp)) => {
            let result = ops::power(&values, exp, trace)?;

            stack.push(StackValue::Matrix {
                values: result,
                label: format!("{}^{}", label, exp).into(),
            });
            Ok(())
        },
        _ => Err(EvalError::UnsupportedOperands { operation: "power" }),
    }
}

fn pop(stack: &mut Vec<StackValue>) -> Result<StackValue, EvalError> {
    stack.pop().ok_or(EvalError::StackUnderflow)
}
