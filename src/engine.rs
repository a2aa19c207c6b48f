//! The operations the engine exposes to its collaborators.
//!
//! Everything here is a pure function of its inputs: callers hand over
//! expression text and named matrices, and get back a fresh grid plus the
//! step trace, or an error. Nothing is retained between calls.

use crate::{
    eval::{self, EvalError, StackValue},
    matrix::{Matrix, NamedMatrix},
    ops::{self, OpError},
    parse::{self, ParseError},
    solve::{self, SolveError},
    trace::StepTrace,
};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// A computed result together with the steps that produced it.
///
/// Scalar results (determinant, rank, scalar expressions) are wrapped as a
/// 1x1 grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub result: Matrix,
    pub trace: StepTrace,
}

/// The single-operand operations available without going through the parser.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BasicOp {
    Transpose,
    Inverse,
    Determinant,
    Rank,
}

/// Any way an engine call can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Eval(EvalError),
    Op(OpError),
    Solve(SolveError),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self { Error::Parse(e) }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self { Error::Eval(e) }
}

impl From<OpError> for Error {
    fn from(e: OpError) -> Self { Error::Op(e) }
}

impl From<SolveError> for Error {
    fn from(e: SolveError) -> Self { Error::Solve(e) }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(inner) => Display::fmt(inner, f),
            Error::Eval(inner) => Display::fmt(inner, f),
            Error::Op(inner) => Display::fmt(inner, f),
            Error::Solve(inner) => Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(inner) => Some(inner),
            Error::Eval(inner) => Some(inner),
            Error::Op(inner) => Some(inner),
            Error::Solve(inner) => Some(inner),
        }
    }
}

/// Evaluate an algebraic expression over the given named matrices.
pub fn evaluate_expression(
    expression: &str,
    matrices: &[NamedMatrix],
) -> Result<Calculation, Error> {
    if expression.trim().is_empty() {
        return Err(Error::Parse(ParseError::EmptyExpression));
    }

    let context: HashMap<_, _> = matrices
        .iter()
        .map(|m| (m.name.clone(), m.values.clone()))
        .collect();

    let tokens = parse::tokenize(expression)?;
    let postfix = parse::to_postfix(tokens);
    let (value, trace) = eval::evaluate(&postfix, &context)?;

    let result = match value {
        StackValue::Matrix { values, .. } => values,
        StackValue::Scalar(value) => Matrix::init(1, 1, |_, _| value),
    };

    Ok(Calculation { result, trace })
}

/// Apply one of the [`BasicOp`]s directly, bypassing the parser.
pub fn calculate_basic_op(
    matrix: &NamedMatrix,
    op: BasicOp,
) -> Result<Calculation, Error> {
    let mut trace = StepTrace::new();

    let result = match op {
        BasicOp::Transpose => {
            let result = matrix.values.transposed();
            trace.text("Transpose: rows -> columns");
            trace.snapshot(format!("{}^t", matrix.name), &result);
            result
        },
        BasicOp::Inverse => ops::inverse(&matrix.values, &mut trace)?,
        BasicOp::Determinant => {
            let value = ops::determinant(&matrix.values, &mut trace)?;
            Matrix::init(1, 1, |_, _| value)
        },
        BasicOp::Rank => {
            let value = ops::rank(&matrix.values, &mut trace);
            Matrix::init(1, 1, |_, _| value as f64)
        },
    };

    Ok(Calculation { result, trace })
}

/// Solve `M·X + N = P` for `X`.
pub fn solve_equation(
    m: &NamedMatrix,
    n: &NamedMatrix,
    p: &NamedMatrix,
) -> Result<Calculation, Error> {
    let (result, trace) = solve::solve(m, n, p)?;

    Ok(Calculation { result, trace })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Step;

    fn sample() -> Vec<NamedMatrix> {
        vec![
            NamedMatrix::new("A", Matrix::from([[1.0, 2.0], [3.0, 4.0]])),
            NamedMatrix::new("B", Matrix::from([[5.0, 6.0], [7.0, 8.0]])),
        ]
    }

    #[test]
    fn expression_evaluation_end_to_end() {
        let got = evaluate_expression("A + B", &sample()).unwrap();

        assert_eq!(got.result, [[6.0, 8.0], [10.0, 12.0]]);
        assert!(!got.trace.is_empty());
    }

    #[test]
    fn scalar_results_become_one_by_one_grids() {
        let got = evaluate_expression("2 * 3", &sample()).unwrap();

        assert_eq!(got.result, [[6.0]]);
    }

    #[test]
    fn blank_expressions_are_rejected_before_tokenizing() {
        for expression in ["", "   ", "\t"].iter() {
            let got = evaluate_expression(expression, &sample()).unwrap_err();

            assert_eq!(got, Error::Parse(ParseError::EmptyExpression));
        }
    }

    #[test]
    fn parse_failures_surface_through_the_engine() {
        let got = evaluate_expression("A $ B", &sample()).unwrap_err();

        assert_eq!(
            got,
            Error::Parse(ParseError::UnexpectedCharacter {
                character: '$',
                index: 2
            })
        );
    }

    #[test]
    fn unknown_matrices_surface_through_the_engine() {
        let got = evaluate_expression("A + Z", &sample()).unwrap_err();

        assert_eq!(got, Error::Eval(EvalError::UnknownMatrix("Z".into())));
    }

    #[test]
    fn basic_transpose_titles_the_snapshot_with_the_name() {
        let matrices = sample();

        let got =
            calculate_basic_op(&matrices[0], BasicOp::Transpose).unwrap();

        assert_eq!(got.result, [[1.0, 3.0], [2.0, 4.0]]);
        match &got.trace.steps()[1] {
            Step::Matrix { title, .. } => assert_eq!(title, "A^t"),
            other => panic!("Expected a snapshot, got {:?}", other),
        }
    }

    #[test]
    fn basic_determinant_is_wrapped_as_a_grid() {
        let matrices = sample();

        let got =
            calculate_basic_op(&matrices[0], BasicOp::Determinant).unwrap();

        assert_eq!(got.result, [[-2.0]]);
    }

    #[test]
    fn basic_rank_is_wrapped_as_a_grid() {
        let matrices = sample();

        let got = calculate_basic_op(&matrices[0], BasicOp::Rank).unwrap();

        assert_eq!(got.result, [[2.0]]);
    }

    #[test]
    fn basic_inverse_matches_the_kernel() {
        let matrices = sample();

        let got =
            calculate_basic_op(&matrices[0], BasicOp::Inverse).unwrap();

        assert_eq!(got.result, [[-2.0, 1.0], [1.5, -0.5]]);
    }

    #[test]
    fn equation_solving_end_to_end() {
        let m = NamedMatrix::new("M", Matrix::identity(2));
        let n = NamedMatrix::new("N", Matrix::from([[1.0, 1.0], [1.0, 1.0]]));
        let p = NamedMatrix::new("P", Matrix::from([[2.0, 2.0], [2.0, 2.0]]));

        let got = solve_equation(&m, &n, &p).unwrap();

        assert_eq!(got.result, [[1.0, 1.0], [1.0, 1.0]]);
    }

    #[test]
    fn inputs_are_never_mutated_even_on_failure() {
        let a = NamedMatrix::new("A", Matrix::from([[1.0, 2.0], [2.0, 4.0]]));
        let before = a.clone();

        let _ = calculate_basic_op(&a, BasicOp::Inverse).unwrap_err();

        assert_eq!(a, before);
    }
}
