//! A symbolic matrix algebra engine that shows its working.
//!
//! Expression text like `"3A^t - B^2"` is tokenized, reordered into postfix
//! with the shunting-yard algorithm and run on a stack machine backed by an
//! elimination-based linear algebra kernel. Every public operation returns
//! the computed grid together with a [`StepTrace`] narrating the
//! intermediate work, ready for display.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod engine;
mod eval;
mod matrix;
mod ops;
mod parse;
mod solve;
mod trace;

pub use engine::{
    calculate_basic_op, evaluate_expression, solve_equation, BasicOp,
    Calculation, Error,
};
pub use eval::{evaluate, EvalError, StackValue};
pub use matrix::{Matrix, NamedMatrix, ShapeError};
pub use ops::OpError;
pub use parse::{to_postfix, tokenize, Op, ParseError, Token};
pub use solve::SolveError;
pub use trace::{Cell, Step, StepTrace};
