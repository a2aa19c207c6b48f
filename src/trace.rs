//! The step trace: an ordered record of how a result was derived.

use crate::matrix::Matrix;
use std::fmt::{self, Display, Formatter};

/// One cell of a step snapshot.
///
/// Computed snapshots hold numbers. Symbolic "before" views (for example the
/// per-cell `6 - (-2)` strings shown for an addition) hold pre-formatted text
/// and deliberately bypass the numeric rounding applied to results.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// A single entry in a [`StepTrace`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A line of narrative.
    Text(String),
    /// A titled snapshot of a matrix, either symbolic or computed.
    Matrix { title: String, cells: Matrix<Cell> },
}

/// The ordered, append-only list of steps produced by one operation.
///
/// A fresh trace is created per top-level call and threaded through every
/// sub-operation; nothing is logged globally. Downstream renderers treat the
/// entries as read-only display data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepTrace {
    steps: Vec<Step>,
}

impl StepTrace {
    pub fn new() -> Self { StepTrace::default() }

    pub fn push(&mut self, step: Step) { self.steps.push(step); }

    pub(crate) fn text<S: Into<String>>(&mut self, message: S) {
        self.push(Step::Text(message.into()));
    }

    pub(crate) fn matrix<S: Into<String>>(
        &mut self,
        title: S,
        cells: Matrix<Cell>,
    ) {
        self.push(Step::Matrix {
            title: title.into(),
            cells,
        });
    }

    /// Record a computed matrix under `title`.
    pub(crate) fn snapshot<S: Into<String>>(
        &mut self,
        title: S,
        values: &Matrix<f64>,
    ) {
        self.matrix(title, values.map(|_, _, &value| Cell::Number(value)));
    }

    pub fn steps(&self) -> &[Step] { self.steps.as_slice() }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> { self.steps.iter() }
}

impl IntoIterator for StepTrace {
    type IntoIter = std::vec::IntoIter<Step>;
    type Item = Step;

    fn into_iter(self) -> Self::IntoIter { self.steps.into_iter() }
}

impl<'a> IntoIterator for &'a StepTrace {
    type IntoIter = std::slice::Iter<'a, Step>;
    type Item = &'a Step;

    fn into_iter(self) -> Self::IntoIter { self.steps.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_their_order() {
        let mut trace = StepTrace::new();

        trace.text("first");
        trace.snapshot("second", &Matrix::identity(1));
        trace.text("third");

        let kinds: Vec<_> = trace
            .iter()
            .map(|step| match step {
                Step::Text(message) => message.as_str(),
                Step::Matrix { title, .. } => title.as_str(),
            })
            .collect();
        assert_eq!(kinds, vec!["first", "second", "third"]);
    }

    #[test]
    fn symbolic_cells_render_verbatim() {
        let cell = Cell::Text("1 + (-2)".into());

        assert_eq!(cell.to_string(), "1 + (-2)");
    }
}
