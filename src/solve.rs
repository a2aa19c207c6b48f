//! Solving the matrix equation `M·X + N = P` for `X`.

use crate::{
    matrix::{Matrix, NamedMatrix},
    ops::{self, OpError},
    trace::StepTrace,
};
use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};

/// How each stage of the solve pipeline can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// `P - N` has mismatched shapes.
    IncompatibleSubtraction {
        p: SmolStr,
        n: SmolStr,
        source: OpError,
    },
    /// `M` could not be inverted.
    NoInverse { m: SmolStr, source: OpError },
    /// `M⁻¹ · (P - N)` has mismatched shapes.
    IncompatibleMultiplication { source: OpError },
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::IncompatibleSubtraction { p, n, .. } => {
                write!(f, "{} - {} have incompatible dimensions", p, n)
            },
            SolveError::NoInverse { m, .. } => {
                write!(f, "Matrix {} has no inverse", m)
            },
            SolveError::IncompatibleMultiplication { .. } => {
                write!(f, "The final multiplication is incompatible")
            },
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::IncompatibleSubtraction { source, .. }
            | SolveError::NoInverse { source, .. }
            | SolveError::IncompatibleMultiplication { source } => {
                Some(source)
            },
        }
    }
}

/// Solve `M·X + N = P` by the fixed rearrangement `X = M⁻¹ · (P - N)`.
///
/// The trace opens with the goal and the rearrangement, then narrates the
/// three stages in order, each followed by the sub-operation's own steps.
pub fn solve(
    m: &NamedMatrix,
    n: &NamedMatrix,
    p: &NamedMatrix,
) -> Result<(Matrix, StepTrace), SolveError> {
    let mut trace = StepTrace::new();

    trace.text(format!(
        "Goal: solve for X in {}·X + {} = {}",
        m.name, n.name, p.name
    ));
    trace.text(format!(
        "Rearranged: X = ({})⁻¹ · ({} - {})",
        m.name, p.name, n.name
    ));

    trace.text(format!("1. Compute R = {} - {}", p.name, n.name));
    let rhs = ops::subtract(&p.values, &n.values, &mut trace).map_err(
        |source| SolveError::IncompatibleSubtraction {
            p: p.name.clone(),
            n: n.name.clone(),
            source,
        },
    )?;

    trace.text(format!("2. Compute the inverse of {}", m.name));
    let inverted =
        ops::inverse(&m.values, &mut trace).map_err(|source| {
            SolveError::NoInverse {
                m: m.name.clone(),
                source,
            }
        })?;
    trace.snapshot(format!("Inverse ({})⁻¹", m.name), &inverted);

    trace.text(format!("3. Multiply ({})⁻¹ · R", m.name));
    let x = ops::multiply(&inverted, &rhs, &mut trace)
        .map_err(|source| SolveError::IncompatibleMultiplication { source })?;
    trace.snapshot("Result X", &x);

    Ok((x, trace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Step;

    fn named(name: &str, values: Matrix) -> NamedMatrix {
        NamedMatrix::new(name, values)
    }

    #[test]
    fn identity_coefficient_reduces_to_a_subtraction() {
        let m = named("M", Matrix::identity(2));
        let n = named("N", Matrix::from([[1.0, 1.0], [1.0, 1.0]]));
        let p = named("P", Matrix::from([[2.0, 2.0], [2.0, 2.0]]));

        let (x, trace) = solve(&m, &n, &p).unwrap();

        assert_eq!(x, [[1.0, 1.0], [1.0, 1.0]]);
        assert_eq!(
            trace.steps()[0],
            Step::Text("Goal: solve for X in M·X + N = P".into())
        );
    }

    #[test]
    fn solution_satisfies_the_original_equation() {
        let m = named("M", Matrix::from([[2.0, 1.0], [1.0, 3.0]]));
        let n = named("N", Matrix::from([[0.0, 1.0], [1.0, 0.0]]));
        let p = named("P", Matrix::from([[5.0, 7.0], [6.0, 8.0]]));

        let (x, _) = solve(&m, &n, &p).unwrap();

        // M·X + N should reproduce P
        let product = ops::multiply_cells(&m.values, &x);
        for row in 0..2 {
            for column in 0..2 {
                let got = product[(row, column)] + n.values[(row, column)];

                assert!(
                    approx::abs_diff_eq!(
                        got,
                        p.values[(row, column)],
                        epsilon = 1e-6
                    ),
                    "cell ({}, {}): {} != {}",
                    row,
                    column,
                    got,
                    p.values[(row, column)]
                );
            }
        }
    }

    #[test]
    fn mismatched_p_and_n_abort_the_first_stage() {
        let m = named("M", Matrix::identity(2));
        let n = named("N", Matrix::from([[1.0, 1.0]]));
        let p = named("P", Matrix::from([[2.0, 2.0], [2.0, 2.0]]));

        let got = solve(&m, &n, &p).unwrap_err();

        assert_eq!(got.to_string(), "P - N have incompatible dimensions");
    }

    #[test]
    fn singular_coefficient_aborts_the_second_stage() {
        let m = named("M", Matrix::from([[1.0, 2.0], [2.0, 4.0]]));
        let n = named("N", Matrix::zeros(2, 2));
        let p = named("P", Matrix::identity(2));

        let got = solve(&m, &n, &p).unwrap_err();

        assert_eq!(
            got,
            SolveError::NoInverse {
                m: "M".into(),
                source: OpError::SingularMatrix,
            }
        );
    }

    #[test]
    fn mismatched_final_product_aborts_the_third_stage() {
        let m = named("M", Matrix::identity(3));
        let n = named("N", Matrix::zeros(2, 2));
        let p = named("P", Matrix::identity(2));

        let got = solve(&m, &n, &p).unwrap_err();

        assert!(matches!(
            got,
            SolveError::IncompatibleMultiplication { .. }
        ));
    }

    #[test]
    fn trace_includes_the_inverse_pivot_narrative() {
        // M needs a row swap before it can be inverted
        let m = named("M", Matrix::from([[0.0, 1.0], [1.0, 0.0]]));
        let n = named("N", Matrix::zeros(2, 2));
        let p = named("P", Matrix::identity(2));

        let (_, trace) = solve(&m, &n, &p).unwrap();

        assert!(trace
            .iter()
            .any(|step| *step == Step::Text("Pivot: swap R1 <-> R2".into())));
    }
}
