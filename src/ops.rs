//! The linear algebra kernel.
//!
//! Every routine works on a copy of its inputs and reports the work it did by
//! appending to a caller-supplied [`StepTrace`]. A failed operation never
//! leaves a caller-owned matrix half-modified.

use crate::{
    matrix::Matrix,
    trace::{Cell, StepTrace},
};
use std::fmt::{self, Display, Formatter};

/// The tolerance used for every zero/pivot test in the kernel.
pub(crate) const EPSILON: f64 = 1e-10;

/// Round a computed value for display: snap to the nearest integer when it is
/// within [`EPSILON`] of one, otherwise keep 4 decimal places.
///
/// Applied to every value stored in a result grid, never to the operands
/// rendered in symbolic step text.
pub(crate) fn clean(value: f64) -> f64 {
    let nearest = value.round();

    if approx::abs_diff_eq!(value, nearest, epsilon = EPSILON) {
        nearest
    } else {
        (value * 1e4).round() / 1e4
    }
}

/// The ways a kernel operation can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum OpError {
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    NotSquare {
        operation: &'static str,
        rows: usize,
        columns: usize,
    },
    SingularMatrix,
    InvalidExponent {
        exponent: f64,
    },
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OpError::DimensionMismatch {
                operation,
                left: (r1, c1),
                right: (r2, c2),
            } => write!(
                f,
                "Incompatible dimensions for {}: {}x{} vs {}x{}",
                operation, r1, c1, r2, c2
            ),
            OpError::NotSquare {
                operation,
                rows,
                columns,
            } => write!(
                f,
                "{} requires a square matrix, got {}x{}",
                operation, rows, columns
            ),
            OpError::SingularMatrix => {
                write!(f, "The matrix is singular and has no inverse")
            },
            OpError::InvalidExponent { exponent } => write!(
                f,
                "Power requires an integer exponent >= 1, got {}",
                exponent
            ),
        }
    }
}

impl std::error::Error for OpError {}

/// Elementwise sum. Records a symbolic per-cell view followed by the
/// computed result.
pub fn add(
    a: &Matrix,
    b: &Matrix,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    elementwise(a, b, "addition", "+", |x, y| x + y, "Addition result", trace)
}

/// Elementwise difference. Records a symbolic per-cell view followed by the
/// computed result.
pub fn subtract(
    a: &Matrix,
    b: &Matrix,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    elementwise(
        a,
        b,
        "subtraction",
        "-",
        |x, y| x - y,
        "Subtraction result",
        trace,
    )
}

fn elementwise(
    a: &Matrix,
    b: &Matrix,
    operation: &'static str,
    symbol: &str,
    combine: fn(f64, f64) -> f64,
    title: &str,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    if a.shape() != b.shape() {
        return Err(OpError::DimensionMismatch {
            operation,
            left: a.shape(),
            right: b.shape(),
        });
    }

    let result = a.map(|row, column, &left| {
        clean(combine(left, b[(row, column)]))
    });
    // the "before" view shows the raw operands, negative right-hand values
    // wrapped in parentheses
    let symbolic = a.map(|row, column, &left| {
        let right = b[(row, column)];
        if right < 0.0 {
            Cell::Text(format!("{} {} ({})", left, symbol, right))
        } else {
            Cell::Text(format!("{} {} {}", left, symbol, right))
        }
    });

    trace.matrix("Operation", symbolic);
    trace.snapshot(title, &result);

    Ok(result)
}

/// Multiply every element by `scalar`.
pub fn scalar_multiply(matrix: &Matrix, scalar: f64) -> Matrix {
    matrix.map(|_, _, &value| clean(value * scalar))
}

/// Standard matrix product. Records the shape rule and one illustrative
/// dot-product expansion for the top-left cell.
pub fn multiply(
    a: &Matrix,
    b: &Matrix,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    let (r1, c1) = a.shape();
    let (r2, c2) = b.shape();

    if c1 != r2 {
        return Err(OpError::DimensionMismatch {
            operation: "multiplication",
            left: a.shape(),
            right: b.shape(),
        });
    }

    let result = multiply_cells(a, b);

    trace.text(format!(
        "Multiplication: ({}x{}) · ({}x{}) -> ({}x{})",
        r1, c1, r2, c2, r1, c2
    ));

    let terms: Vec<String> = (0..c1)
        .map(|k| format!("({}·{})", a[(0, k)], b[(k, 0)]))
        .collect();
    trace.text(format!(
        "Example C[1,1] = Row 1 · Col 1 = {} = {}",
        terms.join(" + "),
        result[(0, 0)]
    ));

    Ok(result)
}

/// The product without any narration; shapes must already be compatible.
pub(crate) fn multiply_cells(a: &Matrix, b: &Matrix) -> Matrix {
    assert_eq!(a.columns(), b.rows());

    Matrix::init(a.rows(), b.columns(), |row, column| {
        let mut sum = 0.0;

        for k in 0..a.columns() {
            sum += a[(row, k)] * b[(k, column)];
        }

        clean(sum)
    })
}

/// Determinant of a square matrix.
///
/// 1x1 and 2x2 matrices are handled directly; anything larger goes through
/// Gaussian elimination with partial pivoting, tracking the swap parity.
pub fn determinant(
    matrix: &Matrix,
    trace: &mut StepTrace,
) -> Result<f64, OpError> {
    let n = require_square(matrix, "Determinant")?;

    trace.text(format!("Determinant of a {}x{} matrix.", n, n));

    if n == 1 {
        return Ok(matrix[(0, 0)]);
    }

    if n == 2 {
        let value = matrix[(0, 0)] * matrix[(1, 1)]
            - matrix[(0, 1)] * matrix[(1, 0)];
        trace.text(format!(
            "Formula ad - bc: ({}·{}) - ({}·{})",
            matrix[(0, 0)],
            matrix[(1, 1)],
            matrix[(0, 1)],
            matrix[(1, 0)]
        ));
        return Ok(clean(value));
    }

    let mut cells = copy_rows(matrix);
    let mut swaps = 0;

    for i in 0..n {
        let pivot = match (i..n).find(|&row| cells[row][i].abs() >= EPSILON) {
            Some(pivot) => pivot,
            None => {
                trace.text("Determinant is 0 (zero pivot column).");
                return Ok(0.0);
            },
        };

        if pivot != i {
            cells.swap(i, pivot);
            swaps += 1;
        }

        for j in i + 1..n {
            if cells[j][i].abs() > EPSILON {
                let factor = cells[j][i] / cells[i][i];
                for k in i..n {
                    cells[j][k] -= factor * cells[i][k];
                }
            }
        }
    }

    let product: f64 = (0..n).map(|i| cells[i][i]).product();
    let value = clean(if swaps % 2 == 1 { -product } else { product });

    trace.text(format!("Triangularization complete. Det = {}", value));

    Ok(value)
}

/// Invert a square matrix by Gauss-Jordan reduction of `[A | I]`.
pub fn inverse(
    matrix: &Matrix,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    let n = require_square(matrix, "Inverse")?;

    trace.text("Gauss-Jordan method for the inverse.");

    // the augmented n x 2n matrix [A | I]
    let mut augmented: Vec<Vec<f64>> = matrix
        .iter_rows()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = row.to_vec();
            cells.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            cells
        })
        .collect();

    for i in 0..n {
        let pivot = (i..n)
            .find(|&row| augmented[row][i].abs() >= EPSILON)
            .ok_or(OpError::SingularMatrix)?;

        if pivot != i {
            augmented.swap(i, pivot);
            trace.text(format!("Pivot: swap R{} <-> R{}", i + 1, pivot + 1));
        }

        let pivot_value = augmented[i][i];
        if (pivot_value - 1.0).abs() > EPSILON {
            for j in 0..2 * n {
                augmented[i][j] /= pivot_value;
            }
        }

        for k in 0..n {
            if k != i && augmented[k][i].abs() > EPSILON {
                let factor = augmented[k][i];
                for j in 0..2 * n {
                    augmented[k][j] -= factor * augmented[i][j];
                }
            }
        }
    }

    Ok(Matrix::init(n, n, |row, column| {
        clean(augmented[row][n + column])
    }))
}

/// Rank of any rectangular matrix, read off a row-echelon reduction.
pub fn rank(matrix: &Matrix, trace: &mut StepTrace) -> usize {
    trace.text("Rank via Gaussian elimination.");

    let mut cells = copy_rows(matrix);
    let (rows, columns) = matrix.shape();
    let mut visited = vec![false; columns];
    let mut rank = 0;

    for r in 0..rows {
        let pivot_column = (0..columns)
            .find(|&c| !visited[c] && cells[r][c].abs() > EPSILON);
        // a row with no usable pivot is simply skipped
        let pivot_column = match pivot_column {
            Some(column) => column,
            None => continue,
        };

        visited[pivot_column] = true;
        rank += 1;

        let pivot_value = cells[r][pivot_column];
        for c in 0..columns {
            cells[r][c] /= pivot_value;
        }

        for i in 0..rows {
            if i != r {
                let factor = cells[i][pivot_column];
                for c in 0..columns {
                    cells[i][c] -= factor * cells[r][c];
                }
            }
        }
    }

    rank
}

/// Raise a square matrix to an integer power >= 1 by binary exponentiation.
pub fn power(
    matrix: &Matrix,
    exponent: f64,
    trace: &mut StepTrace,
) -> Result<Matrix, OpError> {
    let n = require_square(matrix, "Power")?;

    if exponent < 1.0 || exponent.fract() != 0.0 {
        return Err(OpError::InvalidExponent { exponent });
    }

    trace.text(format!("Computing power ^{}", exponent));

    let mut remaining = exponent as u64;
    let mut result = Matrix::identity(n);
    let mut base = matrix.clone();

    while remaining > 0 {
        if remaining % 2 == 1 {
            result = multiply_cells(&result, &base);
        }
        if remaining > 1 {
            base = multiply_cells(&base, &base);
        }
        remaining /= 2;
    }

    trace.snapshot(format!("Power result ^{}", exponent), &result);

    Ok(result)
}

fn require_square(
    matrix: &Matrix,
    operation: &'static str,
) -> Result<usize, OpError> {
    if matrix.is_square() {
        Ok(matrix.rows())
    } else {
        Err(OpError::NotSquare {
            operation,
            rows: matrix.rows(),
            columns: matrix.columns(),
        })
    }
}

fn copy_rows(matrix: &Matrix) -> Vec<Vec<f64>> {
    matrix.iter_rows().map(|row| row.to_vec()).collect()
}
