//! A small dense matrix type holding just the operations the engine needs.

use smol_str::SmolStr;
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::Index,
};

/// A rectangular grid laid out row-by-row in memory.
///
/// The engine does all its arithmetic on `Matrix<f64>`, but step snapshots
/// reuse the same type with textual cells (see [`crate::trace`]).
#[derive(Clone, PartialEq)]
pub struct Matrix<T = f64> {
    cells: Box<[T]>,
    rows: usize,
    columns: usize,
}

impl<T> Matrix<T> {
    /// Create a new [`Matrix`] by invoking some `fn(row, column) -> T`
    /// function for each cell.
    pub fn init<F>(rows: usize, columns: usize, mut get_cell: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        assert!(rows >= 1 && columns >= 1, "Matrices can not be empty");

        let mut cells = Vec::with_capacity(rows * columns);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(row, column));
            }
        }

        Matrix {
            cells: cells.into_boxed_slice(),
            rows,
            columns,
        }
    }

    /// Build a matrix from a list of rows, checking that every row has the
    /// same length.
    pub fn from_rows<R>(rows: R) -> Result<Self, ShapeError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
    {
        let mut cells = Vec::new();
        let mut row_count = 0;
        let mut columns = None;

        for row in rows {
            let before = cells.len();
            cells.extend(row);
            let width = cells.len() - before;

            match columns {
                Some(expected) if expected != width => {
                    return Err(ShapeError {
                        row: row_count,
                        expected,
                        found: width,
                    });
                },
                _ => columns = Some(width),
            }

            row_count += 1;
        }

        match columns {
            Some(columns) if columns > 0 => Ok(Matrix {
                cells: cells.into_boxed_slice(),
                rows: row_count,
                columns,
            }),
            _ => Err(ShapeError {
                row: row_count,
                expected: 1,
                found: 0,
            }),
        }
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn columns(&self) -> usize { self.columns }

    /// The `rows x columns` shape, used for dimension checks and error
    /// messages.
    pub fn shape(&self) -> (usize, usize) { (self.rows, self.columns) }

    pub fn is_square(&self) -> bool { self.rows == self.columns }

    fn index_of(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row < self.rows && column < self.columns {
            self.cells.get(self.index_of(row, column))
        } else {
            None
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks_exact(self.columns)
    }

    /// Apply `fn(row, column, &cell)` to every cell, yielding a new grid.
    pub fn map<F, Q>(&self, mut func: F) -> Matrix<Q>
    where
        F: FnMut(usize, usize, &T) -> Q,
    {
        Matrix::init(self.rows, self.columns, |row, column| {
            func(row, column, &self[(row, column)])
        })
    }

    pub fn transposed(&self) -> Self
    where
        T: Clone,
    {
        Matrix::init(self.columns, self.rows, |row, column| {
            self[(column, row)].clone()
        })
    }
}

impl Matrix<f64> {
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Matrix::init(rows, columns, |_, _| 0.0)
    }

    pub fn identity(size: usize) -> Self {
        Matrix::init(size, size, |row, column| {
            if row == column {
                1.0
            } else {
                0.0
            }
        })
    }
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter_rows()).finish()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows, "Row index out of bounds");
        assert!(column < self.columns, "Column index out of bounds");

        &self.cells[row * self.columns + column]
    }
}

impl<T: Clone, const R: usize, const C: usize> From<[[T; C]; R]> for Matrix<T> {
    fn from(rows: [[T; C]; R]) -> Self {
        Matrix::init(R, C, |row, column| rows[row][column].clone())
    }
}

impl<T, const R: usize, const C: usize> PartialEq<[[T; C]; R]> for Matrix<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &[[T; C]; R]) -> bool {
        self.rows == R
            && self.columns == C
            && self
                .iter_rows()
                .zip(other.iter())
                .all(|(row, expected)| row == expected.as_ref())
    }
}

/// The error returned when a matrix is built from ragged or empty rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeError {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} has {} elements, expected {}",
            self.row + 1,
            self.found,
            self.expected
        )
    }
}

impl std::error::Error for ShapeError {}

/// A matrix as the caller knows it: a grid plus the name it was given.
///
/// The name is display metadata only. It seeds the symbolic labels carried
/// through the evaluation stack and never affects numeric computation.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMatrix {
    pub name: SmolStr,
    pub values: Matrix<f64>,
}

impl NamedMatrix {
    pub fn new<N: Into<SmolStr>>(name: N, values: Matrix<f64>) -> Self {
        NamedMatrix {
            name: name.into(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_representation() {
        let matrix = Matrix::init(2, 3, |row, column| row + column);
        let should_be = "[[0, 1, 2], [1, 2, 3]]";

        let got = format!("{:?}", matrix);

        assert_eq!(got, should_be);
    }

    #[test]
    fn matrix_from_array() {
        let got = Matrix::from([[1, 2, 3, 4], [5, 6, 7, 8]]);

        assert_eq!(got.shape(), (2, 4));
        assert_eq!(got[(1, 2)], 7);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let got = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);

        assert_eq!(
            got,
            Err(ShapeError {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let matrix = Matrix::from([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let got = matrix.transposed();

        assert_eq!(got, [[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
    }

    #[test]
    fn transpose_is_an_involution() {
        let matrix = Matrix::from([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);

        assert_eq!(matrix.transposed().transposed(), matrix);
    }

    #[test]
    fn identity_has_ones_on_the_diagonal() {
        let got = Matrix::identity(3);

        assert_eq!(
            got,
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }
}
