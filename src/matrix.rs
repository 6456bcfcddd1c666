// imports
use crate::error::{check_length, SpaceError, SpaceResult};
use crate::scaled::{check_scale, ScaledSparseVector};
use crate::vector::{SparseVector, Vector, VectorMut};

use std::borrow::{Borrow, BorrowMut};
use ndarray::Array2;
use serde::{Serialize, Deserialize};
use tracing::warn;


/// A row major sparse matrix, each row being a [`SparseVector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    rows: Vec<SparseVector>,
    columns: usize
}

impl SparseMatrix {

    pub fn new(rows: usize, columns: usize) -> SparseMatrix {
        Self { rows: (0..rows).map(|_| SparseVector::new(columns)).collect(), columns }
    }

    /// Builds a matrix out of rows that must all share `columns` as length.
    pub fn from_rows(rows: Vec<SparseVector>, columns: usize) -> SpaceResult<SparseMatrix> {
        for row in &rows {
            check_length(columns, row.len())?;
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> SpaceResult<f64> {
        Ok(self.row_vector(row)?.get(self.check_column(column)?))
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) -> SpaceResult<()> {
        let column = self.check_column(column)?;
        self.row_vector_mut(row)?.set(column, value);
        Ok(())
    }

    pub fn add(&mut self, row: usize, column: usize, delta: f64) -> SpaceResult<f64> {
        let column = self.check_column(column)?;
        Ok(self.row_vector_mut(row)?.add(column, delta))
    }

    pub fn row_vector(&self, row: usize) -> SpaceResult<&SparseVector> {
        let len = self.rows.len();
        self.rows.get(row).ok_or(SpaceError::OutOfRange { index: row, len })
    }

    pub fn row_vector_mut(&mut self, row: usize) -> SpaceResult<&mut SparseVector> {
        let len = self.rows.len();
        self.rows.get_mut(row).ok_or(SpaceError::OutOfRange { index: row, len })
    }

    /// Copies a column out of the rows, the matrix being stored row wise.
    pub fn column_vector(&self, column: usize) -> SpaceResult<SparseVector> {
        let column = self.check_column(column)?;
        let mut v = SparseVector::new(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            v.set(r, row.get(column));
        }
        Ok(v)
    }

    /// Sum of the entries of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.iter().map(|(_, x)| x).sum()).collect()
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.rows.len(), self.columns));
        for (r, row) in self.rows.iter().enumerate() {
            for (c, x) in row.iter() {
                dense[[r, c]] = x;
            }
        }
        dense
    }

    fn check_column(&self, column: usize) -> SpaceResult<usize> {
        if column >= self.columns {
            return Err(SpaceError::OutOfRange { index: column, len: self.columns });
        }
        Ok(column)
    }

}


/// A view of a [`SparseMatrix`] whose row `r` reads as the stored row times `scales[r]`.
///
/// No entry is copied. Columns cross rows with different scales, so they
/// cannot be handed out as a single scaled vector and `column_vector` is unsupported.
#[derive(Debug)]
pub struct RowScaledSparseMatrix<M> {
    matrix: M,
    scales: Vec<f64>
}

impl<M: Borrow<SparseMatrix>> RowScaledSparseMatrix<M> {

    pub fn new(matrix: M, scales: Vec<f64>) -> SpaceResult<RowScaledSparseMatrix<M>> {
        let backing: &SparseMatrix = matrix.borrow();
        check_length(backing.rows(), scales.len())?;
        for scale in &scales {
            check_scale(*scale)?;
        }
        Ok(Self { matrix, scales })
    }

    /// Scales every row by the inverse of its sum, so each row reads as a distribution.
    ///
    /// Rows summing to zero keep a scale of one.
    pub fn row_normalized(matrix: M) -> SpaceResult<RowScaledSparseMatrix<M>> {
        let backing: &SparseMatrix = matrix.borrow();
        let scales = backing.row_sums().into_iter().enumerate().map(|(r, sum)| {
            if sum == 0.0 || !sum.is_finite() {
                warn!(row = r, sum, "row cannot be normalized, keeping it unscaled");
                1.0
            } else {
                1.0 / sum
            }
        }).collect();
        Self::new(matrix, scales)
    }

    pub fn backing(&self) -> &SparseMatrix {
        self.matrix.borrow()
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn rows(&self) -> usize {
        self.backing().rows()
    }

    pub fn columns(&self) -> usize {
        self.backing().columns()
    }

    pub fn get(&self, row: usize, column: usize) -> SpaceResult<f64> {
        Ok(self.backing().get(row, column)? * self.scales[row])
    }

    pub fn row_vector(&self, row: usize) -> SpaceResult<ScaledSparseVector<&SparseVector>> {
        let backing = self.backing().row_vector(row)?;
        ScaledSparseVector::new(backing, self.scales[row])
    }

    pub fn column_vector(&self, _column: usize) -> SpaceResult<SparseVector> {
        Err(SpaceError::unsupported("column vectors of a row scaled matrix"))
    }

    pub fn into_backing(self) -> M {
        self.matrix
    }

}

impl<M: BorrowMut<SparseMatrix>> RowScaledSparseMatrix<M> {

    pub fn row_vector_mut(&mut self, row: usize) -> SpaceResult<ScaledSparseVector<&mut SparseVector>> {
        let scale = *self.scales.get(row).ok_or(SpaceError::OutOfRange { index: row, len: self.scales.len() })?;
        let matrix: &mut SparseMatrix = self.matrix.borrow_mut();
        let backing = matrix.row_vector_mut(row)?;
        ScaledSparseVector::new(backing, scale)
    }

    pub fn set(&mut self, row: usize, column: usize, value: f64) -> SpaceResult<()> {
        let column = self.backing().check_column(column)?;
        self.row_vector_mut(row)?.set(column, value);
        Ok(())
    }

}
