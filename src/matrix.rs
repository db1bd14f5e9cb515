use std::num::NonZeroUsize;

use num_traits::{Float, Zero};
use primitive::seq::Seq;
use thiserror::Error;

/// Pivots at or below this fraction of the largest entry are treated as zero.
const SINGULAR_RELATIVE_TOLERANCE: f64 = 1e-10;
const MAX_JACOBI_SWEEPS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub row: usize,
    pub col: usize,
}
impl Index {
    pub(crate) fn to_1(self, cols: NonZeroUsize) -> usize {
        self.row * cols.get() + self.col
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub rows: NonZeroUsize,
    pub cols: NonZeroUsize,
}
impl Size {
    pub fn volume(&self) -> NonZeroUsize {
        let volume = self.rows.get() * self.cols.get();
        NonZeroUsize::new(volume).unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct MatrixBuf<T> {
    size: Size,
    data: T,
}
impl<T> Container2D for MatrixBuf<T>
where
    T: Seq<f64>,
{
    type Item = f64;
    fn size(&self) -> Size {
        self.size
    }
    fn cell(&self, index: Index) -> Self::Item {
        let index = self.index_2_to_1(index);
        self.data.as_slice()[index]
    }
}
impl<T> Container2DMut for MatrixBuf<T>
where
    T: Seq<f64>,
{
    fn set_cell(&mut self, index: Index, value: Self::Item) {
        let index = self.index_2_to_1(index);
        self.data.as_slice_mut()[index] = value;
    }
}
impl<T> MatrixBuf<T>
where
    T: Seq<f64>,
{
    pub fn new(size: Size, data: T) -> Self {
        if data.as_slice().len() < size.volume().get() {
            panic!("not enough buffer size");
        }
        Self { size, data }
    }
    pub fn zero(size: Size) -> MatrixBuf<Vec<f64>> {
        let data = vec![0.; size.volume().get()];
        MatrixBuf::new(size, data)
    }
    pub fn identity(rows: NonZeroUsize) -> MatrixBuf<Vec<f64>> {
        let size = Size { rows, cols: rows };
        let mut matrix = Self::zero(size);
        for row in 0..rows.get() {
            let index = Index { row, col: row };
            matrix.set_cell(index, 1.);
        }
        matrix
    }

    fn index_2_to_1(&self, index: Index) -> usize {
        if self.size().cols.get() <= index.col {
            panic!("col out of range");
        }
        if self.size().rows.get() <= index.row {
            panic!("row out of range");
        }
        index.to_1(self.size().cols)
    }

    pub fn to_owned_buf(&self) -> MatrixBuf<Vec<f64>> {
        MatrixBuf::new(self.size(), self.data.as_slice().to_vec())
    }

    pub fn transpose(&self) -> MatrixBuf<Vec<f64>> {
        let mut out = MatrixBuf::<Vec<f64>>::zero(self.transpose_size());
        self.transpose_in(&mut out);
        out
    }

    pub fn mul_matrix(&self, other: &impl Container2D<Item = f64>) -> MatrixBuf<Vec<f64>> {
        if self.size().cols != other.size().rows {
            panic!("unmatched matrix shapes for mul");
        }
        let mut matrix = MatrixBuf::<Vec<f64>>::zero(self.mul_matrix_size(other));
        self.mul_matrix_in(other, &mut matrix);
        matrix
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.data
            .as_slice()
            .iter()
            .take(self.size().volume().get())
            .fold(0., |max, x| f64::max(max, x.abs()))
    }

    /// Gauss-Jordan elimination with partial pivoting.
    pub fn inverse(&self) -> Result<MatrixBuf<Vec<f64>>, SingularMatrixError> {
        if !self.is_square() {
            panic!("not a square matrix");
        }
        let n = self.size().rows;
        let tolerance = SINGULAR_RELATIVE_TOLERANCE * self.max_abs();
        let mut work = self.to_owned_buf();
        let mut inverse = Self::identity(n);

        for col in 0..n.get() {
            let pivot_row = (col..n.get())
                .max_by(|&a, &b| {
                    let a = work.cell(Index { row: a, col }).abs();
                    let b = work.cell(Index { row: b, col }).abs();
                    a.total_cmp(&b)
                })
                .unwrap();
            let pivot = work.cell(Index {
                row: pivot_row,
                col,
            });
            // NaN pivots fail this check as well
            if !(pivot.abs() > tolerance) {
                return Err(SingularMatrixError);
            }
            work.swap_rows(col, pivot_row);
            inverse.swap_rows(col, pivot_row);

            work.scale_row(col, 1. / pivot);
            inverse.scale_row(col, 1. / pivot);

            for row in 0..n.get() {
                if row == col {
                    continue;
                }
                let factor = work.cell(Index { row, col });
                if factor.is_zero() {
                    continue;
                }
                work.sub_row_multiple(row, col, factor);
                inverse.sub_row_multiple(row, col, factor);
            }
        }
        Ok(inverse)
    }

    /// Eigenvalues of a symmetric matrix in ascending order, by cyclic Jacobi rotations.
    pub fn symmetric_eigenvalues(&self) -> Vec<f64> {
        if !self.is_square() {
            panic!("not a square matrix");
        }
        let n = self.size().rows.get();
        let mut a = self.to_owned_buf();

        for _ in 0..MAX_JACOBI_SWEEPS {
            let mut off_diagonal = 0.;
            let mut total = 0.;
            for row in 0..n {
                for col in 0..n {
                    let value = a.cell(Index { row, col }).powi(2);
                    total += value;
                    if row != col {
                        off_diagonal += value;
                    }
                }
            }
            if off_diagonal <= f64::EPSILON.powi(2) * total {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let a_pq = a.cell(Index { row: p, col: q });
                    if a_pq.is_zero() {
                        continue;
                    }
                    let a_pp = a.cell(Index { row: p, col: p });
                    let a_qq = a.cell(Index { row: q, col: q });
                    let theta = (a_qq - a_pp) / (2. * a_pq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.).sqrt());
                    let c = 1. / (t * t + 1.).sqrt();
                    let s = t * c;
                    a.rotate(p, q, c, s);
                }
            }
        }

        let mut eigenvalues = (0..n)
            .map(|i| a.cell(Index { row: i, col: i }))
            .collect::<Vec<f64>>();
        eigenvalues.sort_by(f64::total_cmp);
        eigenvalues
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.size().cols.get() {
            let index_a = Index { row: a, col };
            let index_b = Index { row: b, col };
            let value_a = self.cell(index_a);
            let value_b = self.cell(index_b);
            self.set_cell(index_a, value_b);
            self.set_cell(index_b, value_a);
        }
    }
    fn scale_row(&mut self, row: usize, factor: f64) {
        for col in 0..self.size().cols.get() {
            let index = Index { row, col };
            let value = self.cell(index);
            self.set_cell(index, value * factor);
        }
    }
    /// `row -= factor * source`
    fn sub_row_multiple(&mut self, row: usize, source: usize, factor: f64) {
        for col in 0..self.size().cols.get() {
            let index = Index { row, col };
            let value = self.cell(index) - factor * self.cell(Index { row: source, col });
            self.set_cell(index, value);
        }
    }
    /// `A <- Jᵀ A J` for the Givens rotation `J` acting on rows/cols `p` and `q`.
    fn rotate(&mut self, p: usize, q: usize, c: f64, s: f64) {
        for k in 0..self.size().rows.get() {
            let a_kp = self.cell(Index { row: k, col: p });
            let a_kq = self.cell(Index { row: k, col: q });
            self.set_cell(Index { row: k, col: p }, c * a_kp - s * a_kq);
            self.set_cell(Index { row: k, col: q }, s * a_kp + c * a_kq);
        }
        for k in 0..self.size().cols.get() {
            let a_pk = self.cell(Index { row: p, col: k });
            let a_qk = self.cell(Index { row: q, col: k });
            self.set_cell(Index { row: p, col: k }, c * a_pk - s * a_qk);
            self.set_cell(Index { row: q, col: k }, s * a_pk + c * a_qk);
        }
    }
}

#[derive(Debug, Error, Clone, Copy)]
#[error("matrix is singular")]
pub struct SingularMatrixError;

pub trait Container2D {
    type Item;
    fn size(&self) -> Size;
    fn cell(&self, index: Index) -> Self::Item;

    fn is_square(&self) -> bool {
        self.size().rows == self.size().cols
    }
}
pub trait Container2DMut: Container2D {
    fn set_cell(&mut self, index: Index, value: Self::Item);
}
pub trait Matrix: Container2D
where
    Self::Item: Float,
{
    fn mul_matrix_size(&self, other: &impl Container2D<Item = Self::Item>) -> Size {
        Size {
            rows: self.size().rows,
            cols: other.size().cols,
        }
    }
    fn mul_matrix_in(
        &self,
        other: &impl Container2D<Item = Self::Item>,
        out: &mut impl Container2DMut<Item = Self::Item>,
    ) {
        assert_eq!(out.size(), self.mul_matrix_size(other));
        for row in 0..self.size().rows.get() {
            for col in 0..other.size().cols.get() {
                let index = Index { row, col };
                let mut sum = Zero::zero();

                for i in 0..self.size().cols.get() {
                    let a = Index { row, col: i };
                    let b = Index { row: i, col };
                    let a = self.cell(a);
                    let b = other.cell(b);
                    sum = sum + (a * b);
                }

                out.set_cell(index, sum);
            }
        }
    }

    fn transpose_size(&self) -> Size {
        Size {
            rows: self.size().cols,
            cols: self.size().rows,
        }
    }
    fn transpose_in(&self, out: &mut impl Container2DMut<Item = Self::Item>) {
        assert_eq!(out.size(), self.transpose_size());
        for row in 0..self.size().rows.get() {
            for col in 0..self.size().cols.get() {
                let value = self.cell(Index { row, col });
                let index = Index { row: col, col: row };
                out.set_cell(index, value);
            }
        }
    }
}
impl<T, F> Matrix for T
where
    T: Container2D<Item = F>,
    F: Float,
{
}
