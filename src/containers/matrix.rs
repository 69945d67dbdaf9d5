use crate::containers::numeric::Real;
use crate::containers::vector::{Orientation, Vector};
use crate::error::{LinAlgError, Result};
use approx::{AbsDiffEq, RelativeEq};
use itertools::Itertools;
use std::fmt;
use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Range, Sub};

/// Dense matrix stored row-major in one contiguous buffer.
/// Every row has exactly `cols` elements; the shape only changes through [`Matrix::resize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Real> Matrix<T> {
    /// matrix from a row-major buffer
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Matrix<T>> {
        if data.len() != rows * cols {
            return Err(LinAlgError::DimensionMismatch {
                operation: "matrix construction",
                expected: (rows, cols),
                found: (data.len(), 1),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    /// matrix from nested rows; all rows must have the same length
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Matrix<T>> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(LinAlgError::DimensionMismatch {
                    operation: "matrix construction from rows",
                    expected: (1, ncols),
                    found: (1, row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Matrix {
            data,
            rows: nrows,
            cols: ncols,
        })
    }

    /// matrix from a generator `f(i, j)`
    pub fn from_fn<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, mut f: F) -> Matrix<T> {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { data, rows, cols }
    }

    pub fn zeros(rows: usize, cols: usize) -> Matrix<T> {
        Matrix::from_elem(rows, cols, T::zero())
    }

    pub fn from_elem(rows: usize, cols: usize, value: T) -> Matrix<T> {
        Matrix {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    pub fn identity(n: usize) -> Matrix<T> {
        Matrix::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    pub fn from_diagonal(diag: &[T]) -> Matrix<T> {
        let n = diag.len();
        Matrix::from_fn(n, n, |i, j| if i == j { diag[i] } else { T::zero() })
    }

    /// permutation matrix P with P[i][perm[i]] = 1, so that (P·A) row i = A row perm[i]
    pub fn from_permutation(perm: &[usize]) -> Result<Matrix<T>> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &p in perm {
            if p >= n || seen[p] {
                return Err(LinAlgError::InvalidInput(format!(
                    "{:?} is not a permutation of 0..{}",
                    perm, n
                )));
            }
            seen[p] = true;
        }
        Ok(Matrix::from_fn(n, n, |i, j| {
            if perm[i] == j { T::one() } else { T::zero() }
        }))
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    fn check_index(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(LinAlgError::IndexOutOfRange {
                index: (i, j),
                bounds: self.shape(),
            });
        }
        Ok(())
    }

    /// bounds-checked element access
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.check_index(i, j)?;
        Ok(self.data[self.offset(i, j)])
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_index(i, j)?;
        let k = self.offset(i, j);
        self.data[k] = value;
        Ok(())
    }

    /// i-th row as a slice
    pub fn row(&self, i: usize) -> &[T] {
        let start = self.offset(i, 0);
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = self.offset(i, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    /// i-th row copied into a row vector
    pub fn row_vector(&self, i: usize) -> Result<Vector<T>> {
        self.check_index(i, 0)?;
        Ok(Vector::row(self.row(i).to_vec()))
    }

    /// j-th column copied into a column vector
    pub fn column(&self, j: usize) -> Result<Vector<T>> {
        self.check_index(0, j)?;
        Ok(Vector::from_fn(self.rows, |i| self[(i, j)]))
    }

    pub fn diagonal(&self) -> Vector<T> {
        Vector::from_fn(self.rows.min(self.cols), |i| self[(i, i)])
    }

    pub fn transpose(&self) -> Matrix<T> {
        Matrix::from_fn(self.cols, self.rows, |i, j| self[(j, i)])
    }

    /// Change the shape; elements in the overlapping top-left block are kept,
    /// new elements take `fill`.
    pub fn resize(&mut self, rows: usize, cols: usize, fill: T) {
        let resized = Matrix::from_fn(rows, cols, |i, j| {
            if i < self.rows && j < self.cols {
                self[(i, j)]
            } else {
                fill
            }
        });
        *self = resized;
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            let (ka, kb) = (self.offset(a, j), self.offset(b, j));
            self.data.swap(ka, kb);
        }
    }

    /// copy of the block `rows x cols`
    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix<T>> {
        if rows.end > self.rows || cols.end > self.cols || rows.start > rows.end || cols.start > cols.end
        {
            return Err(LinAlgError::IndexOutOfRange {
                index: (rows.end, cols.end),
                bounds: self.shape(),
            });
        }
        Ok(Matrix::from_fn(rows.len(), cols.len(), |i, j| {
            self[(rows.start + i, cols.start + j)]
        }))
    }

    /// write `block` with its top-left corner at (row, col)
    pub fn set_block(&mut self, row: usize, col: usize, block: &Matrix<T>) -> Result<()> {
        if row + block.rows > self.rows || col + block.cols > self.cols {
            return Err(LinAlgError::DimensionMismatch {
                operation: "block assignment",
                expected: (self.rows - row.min(self.rows), self.cols - col.min(self.cols)),
                found: block.shape(),
            });
        }
        for i in 0..block.rows {
            for j in 0..block.cols {
                self[(row + i, col + j)] = block[(i, j)];
            }
        }
        Ok(())
    }

    pub fn map<F: Fn(T) -> T>(&self, f: F) -> Matrix<T> {
        Matrix {
            data: self.data.iter().map(|&x| f(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn check_same_shape(&self, other: &Matrix<T>, operation: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(LinAlgError::DimensionMismatch {
                operation,
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    fn zip_with<F: Fn(T, T) -> T>(&self, other: &Matrix<T>, f: F) -> Matrix<T> {
        Matrix {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn try_add(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        self.check_same_shape(other, "matrix addition")?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    pub fn try_sub(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        self.check_same_shape(other, "matrix subtraction")?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    /// elementwise (Hadamard) product
    pub fn hadamard(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        self.check_same_shape(other, "elementwise product")?;
        Ok(self.zip_with(other, |a, b| a * b))
    }

    /// matrix product A·B
    pub fn try_matmul(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        if self.cols != other.rows {
            return Err(LinAlgError::DimensionMismatch {
                operation: "matrix product",
                expected: (self.cols, other.cols),
                found: other.shape(),
            });
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self[(i, k)];
                if a_ik == T::zero() {
                    continue;
                }
                for j in 0..other.cols {
                    out[(i, j)] += a_ik * other[(k, j)];
                }
            }
        }
        Ok(out)
    }

    /// A·x for a column vector x
    pub fn try_mul_vector(&self, x: &Vector<T>) -> Result<Vector<T>> {
        if x.orientation() != Orientation::Column || x.len() != self.cols {
            return Err(LinAlgError::DimensionMismatch {
                operation: "matrix-vector product",
                expected: (self.cols, 1),
                found: x.shape(),
            });
        }
        Ok(Vector::from_fn(self.rows, |i| self.row_dot(i, x.as_slice())))
    }

    /// xᵗ·A for a row vector x
    pub fn try_vector_mul(&self, x: &Vector<T>) -> Result<Vector<T>> {
        if x.orientation() != Orientation::Row || x.len() != self.rows {
            return Err(LinAlgError::DimensionMismatch {
                operation: "vector-matrix product",
                expected: (1, self.rows),
                found: x.shape(),
            });
        }
        let mut out = vec![T::zero(); self.cols];
        for i in 0..self.rows {
            let xi = x[i];
            for (o, &a) in out.iter_mut().zip(self.row(i)) {
                *o += xi * a;
            }
        }
        Ok(Vector::row(out))
    }

    /// Σ_j A_ij x_j for one row; used by the solvers' sweeps
    #[inline]
    pub fn row_dot(&self, i: usize, x: &[T]) -> T {
        self.row(i)
            .iter()
            .zip(x.iter())
            .map(|(&a, &b)| a * b)
            .sum()
    }

    pub fn frobenius_norm(&self) -> T {
        self.data.iter().map(|&x| x * x).sum::<T>().sqrt()
    }

    /// max |a_ij|
    pub fn max_abs(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| if x.abs() > acc { x.abs() } else { acc })
    }

    pub fn trace(&self) -> T {
        (0..self.rows.min(self.cols)).map(|i| self[(i, i)]).sum()
    }

    /// lower triangle (with diagonal) of the matrix, zeros above
    pub fn lower_triangle(&self) -> Matrix<T> {
        Matrix::from_fn(self.rows, self.cols, |i, j| {
            if j <= i { self[(i, j)] } else { T::zero() }
        })
    }

    /// upper triangle (with diagonal) of the matrix, zeros below
    pub fn upper_triangle(&self) -> Matrix<T> {
        Matrix::from_fn(self.rows, self.cols, |i, j| {
            if j >= i { self[(i, j)] } else { T::zero() }
        })
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;
    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.rows && j < self.cols, "matrix index out of bounds");
        &self.data[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(i < self.rows && j < self.cols, "matrix index out of bounds");
        &mut self.data[i * self.cols + j]
    }
}

//////////////////////////////////OPERATORS/////////////////////////////////
// Binary operators panic on shape mismatch; the try_* methods return a Result instead.

impl<T: Real> Add for &Matrix<T> {
    type Output = Matrix<T>;
    /// # Panics
    /// if the shapes differ
    fn add(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.try_add(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Sub for &Matrix<T> {
    type Output = Matrix<T>;
    /// # Panics
    /// if the shapes differ
    fn sub(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.try_sub(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Mul for &Matrix<T> {
    type Output = Matrix<T>;
    /// # Panics
    /// if `self.ncols() != rhs.nrows()`
    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.try_matmul(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Mul<&Vector<T>> for &Matrix<T> {
    type Output = Vector<T>;
    /// # Panics
    /// if `rhs` is not a column vector of length `self.ncols()`
    fn mul(self, rhs: &Vector<T>) -> Vector<T> {
        self.try_mul_vector(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Mul<&Matrix<T>> for &Vector<T> {
    type Output = Vector<T>;
    /// # Panics
    /// if `self` is not a row vector of length `rhs.nrows()`
    fn mul(self, rhs: &Matrix<T>) -> Vector<T> {
        rhs.try_vector_mul(self).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Neg for &Matrix<T> {
    type Output = Matrix<T>;
    fn neg(self) -> Matrix<T> {
        self.map(|x| -x)
    }
}

impl<T: Real> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: T) -> Matrix<T> {
        self.map(|x| x * rhs)
    }
}

impl<T: Real> Div<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn div(self, rhs: T) -> Matrix<T> {
        self.map(|x| x / rhs)
    }
}

impl<T: Real> Add<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn add(self, rhs: T) -> Matrix<T> {
        self.map(|x| x + rhs)
    }
}

impl<T: Real> Sub<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn sub(self, rhs: T) -> Matrix<T> {
        self.map(|x| x - rhs)
    }
}

impl<T: Real + AbsDiffEq<Epsilon = T>> AbsDiffEq for Matrix<T> {
    type Epsilon = T;
    fn default_epsilon() -> T {
        <T as AbsDiffEq>::default_epsilon()
    }
    fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<T: Real + RelativeEq<Epsilon = T>> RelativeEq for Matrix<T> {
    fn default_max_relative() -> T {
        <T as RelativeEq>::default_max_relative()
    }
    fn relative_eq(&self, other: &Self, epsilon: T, max_relative: T) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

impl<T: Real> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..self.rows {
            let row = self
                .row(i)
                .iter()
                .map(|x| format!("{:>12.6}", x))
                .join(" ");
            writeln!(f, "│ {} │", row)?;
        }
        Ok(())
    }
}
