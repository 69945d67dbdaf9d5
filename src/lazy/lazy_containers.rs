use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::expression::{MatrixExpression, VectorExpression};
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

enum MatrixSource<'a, T> {
    Borrowed(&'a Matrix<T>),
    Generated(Box<dyn Fn(usize, usize) -> T + Send + Sync + 'a>),
    Copied(Matrix<T>),
}

/// Read-only lazy matrix: either a view of an existing container or a generator
/// `f(i, j)`. It owns data only when built with [`LazyMatrix::copied_from`].
/// A `LazyMatrix` cannot be the target of `+=`/`-=`/`*=`/`/=`:
///
/// ```compile_fail
/// use RustedLinSolve::containers::Matrix;
/// use RustedLinSolve::lazy::LazyMatrix;
/// let a = Matrix::<f64>::identity(2);
/// let b = Matrix::<f64>::identity(2);
/// let mut view = LazyMatrix::from_matrix(&a);
/// view += &b;
/// ```
pub struct LazyMatrix<'a, T> {
    rows: usize,
    cols: usize,
    source: MatrixSource<'a, T>,
}

impl<'a, T: Real> LazyMatrix<'a, T> {
    pub fn from_matrix(matrix: &'a Matrix<T>) -> LazyMatrix<'a, T> {
        LazyMatrix {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            source: MatrixSource::Borrowed(matrix),
        }
    }

    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> LazyMatrix<'a, T>
    where
        F: Fn(usize, usize) -> T + Send + Sync + 'a,
    {
        LazyMatrix {
            rows,
            cols,
            source: MatrixSource::Generated(Box::new(f)),
        }
    }

    /// explicit copy of a container; the only constructor that owns storage
    pub fn copied_from(matrix: &Matrix<T>) -> LazyMatrix<'a, T> {
        LazyMatrix {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            source: MatrixSource::Copied(matrix.clone()),
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self.source, MatrixSource::Generated(_))
    }
}

impl<T: Real> MatrixExpression<T> for LazyMatrix<'_, T> {
    fn nrows(&self) -> usize {
        self.rows
    }
    fn ncols(&self) -> usize {
        self.cols
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        match &self.source {
            MatrixSource::Borrowed(m) => m[(i, j)],
            MatrixSource::Generated(f) => f(i, j),
            MatrixSource::Copied(m) => m[(i, j)],
        }
    }
}

enum VectorSource<'a, T> {
    Borrowed(&'a Vector<T>),
    Generated(Box<dyn Fn(usize) -> T + Send + Sync + 'a>),
    Copied(Vector<T>),
}

/// Read-only lazy vector: a view of an existing vector or a generator `f(i)`.
pub struct LazyVector<'a, T> {
    len: usize,
    source: VectorSource<'a, T>,
}

impl<'a, T: Real> LazyVector<'a, T> {
    pub fn from_vector(vector: &'a Vector<T>) -> LazyVector<'a, T> {
        LazyVector {
            len: vector.len(),
            source: VectorSource::Borrowed(vector),
        }
    }

    pub fn from_fn<F>(len: usize, f: F) -> LazyVector<'a, T>
    where
        F: Fn(usize) -> T + Send + Sync + 'a,
    {
        LazyVector {
            len,
            source: VectorSource::Generated(Box::new(f)),
        }
    }

    pub fn copied_from(vector: &Vector<T>) -> LazyVector<'a, T> {
        LazyVector {
            len: vector.len(),
            source: VectorSource::Copied(vector.clone()),
        }
    }
}

impl<T: Real> VectorExpression<T> for LazyVector<'_, T> {
    fn len(&self) -> usize {
        self.len
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        match &self.source {
            VectorSource::Borrowed(v) => v[i],
            VectorSource::Generated(f) => f(i),
            VectorSource::Copied(v) => v[i],
        }
    }
}

/// Mutable proxy over a concrete matrix: compound assignment with any matrix
/// expression updates the backing store in place, element by element.
///
/// `+=` and `-=` panic on shape mismatch; `try_add_assign` / `try_sub_assign` return a `Result`.
pub struct LazyMatrixMut<'a, T> {
    target: &'a mut Matrix<T>,
}

impl<'a, T: Real> LazyMatrixMut<'a, T> {
    pub fn new(target: &'a mut Matrix<T>) -> LazyMatrixMut<'a, T> {
        LazyMatrixMut { target }
    }

    fn update_with<E: MatrixExpression<T>, F: Fn(T, T) -> T>(&mut self, rhs: &E, f: F) -> Result<()> {
        if rhs.shape() != self.target.shape() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy compound assignment",
                expected: self.target.shape(),
                found: rhs.shape(),
            });
        }
        for i in 0..self.target.nrows() {
            for j in 0..self.target.ncols() {
                let v = self.target[(i, j)];
                self.target[(i, j)] = f(v, rhs.at(i, j));
            }
        }
        Ok(())
    }

    pub fn try_add_assign<E: MatrixExpression<T>>(&mut self, rhs: E) -> Result<()> {
        self.update_with(&rhs, |a, b| a + b)
    }

    pub fn try_sub_assign<E: MatrixExpression<T>>(&mut self, rhs: E) -> Result<()> {
        self.update_with(&rhs, |a, b| a - b)
    }

    /// assign the expression into the backing store
    pub fn assign<E: MatrixExpression<T>>(&mut self, rhs: E) -> Result<()> {
        rhs.evaluate_into(&mut *self.target)
    }
}

impl<T: Real> MatrixExpression<T> for LazyMatrixMut<'_, T> {
    fn nrows(&self) -> usize {
        self.target.nrows()
    }
    fn ncols(&self) -> usize {
        self.target.ncols()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        self.target[(i, j)]
    }
}

impl<T: Real, E: MatrixExpression<T>> AddAssign<E> for LazyMatrixMut<'_, T> {
    fn add_assign(&mut self, rhs: E) {
        self.try_add_assign(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real, E: MatrixExpression<T>> SubAssign<E> for LazyMatrixMut<'_, T> {
    fn sub_assign(&mut self, rhs: E) {
        self.try_sub_assign(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> MulAssign<T> for LazyMatrixMut<'_, T> {
    fn mul_assign(&mut self, rhs: T) {
        self.target.as_mut_slice().iter_mut().for_each(|x| *x *= rhs);
    }
}

impl<T: Real> DivAssign<T> for LazyMatrixMut<'_, T> {
    fn div_assign(&mut self, rhs: T) {
        self.target.as_mut_slice().iter_mut().for_each(|x| *x /= rhs);
    }
}

/// Mutable proxy over a concrete vector, the vector counterpart of [`LazyMatrixMut`].
pub struct LazyVectorMut<'a, T> {
    target: &'a mut Vector<T>,
}

impl<'a, T: Real> LazyVectorMut<'a, T> {
    pub fn new(target: &'a mut Vector<T>) -> LazyVectorMut<'a, T> {
        LazyVectorMut { target }
    }

    fn update_with<E: VectorExpression<T>, F: Fn(T, T) -> T>(&mut self, rhs: &E, f: F) -> Result<()> {
        if rhs.len() != self.target.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy compound assignment",
                expected: self.target.shape(),
                found: (rhs.len(), 1),
            });
        }
        for i in 0..self.target.len() {
            let v = self.target[i];
            self.target[i] = f(v, rhs.at(i));
        }
        Ok(())
    }

    pub fn try_add_assign<E: VectorExpression<T>>(&mut self, rhs: E) -> Result<()> {
        self.update_with(&rhs, |a, b| a + b)
    }

    pub fn try_sub_assign<E: VectorExpression<T>>(&mut self, rhs: E) -> Result<()> {
        self.update_with(&rhs, |a, b| a - b)
    }

    pub fn assign<E: VectorExpression<T>>(&mut self, rhs: E) -> Result<()> {
        rhs.evaluate_into(&mut *self.target)
    }
}

impl<T: Real> VectorExpression<T> for LazyVectorMut<'_, T> {
    fn len(&self) -> usize {
        self.target.len()
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        self.target[i]
    }
}

impl<T: Real, E: VectorExpression<T>> AddAssign<E> for LazyVectorMut<'_, T> {
    fn add_assign(&mut self, rhs: E) {
        self.try_add_assign(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real, E: VectorExpression<T>> SubAssign<E> for LazyVectorMut<'_, T> {
    fn sub_assign(&mut self, rhs: E) {
        self.try_sub_assign(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> MulAssign<T> for LazyVectorMut<'_, T> {
    fn mul_assign(&mut self, rhs: T) {
        self.target.as_mut_slice().iter_mut().for_each(|x| *x *= rhs);
    }
}

impl<T: Real> DivAssign<T> for LazyVectorMut<'_, T> {
    fn div_assign(&mut self, rhs: T) {
        self.target.as_mut_slice().iter_mut().for_each(|x| *x /= rhs);
    }
}
