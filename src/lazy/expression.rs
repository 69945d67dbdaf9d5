use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::container::{ContainerExpression, TransposeExpression};
use crate::lazy::elementwise::{ElementwiseExpression, ElementwiseOp, MapExpression};

/// A matrix-shaped expression whose element (i, j) is computed on request.
pub trait MatrixExpression<T: Real> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    /// element (i, j); callers keep indices inside `shape()`
    fn at(&self, i: usize, j: usize) -> T;

    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// bounds-checked element access
    fn get(&self, i: usize, j: usize) -> Result<T> {
        if i >= self.nrows() || j >= self.ncols() {
            return Err(LinAlgError::IndexOutOfRange {
                index: (i, j),
                bounds: self.shape(),
            });
        }
        Ok(self.at(i, j))
    }

    /// write every element into an existing container of the same shape
    fn evaluate_into(&self, target: &mut Matrix<T>) -> Result<()> {
        if target.shape() != self.shape() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy matrix assignment",
                expected: self.shape(),
                found: target.shape(),
            });
        }
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                target[(i, j)] = self.at(i, j);
            }
        }
        Ok(())
    }

    fn to_matrix(&self) -> Matrix<T> {
        Matrix::from_fn(self.nrows(), self.ncols(), |i, j| self.at(i, j))
    }

    fn elementwise<R>(self, rhs: R, op: ElementwiseOp) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
        R: MatrixExpression<T>,
    {
        if self.shape() != rhs.shape() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy elementwise matrix operation",
                expected: self.shape(),
                found: rhs.shape(),
            });
        }
        Ok(ElementwiseExpression::new(self, rhs, op))
    }

    fn plus<R: MatrixExpression<T>>(self, rhs: R) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
    {
        self.elementwise(rhs, ElementwiseOp::Add)
    }

    fn minus<R: MatrixExpression<T>>(self, rhs: R) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
    {
        self.elementwise(rhs, ElementwiseOp::Sub)
    }

    /// apply `f` to every element lazily
    fn map_elements<F: Fn(T) -> T>(self, f: F) -> MapExpression<Self, F>
    where
        Self: Sized,
    {
        MapExpression::new(self, f)
    }

    fn transposed(self) -> TransposeExpression<Self>
    where
        Self: Sized,
    {
        TransposeExpression::new(self)
    }

    /// lazy product with a column vector expression
    fn times_vector<V: VectorExpression<T>>(self, x: V) -> Result<ContainerExpression<Self, V>>
    where
        Self: Sized,
    {
        ContainerExpression::matrix_vector(self, x)
    }

    /// lazy matrix product
    fn times_matrix<M: MatrixExpression<T>>(self, b: M) -> Result<ContainerExpression<Self, M>>
    where
        Self: Sized,
    {
        ContainerExpression::matrix_matrix(self, b)
    }
}

/// A vector-shaped expression whose element i is computed on request.
pub trait VectorExpression<T: Real> {
    fn len(&self) -> usize;
    /// element i; callers keep the index below `len()`
    fn at(&self, i: usize) -> T;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, i: usize) -> Result<T> {
        if i >= self.len() {
            return Err(LinAlgError::IndexOutOfRange {
                index: (i, 0),
                bounds: (self.len(), 1),
            });
        }
        Ok(self.at(i))
    }

    fn evaluate_into(&self, target: &mut Vector<T>) -> Result<()> {
        if target.len() != self.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy vector assignment",
                expected: (self.len(), 1),
                found: target.shape(),
            });
        }
        for i in 0..self.len() {
            target[i] = self.at(i);
        }
        Ok(())
    }

    fn as_column_vector(&self) -> Vector<T> {
        Vector::from_fn(self.len(), |i| self.at(i))
    }

    fn as_row_vector(&self) -> Vector<T> {
        Vector::row((0..self.len()).map(|i| self.at(i)).collect())
    }

    /// ‖e‖₂ computed in one pass over the elements
    fn norm_l2(&self) -> T {
        (0..self.len())
            .map(|i| {
                let v = self.at(i);
                v * v
            })
            .sum::<T>()
            .sqrt()
    }

    /// max_i |e_i|
    fn norm_max(&self) -> T {
        (0..self.len()).fold(T::zero(), |acc, i| {
            let v = self.at(i).abs();
            if v > acc { v } else { acc }
        })
    }

    fn dot_with<R: VectorExpression<T>>(&self, other: &R) -> Result<T> {
        if self.len() != other.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy dot product",
                expected: (self.len(), 1),
                found: (other.len(), 1),
            });
        }
        Ok((0..self.len()).map(|i| self.at(i) * other.at(i)).sum())
    }

    fn elementwise<R>(self, rhs: R, op: ElementwiseOp) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
        R: VectorExpression<T>,
    {
        if self.len() != rhs.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy elementwise vector operation",
                expected: (self.len(), 1),
                found: (rhs.len(), 1),
            });
        }
        Ok(ElementwiseExpression::new(self, rhs, op))
    }

    fn plus<R: VectorExpression<T>>(self, rhs: R) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
    {
        self.elementwise(rhs, ElementwiseOp::Add)
    }

    fn minus<R: VectorExpression<T>>(self, rhs: R) -> Result<ElementwiseExpression<Self, R>>
    where
        Self: Sized,
    {
        self.elementwise(rhs, ElementwiseOp::Sub)
    }

    fn map_elements<F: Fn(T) -> T>(self, f: F) -> MapExpression<Self, F>
    where
        Self: Sized,
    {
        MapExpression::new(self, f)
    }
}

impl<T: Real> MatrixExpression<T> for Matrix<T> {
    fn nrows(&self) -> usize {
        Matrix::nrows(self)
    }
    fn ncols(&self) -> usize {
        Matrix::ncols(self)
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        self[(i, j)]
    }
}

impl<T: Real> VectorExpression<T> for Vector<T> {
    fn len(&self) -> usize {
        Vector::len(self)
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        self[i]
    }
}

impl<T: Real, E: MatrixExpression<T> + ?Sized> MatrixExpression<T> for &E {
    fn nrows(&self) -> usize {
        (**self).nrows()
    }
    fn ncols(&self) -> usize {
        (**self).ncols()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        (**self).at(i, j)
    }
}

impl<T: Real, E: VectorExpression<T> + ?Sized> VectorExpression<T> for &E {
    fn len(&self) -> usize {
        (**self).len()
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        (**self).at(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containers_are_expressions() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(MatrixExpression::get(&a, 1, 1).unwrap(), 4.0);
        assert!(MatrixExpression::get(&a, 2, 0).is_err());
        let v = Vector::new(vec![3.0, 4.0]);
        assert_eq!(VectorExpression::norm_l2(&v), 5.0);
        assert_eq!((&v).as_row_vector().shape(), (1, 2));
    }

    #[test]
    fn test_evaluate_into_checks_shape() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let mut wrong = Matrix::<f64>::zeros(3, 2);
        assert!((&a).evaluate_into(&mut wrong).is_err());
        let mut right = Matrix::<f64>::zeros(2, 2);
        (&a).plus(&a).unwrap().evaluate_into(&mut right).unwrap();
        assert_eq!(right.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
    }
}
