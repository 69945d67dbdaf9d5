use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::elementwise::{ElementwiseExpression, ElementwiseOp};
use crate::lazy::expression::{MatrixExpression, VectorExpression};

/// Lazy product of a matrix expression with a vector or a matrix expression.
/// Element i (or (i, j)) is the inner product of row i with the right operand,
/// computed when it is read.
#[derive(Debug, Clone)]
pub struct ContainerExpression<A, B> {
    lhs: A,
    rhs: B,
}

impl<A, B> ContainerExpression<A, B> {
    /// A·x; `x` must have `A.ncols()` elements
    pub fn matrix_vector<T: Real>(a: A, x: B) -> Result<Self>
    where
        A: MatrixExpression<T>,
        B: VectorExpression<T>,
    {
        if a.ncols() != x.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy matrix-vector product",
                expected: (a.ncols(), 1),
                found: (x.len(), 1),
            });
        }
        Ok(ContainerExpression { lhs: a, rhs: x })
    }

    /// A·B; `B` must have `A.ncols()` rows
    pub fn matrix_matrix<T: Real>(a: A, b: B) -> Result<Self>
    where
        A: MatrixExpression<T>,
        B: MatrixExpression<T>,
    {
        if a.ncols() != b.nrows() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "lazy matrix product",
                expected: (a.ncols(), b.ncols()),
                found: b.shape(),
            });
        }
        Ok(ContainerExpression { lhs: a, rhs: b })
    }
}

impl<T: Real, A: MatrixExpression<T>, B: VectorExpression<T>> VectorExpression<T>
    for ContainerExpression<A, B>
{
    fn len(&self) -> usize {
        self.lhs.nrows()
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        (0..self.lhs.ncols())
            .map(|j| self.lhs.at(i, j) * self.rhs.at(j))
            .sum()
    }
}

impl<T: Real, A: MatrixExpression<T>, B: MatrixExpression<T>> MatrixExpression<T>
    for ContainerExpression<A, B>
{
    fn nrows(&self) -> usize {
        self.lhs.nrows()
    }
    fn ncols(&self) -> usize {
        self.rhs.ncols()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        (0..self.lhs.ncols())
            .map(|k| self.lhs.at(i, k) * self.rhs.at(k, j))
            .sum()
    }
}

/// Aᵗ without copying
#[derive(Debug, Clone)]
pub struct TransposeExpression<E> {
    inner: E,
}

impl<E> TransposeExpression<E> {
    pub(crate) fn new(inner: E) -> Self {
        TransposeExpression { inner }
    }
}

impl<T: Real, E: MatrixExpression<T>> MatrixExpression<T> for TransposeExpression<E> {
    fn nrows(&self) -> usize {
        self.inner.ncols()
    }
    fn ncols(&self) -> usize {
        self.inner.nrows()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        self.inner.at(j, i)
    }
}

/// Residual expression `b - A·x`, evaluated lazily. Its norms are computed without
/// allocating the residual vector, which is how the iterative solvers check convergence.
pub fn residual<'a, T: Real>(
    a: &'a Matrix<T>,
    x: &'a Vector<T>,
    b: &'a Vector<T>,
) -> Result<ElementwiseExpression<&'a Vector<T>, ContainerExpression<&'a Matrix<T>, &'a Vector<T>>>>
{
    if a.nrows() != b.len() {
        return Err(LinAlgError::DimensionMismatch {
            operation: "residual",
            expected: (a.nrows(), 1),
            found: (b.len(), 1),
        });
    }
    let ax = ContainerExpression::matrix_vector(a, x)?;
    b.elementwise(ax, ElementwiseOp::Sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::LazyMatrix;

    #[test]
    fn test_lazy_products_match_eager() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let x = Vector::new(vec![1.0, 0.0, -1.0]);
        let ax = (&a).times_vector(&x).unwrap();
        assert_eq!(ax.as_column_vector(), &a * &x);

        let at = (&a).transposed();
        assert_eq!(at.shape(), (3, 2));
        let ata = (&a).transposed().times_matrix(&a).unwrap();
        assert_eq!(ata.to_matrix(), &a.transpose() * &a);
        assert!((&a).times_matrix(&a).is_err());
    }

    #[test]
    fn test_residual() {
        let a = Matrix::from_rows(vec![vec![4.0, 1.0], vec![2.0, 3.0]]).unwrap();
        let x = Vector::new(vec![1.0, 2.0]);
        let b = Vector::new(vec![6.0, 9.0]);
        let r = residual(&a, &x, &b).unwrap();
        assert_eq!(r.as_column_vector().as_slice(), &[0.0, 1.0]);
        assert_eq!(r.norm_max(), 1.0);
        let short = Vector::new(vec![1.0]);
        assert!(residual(&a, &x, &short).is_err());
    }

    #[test]
    fn test_generated_matrix_product() {
        // 3x3 identity generated on demand, never stored
        let eye = LazyMatrix::from_fn(3, 3, |i, j| if i == j { 1.0 } else { 0.0 });
        let v = Vector::new(vec![7.0, 8.0, 9.0]);
        let y = eye.times_vector(&v).unwrap();
        assert_eq!(y.as_column_vector(), v);
    }
}
