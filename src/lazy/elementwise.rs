use crate::containers::Real;
use crate::lazy::expression::{MatrixExpression, VectorExpression};

/// binary elementwise operation of an [`ElementwiseExpression`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementwiseOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ElementwiseOp {
    #[inline]
    pub fn apply<T: Real>(&self, a: T, b: T) -> T {
        match self {
            ElementwiseOp::Add => a + b,
            ElementwiseOp::Sub => a - b,
            ElementwiseOp::Mul => a * b,
            ElementwiseOp::Div => a / b,
        }
    }
}

/// `lhs op rhs` evaluated element by element. Operand shapes are checked when the
/// node is built through `MatrixExpression::elementwise` / `VectorExpression::elementwise`.
#[derive(Debug, Clone)]
pub struct ElementwiseExpression<L, R> {
    lhs: L,
    rhs: R,
    op: ElementwiseOp,
}

impl<L, R> ElementwiseExpression<L, R> {
    pub(crate) fn new(lhs: L, rhs: R, op: ElementwiseOp) -> Self {
        ElementwiseExpression { lhs, rhs, op }
    }

    pub fn op(&self) -> ElementwiseOp {
        self.op
    }
}

impl<T: Real, L: MatrixExpression<T>, R: MatrixExpression<T>> MatrixExpression<T>
    for ElementwiseExpression<L, R>
{
    fn nrows(&self) -> usize {
        self.lhs.nrows()
    }
    fn ncols(&self) -> usize {
        self.lhs.ncols()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        self.op.apply(self.lhs.at(i, j), self.rhs.at(i, j))
    }
}

impl<T: Real, L: VectorExpression<T>, R: VectorExpression<T>> VectorExpression<T>
    for ElementwiseExpression<L, R>
{
    fn len(&self) -> usize {
        self.lhs.len()
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        self.op.apply(self.lhs.at(i), self.rhs.at(i))
    }
}

/// `f(e)` applied to every element of the inner expression, e.g. scaling by a constant.
#[derive(Clone)]
pub struct MapExpression<E, F> {
    inner: E,
    f: F,
}

impl<E, F> MapExpression<E, F> {
    pub(crate) fn new(inner: E, f: F) -> Self {
        MapExpression { inner, f }
    }
}

impl<T: Real, E: MatrixExpression<T>, F: Fn(T) -> T> MatrixExpression<T> for MapExpression<E, F> {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
    #[inline]
    fn at(&self, i: usize, j: usize) -> T {
        (self.f)(self.inner.at(i, j))
    }
}

impl<T: Real, E: VectorExpression<T>, F: Fn(T) -> T> VectorExpression<T> for MapExpression<E, F> {
    fn len(&self) -> usize {
        self.inner.len()
    }
    #[inline]
    fn at(&self, i: usize) -> T {
        (self.f)(self.inner.at(i))
    }
}
