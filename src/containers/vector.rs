use crate::containers::numeric::Real;
use crate::error::{LinAlgError, Result};
use approx::{AbsDiffEq, RelativeEq};
use itertools::Itertools;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

/// Orientation tag used to check matrix-vector products:
/// `A * x` needs a column vector, `x * A` needs a row vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Row,
    #[default]
    Column,
}

/// Dense vector of fixed length. Created once, the length never changes;
/// only the elements and the orientation tag can be modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    data: Vec<T>,
    orientation: Orientation,
}

impl<T: Real> Vector<T> {
    /// column vector from a `Vec`
    pub fn new(data: Vec<T>) -> Vector<T> {
        Vector {
            data,
            orientation: Orientation::Column,
        }
    }

    pub fn row(data: Vec<T>) -> Vector<T> {
        Vector {
            data,
            orientation: Orientation::Row,
        }
    }

    pub fn from_slice(data: &[T]) -> Vector<T> {
        Vector::new(data.to_vec())
    }

    pub fn zeros(n: usize) -> Vector<T> {
        Vector::new(vec![T::zero(); n])
    }

    pub fn from_elem(n: usize, value: T) -> Vector<T> {
        Vector::new(vec![value; n])
    }

    /// build a column vector from a generator `f(i)`
    pub fn from_fn<F: FnMut(usize) -> T>(n: usize, f: F) -> Vector<T> {
        Vector::new((0..n).map(f).collect())
    }

    /// i-th canonical basis vector e_i
    pub fn unit(n: usize, i: usize) -> Result<Vector<T>> {
        if i >= n {
            return Err(LinAlgError::IndexOutOfRange {
                index: (i, 0),
                bounds: (n, 1),
            });
        }
        let mut v = Vector::zeros(n);
        v.data[i] = T::one();
        Ok(v)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_row(&self) -> bool {
        self.orientation == Orientation::Row
    }

    pub fn is_column(&self) -> bool {
        self.orientation == Orientation::Column
    }

    /// shape as a matrix: (1, n) for a row vector, (n, 1) for a column vector
    pub fn shape(&self) -> (usize, usize) {
        match self.orientation {
            Orientation::Row => (1, self.len()),
            Orientation::Column => (self.len(), 1),
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Vector<T> {
        self.orientation = orientation;
        self
    }

    /// same data with the orientation flipped
    pub fn transpose(&self) -> Vector<T> {
        let orientation = match self.orientation {
            Orientation::Row => Orientation::Column,
            Orientation::Column => Orientation::Row,
        };
        Vector {
            data: self.data.clone(),
            orientation,
        }
    }

    /// bounds-checked element access
    pub fn get(&self, i: usize) -> Result<T> {
        self.data.get(i).copied().ok_or(LinAlgError::IndexOutOfRange {
            index: (i, 0),
            bounds: (self.len(), 1),
        })
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        let n = self.len();
        match self.data.get_mut(i) {
            Some(x) => {
                *x = value;
                Ok(())
            }
            None => Err(LinAlgError::IndexOutOfRange {
                index: (i, 0),
                bounds: (n, 1),
            }),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    pub fn map<F: Fn(T) -> T>(&self, f: F) -> Vector<T> {
        Vector {
            data: self.data.iter().map(|&x| f(x)).collect(),
            orientation: self.orientation,
        }
    }

    fn check_same_len(&self, other: &Vector<T>, operation: &'static str) -> Result<()> {
        if self.len() != other.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation,
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    /// inner product, orientation is ignored
    pub fn dot(&self, other: &Vector<T>) -> Result<T> {
        self.check_same_len(other, "dot product")?;
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| a * b)
            .sum())
    }

    /// Euclidean norm
    pub fn norm(&self) -> T {
        self.data.iter().map(|&x| x * x).sum::<T>().sqrt()
    }

    /// max_i |x_i|
    pub fn norm_max(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| if x.abs() > acc { x.abs() } else { acc })
    }

    pub fn norm_l1(&self) -> T {
        self.data.iter().map(|x| x.abs()).sum()
    }

    /// `x / ‖x‖₂`; fails for the zero vector
    pub fn normalize(&self) -> Result<Vector<T>> {
        let norm = self.norm();
        if norm == T::zero() || !norm.is_finite() {
            return Err(LinAlgError::InvalidInput(
                "cannot normalize a zero or non-finite vector".to_string(),
            ));
        }
        Ok(self.map(|x| x / norm))
    }

    pub fn try_add(&self, other: &Vector<T>) -> Result<Vector<T>> {
        self.check_same_len(other, "vector addition")?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    pub fn try_sub(&self, other: &Vector<T>) -> Result<Vector<T>> {
        self.check_same_len(other, "vector subtraction")?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    /// elementwise product
    pub fn hadamard(&self, other: &Vector<T>) -> Result<Vector<T>> {
        self.check_same_len(other, "elementwise product")?;
        Ok(self.zip_with(other, |a, b| a * b))
    }

    /// self += alpha * x
    pub fn axpy(&mut self, alpha: T, x: &Vector<T>) -> Result<()> {
        self.check_same_len(x, "axpy")?;
        for (yi, &xi) in self.data.iter_mut().zip(x.data.iter()) {
            *yi += alpha * xi;
        }
        Ok(())
    }

    fn zip_with<F: Fn(T, T) -> T>(&self, other: &Vector<T>, f: F) -> Vector<T> {
        Vector {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            orientation: self.orientation,
        }
    }
}

impl<T: Real> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Vector::new(data)
    }
}

impl<T: Real> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vector::new(iter.into_iter().collect())
    }
}

impl<T> Index<usize> for Vector<T> {
    type Output = T;
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for Vector<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

//////////////////////////////////OPERATORS/////////////////////////////////
// Binary operators panic on length mismatch; use the try_* methods to get a Result.

impl<T: Real> Add for &Vector<T> {
    type Output = Vector<T>;
    /// # Panics
    /// if the lengths differ
    fn add(self, rhs: &Vector<T>) -> Vector<T> {
        self.try_add(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Sub for &Vector<T> {
    type Output = Vector<T>;
    /// # Panics
    /// if the lengths differ
    fn sub(self, rhs: &Vector<T>) -> Vector<T> {
        self.try_sub(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> Neg for &Vector<T> {
    type Output = Vector<T>;
    fn neg(self) -> Vector<T> {
        self.map(|x| -x)
    }
}

impl<T: Real> Mul<T> for &Vector<T> {
    type Output = Vector<T>;
    fn mul(self, rhs: T) -> Vector<T> {
        self.map(|x| x * rhs)
    }
}

impl<T: Real> Div<T> for &Vector<T> {
    type Output = Vector<T>;
    fn div(self, rhs: T) -> Vector<T> {
        self.map(|x| x / rhs)
    }
}

impl<T: Real> Add<T> for &Vector<T> {
    type Output = Vector<T>;
    fn add(self, rhs: T) -> Vector<T> {
        self.map(|x| x + rhs)
    }
}

impl<T: Real> Sub<T> for &Vector<T> {
    type Output = Vector<T>;
    fn sub(self, rhs: T) -> Vector<T> {
        self.map(|x| x - rhs)
    }
}

impl<T: Real> AddAssign<&Vector<T>> for Vector<T> {
    /// # Panics
    /// if the lengths differ
    fn add_assign(&mut self, rhs: &Vector<T>) {
        self.axpy(T::one(), rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> SubAssign<&Vector<T>> for Vector<T> {
    /// # Panics
    /// if the lengths differ
    fn sub_assign(&mut self, rhs: &Vector<T>) {
        self.axpy(-T::one(), rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Real> MulAssign<T> for Vector<T> {
    fn mul_assign(&mut self, rhs: T) {
        self.data.iter_mut().for_each(|x| *x *= rhs);
    }
}

/// Tolerance-based comparison of the elements; the orientation tag is not compared.
impl<T: Real + AbsDiffEq<Epsilon = T>> AbsDiffEq for Vector<T> {
    type Epsilon = T;
    fn default_epsilon() -> T {
        <T as AbsDiffEq>::default_epsilon()
    }
    fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.len() == other.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl<T: Real + RelativeEq<Epsilon = T>> RelativeEq for Vector<T> {
    fn default_max_relative() -> T {
        <T as RelativeEq>::default_max_relative()
    }
    fn relative_eq(&self, other: &Self, epsilon: T, max_relative: T) -> bool {
        self.len() == other.len()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}

impl<T: Real> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let body = self
            .data
            .iter()
            .map(|x| format!("{:.6}", x))
            .join(", ");
        match self.orientation {
            Orientation::Row => write!(f, "[{}]", body),
            Orientation::Column => write!(f, "[{}]ᵗ", body),
        }
    }
}
