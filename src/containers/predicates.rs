//! Pure structural checks used as preconditions by the factorization and solver layers.
use crate::containers::matrix::Matrix;
use crate::containers::numeric::Real;
use crate::containers::vector::Vector;

impl<T: Real> Matrix<T> {
    pub fn is_square_matrix(&self) -> bool {
        self.nrows() == self.ncols()
    }

    /// |a_ij - a_ji| <= tol for all i, j
    pub fn is_symmetric_matrix(&self, tol: T) -> bool {
        if !self.is_square_matrix() {
            return false;
        }
        let n = self.nrows();
        (0..n).all(|i| (i + 1..n).all(|j| (self[(i, j)] - self[(j, i)]).abs() <= tol))
    }

    /// weak row diagonal dominance: |a_ii| >= Σ_{j≠i} |a_ij| for every row
    pub fn is_diagonally_dominant(&self) -> bool {
        self.is_square_matrix()
            && (0..self.nrows()).all(|i| {
                let (diag, off) = self.row_abs_split(i);
                diag >= off
            })
    }

    /// strict row diagonal dominance: |a_ii| > Σ_{j≠i} |a_ij| for every row
    pub fn is_strictly_diagonally_dominant(&self) -> bool {
        self.is_square_matrix()
            && (0..self.nrows()).all(|i| {
                let (diag, off) = self.row_abs_split(i);
                diag > off
            })
    }

    fn row_abs_split(&self, i: usize) -> (T, T) {
        let diag = self[(i, i)].abs();
        let total: T = self.row(i).iter().map(|x| x.abs()).sum();
        (diag, total - diag)
    }

    /// zeros strictly above the diagonal
    pub fn is_lower_triangular_matrix(&self, tol: T) -> bool {
        self.is_square_matrix()
            && (0..self.nrows()).all(|i| (i + 1..self.ncols()).all(|j| self[(i, j)].abs() <= tol))
    }

    /// lower triangular with ones on the diagonal
    pub fn is_unit_lower_triangular_matrix(&self, tol: T) -> bool {
        self.is_lower_triangular_matrix(tol)
            && (0..self.nrows()).all(|i| (self[(i, i)] - T::one()).abs() <= tol)
    }

    /// zeros strictly below the diagonal
    pub fn is_upper_triangular_matrix(&self, tol: T) -> bool {
        self.is_square_matrix() && (0..self.nrows()).all(|i| (0..i).all(|j| self[(i, j)].abs() <= tol))
    }

    /// every element is exactly 0 or 1
    pub fn is_binary_matrix(&self) -> bool {
        self.as_slice()
            .iter()
            .all(|&x| x == T::zero() || x == T::one())
    }

    /// binary, square, exactly one 1 in each row and each column
    pub fn is_permutation_matrix(&self) -> bool {
        if !self.is_square_matrix() || !self.is_binary_matrix() {
            return false;
        }
        let n = self.nrows();
        let rows_ok = (0..n).all(|i| self.row(i).iter().filter(|&&x| x == T::one()).count() == 1);
        let cols_ok = (0..n).all(|j| (0..n).filter(|&i| self[(i, j)] == T::one()).count() == 1);
        rows_ok && cols_ok
    }

    pub fn is_zero_matrix(&self) -> bool {
        self.as_slice().iter().all(|&x| x == T::zero())
    }

    /// Symmetric and every pivot of an attempted Cholesky factorization is positive.
    /// No determinant is evaluated.
    pub fn is_positive_definite_matrix(&self) -> bool {
        let n = self.nrows();
        let tol = T::epsilon().sqrt() * (T::one() + self.max_abs());
        if !self.is_symmetric_matrix(tol) {
            return false;
        }
        let mut l = Matrix::<T>::zeros(n, n);
        for j in 0..n {
            let mut pivot = self[(j, j)];
            for k in 0..j {
                pivot -= l[(j, k)] * l[(j, k)];
            }
            if !(pivot > T::zero()) {
                return false;
            }
            let ljj = pivot.sqrt();
            l[(j, j)] = ljj;
            for i in j + 1..n {
                let mut s = self[(i, j)];
                for k in 0..j {
                    s -= l[(i, k)] * l[(j, k)];
                }
                l[(i, j)] = s / ljj;
            }
        }
        true
    }

    /// no zero element on the main diagonal
    pub fn has_nonzero_diagonal(&self) -> bool {
        self.diagonal().iter().all(|&d| d != T::zero())
    }
}

impl<T: Real> Vector<T> {
    pub fn is_binary_vector(&self) -> bool {
        self.iter().all(|&x| x == T::zero() || x == T::one())
    }

    pub fn is_zero_vector(&self) -> bool {
        self.iter().all(|&x| x == T::zero())
    }

    /// ‖x‖₂ = 1 within `tol`
    pub fn is_unit_vector(&self, tol: T) -> bool {
        (self.norm() - T::one()).abs() <= tol
    }
}
