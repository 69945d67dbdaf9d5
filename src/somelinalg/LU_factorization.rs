//! LU factorizations of dense square matrices: Doolittle (no pivoting), recursive block
//! variant with Schur-complement update, and LUP with partial (row) pivoting, plus the
//! forward/backward substitutions that finish a direct solve.
#![allow(non_snake_case)]
use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use log::{debug, warn};
use rayon::prelude::*;

/// Result of a factorization: `P·A = L·U`, where L is unit lower triangular, U is upper
/// triangular and P is the row permutation (identity for the unpivoted variants).
#[derive(Debug, Clone, PartialEq)]
pub struct LUFactorization<T> {
    pub l: Matrix<T>,
    pub u: Matrix<T>,
    /// row i of P·A is row `perm[i]` of A
    pub perm: Vec<usize>,
    /// number of row exchanges, gives the sign of the determinant
    pub swaps: usize,
}

impl<T: Real> LUFactorization<T> {
    pub fn dim(&self) -> usize {
        self.l.nrows()
    }

    /// permutation matrix P
    pub fn p(&self) -> Matrix<T> {
        let n = self.perm.len();
        Matrix::from_fn(n, n, |i, j| if self.perm[i] == j { T::one() } else { T::zero() })
    }

    /// true when some diagonal element of U is exactly zero
    pub fn is_singular(&self) -> bool {
        (0..self.dim()).any(|i| self.u[(i, i)] == T::zero())
    }

    /// P·b
    pub fn permute(&self, b: &Vector<T>) -> Result<Vector<T>> {
        if b.len() != self.perm.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "permutation of right-hand side",
                expected: (self.perm.len(), 1),
                found: b.shape(),
            });
        }
        Ok(Vector::from_fn(b.len(), |i| b[self.perm[i]]))
    }

    /// solve A·x = b: L·y = P·b, then U·x = y
    pub fn solve(&self, b: &Vector<T>) -> Result<Vector<T>> {
        let pb = self.permute(b)?;
        let y = forward_substitution(&self.l, &pb)?;
        backward_substitution(&self.u, &y)
    }

    /// L·U (equals P·A up to rounding)
    pub fn reconstruct(&self) -> Matrix<T> {
        &self.l * &self.u
    }

    pub fn determinant(&self) -> T {
        let det: T = (0..self.dim()).fold(T::one(), |acc, i| acc * self.u[(i, i)]);
        if self.swaps % 2 == 1 { -det } else { det }
    }

    /// A⁻¹ column by column: the n right-hand sides e_i are independent, so they are solved in parallel
    pub fn inverse(&self) -> Result<Matrix<T>> {
        let n = self.dim();
        if let Some(k) = (0..n).find(|&i| self.u[(i, i)] == T::zero()) {
            return Err(LinAlgError::SingularMatrix { pivot: k });
        }
        let columns: Vec<Vector<T>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let e_i = Vector::unit(n, i)?;
                self.solve(&e_i)
            })
            .collect::<Result<Vec<Vector<T>>>>()?;
        Ok(Matrix::from_fn(n, n, |i, j| columns[j][i]))
    }
}

fn check_square<T: Real>(A: &Matrix<T>, operation: &'static str) -> Result<usize> {
    if !A.is_square_matrix() {
        return Err(LinAlgError::DimensionMismatch {
            operation,
            expected: (A.nrows(), A.nrows()),
            found: A.shape(),
        });
    }
    Ok(A.nrows())
}

/// Doolittle factorization A = L·U, column by column: row k of U from the already reduced
/// part, then the multipliers L[i][k] = (A[i][k] - Σ L[i][s]·U[s][k]) / U[k][k].
/// Fails with `SingularMatrix` when a pivot U[k][k] is exactly zero.
pub fn lu_doolittle<T: Real>(A: &Matrix<T>) -> Result<LUFactorization<T>> {
    let n = check_square(A, "LU factorization")?;
    let mut L = Matrix::<T>::identity(n);
    let mut U = Matrix::<T>::zeros(n, n);
    for k in 0..n {
        for j in k..n {
            let mut s = A[(k, j)];
            for m in 0..k {
                s -= L[(k, m)] * U[(m, j)];
            }
            U[(k, j)] = s;
        }
        let pivot = U[(k, k)];
        if pivot == T::zero() {
            warn!("Doolittle LU: zero pivot in column {}", k);
            return Err(LinAlgError::SingularMatrix { pivot: k });
        }
        for i in k + 1..n {
            let mut s = A[(i, k)];
            for m in 0..k {
                s -= L[(i, m)] * U[(m, k)];
            }
            L[(i, k)] = s / pivot;
        }
    }
    debug!("Doolittle LU of {}x{} matrix done", n, n);
    Ok(LUFactorization {
        l: L,
        u: U,
        perm: (0..n).collect(),
        swaps: 0,
    })
}

/// Recursive block LU without pivoting. The matrix is split into
/// `[[A11, A12], [A21, A22]]`; A11 is factorized recursively, then
/// U12 = L11⁻¹·A12, L21 = A21·U11⁻¹, and the Schur complement S = A22 - L21·U12 is
/// factorized recursively. Blocks of size `<= block_size` fall back to Doolittle.
/// Same numerics as Doolittle, the blocking only improves locality on large matrices.
pub fn lu_recursive<T: Real>(A: &Matrix<T>, block_size: usize) -> Result<LUFactorization<T>> {
    let n = check_square(A, "recursive LU factorization")?;
    let block_size = block_size.max(1);
    let (L, U) = recursive_block(A, block_size, 0)?;
    Ok(LUFactorization {
        l: L,
        u: U,
        perm: (0..n).collect(),
        swaps: 0,
    })
}

fn shift_pivot(e: LinAlgError, offset: usize) -> LinAlgError {
    match e {
        LinAlgError::SingularMatrix { pivot } => LinAlgError::SingularMatrix {
            pivot: pivot + offset,
        },
        other => other,
    }
}

fn recursive_block<T: Real>(
    A: &Matrix<T>,
    block_size: usize,
    offset: usize,
) -> Result<(Matrix<T>, Matrix<T>)> {
    let n = A.nrows();
    if n <= block_size {
        let lu = lu_doolittle(A).map_err(|e| shift_pivot(e, offset))?;
        return Ok((lu.l, lu.u));
    }
    let h = n / 2;
    let A11 = A.submatrix(0..h, 0..h)?;
    let A12 = A.submatrix(0..h, h..n)?;
    let A21 = A.submatrix(h..n, 0..h)?;
    let A22 = A.submatrix(h..n, h..n)?;

    let (L11, U11) = recursive_block(&A11, block_size, offset)?;

    // U12 = L11^-1 A12, one forward substitution per column
    let mut U12 = Matrix::<T>::zeros(h, n - h);
    for j in 0..n - h {
        let col = forward_substitution(&L11, &A12.column(j)?)?;
        for i in 0..h {
            U12[(i, j)] = col[i];
        }
    }
    // L21 = A21 U11^-1, i.e. x·U11 = a for each row a of A21
    let mut L21 = Matrix::<T>::zeros(n - h, h);
    for r in 0..n - h {
        for j in 0..h {
            let mut s = A21[(r, j)];
            for m in 0..j {
                s -= L21[(r, m)] * U11[(m, j)];
            }
            let pivot = U11[(j, j)];
            if pivot == T::zero() {
                return Err(LinAlgError::SingularMatrix { pivot: offset + j });
            }
            L21[(r, j)] = s / pivot;
        }
    }
    let schur = A22.try_sub(&L21.try_matmul(&U12)?)?;
    let (L22, U22) = recursive_block(&schur, block_size, offset + h)?;

    let mut L = Matrix::<T>::zeros(n, n);
    let mut U = Matrix::<T>::zeros(n, n);
    L.set_block(0, 0, &L11)?;
    L.set_block(h, 0, &L21)?;
    L.set_block(h, h, &L22)?;
    U.set_block(0, 0, &U11)?;
    U.set_block(0, h, &U12)?;
    U.set_block(h, h, &U22)?;
    Ok((L, U))
}

/// LUP factorization with partial pivoting: at step k the row with the largest |a_ik|,
/// i >= k, is swapped into the pivot position before elimination.
/// A column without a nonzero candidate is skipped, leaving a zero on the diagonal of U;
/// the factorization then reports `is_singular()` and solves fail with `SingularMatrix`.
pub fn lup_factorize<T: Real>(A: &Matrix<T>) -> Result<LUFactorization<T>> {
    let n = check_square(A, "LUP factorization")?;
    let mut U = A.clone();
    let mut L = Matrix::<T>::zeros(n, n);
    let mut perm: Vec<usize> = (0..n).collect();
    let mut swaps = 0;
    for k in 0..n {
        // find the pivot row: maximum absolute value in column k from row k down
        let mut piv = k;
        let mut max = U[(k, k)].abs();
        for i in k + 1..n {
            let v = U[(i, k)].abs();
            if v > max {
                max = v;
                piv = i;
            }
        }
        if piv != k {
            U.swap_rows(k, piv);
            perm.swap(k, piv);
            // already computed multipliers travel with their rows
            for j in 0..k {
                let tmp = L[(k, j)];
                L[(k, j)] = L[(piv, j)];
                L[(piv, j)] = tmp;
            }
            swaps += 1;
        }
        L[(k, k)] = T::one();
        let diag = U[(k, k)];
        if diag == T::zero() {
            // no nonzero entries in this column
            debug!("LUP: column {} has no nonzero pivot candidate", k);
            continue;
        }
        for i in k + 1..n {
            let factor = U[(i, k)] / diag;
            L[(i, k)] = factor;
            U[(i, k)] = T::zero();
            for j in k + 1..n {
                let ukj = U[(k, j)];
                U[(i, j)] -= factor * ukj;
            }
        }
    }
    Ok(LUFactorization {
        l: L,
        u: U,
        perm,
        swaps,
    })
}

/// `factorize(A) -> (L, U, P)`: the pivoted factorization, usable for any square matrix.
pub fn factorize<T: Real>(A: &Matrix<T>) -> Result<LUFactorization<T>> {
    lup_factorize(A)
}

/// Solve L·y = b for lower triangular L in O(n²). A zero diagonal element is `SingularMatrix`.
pub fn forward_substitution<T: Real>(L: &Matrix<T>, b: &Vector<T>) -> Result<Vector<T>> {
    let n = check_square(L, "forward substitution")?;
    if b.len() != n {
        return Err(LinAlgError::DimensionMismatch {
            operation: "forward substitution",
            expected: (n, 1),
            found: b.shape(),
        });
    }
    let mut y = Vector::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for j in 0..i {
            s -= L[(i, j)] * y[j];
        }
        let d = L[(i, i)];
        if d == T::zero() {
            return Err(LinAlgError::SingularMatrix { pivot: i });
        }
        y[i] = s / d;
    }
    Ok(y)
}

/// Solve U·x = y for upper triangular U in O(n²). A zero diagonal element is `SingularMatrix`.
pub fn backward_substitution<T: Real>(U: &Matrix<T>, y: &Vector<T>) -> Result<Vector<T>> {
    let n = check_square(U, "backward substitution")?;
    if y.len() != n {
        return Err(LinAlgError::DimensionMismatch {
            operation: "backward substitution",
            expected: (n, 1),
            found: y.shape(),
        });
    }
    let mut x = Vector::zeros(n);
    for i in (0..n).rev() {
        let mut s = y[i];
        for j in i + 1..n {
            s -= U[(i, j)] * x[j];
        }
        let d = U[(i, i)];
        if d == T::zero() {
            return Err(LinAlgError::SingularMatrix { pivot: i });
        }
        x[i] = s / d;
    }
    Ok(x)
}
