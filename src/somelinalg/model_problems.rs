use crate::containers::{Matrix, Real};
use itertools::iproduct;

/// famous example of ill-conditioned matrix, H_ij = 1 / (i + j + 1) (0-based)
pub fn hilbert_matrix<T: Real>(n: usize) -> Matrix<T> {
    Matrix::from_fn(n, n, |i, j| T::one() / T::from_usize_lossy(i + j + 1))
}

/// constant-coefficient tridiagonal matrix
pub fn tridiagonal<T: Real>(n: usize, lower: T, diag: T, upper: T) -> Matrix<T> {
    Matrix::from_fn(n, n, |i, j| {
        if i == j {
            diag
        } else if i == j + 1 {
            lower
        } else if j == i + 1 {
            upper
        } else {
            T::zero()
        }
    })
}

/// 1D Poisson problem on n interior points: tridiag(-1, 2, -1), SPD
pub fn poisson_1d<T: Real>(n: usize) -> Matrix<T> {
    tridiagonal(n, -T::one(), T::cast(2.0), -T::one())
}

/// 2D Poisson problem, five-point stencil on an nx × ny interior grid (lexicographic order,
/// x fastest): 4 on the diagonal, -1 for each grid neighbour. SPD, size nx·ny.
pub fn poisson_2d<T: Real>(nx: usize, ny: usize) -> Matrix<T> {
    let n = nx * ny;
    let mut a = Matrix::zeros(n, n);
    for (gy, gx) in iproduct!(0..ny, 0..nx) {
        let k = gy * nx + gx;
        a[(k, k)] = T::cast(4.0);
        if gx > 0 {
            a[(k, k - 1)] = -T::one();
        }
        if gx + 1 < nx {
            a[(k, k + 1)] = -T::one();
        }
        if gy > 0 {
            a[(k, k - nx)] = -T::one();
        }
        if gy + 1 < ny {
            a[(k, k + nx)] = -T::one();
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hilbert() {
        let h: Matrix<f64> = hilbert_matrix(3);
        assert_eq!(h[(0, 0)], 1.0);
        assert_eq!(h[(1, 2)], 0.25);
        assert!(h.is_symmetric_matrix(0.0));
        assert!(h.is_positive_definite_matrix());
    }

    #[test]
    fn test_poisson_matrices() {
        let p1: Matrix<f64> = poisson_1d(5);
        assert!(p1.is_diagonally_dominant());
        assert!(p1.is_positive_definite_matrix());
        assert_eq!(p1[(4, 3)], -1.0);
        assert_eq!(p1[(0, 4)], 0.0);

        let p2: Matrix<f64> = poisson_2d(3, 4);
        assert_eq!(p2.shape(), (12, 12));
        assert!(p2.is_symmetric_matrix(0.0));
        assert!(p2.is_positive_definite_matrix());
        // corner node has two neighbours, centre node four
        assert_eq!(p2.row(0).iter().sum::<f64>(), 2.0);
        assert_eq!(p2.row(4).iter().sum::<f64>(), 0.0);
        // no coupling across the end of a grid line
        assert_eq!(p2[(2, 3)], 0.0);
    }
}
