//! Explicitly seeded pseudo-random source for starting vectors and generated test systems.
//! There is no global generator: every caller owns its `Randomiser`, so runs repeat exactly.
use crate::containers::{Matrix, Real, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct Randomiser {
    seed: u64,
    rng: StdRng,
}

impl Default for Randomiser {
    fn default() -> Self {
        Randomiser::new(DEFAULT_SEED)
    }
}

impl Randomiser {
    pub fn new(seed: u64) -> Randomiser {
        Randomiser {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// restart the sequence from the original seed
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// uniform in [lo, hi); `lo` when the range is empty
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }

    pub fn vector<T: Real>(&mut self, n: usize, lo: f64, hi: f64) -> Vector<T> {
        Vector::new((0..n).map(|_| T::cast(self.uniform(lo, hi))).collect())
    }

    /// random direction of unit L2 length, the usual starting vector for eigen iterations;
    /// empty for n = 0
    pub fn unit_vector<T: Real>(&mut self, n: usize) -> Vector<T> {
        if n == 0 {
            return Vector::zeros(0);
        }
        loop {
            let v: Vector<T> = self.vector(n, -1.0, 1.0);
            if let Ok(u) = v.normalize() {
                return u;
            }
        }
    }

    pub fn matrix<T: Real>(&mut self, rows: usize, cols: usize, lo: f64, hi: f64) -> Matrix<T> {
        let data: Vec<T> = (0..rows * cols)
            .map(|_| T::cast(self.uniform(lo, hi)))
            .collect();
        Matrix::from_fn(rows, cols, |i, j| data[i * cols + j])
    }

    /// off-diagonal entries in [-1, 1), diagonal strictly larger than the row's absolute off-diagonal sum
    pub fn diagonally_dominant_matrix<T: Real>(&mut self, n: usize) -> Matrix<T> {
        let mut a: Matrix<T> = self.matrix(n, n, -1.0, 1.0);
        for i in 0..n {
            let off: T = (0..n).filter(|&j| j != i).map(|j| a[(i, j)].abs()).sum();
            a[(i, i)] = off + T::cast(self.uniform(1.0, 2.0));
        }
        a
    }

    /// B·Bᵗ + n·I with B uniform in [-1, 1): symmetric positive definite
    pub fn spd_matrix<T: Real>(&mut self, n: usize) -> Matrix<T> {
        let b: Matrix<T> = self.matrix(n, n, -1.0, 1.0);
        let mut a = &b * &b.transpose();
        let shift = T::from_usize_lossy(n);
        for i in 0..n {
            a[(i, i)] += shift;
        }
        // exact symmetry, the product is symmetric only up to rounding
        for i in 0..n {
            for j in 0..i {
                let v = a[(i, j)];
                a[(j, i)] = v;
            }
        }
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut r1 = Randomiser::new(123);
        let mut r2 = Randomiser::new(123);
        let a: Vector<f64> = r1.vector(10, 0.0, 1.0);
        let b: Vector<f64> = r2.vector(10, 0.0, 1.0);
        assert_eq!(a, b);
        r1.reset();
        let c: Vector<f64> = r1.vector(10, 0.0, 1.0);
        assert_eq!(a, c);
        assert!(a.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_generated_systems_have_their_properties() {
        let mut rnd = Randomiser::default();
        assert_eq!(rnd.seed(), DEFAULT_SEED);
        let a: Matrix<f64> = rnd.diagonally_dominant_matrix(12);
        assert!(a.is_strictly_diagonally_dominant());
        let s: Matrix<f64> = rnd.spd_matrix(12);
        assert!(s.is_symmetric_matrix(0.0));
        assert!(s.is_positive_definite_matrix());
        let u: Vector<f64> = rnd.unit_vector(5);
        assert!(u.is_unit_vector(1e-12));
        let empty: Vector<f64> = rnd.unit_vector(0);
        assert!(empty.is_empty());
    }
}
