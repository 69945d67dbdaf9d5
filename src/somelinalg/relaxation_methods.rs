//! Stationary relaxation methods for A·x = b: Point-Jacobi, weighted Jacobi (SORJ),
//! Gauss-Seidel, symmetric Gauss-Seidel, SOR and SSOR.
//!
//! Every method runs the same loop: pre-checks, then sweep / residual / convergence check
//! until the [`ConvergenceMonitor`] reports a status. Non-convergence is a status on the
//! returned [`Solution`], never an error.
//!
//! With `threads > 1` the rows are split into contiguous blocks, one per worker, inside a
//! dedicated rayon pool. Jacobi-type sweeps give the same iterates as the serial sweep.
//! Gauss-Seidel-type sweeps become block-Jacobi across the partitions: inside its block a
//! worker uses the components it has already updated, while components owned by other
//! blocks are read from the snapshot taken at the start of the sweep. The iterates (and
//! usually the iteration count) therefore differ from serial Gauss-Seidel.
use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::{LazyMatrix, MatrixExpression, VectorExpression};
use crate::somelinalg::linear_sys_diagnostics::{
    ConvergenceMonitor, passes_pre_checks, report_status, residual_norm,
};
use crate::somelinalg::solver_params::{Method, Solution, SolverParams};
use crate::Utils::random::Randomiser;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::f64::consts::PI;
use std::time::Instant;

/// Closed-form optimal SOR factor for the model Poisson problem on a grid with `mesh[k]`
/// interior points along dimension k: the Jacobi spectral radius is the mean of
/// cos(π / (n_k + 1)), and ω = 2 / (1 + sqrt(1 - ρ²)).
pub fn approximate_optimal_relaxation_factor<T: Real>(mesh: &[usize]) -> Result<T> {
    if mesh.is_empty() || mesh.contains(&0) {
        return Err(LinAlgError::InvalidInput(format!(
            "mesh dimensions must be non-empty and positive, got {:?}",
            mesh
        )));
    }
    let rho = mesh
        .iter()
        .map(|&n| (PI / (n as f64 + 1.0)).cos())
        .sum::<f64>()
        / mesh.len() as f64;
    Ok(T::cast(optimal_relaxation_from_spectral_radius(rho)))
}

/// ω_opt = 2 / (1 + sqrt(1 - ρ²)) for a Jacobi spectral radius ρ < 1; 1 otherwise
pub fn optimal_relaxation_from_spectral_radius(rho: f64) -> f64 {
    if !(0.0..1.0).contains(&rho) {
        return 1.0;
    }
    2.0 / (1.0 + (1.0 - rho * rho).sqrt())
}

/// Estimate ρ(B) of the Jacobi iteration matrix B = I - D⁻¹A by power iteration on B².
/// B is never stored: it is a generated lazy matrix read through the lazy product.
/// Iterating on B² avoids the sign oscillation of the ±ρ eigenvalue pairs of
/// consistently ordered matrices.
pub fn jacobi_spectral_radius<T: Real>(A: &Matrix<T>, seed: u64) -> Result<f64> {
    let n = A.nrows();
    if n == 0 || !A.is_square_matrix() || !A.has_nonzero_diagonal() {
        return Err(LinAlgError::InvalidInput(
            "Jacobi iteration matrix needs a non-empty square matrix with nonzero diagonal".to_string(),
        ));
    }
    let B = LazyMatrix::from_fn(n, n, |i, j| {
        if i == j { T::zero() } else { -A[(i, j)] / A[(i, i)] }
    });
    let mut x: Vector<T> = Randomiser::new(seed).unit_vector(n);
    let mut lambda = 0.0;
    for _ in 0..200 {
        let bx = (&B).times_vector(&x)?.as_column_vector();
        let y = (&B).times_vector(&bx)?.as_column_vector();
        let norm = y.norm().to_f64().unwrap_or(f64::NAN);
        if !(norm > 0.0) || !norm.is_finite() {
            // B² x = 0: nilpotent on the start vector (e.g. triangular A)
            return Ok(0.0);
        }
        let converged = (norm - lambda).abs() <= 1e-10 * norm;
        lambda = norm;
        x = &y / T::cast(norm);
        if converged {
            break;
        }
    }
    Ok(lambda.sqrt())
}

/// ω used by `method`: 1 for the unrelaxed methods; for SOR/SSOR the given factor, else the
/// closed form from the mesh dimensions, else the estimate from the Jacobi spectral radius.
/// Weighted Jacobi without an explicit factor runs with ω = 1.
pub fn relaxation_factor_for<T: Real>(
    method: Method,
    A: &Matrix<T>,
    params: &SolverParams<T>,
) -> Result<T> {
    if !method.is_relaxed() {
        return Ok(T::one());
    }
    if let Some(omega) = params.relaxation_factor {
        return Ok(omega);
    }
    if method == Method::SORJacobi {
        info!("no relaxation factor for weighted Jacobi, using 1");
        return Ok(T::one());
    }
    if let Some(mesh) = &params.mesh_dimensions {
        let omega = approximate_optimal_relaxation_factor(mesh)?;
        info!("relaxation factor from mesh {:?}: {}", mesh, omega);
        return Ok(omega);
    }
    let rho = jacobi_spectral_radius(A, params.seed)?;
    let omega = optimal_relaxation_from_spectral_radius(rho);
    if rho >= 1.0 {
        warn!("Jacobi spectral radius estimate {} >= 1, falling back to omega = 1", rho);
    } else {
        info!("relaxation factor from Jacobi spectral radius {:.6}: {:.6}", rho, omega);
    }
    Ok(T::cast(omega))
}

#[inline]
fn relaxed_row_update<T: Real, F: Fn(usize) -> T>(
    row: &[T],
    b_i: T,
    i: usize,
    x_i: T,
    omega: T,
    x_j: F,
) -> T {
    let mut sigma = T::zero();
    for (j, &a_ij) in row.iter().enumerate() {
        if j != i {
            sigma += a_ij * x_j(j);
        }
    }
    let update = (b_i - sigma) / row[i];
    (T::one() - omega) * x_i + omega * update
}

/// One (weighted) Jacobi sweep: every component of `x_new` is computed from `x_old` only.
/// ω = 1 is Point-Jacobi.
pub fn jacobi_sweep<T: Real>(A: &Matrix<T>, b: &Vector<T>, x_old: &[T], x_new: &mut [T], omega: T) {
    for (i, xi) in x_new.iter_mut().enumerate() {
        *xi = relaxed_row_update(A.row(i), b[i], i, x_old[i], omega, |j| x_old[j]);
    }
}

/// Jacobi sweep with the rows split into blocks of `chunk`; identical result to [`jacobi_sweep`]
pub fn parallel_jacobi_sweep<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    x_old: &[T],
    x_new: &mut [T],
    omega: T,
    chunk: usize,
) {
    x_new
        .par_chunks_mut(chunk.max(1))
        .enumerate()
        .for_each(|(c, block)| {
            let start = c * chunk.max(1);
            for (k, xi) in block.iter_mut().enumerate() {
                let i = start + k;
                *xi = relaxed_row_update(A.row(i), b[i], i, x_old[i], omega, |j| x_old[j]);
            }
        });
}

/// In-place SOR sweep, rows in increasing order (`forward`) or decreasing order.
/// ω = 1 is a Gauss-Seidel sweep.
pub fn sor_sweep<T: Real>(A: &Matrix<T>, b: &Vector<T>, x: &mut [T], omega: T, forward: bool) {
    let n = x.len();
    let mut update = |i: usize| {
        let v = relaxed_row_update(A.row(i), b[i], i, x[i], omega, |j| x[j]);
        x[i] = v;
    };
    if forward {
        (0..n).for_each(&mut update);
    } else {
        (0..n).rev().for_each(update);
    }
}

/// Block-parallel SOR sweep: Gauss-Seidel ordering inside each block of `chunk` rows,
/// values of other blocks taken from the start-of-sweep snapshot.
pub fn parallel_sor_sweep<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    x: &mut [T],
    omega: T,
    forward: bool,
    chunk: usize,
) {
    let chunk = chunk.max(1);
    let snapshot = x.to_vec();
    x.par_chunks_mut(chunk).enumerate().for_each(|(c, block)| {
        let start = c * chunk;
        let len = block.len();
        let end = start + len;
        let mut update = |k: usize| {
            let i = start + k;
            let v = relaxed_row_update(A.row(i), b[i], i, block[k], omega, |j| {
                if j >= start && j < end { block[j - start] } else { snapshot[j] }
            });
            block[k] = v;
        };
        if forward {
            (0..len).for_each(&mut update);
        } else {
            (0..len).rev().for_each(update);
        }
    });
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| LinAlgError::InvalidInput(format!("cannot build thread pool: {}", e)))
}

/// sweep machinery for one solve: method, ω, optional worker pool
struct Relaxation<'a, T> {
    method: Method,
    A: &'a Matrix<T>,
    b: &'a Vector<T>,
    omega: T,
    pool: Option<ThreadPool>,
    chunk: usize,
}

impl<T: Real> Relaxation<'_, T> {
    fn sor(&self, x: &mut [T], forward: bool) {
        match &self.pool {
            Some(pool) => pool.install(|| parallel_sor_sweep(self.A, self.b, x, self.omega, forward, self.chunk)),
            None => sor_sweep(self.A, self.b, x, self.omega, forward),
        }
    }

    /// one iteration; `scratch` is the second buffer of the Jacobi-type methods
    fn iterate(&self, x: &mut Vector<T>, scratch: &mut Vector<T>) {
        match self.method {
            Method::PointJacobi | Method::SORJacobi => {
                match &self.pool {
                    Some(pool) => pool.install(|| {
                        parallel_jacobi_sweep(
                            self.A,
                            self.b,
                            x.as_slice(),
                            scratch.as_mut_slice(),
                            self.omega,
                            self.chunk,
                        )
                    }),
                    None => jacobi_sweep(self.A, self.b, x.as_slice(), scratch.as_mut_slice(), self.omega),
                }
                std::mem::swap(x, scratch);
            }
            Method::GaussSeidel | Method::SOR => self.sor(x.as_mut_slice(), true),
            Method::SymmetricGaussSeidel | Method::SSOR => {
                self.sor(x.as_mut_slice(), true);
                self.sor(x.as_mut_slice(), false);
            }
            other => unreachable!("{} is rejected by relaxation_solve", other),
        }
    }
}

/// Shared driver of the stationary methods.
pub fn relaxation_solve<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    method: Method,
    params: &SolverParams<T>,
) -> Result<Solution<T>> {
    if !method.is_stationary() {
        return Err(LinAlgError::InvalidInput(format!(
            "{} is not a stationary relaxation method",
            method
        )));
    }
    params.validate()?;
    passes_pre_checks(A, b, params)?;
    let n = A.nrows();
    let start = Instant::now();
    let omega = relaxation_factor_for(method, A, params)?;
    if !(omega > T::zero() && omega < T::cast(2.0)) {
        return Err(LinAlgError::InvalidInput(format!(
            "relaxation factor must lie in (0, 2), got {}",
            omega
        )));
    }
    let pool = if params.threads > 1 && n > 1 {
        Some(build_pool(params.threads)?)
    } else {
        None
    };
    let relaxation = Relaxation {
        method,
        A,
        b,
        omega,
        chunk: n.div_ceil(params.threads).max(1),
        pool,
    };
    info!(
        "{} on {}x{} system: tolerance {}, max iterations {}, omega {}, threads {}",
        method, n, n, params.tolerance, params.max_iterations, omega, params.threads
    );

    let mut x = params
        .initial_guess
        .clone()
        .map(|x0| x0.with_orientation(Default::default()))
        .unwrap_or_else(|| Vector::zeros(n));
    let mut scratch = x.clone();
    let mut monitor = ConvergenceMonitor::new(params, residual_norm(A, &x, b, params.norm)?);
    let mut iterations = 0;
    let status = match monitor.initial_status() {
        Some(status) => status,
        None => loop {
            iterations += 1;
            relaxation.iterate(&mut x, &mut scratch);
            let r = residual_norm(A, &x, b, params.norm)?;
            if let Some(status) = monitor.check(iterations, r) {
                break status;
            }
        },
    };
    let history = monitor.into_history();
    debug!("{} residual history: {:?}", method, history);
    let solution = Solution::new(method, x, status, iterations, history).with_elapsed(start.elapsed());
    report_status(&method.to_string(), status, iterations, solution.residual);
    Ok(solution)
}

/// x_i ← (b_i − Σ_{j≠i} a_ij x_j^{old}) / a_ii
pub fn point_jacobi<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::PointJacobi, params)
}

/// x_i ← (1−ω) x_i^{old} + ω · JacobiUpdate_i
pub fn sor_jacobi<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::SORJacobi, params)
}

pub fn gauss_seidel<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::GaussSeidel, params)
}

/// forward then backward Gauss-Seidel sweep per iteration
pub fn symmetric_gauss_seidel<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    params: &SolverParams<T>,
) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::SymmetricGaussSeidel, params)
}

pub fn sor<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::SOR, params)
}

pub fn ssor<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    relaxation_solve(A, b, Method::SSOR, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::somelinalg::model_problems::poisson_1d;
    use crate::somelinalg::solver_params::SolverStatus;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn system() -> (Matrix<f64>, Vector<f64>) {
        let A = Matrix::from_rows(vec![
            vec![10.0, 1.0, 1.0],
            vec![1.0, 10.0, 1.0],
            vec![1.0, 1.0, 10.0],
        ])
        .unwrap();
        (A, Vector::new(vec![12.0, 12.0, 12.0]))
    }

    #[test]
    fn test_mesh_relaxation_factor() {
        let omega: f64 = approximate_optimal_relaxation_factor(&[31]).unwrap();
        let rho = (PI / 32.0).cos();
        assert_relative_eq!(omega, 2.0 / (1.0 + (1.0 - rho * rho).sqrt()), epsilon = 1e-12);
        assert!(omega > 1.0 && omega < 2.0);
        let square: f64 = approximate_optimal_relaxation_factor(&[31, 31]).unwrap();
        assert_relative_eq!(square, omega, epsilon = 1e-12);
        assert!(approximate_optimal_relaxation_factor::<f64>(&[]).is_err());
        assert_eq!(optimal_relaxation_from_spectral_radius(1.2), 1.0);
    }

    #[test]
    fn test_jacobi_spectral_radius_of_poisson() {
        let n = 15;
        let A: Matrix<f64> = poisson_1d(n);
        let rho = jacobi_spectral_radius(&A, 1).unwrap();
        assert_relative_eq!(rho, (PI / (n as f64 + 1.0)).cos(), epsilon = 1e-4);
        assert!(matches!(
            jacobi_spectral_radius(&Matrix::<f64>::zeros(0, 0), 1),
            Err(LinAlgError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_jacobi_scenario_converges() {
        let (A, b) = system();
        let params = SolverParams::default().with_max_iterations(50);
        let sol = point_jacobi(&A, &b, &params).unwrap();
        assert!(sol.converged);
        assert_eq!(sol.status, SolverStatus::Converged);
        assert!(sol.residual < 1e-6);
        assert!(sol.iterations <= 50);
        assert_relative_eq!(sol.x, Vector::new(vec![1.0, 1.0, 1.0]), epsilon = 1e-6);
        assert_eq!(sol.residual_history.len(), sol.iterations + 1);
        assert!(sol.residual_history.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_all_methods_converge_on_dominant_system() {
        let mut rnd = Randomiser::new(21);
        let A: Matrix<f64> = rnd.diagonally_dominant_matrix(20);
        let x_true: Vector<f64> = rnd.vector(20, -1.0, 1.0);
        let b = &A * &x_true;
        let params = SolverParams::default()
            .with_tolerance(1e-10)
            .with_max_iterations(2000)
            .with_relaxation_factor(1.1);
        for method in [
            Method::PointJacobi,
            Method::GaussSeidel,
            Method::SymmetricGaussSeidel,
            Method::SOR,
            Method::SSOR,
        ] {
            let sol = relaxation_solve(&A, &b, method, &params).unwrap();
            assert!(sol.converged, "{} did not converge", method);
            assert_relative_eq!(sol.x, x_true, epsilon = 1e-8);
        }
        let weighted = params.clone().with_relaxation_factor(0.8);
        let sol = sor_jacobi(&A, &b, &weighted).unwrap();
        assert!(sol.converged);
    }

    #[test]
    fn test_max_iterations_is_not_an_error() {
        let A: Matrix<f64> = poisson_1d(30);
        let b = Vector::from_elem(30, 1.0);
        let params = SolverParams::default().with_max_iterations(5);
        let sol = point_jacobi(&A, &b, &params).unwrap();
        assert!(!sol.converged);
        assert_eq!(sol.status, SolverStatus::MaxItersReached);
        assert_eq!(sol.iterations, 5);
    }

    #[test]
    fn test_divergence_is_reported() {
        // not diagonally dominant, Jacobi iteration matrix has spectral radius 3
        let A = Matrix::from_rows(vec![vec![1.0, 3.0], vec![3.0, 1.0]]).unwrap();
        let b = Vector::new(vec![1.0, 2.0]);
        let params = SolverParams::default().with_max_iterations(1000);
        let sol = point_jacobi(&A, &b, &params).unwrap();
        assert_eq!(sol.status, SolverStatus::Diverged);
        assert!(sol.iterations < 1000);
    }

    #[test]
    fn test_slow_growth_is_divergence() {
        // Jacobi iteration matrix has spectral radius 1.05: the residual grows by 5% a step
        let A = Matrix::from_rows(vec![vec![1.0, 1.05], vec![1.05, 1.0]]).unwrap();
        let b = Vector::new(vec![1.0, 0.0]);
        let params = SolverParams::default().with_max_iterations(100);
        let sol = point_jacobi(&A, &b, &params).unwrap();
        assert_eq!(sol.status, SolverStatus::Diverged);
        assert_eq!(sol.iterations, params.max_residual_growth);
        assert!(sol.residual < 1e8 * sol.residual_history[0]);

        let unlimited = params.clone().with_max_residual_growth(0);
        let sol = point_jacobi(&A, &b, &unlimited).unwrap();
        assert_eq!(sol.status, SolverStatus::MaxItersReached);
        assert_eq!(sol.iterations, 100);
    }

    #[test]
    fn test_initial_guess_already_solves() {
        let (A, b) = system();
        let params = SolverParams::default().with_initial_guess(Vector::new(vec![1.0, 1.0, 1.0]));
        let sol = gauss_seidel(&A, &b, &params).unwrap();
        assert!(sol.converged);
        assert_eq!(sol.iterations, 0);
        assert_eq!(sol.residual_history, vec![0.0]);
    }

    #[test]
    fn test_invalid_inputs() {
        let (A, b) = system();
        let bad_omega = SolverParams::default().with_relaxation_factor(2.5);
        assert!(matches!(sor(&A, &b, &bad_omega), Err(LinAlgError::InvalidInput(_))));
        let zero_diag = Matrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert!(point_jacobi(&zero_diag, &Vector::new(vec![1.0, 1.0]), &SolverParams::default()).is_err());
        assert!(matches!(
            point_jacobi(&A, &Vector::new(vec![1.0]), &SolverParams::default()),
            Err(LinAlgError::DimensionMismatch { .. })
        ));
        for method in Method::iter().filter(|m| !m.is_stationary()) {
            assert!(matches!(
                relaxation_solve(&A, &b, method, &SolverParams::default()),
                Err(LinAlgError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_sor_with_unit_omega_is_gauss_seidel() {
        let mut rnd = Randomiser::new(8);
        let A: Matrix<f64> = rnd.diagonally_dominant_matrix(9);
        let b: Vector<f64> = rnd.vector(9, -1.0, 1.0);
        let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(500);
        let gs = gauss_seidel(&A, &b, &params).unwrap();
        let sor_1 = sor(&A, &b, &params.clone().with_relaxation_factor(1.0)).unwrap();
        assert_eq!(gs.iterations, sor_1.iterations);
        assert_eq!(gs.residual_history, sor_1.residual_history);
        assert_eq!(gs.x, sor_1.x);
    }

    #[test]
    fn test_parallel_jacobi_matches_serial() {
        let mut rnd = Randomiser::new(4);
        let A: Matrix<f64> = rnd.diagonally_dominant_matrix(37);
        let b: Vector<f64> = rnd.vector(37, -1.0, 1.0);
        let params = SolverParams::default().with_tolerance(1e-10).with_max_iterations(500);
        let serial = point_jacobi(&A, &b, &params).unwrap();
        let parallel = point_jacobi(&A, &b, &params.clone().with_threads(4)).unwrap();
        assert_eq!(serial.iterations, parallel.iterations);
        assert_eq!(serial.x, parallel.x);
    }

    #[test]
    fn test_block_parallel_gauss_seidel_converges() {
        let mut rnd = Randomiser::new(5);
        let A: Matrix<f64> = rnd.diagonally_dominant_matrix(40);
        let x_true: Vector<f64> = rnd.vector(40, -1.0, 1.0);
        let b = &A * &x_true;
        let params = SolverParams::default()
            .with_tolerance(1e-10)
            .with_max_iterations(1000)
            .with_threads(3);
        for method in [Method::GaussSeidel, Method::SSOR] {
            let p = params.clone().with_relaxation_factor(1.0);
            let sol = relaxation_solve(&A, &b, method, &p).unwrap();
            assert!(sol.converged);
            assert_relative_eq!(sol.x, x_true, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_block_sweep_with_one_block_is_serial() {
        let mut rnd = Randomiser::new(6);
        let A: Matrix<f64> = rnd.diagonally_dominant_matrix(10);
        let b: Vector<f64> = rnd.vector(10, -1.0, 1.0);
        let mut serial = vec![0.5; 10];
        let mut block = vec![0.5; 10];
        sor_sweep(&A, &b, &mut serial, 1.3, false);
        parallel_sor_sweep(&A, &b, &mut block, 1.3, false, 10);
        assert_eq!(serial, block);
    }

    #[test]
    fn test_sor_with_estimated_omega() {
        let n = 20;
        let A: Matrix<f64> = poisson_1d(n);
        let b = Vector::from_elem(n, 1.0);
        let params = SolverParams::default().with_tolerance(1e-8).with_max_iterations(5000);
        let gs = gauss_seidel(&A, &b, &params).unwrap();
        let estimated = sor(&A, &b, &params).unwrap();
        let from_mesh = sor(&A, &b, &params.clone().with_mesh_dimensions(vec![n])).unwrap();
        assert!(gs.converged && estimated.converged && from_mesh.converged);
        assert!(estimated.iterations < gs.iterations);
        assert!(from_mesh.iterations < gs.iterations);
    }
}
