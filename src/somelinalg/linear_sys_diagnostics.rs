use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::{VectorExpression, residual};
use crate::somelinalg::solver_params::{ResidualNorm, SolverParams, SolverStatus};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, stack};
use std::time::{Duration, Instant};

/// ‖v‖₂
pub fn l2_norm<T: Real, V: VectorExpression<T>>(v: V) -> T {
    v.norm_l2()
}

/// ‖a - b‖₂, e.g. between successive iterates; no difference vector is allocated
pub fn L2<T: Real>(a: &Vector<T>, b: &Vector<T>) -> Result<T> {
    Ok(a.minus(b)?.norm_l2())
}

/// max_i |a_i - b_i|
pub fn absolute_max_residual<T: Real>(a: &Vector<T>, b: &Vector<T>) -> Result<T> {
    Ok(a.minus(b)?.norm_max())
}

impl ResidualNorm {
    pub fn measure<T: Real, E: VectorExpression<T>>(&self, e: E) -> T {
        match self {
            ResidualNorm::L2 => e.norm_l2(),
            ResidualNorm::AbsoluteMax => e.norm_max(),
        }
    }
}

/// ‖b - A·x‖ in the requested norm, evaluated lazily
pub fn residual_norm<T: Real>(
    A: &Matrix<T>,
    x: &Vector<T>,
    b: &Vector<T>,
    norm: ResidualNorm,
) -> Result<T> {
    Ok(norm.measure(residual(A, x, b)?))
}

/// A square, b of matching length; returns n
pub fn check_system_shape<T: Real>(A: &Matrix<T>, b: &Vector<T>, operation: &'static str) -> Result<usize> {
    let n = A.nrows();
    if !A.is_square_matrix() {
        return Err(LinAlgError::DimensionMismatch {
            operation,
            expected: (n, n),
            found: A.shape(),
        });
    }
    if b.len() != n {
        return Err(LinAlgError::DimensionMismatch {
            operation,
            expected: (n, 1),
            found: b.shape(),
        });
    }
    Ok(n)
}

/// true when every |a_ii| is below `threshold`
pub fn all_diagonal_elements_below_threshold<T: Real>(A: &Matrix<T>, threshold: T) -> bool {
    A.diagonal().iter().all(|d| d.abs() < threshold)
}

/// Preconditions of the stationary methods: square system, no diagonal element at or below
/// `params.diagonal_threshold` in magnitude, a diagonal that is not negligible compared to
/// the off-diagonal entries, and (when required) diagonal dominance.
pub fn passes_pre_checks<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<()> {
    let n = check_system_shape(A, b, "iterative solver pre-check")?;
    if n == 0 {
        return Err(LinAlgError::InvalidInput("empty system".to_string()));
    }
    if let Some(x0) = &params.initial_guess {
        if x0.len() != n {
            return Err(LinAlgError::DimensionMismatch {
                operation: "initial guess",
                expected: (n, 1),
                found: x0.shape(),
            });
        }
    }
    for i in 0..n {
        if A[(i, i)].abs() <= params.diagonal_threshold {
            warn!("pre-check failed: |a_{}{}| = {} is below threshold", i, i, A[(i, i)].abs());
            return Err(LinAlgError::InvalidInput(format!(
                "diagonal element {} is zero or below threshold {}",
                i, params.diagonal_threshold
            )));
        }
    }
    let negligible = T::epsilon().sqrt() * A.max_abs();
    if n > 1 && all_diagonal_elements_below_threshold(A, negligible) {
        warn!("pre-check failed: every diagonal element is negligible, the system is ill-conditioned for relaxation");
        return Err(LinAlgError::InvalidInput(
            "all diagonal elements are negligible compared to the off-diagonal entries".to_string(),
        ));
    }
    if !A.is_diagonally_dominant() {
        if params.require_diagonal_dominance {
            warn!("pre-check failed: matrix is not diagonally dominant");
            return Err(LinAlgError::InvalidInput(
                "matrix is not diagonally dominant".to_string(),
            ));
        }
        warn!("matrix is not diagonally dominant, relaxation may not converge");
    }
    Ok(())
}

/// Per-iteration bookkeeping shared by the iterative solvers: residual history, tolerance,
/// iteration cap, divergence (blow-up or sustained growth) and timeout.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor<T> {
    tolerance: T,
    max_iterations: usize,
    divergence_factor: T,
    max_residual_growth: usize,
    /// consecutive iterations on which the residual increased
    growth: usize,
    timeout: Option<Duration>,
    start: Instant,
    initial: T,
    history: Vec<T>,
}

impl<T: Real> ConvergenceMonitor<T> {
    pub fn new(params: &SolverParams<T>, initial_residual: T) -> ConvergenceMonitor<T> {
        ConvergenceMonitor {
            tolerance: params.tolerance,
            max_iterations: params.max_iterations,
            divergence_factor: params.divergence_factor,
            max_residual_growth: params.max_residual_growth,
            growth: 0,
            timeout: params.timeout,
            start: Instant::now(),
            initial: initial_residual,
            history: vec![initial_residual],
        }
    }

    /// status before any iteration: the initial guess may already solve the system
    pub fn initial_status(&self) -> Option<SolverStatus> {
        if !self.initial.is_finite() {
            Some(SolverStatus::Diverged)
        } else if self.initial < self.tolerance {
            Some(SolverStatus::Converged)
        } else {
            None
        }
    }

    /// record the residual after `iteration` (1-based) and decide whether to stop
    pub fn check(&mut self, iteration: usize, residual: T) -> Option<SolverStatus> {
        let previous = self.history.last().copied().unwrap_or(self.initial);
        self.growth = if residual > previous { self.growth + 1 } else { 0 };
        self.history.push(residual);
        debug!("iteration {}: residual {}", iteration, residual);
        if !residual.is_finite() {
            return Some(SolverStatus::Diverged);
        }
        if residual < self.tolerance {
            return Some(SolverStatus::Converged);
        }
        let reference = if self.initial > self.tolerance { self.initial } else { self.tolerance };
        if residual > self.divergence_factor * reference {
            return Some(SolverStatus::Diverged);
        }
        if self.max_residual_growth > 0 && self.growth >= self.max_residual_growth {
            debug!("residual grew on {} consecutive iterations", self.growth);
            return Some(SolverStatus::Diverged);
        }
        if let Some(limit) = self.timeout {
            if self.start.elapsed() >= limit {
                return Some(SolverStatus::TimedOut);
            }
        }
        if iteration >= self.max_iterations {
            return Some(SolverStatus::MaxItersReached);
        }
        None
    }

    pub fn history(&self) -> &[T] {
        &self.history
    }

    pub fn into_history(self) -> Vec<T> {
        self.history
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// log the outcome of an iterative solve at a level matching its status
pub fn report_status<T: Real>(method: &str, status: SolverStatus, iterations: usize, residual: T) {
    match status {
        SolverStatus::Converged => {
            log::info!("{} converged in {} iterations, residual {}", method, iterations, residual)
        }
        SolverStatus::MaxItersReached => warn!(
            "{} did not converge in {} iterations, residual {}",
            method, iterations, residual
        ),
        SolverStatus::Diverged => warn!(
            "{} diverged after {} iterations, residual {}",
            method, iterations, residual
        ),
        SolverStatus::TimedOut => warn!(
            "{} timed out after {} iterations, residual {}",
            method, iterations, residual
        ),
    }
}

////////////////////////////////////////////////////////////////////////////////
// conditioning and solvability, computed with nalgebra
////////////////////////////////////////////////////////////////////////////////

pub fn to_dmatrix(A: &Matrix<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(A.nrows(), A.ncols(), A.as_slice())
}

pub fn to_dvector(b: &Vector<f64>) -> DVector<f64> {
    DVector::from_column_slice(b.as_slice())
}

/// In mathematics, the Rouché–Capelli theorem gives a necessary and sufficient condition for a
/// system of linear equations to have a solution: A·x = b is solvable if and only if
/// rank(A) = rank([A b]).
pub fn Rouche_Capelli_theorem(A: &Matrix<f64>, b: &Vector<f64>) -> Result<bool> {
    if A.nrows() != b.len() {
        return Err(LinAlgError::DimensionMismatch {
            operation: "Rouche-Capelli check",
            expected: (A.nrows(), 1),
            found: b.shape(),
        });
    }
    let a_owned = to_dmatrix(A);
    let b_owned = to_dvector(b);
    let (a, bv) = (&a_owned, &b_owned);
    let ab: DMatrix<f64> = stack![a, bv];
    let eps = 1e3 * f64::EPSILON * (1.0 + A.max_abs().max(b.norm_max()));
    let rank_a = a.rank(eps);
    let rank_ab = ab.rank(eps);
    let solvable = rank_a == rank_ab;
    if !solvable {
        warn!(
            "The system has no solution. rank(A) = {} != rank([A b]) = {}",
            rank_a, rank_ab
        );
    }
    Ok(solvable)
}

/// 2-norm condition number σ_max / σ_min; infinite for a singular matrix
pub fn condition_number(A: &Matrix<f64>) -> Result<f64> {
    if !A.is_square_matrix() || A.nrows() == 0 {
        return Err(LinAlgError::DimensionMismatch {
            operation: "condition number",
            expected: (A.nrows(), A.nrows()),
            found: A.shape(),
        });
    }
    let singular_values = to_dmatrix(A).singular_values();
    let max_sigma = singular_values.max();
    let min_sigma = singular_values.min();
    if min_sigma == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(max_sigma / min_sigma)
}

/// A system is poorly conditioned when its solution is sensitive to small changes in the
/// input data, measured here by a condition number above `threshold`.
pub fn poorly_conditioned(A: &Matrix<f64>, threshold: f64) -> Result<bool> {
    let cond = condition_number(A)?;
    let poorly = cond > threshold;
    if poorly {
        warn!(
            "The system of linear equations is poorly conditioned. Condition number = {:.2e}",
            cond
        );
    }
    Ok(poorly)
}

/// solvable and well conditioned
pub fn linear_system_diagnostics(A: &Matrix<f64>, b: &Vector<f64>, threshold: f64) -> Result<bool> {
    let solvable = Rouche_Capelli_theorem(A, b)?;
    let poorly = poorly_conditioned(A, threshold)?;
    if !solvable {
        warn!("The system of linear equations does not have a solution.");
    }
    Ok(solvable && !poorly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::somelinalg::model_problems::hilbert_matrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_norms() {
        let a = Vector::new(vec![1.0, 2.0, 3.0]);
        let b = Vector::new(vec![1.0, 0.0, -1.0]);
        assert_relative_eq!(L2(&a, &b).unwrap(), 20.0f64.sqrt());
        assert_eq!(absolute_max_residual(&a, &b).unwrap(), 4.0);
        assert_relative_eq!(l2_norm(&b), 2.0f64.sqrt());
        assert!(L2(&a, &Vector::new(vec![1.0])).is_err());
    }

    #[test]
    fn test_residual_norm_both_norms() {
        let A = Matrix::from_rows(vec![vec![2.0, 0.0], vec![0.0, 2.0]]).unwrap();
        let x = Vector::new(vec![1.0, 1.0]);
        let b = Vector::new(vec![5.0, 2.0]);
        assert_eq!(residual_norm(&A, &x, &b, ResidualNorm::L2).unwrap(), 3.0);
        assert_eq!(residual_norm(&A, &x, &b, ResidualNorm::AbsoluteMax).unwrap(), 3.0);
    }

    #[test]
    fn test_pre_checks() {
        let params = SolverParams::<f64>::default();
        let b = Vector::new(vec![1.0, 1.0]);
        let good = Matrix::from_rows(vec![vec![4.0, 1.0], vec![1.0, 3.0]]).unwrap();
        assert!(passes_pre_checks(&good, &b, &params).is_ok());
        let zero_diag = Matrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 3.0]]).unwrap();
        assert!(matches!(
            passes_pre_checks(&zero_diag, &b, &params),
            Err(LinAlgError::InvalidInput(_))
        ));
        let weak = Matrix::from_rows(vec![vec![1.0, 5.0], vec![5.0, 1.0]]).unwrap();
        assert!(passes_pre_checks(&weak, &b, &params).is_ok());
        let strict = params.clone().with_diagonal_dominance_required(true);
        assert!(passes_pre_checks(&weak, &b, &strict).is_err());
        let tiny = Matrix::from_rows(vec![vec![1e-12, 1.0], vec![1.0, 1e-12]]).unwrap();
        assert!(all_diagonal_elements_below_threshold(&tiny, 1e-6));
        assert!(passes_pre_checks(&tiny, &b, &params).is_err());
        assert!(passes_pre_checks(&good, &Vector::new(vec![1.0]), &params).is_err());
    }

    #[test]
    fn test_monitor_statuses() {
        let params = SolverParams::<f64>::default()
            .with_tolerance(1e-3)
            .with_max_iterations(3)
            .with_divergence_factor(10.0);
        let mut m = ConvergenceMonitor::new(&params, 1.0);
        assert_eq!(m.initial_status(), None);
        assert_eq!(m.check(1, 0.5), None);
        assert_eq!(m.check(2, 0.4), None);
        assert_eq!(m.check(3, 0.3), Some(SolverStatus::MaxItersReached));
        assert_eq!(m.history(), &[1.0, 0.5, 0.4, 0.3]);

        let mut m = ConvergenceMonitor::new(&params, 1.0);
        assert_eq!(m.check(1, 1e-4), Some(SolverStatus::Converged));
        let mut m = ConvergenceMonitor::new(&params, 1.0);
        assert_eq!(m.check(1, 50.0), Some(SolverStatus::Diverged));
        let mut m = ConvergenceMonitor::new(&params, 1.0);
        assert_eq!(m.check(1, f64::NAN), Some(SolverStatus::Diverged));

        let growing = params.clone().with_max_iterations(100).with_max_residual_growth(3);
        let mut m = ConvergenceMonitor::new(&growing, 1.0);
        assert_eq!(m.check(1, 1.1), None);
        assert_eq!(m.check(2, 1.0), None);
        assert_eq!(m.check(3, 1.2), None);
        assert_eq!(m.check(4, 1.3), None);
        assert_eq!(m.check(5, 1.4), Some(SolverStatus::Diverged));
        assert_eq!(
            ConvergenceMonitor::new(&params, 0.0).initial_status(),
            Some(SolverStatus::Converged)
        );
    }

    #[test]
    fn test_monitor_timeout() {
        let params = SolverParams::<f64>::default().with_timeout(Duration::from_millis(1));
        let mut m = ConvergenceMonitor::new(&params, 1.0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(m.check(1, 0.9), Some(SolverStatus::TimedOut));
    }

    #[test]
    fn test_Rouche_Capelli_theorem() {
        // example https://en.wikipedia.org/wiki/Rouché–Capelli_theorem
        let A = Matrix::from_rows(vec![
            vec![1.0, 1.0, 2.0],
            vec![1.0, 1.0, 1.0],
            vec![2.0, 2.0, 2.0],
        ])
        .unwrap();
        let b = Vector::new(vec![3.0, 1.0, 5.0]);
        assert!(!Rouche_Capelli_theorem(&A, &b).unwrap());
        let b = Vector::new(vec![3.0, 1.0, 2.0]);
        assert!(Rouche_Capelli_theorem(&A, &b).unwrap());
    }

    #[test]
    fn test_poorly_conditioned_hilbert() {
        let H: Matrix<f64> = hilbert_matrix(6);
        assert!(poorly_conditioned(&H, 1e5).unwrap());
        assert!(!poorly_conditioned(&Matrix::identity(6), 1e5).unwrap());
        assert_relative_eq!(condition_number(&Matrix::identity(3)).unwrap(), 1.0);
        let singular = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(condition_number(&singular).unwrap() > 1e15);
        let b = Vector::new(vec![1.0; 6]);
        assert!(!linear_system_diagnostics(&H, &b, 1e5).unwrap());
    }
}
