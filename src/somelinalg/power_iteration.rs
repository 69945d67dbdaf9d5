//! Power iteration family for a single eigenpair:
//! direct power iteration (largest |λ|), inverse power iteration with an optional shift
//! (λ closest to the shift), and Rayleigh-quotient iteration (re-factorizes A - λI every
//! step, cubic convergence for symmetric A).
//! Convergence: |λ_k - λ_{k-1}| < tolerance.
use crate::Utils::random::Randomiser;
use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::somelinalg::LU_factorization::{LUFactorization, lup_factorize};
use crate::somelinalg::solver_params::{SolverParams, SolverStatus};
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EigenPair<T> {
    pub eigenvalue: T,
    /// unit 2-norm, sign not normalized
    pub eigenvector: Vector<T>,
    pub iterations: usize,
    pub converged: bool,
    pub status: SolverStatus,
    /// eigenvalue estimate after each iteration
    pub history: Vec<T>,
}

/// xᵗAx / xᵗx
pub fn rayleigh_quotient<T: Real>(A: &Matrix<T>, x: &Vector<T>) -> Result<T> {
    let xx = x.dot(x)?;
    if xx == T::zero() {
        return Err(LinAlgError::InvalidInput(
            "Rayleigh quotient of the zero vector".to_string(),
        ));
    }
    let ax = A.try_mul_vector(x)?;
    Ok(x.dot(&ax)? / xx)
}

fn starting_vector<T: Real>(A: &Matrix<T>, params: &SolverParams<T>) -> Result<Vector<T>> {
    params.validate()?;
    let n = A.nrows();
    if !A.is_square_matrix() || n == 0 {
        return Err(LinAlgError::InvalidInput(format!(
            "eigenvalue iteration needs a non-empty square matrix, got {:?}",
            A.shape()
        )));
    }
    match &params.initial_guess {
        Some(x0) if x0.len() != n => Err(LinAlgError::DimensionMismatch {
            operation: "initial guess",
            expected: (n, 1),
            found: x0.shape(),
        }),
        Some(x0) => Vector::from_slice(x0.as_slice()).normalize(),
        None => Ok(Randomiser::new(params.seed).unit_vector(n)),
    }
}

fn shifted<T: Real>(A: &Matrix<T>, sigma: T) -> Matrix<T> {
    let mut shifted = A.clone();
    for i in 0..A.nrows() {
        shifted[(i, i)] -= sigma;
    }
    shifted
}

enum Step<T> {
    /// next normalized iterate and its eigenvalue estimate
    Next(Vector<T>, T),
    /// the current estimate is exact (shifted matrix is singular)
    Exact,
}

fn iterate<T: Real, F>(
    name: &str,
    params: &SolverParams<T>,
    mut x: Vector<T>,
    mut lambda: T,
    mut step: F,
) -> Result<EigenPair<T>>
where
    F: FnMut(&Vector<T>, T) -> Result<Step<T>>,
{
    let start = Instant::now();
    let mut history = Vec::new();
    let mut iterations = 0;
    let status = loop {
        iterations += 1;
        match step(&x, lambda)? {
            Step::Exact => {
                debug!("{}: shifted matrix is singular, estimate {} is exact", name, lambda);
                history.push(lambda);
                break SolverStatus::Converged;
            }
            Step::Next(y, lambda_new) => {
                let change = (lambda_new - lambda).abs();
                x = y;
                lambda = lambda_new;
                history.push(lambda);
                debug!("{} iteration {}: eigenvalue {}, change {}", name, iterations, lambda, change);
                if !lambda.is_finite() {
                    break SolverStatus::Diverged;
                }
                if change < params.tolerance {
                    break SolverStatus::Converged;
                }
            }
        }
        if let Some(limit) = params.timeout {
            if start.elapsed() >= limit {
                break SolverStatus::TimedOut;
            }
        }
        if iterations >= params.max_iterations {
            break SolverStatus::MaxItersReached;
        }
    };
    let converged = status == SolverStatus::Converged;
    if converged {
        info!("{} converged in {} iterations: eigenvalue {}", name, iterations, lambda);
    } else {
        warn!("{} stopped with status {} after {} iterations: eigenvalue {}", name, status, iterations, lambda);
    }
    Ok(EigenPair {
        eigenvalue: lambda,
        eigenvector: x,
        iterations,
        converged,
        status,
        history,
    })
}

/// normalize `y`; None when y = 0
fn normalized<T: Real>(y: Vector<T>) -> Option<Vector<T>> {
    let norm = y.norm();
    if norm == T::zero() || !norm.is_finite() {
        None
    } else {
        Some(&y / norm)
    }
}

/// Dominant eigenpair by y = A·x, x = y/‖y‖, λ = xᵗAx.
/// If A·x vanishes, x is in the null space and λ = 0 is returned as converged.
pub fn power_iteration<T: Real>(A: &Matrix<T>, params: &SolverParams<T>) -> Result<EigenPair<T>> {
    let x0 = starting_vector(A, params)?;
    let lambda0 = rayleigh_quotient(A, &x0)?;
    iterate("power iteration", params, x0, lambda0, |x, _| {
        let y = A.try_mul_vector(x)?;
        match normalized(y) {
            Some(x_new) => {
                let lambda = rayleigh_quotient(A, &x_new)?;
                Ok(Step::Next(x_new, lambda))
            }
            None => Ok(Step::Next(x.clone(), T::zero())),
        }
    })
}

/// Eigenpair closest to `params.shift` (0 when unset): (A - σI) is factorized once with
/// partial pivoting and every step solves (A - σI)·y = x. A shift equal to an eigenvalue
/// makes the solve fail with `SingularMatrix`.
pub fn inverse_power_iteration<T: Real>(A: &Matrix<T>, params: &SolverParams<T>) -> Result<EigenPair<T>> {
    let x0 = starting_vector(A, params)?;
    let sigma = params.shift.unwrap_or_else(T::zero);
    let lu: LUFactorization<T> = lup_factorize(&shifted(A, sigma))?;
    let lambda0 = rayleigh_quotient(A, &x0)?;
    iterate("inverse power iteration", params, x0, lambda0, |x, _| {
        let y = lu.solve(x)?;
        let x_new = normalized(y).ok_or_else(|| {
            LinAlgError::InvalidInput("inverse iteration produced a zero vector".to_string())
        })?;
        let lambda = rayleigh_quotient(A, &x_new)?;
        Ok(Step::Next(x_new, lambda))
    })
}

/// Rayleigh-quotient iteration: shift by the current estimate, factorize A - λ_k I and
/// solve each step. Starts from `params.shift` if set, otherwise from the Rayleigh
/// quotient of the starting vector. A singular shifted matrix means λ_k is an eigenvalue.
pub fn rayleigh_quotient_iteration<T: Real>(A: &Matrix<T>, params: &SolverParams<T>) -> Result<EigenPair<T>> {
    let x0 = starting_vector(A, params)?;
    let lambda0 = match params.shift {
        Some(sigma) => sigma,
        None => rayleigh_quotient(A, &x0)?,
    };
    iterate("Rayleigh quotient iteration", params, x0, lambda0, |x, lambda| {
        let lu = lup_factorize(&shifted(A, lambda))?;
        let y = match lu.solve(x) {
            Ok(y) => y,
            Err(LinAlgError::SingularMatrix { .. }) => return Ok(Step::Exact),
            Err(e) => return Err(e),
        };
        match normalized(y) {
            Some(x_new) => {
                let lambda_new = rayleigh_quotient(A, &x_new)?;
                Ok(Step::Next(x_new, lambda_new))
            }
            None => Ok(Step::Exact),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diag_521() -> Matrix<f64> {
        Matrix::from_diagonal(&[5.0, 2.0, 1.0])
    }

    #[test]
    fn test_rayleigh_quotient() {
        let A = diag_521();
        let x = Vector::new(vec![1.0, 1.0, 0.0]);
        assert_relative_eq!(rayleigh_quotient(&A, &x).unwrap(), 3.5);
        assert!(rayleigh_quotient(&A, &Vector::zeros(3)).is_err());
    }

    #[test]
    fn test_power_iteration_dominant_pair() {
        let A = diag_521();
        let params = SolverParams::default().with_tolerance(1e-10).with_max_iterations(500);
        let pair = power_iteration(&A, &params).unwrap();
        assert!(pair.converged);
        assert_relative_eq!(pair.eigenvalue, 5.0, epsilon = 1e-8);
        assert_relative_eq!(pair.eigenvector[0].abs(), 1.0, epsilon = 1e-4);
        assert!(pair.eigenvector[1].abs() < 1e-4);
        assert_eq!(pair.history.len(), pair.iterations);
    }

    #[test]
    fn test_inverse_power_iteration() {
        let A = diag_521();
        let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(500);
        let smallest = inverse_power_iteration(&A, &params).unwrap();
        assert!(smallest.converged);
        assert_relative_eq!(smallest.eigenvalue, 1.0, epsilon = 1e-8);
        assert_relative_eq!(smallest.eigenvector[2].abs(), 1.0, epsilon = 1e-4);

        let near_two = inverse_power_iteration(&A, &params.clone().with_shift(2.2)).unwrap();
        assert!(near_two.converged);
        assert_relative_eq!(near_two.eigenvalue, 2.0, epsilon = 1e-8);

        let exact = inverse_power_iteration(&A, &params.with_shift(2.0));
        assert!(matches!(exact, Err(LinAlgError::SingularMatrix { .. })));
    }

    #[test]
    fn test_rayleigh_quotient_iteration_finds_an_eigenpair() {
        let A: Matrix<f64> = Matrix::from_rows(vec![
            vec![2.0, 1.0, 0.0],
            vec![1.0, 3.0, 1.0],
            vec![0.0, 1.0, 4.0],
        ])
        .unwrap();
        let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(50);
        let pair = rayleigh_quotient_iteration(&A, &params).unwrap();
        assert!(pair.converged);
        assert!(pair.iterations < 20);
        let r = &(&A * &pair.eigenvector) - &(&pair.eigenvector * pair.eigenvalue);
        assert!(r.norm() < 1e-8);
        let eigenvalues = nalgebra::DMatrix::from_row_slice(3, 3, A.as_slice())
            .symmetric_eigen()
            .eigenvalues;
        assert!(eigenvalues.iter().any(|&l| (l - pair.eigenvalue).abs() < 1e-8));
    }

    #[test]
    fn test_eigen_iteration_input_checks() {
        let A = diag_521();
        let zero_start = SolverParams::default().with_initial_guess(Vector::zeros(3));
        assert!(power_iteration(&A, &zero_start).is_err());
        let short = SolverParams::default().with_initial_guess(Vector::zeros(2));
        assert!(matches!(
            power_iteration(&A, &short),
            Err(LinAlgError::DimensionMismatch { .. })
        ));
        let rect = Matrix::<f64>::zeros(2, 3);
        assert!(power_iteration(&rect, &SolverParams::default()).is_err());
    }

    #[test]
    fn test_power_iteration_reports_max_iterations() {
        // λ2/λ1 = 0.999: the estimate moves by about 1e-4 per step
        let A = Matrix::from_diagonal(&[1.0, 0.999]);
        let params = SolverParams::default()
            .with_tolerance(1e-14)
            .with_max_iterations(10)
            .with_initial_guess(Vector::new(vec![1.0, 1.0]));
        let pair = power_iteration(&A, &params).unwrap();
        assert_eq!(pair.iterations, 10);
        assert_eq!(pair.status, SolverStatus::MaxItersReached);
        assert!(!pair.converged);
    }
}
