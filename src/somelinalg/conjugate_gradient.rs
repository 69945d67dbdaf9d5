//! Conjugate gradient for symmetric positive definite systems, plain and preconditioned.
//!
//! CG minimizes the A-norm of the error over growing Krylov subspaces and, in exact
//! arithmetic, terminates in at most n iterations. A non-positive curvature pᵀAp means the
//! matrix is not positive definite; the solve stops with status `Diverged`.
use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::lazy::{VectorExpression, residual};
use crate::somelinalg::linear_sys_diagnostics::{ConvergenceMonitor, check_system_shape, report_status};
use crate::somelinalg::solver_params::{Method, PreconditionerKind, Solution, SolverParams, SolverStatus};
use log::{info, warn};
use std::time::Instant;

/// Approximate inverse of the system matrix: `apply(r)` returns z = M⁻¹·r
pub trait Preconditioner<T: Real> {
    fn apply(&self, r: &Vector<T>) -> Result<Vector<T>>;
}

/// M = I, turns PCG into plain CG
pub struct IdentityPreconditioner;

impl<T: Real> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Vector<T>) -> Result<Vector<T>> {
        Ok(r.clone())
    }
}

/// M = diag(A)
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner<T> {
    inv_diag: Vec<T>,
}

impl<T: Real> JacobiPreconditioner<T> {
    pub fn new(A: &Matrix<T>) -> Result<Self> {
        if !A.is_square_matrix() {
            return Err(LinAlgError::InvalidInput(
                "Jacobi preconditioner needs a square matrix".to_string(),
            ));
        }
        let inv_diag = A
            .diagonal()
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                if d == T::zero() {
                    Err(LinAlgError::InvalidInput(format!(
                        "zero diagonal element at row {} in Jacobi preconditioner",
                        i
                    )))
                } else {
                    Ok(T::one() / d)
                }
            })
            .collect::<Result<Vec<T>>>()?;
        Ok(JacobiPreconditioner { inv_diag })
    }
}

impl<T: Real> Preconditioner<T> for JacobiPreconditioner<T> {
    fn apply(&self, r: &Vector<T>) -> Result<Vector<T>> {
        if r.len() != self.inv_diag.len() {
            return Err(LinAlgError::DimensionMismatch {
                operation: "Jacobi preconditioner",
                expected: (self.inv_diag.len(), 1),
                found: r.shape(),
            });
        }
        Ok(Vector::from_fn(r.len(), |i| self.inv_diag[i] * r[i]))
    }
}

/// Symmetric SOR preconditioner
/// M = ω/(2-ω) · (D/ω + L) · (D/ω)⁻¹ · (D/ω + U), with A = L + D + U.
/// This differs from the usual 1/(ω(2-ω)) · (D + ωL) · D⁻¹ · (D + ωU) only by a constant
/// factor, which leaves the PCG iterates unchanged.
/// Applied by a forward and a backward triangular sweep over A, nothing is stored.
#[derive(Debug, Clone)]
pub struct SSORPreconditioner<'a, T> {
    a: &'a Matrix<T>,
    omega: T,
}

impl<'a, T: Real> SSORPreconditioner<'a, T> {
    pub fn new(A: &'a Matrix<T>, omega: T) -> Result<Self> {
        if !(omega > T::zero() && omega < T::cast(2.0)) {
            return Err(LinAlgError::InvalidInput(format!(
                "SSOR preconditioner needs omega in (0, 2), got {}",
                omega
            )));
        }
        if !A.is_square_matrix() || !A.has_nonzero_diagonal() {
            return Err(LinAlgError::InvalidInput(
                "SSOR preconditioner needs a square matrix with nonzero diagonal".to_string(),
            ));
        }
        Ok(SSORPreconditioner { a: A, omega })
    }
}

impl<T: Real> Preconditioner<T> for SSORPreconditioner<'_, T> {
    fn apply(&self, r: &Vector<T>) -> Result<Vector<T>> {
        let A = self.a;
        let n = A.nrows();
        if r.len() != n {
            return Err(LinAlgError::DimensionMismatch {
                operation: "SSOR preconditioner",
                expected: (n, 1),
                found: r.shape(),
            });
        }
        let omega = self.omega;
        // (D/ω + L) y = r
        let mut y = vec![T::zero(); n];
        for i in 0..n {
            let row = A.row(i);
            let s: T = (0..i).map(|j| row[j] * y[j]).sum();
            y[i] = (r[i] - s) * omega / row[i];
        }
        // z = (D/ω) y
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = *yi * A[(i, i)] / omega;
        }
        // (D/ω + U) w = z
        let mut w = vec![T::zero(); n];
        for i in (0..n).rev() {
            let row = A.row(i);
            let s: T = (i + 1..n).map(|j| row[j] * w[j]).sum();
            w[i] = (y[i] - s) * omega / row[i];
        }
        let scale = (T::cast(2.0) - omega) / omega;
        Ok(Vector::new(w.into_iter().map(|v| v * scale).collect()))
    }
}

/// CG core with an arbitrary preconditioner; `method` only labels the solution
pub fn preconditioned_conjugate_gradient_with<T: Real, P: Preconditioner<T>>(
    A: &Matrix<T>,
    b: &Vector<T>,
    params: &SolverParams<T>,
    preconditioner: &P,
    method: Method,
) -> Result<Solution<T>> {
    params.validate()?;
    let n = check_system_shape(A, b, "conjugate gradient")?;
    if n == 0 {
        return Err(LinAlgError::InvalidInput("empty system".to_string()));
    }
    let tol = T::epsilon().sqrt() * A.max_abs();
    if !A.is_symmetric_matrix(tol) {
        return Err(LinAlgError::InvalidInput(
            "conjugate gradient needs a symmetric matrix".to_string(),
        ));
    }
    let start = Instant::now();
    let mut x = match &params.initial_guess {
        Some(x0) if x0.len() != n => {
            return Err(LinAlgError::DimensionMismatch {
                operation: "initial guess",
                expected: (n, 1),
                found: x0.shape(),
            });
        }
        Some(x0) => Vector::from_slice(x0.as_slice()),
        None => Vector::zeros(n),
    };
    info!(
        "{} on {}x{} system: tolerance {}, max iterations {}",
        method, n, n, params.tolerance, params.max_iterations
    );

    let mut r = residual(A, &x, b)?.as_column_vector();
    let mut monitor = ConvergenceMonitor::new(params, params.norm.measure(&r));
    let mut iterations = 0;
    let status = match monitor.initial_status() {
        Some(status) => status,
        None => {
            let mut z = preconditioner.apply(&r)?;
            let mut p = z.clone();
            let mut rz = r.dot(&z)?;
            loop {
                let q = A.try_mul_vector(&p)?;
                let pq = p.dot(&q)?;
                if !(pq > T::zero()) {
                    warn!("{}: non-positive curvature {} at iteration {}, matrix is not positive definite", method, pq, iterations + 1);
                    break SolverStatus::Diverged;
                }
                iterations += 1;
                let alpha = rz / pq;
                x.axpy(alpha, &p)?;
                r.axpy(-alpha, &q)?;
                if let Some(status) = monitor.check(iterations, params.norm.measure(&r)) {
                    break status;
                }
                z = preconditioner.apply(&r)?;
                let rz_new = r.dot(&z)?;
                let beta = rz_new / rz;
                p = Vector::from_fn(n, |i| z[i] + beta * p[i]);
                rz = rz_new;
            }
        }
    };
    let solution = Solution::new(method, x, status, iterations, monitor.into_history())
        .with_elapsed(start.elapsed());
    report_status(&method.to_string(), status, iterations, solution.residual);
    Ok(solution)
}

pub fn conjugate_gradient<T: Real>(A: &Matrix<T>, b: &Vector<T>, params: &SolverParams<T>) -> Result<Solution<T>> {
    preconditioned_conjugate_gradient_with(A, b, params, &IdentityPreconditioner, Method::ConjugateGradient)
}

/// PCG with the preconditioner chosen by `params.preconditioner`; the SSOR preconditioner
/// takes ω from `params.relaxation_factor` (1 when unset).
pub fn preconditioned_conjugate_gradient<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    params: &SolverParams<T>,
) -> Result<Solution<T>> {
    let method = Method::PreconditionedConjugateGradient;
    match params.preconditioner {
        PreconditionerKind::None => {
            preconditioned_conjugate_gradient_with(A, b, params, &IdentityPreconditioner, method)
        }
        PreconditionerKind::Jacobi => {
            let m = JacobiPreconditioner::new(A)?;
            preconditioned_conjugate_gradient_with(A, b, params, &m, method)
        }
        PreconditionerKind::SSOR => {
            let omega = params.relaxation_factor.unwrap_or_else(T::one);
            let m = SSORPreconditioner::new(A, omega)?;
            preconditioned_conjugate_gradient_with(A, b, params, &m, method)
        }
    }
}
