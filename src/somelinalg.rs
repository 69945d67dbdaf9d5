//! dense linear solvers: LU family, stationary relaxation methods, conjugate gradient,
//! eigenvalue iterations and the unified `solve` entry point
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// Doolittle, recursive block and partially pivoted LU factorizations with substitution
pub mod LU_factorization;
/// CG and preconditioned CG for symmetric positive definite systems
pub mod conjugate_gradient;
/// diagnostics for linear systems and matrices: pre-checks, residual norms, convergence
/// monitoring, condition number
pub mod linear_sys_diagnostics;
/// well-known test matrices (Hilbert, Poisson)
pub mod model_problems;
/// power, inverse power and Rayleigh quotient iteration
pub mod power_iteration;
/// Jacobi, weighted Jacobi, Gauss-Seidel, SOR, SSOR
pub mod relaxation_methods;
/// `solve(A, b, method, params)` and the `LinearSolver` driver
pub mod solver_api;
/// method, status and parameter types shared by all solvers
pub mod solver_params;

#[cfg(test)]
mod solvers_tests;
