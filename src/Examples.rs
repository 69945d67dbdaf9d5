//! examples of usage of RustedLinSolve
/// LU factorization, relaxation and Krylov solvers, eigenvalue iterations, diagnostics
pub mod linear_solver_examples;
