// cross-method tests of the solver family: every method against the direct solution,
// convergence statuses, parameters read from task documents
use crate::Utils::random::Randomiser;
use crate::containers::{Matrix, Vector};
use crate::lazy::{VectorExpression, residual};
use crate::somelinalg::model_problems::{hilbert_matrix, poisson_1d, poisson_2d};
use crate::somelinalg::solver_api::{LinearSolver, power_iteration, solve};
use crate::somelinalg::solver_params::{Method, PreconditionerKind, ResidualNorm, SolverParams, SolverStatus};
use approx::assert_relative_eq;
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;

#[test]
fn every_method_solves_an_spd_dominant_system() {
    let n = 16;
    let mut rnd = Randomiser::new(11);
    let A: Matrix<f64> = rnd.spd_matrix(n);
    let x_true: Vector<f64> = rnd.vector(n, -1.0, 1.0);
    let b = &A * &x_true;
    let params = SolverParams::default()
        .with_tolerance(1e-10)
        .with_max_iterations(5000)
        .with_block_size(5);
    let direct = solve(&A, &b, Method::LUP, &params).unwrap();
    for method in Method::iter() {
        let sol = solve(&A, &b, method, &params).unwrap();
        assert!(sol.converged, "{} did not converge: {:?}", method, sol.status);
        assert_relative_eq!(sol.x, direct.x, epsilon = 1e-7);
        let r = residual(&A, &sol.x, &b).unwrap();
        assert!(r.norm_l2() < 1e-7, "{} residual {}", method, r.norm_l2());
    }
}

#[test]
fn cg_agrees_with_lu_on_poisson_2d() {
    let A: Matrix<f64> = poisson_2d(5, 4);
    let b = Vector::from_fn(20, |i| (i as f64 * 0.3).sin());
    let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(20);
    let cg = solve(&A, &b, Method::ConjugateGradient, &params).unwrap();
    let lu = solve(&A, &b, Method::LU, &params).unwrap();
    assert!(cg.converged);
    assert!(cg.iterations <= 20);
    assert_relative_eq!(cg.x, lu.x, epsilon = 1e-9);
}

#[test]
fn gauss_seidel_needs_no_more_iterations_than_jacobi() {
    let A: Matrix<f64> = poisson_1d(10);
    let b = Vector::from_elem(10, 1.0);
    let params = SolverParams::default().with_tolerance(1e-8).with_max_iterations(5000);
    let jacobi = solve(&A, &b, Method::PointJacobi, &params).unwrap();
    let gs = solve(&A, &b, Method::GaussSeidel, &params).unwrap();
    let sgs = solve(&A, &b, Method::SymmetricGaussSeidel, &params).unwrap();
    assert!(jacobi.converged && gs.converged && sgs.converged);
    assert!(gs.iterations <= jacobi.iterations);
    assert!(sgs.iterations <= jacobi.iterations);
}

#[test]
fn jacobi_small_dominant_system_from_zero_guess() {
    let A = Matrix::from_rows(vec![
        vec![10.0, 1.0, 1.0],
        vec![1.0, 10.0, 1.0],
        vec![1.0, 1.0, 10.0],
    ])
    .unwrap();
    let b = Vector::new(vec![12.0, 12.0, 12.0]);
    let method = Method::from_str("jacobi").unwrap();
    let params = SolverParams::default().with_max_iterations(50);
    let sol = solve(&A, &b, method, &params).unwrap();
    assert!(sol.converged);
    assert!(sol.residual < 1e-6);
    assert!(sol.iterations <= 50);
    let summary = sol.residual_summary().unwrap();
    assert_eq!(summary.count, sol.iterations + 1);
    assert_relative_eq!(summary.max, sol.residual_history[0]);
}

#[test]
fn absolute_max_norm_is_used_for_convergence() {
    let A: Matrix<f64> = poisson_1d(8);
    let b = Vector::from_elem(8, 1.0);
    let params = SolverParams::default()
        .with_tolerance(1e-9)
        .with_max_iterations(2000)
        .with_norm(ResidualNorm::AbsoluteMax);
    let sol = solve(&A, &b, Method::GaussSeidel, &params).unwrap();
    assert!(sol.converged);
    let r = residual(&A, &sol.x, &b).unwrap();
    assert_relative_eq!(sol.residual, r.norm_max(), epsilon = 1e-15);
    assert!(r.norm_max() < 1e-9);
}

#[test]
fn divergence_and_timeout_are_statuses() {
    let A = Matrix::from_rows(vec![vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
    let b = Vector::new(vec![1.0, 0.0]);
    let params = SolverParams::default()
        .with_max_iterations(10_000)
        .with_divergence_factor(1e4);
    let sol = solve(&A, &b, Method::GaussSeidel, &params).unwrap();
    assert_eq!(sol.status, SolverStatus::Diverged);
    assert!(!sol.converged);

    let n = 300;
    let big: Matrix<f64> = poisson_1d(n);
    let rhs = Vector::from_elem(n, 1.0);
    let params = SolverParams::default()
        .with_tolerance(1e-14)
        .with_max_iterations(usize::MAX)
        .with_timeout(Duration::from_millis(5));
    let sol = solve(&big, &rhs, Method::PointJacobi, &params).unwrap();
    assert_eq!(sol.status, SolverStatus::TimedOut);
    assert!(sol.iterations >= 1);
}

#[test]
fn preconditioned_cg_with_ssor_from_document() {
    let doc = "solver\n method: pcg\n preconditioner: ssor\n relaxation_factor: 1.2\n tolerance: 1e-10\n max_iterations: 100\n loglevel: off";
    let (method, params) = SolverParams::<f64>::from_document(doc).unwrap();
    assert_eq!(method, Method::PreconditionedConjugateGradient);
    assert_eq!(params.preconditioner, PreconditionerKind::SSOR);
    let A: Matrix<f64> = poisson_2d(4, 4);
    let b = Vector::from_elem(16, 1.0);
    let sol = solve(&A, &b, method, &params).unwrap();
    assert!(sol.converged);
    let lu = solve(&A, &b, Method::LUP, &params).unwrap();
    assert_relative_eq!(sol.x, lu.x, epsilon = 1e-8);
}

#[test]
fn sor_driver_with_mesh_from_document() {
    let n = 15;
    let mut solver = LinearSolver::new();
    solver
        .from_document(&format!(
            "solver\n method: sor\n mesh: {}\n tolerance: 1e-9\n max_iterations: 1000\n threads: 2\n loglevel: off",
            n
        ))
        .unwrap();
    solver.set_system(poisson_1d::<f64>(n), Vector::from_elem(n, 1.0)).unwrap();
    let sol = solver.solve().unwrap().clone();
    assert!(sol.converged);
    // exact solution of tridiag(-1, 2, -1) x = 1: x_i = (i+1)(n-i)/2
    let exact = Vector::from_fn(n, |i| ((i + 1) * (n - i)) as f64 / 2.0);
    assert_relative_eq!(sol.x, exact, epsilon = 1e-7);
    assert_eq!(solver.get_statistics()["threads"], 2);
}

#[test]
fn hilbert_system_direct_vs_iterative() {
    // ill-conditioned but SPD: LUP stays accurate, CG converges in residual
    let n = 6;
    let A: Matrix<f64> = hilbert_matrix(n);
    let x_true = Vector::from_elem(n, 1.0);
    let b = &A * &x_true;
    let lup = solve(&A, &b, Method::LUP, &SolverParams::default()).unwrap();
    assert_relative_eq!(lup.x, x_true, epsilon = 1e-6);
    let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(200);
    let cg = solve(&A, &b, Method::ConjugateGradient, &params).unwrap();
    assert!(cg.converged);
    assert!(cg.residual < 1e-12);
}

#[test]
fn single_precision_solvers() {
    let A: Matrix<f32> = poisson_1d(6);
    let b = Vector::from_elem(6, 1.0f32);
    let params = SolverParams::<f32>::default().with_tolerance(1e-4).with_max_iterations(500);
    let cg = solve(&A, &b, Method::ConjugateGradient, &params).unwrap();
    let gs = solve(&A, &b, Method::GaussSeidel, &params).unwrap();
    assert!(cg.converged && gs.converged);
    let exact = Vector::from_fn(6, |i| ((i + 1) * (6 - i)) as f32 / 2.0);
    assert_relative_eq!(cg.x, exact, epsilon = 1e-2);
    assert_relative_eq!(gs.x, exact, epsilon = 1e-2);
}

#[test]
fn power_iteration_on_poisson_matches_analytic_eigenvalue() {
    let n = 8;
    let A: Matrix<f64> = poisson_1d(n);
    let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(5000);
    let pair = power_iteration(&A, &params).unwrap();
    assert!(pair.converged);
    let lambda_max = 2.0 - 2.0 * (n as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos();
    assert_relative_eq!(pair.eigenvalue, lambda_max, epsilon = 1e-6);
}
