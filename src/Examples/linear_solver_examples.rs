use crate::Utils::random::Randomiser;
use crate::containers::{Matrix, Vector};
use crate::error::Result;
use crate::lazy::{LazyMatrix, MatrixExpression, VectorExpression, residual};
use crate::somelinalg::LU_factorization::lup_factorize;
use crate::somelinalg::linear_sys_diagnostics::{condition_number, linear_system_diagnostics};
use crate::somelinalg::model_problems::{hilbert_matrix, poisson_1d, poisson_2d};
use crate::somelinalg::solver_api::{
    LinearSolver, inverse_power_iteration, power_iteration, rayleigh_quotient_iteration, solve,
};
use crate::somelinalg::solver_params::{Method, PreconditionerKind, SolverParams};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use tabled::{builder::Builder, settings::Style};

pub fn linear_solver_examples(example: usize) -> Result<()> {
    match example {
        0 => {
            // LUP factorization: P·A = L·U
            let A = Matrix::from_rows(vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 10.0],
            ])?;
            let lu = lup_factorize(&A)?;
            println!("L = \n{}", lu.l);
            println!("U = \n{}", lu.u);
            println!("P = \n{}", lu.p());
            println!("det(A) = {}", lu.determinant());
            let b = Vector::new(vec![1.0, 1.0, 1.0]);
            let x = lu.solve(&b)?;
            println!("x = {}", x);
            println!("A^-1 = \n{}", lu.inverse()?);
        }
        1 => {
            // every method on the 2D Poisson problem, iterations to convergence
            let (nx, ny) = (8, 8);
            let A: Matrix<f64> = poisson_2d(nx, ny);
            let b = Vector::from_elem(nx * ny, 1.0);
            let params = SolverParams::default()
                .with_tolerance(1e-8)
                .with_max_iterations(10_000)
                .with_mesh_dimensions(vec![nx, ny])
                .with_preconditioner(PreconditionerKind::SSOR);
            let mut iterations: HashMap<String, String> = HashMap::new();
            for method in Method::iter() {
                let solution = solve(&A, &b, method, &params)?;
                iterations.insert(
                    method.to_string(),
                    format!(
                        "{} iterations, {}, residual {:.3e}",
                        solution.iterations, solution.status, solution.residual
                    ),
                );
            }
            let mut table = Builder::from(iterations).build();
            table.with(Style::modern_rounded());
            println!("{}", table);
        }
        2 => {
            // solver configured by a task document
            let input = r#"
                solver
                method: sor
                tolerance: 1e-10
                max_iterations: 2000
                mesh: 31
                threads: 2
                loglevel: info
                "#;
            let mut solver = LinearSolver::new();
            solver.from_document(input)?;
            solver.set_system(poisson_1d::<f64>(31), Vector::from_elem(31, 1.0))?;
            let solution = solver.solve()?;
            println!("x = {}", solution.x);
            println!("{}", solver.report()?);
        }
        3 => {
            // eigenvalues of the 1D Poisson matrix: 2 - 2cos(kπ/(n+1))
            let n = 10;
            let A: Matrix<f64> = poisson_1d(n);
            let params = SolverParams::default().with_tolerance(1e-12).with_max_iterations(10_000);
            let largest = power_iteration(&A, &params)?;
            let smallest = inverse_power_iteration(&A, &params)?;
            let near_one = rayleigh_quotient_iteration(&A, &params.clone().with_shift(1.0))?;
            let exact = |k: usize| 2.0 - 2.0 * (k as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos();
            println!("largest: {} (exact {}), {} iterations", largest.eigenvalue, exact(n), largest.iterations);
            println!("smallest: {} (exact {}), {} iterations", smallest.eigenvalue, exact(1), smallest.iterations);
            println!("near 1: {}, {} iterations", near_one.eigenvalue, near_one.iterations);
        }
        4 => {
            // conditioning: Hilbert matrices
            for n in [3, 6, 9, 12] {
                let H: Matrix<f64> = hilbert_matrix(n);
                let b = Vector::from_elem(n, 1.0);
                println!(
                    "n = {}, cond = {:.3e}, well posed = {}",
                    n,
                    condition_number(&H)?,
                    linear_system_diagnostics(&H, &b, 1e10)?
                );
            }
        }
        5 => {
            // lazy expressions: nothing is allocated until evaluation
            let mut rnd = Randomiser::new(7);
            let A: Matrix<f64> = rnd.diagonally_dominant_matrix(5);
            let x: Vector<f64> = rnd.vector(5, -1.0, 1.0);
            let b = &A * &x;
            let r = residual(&A, &x, &b)?;
            println!("‖b - A·x‖ = {:e}", r.norm_l2());
            let shifted = LazyMatrix::from_fn(5, 5, |i, j| if i == j { 1.0 } else { 0.0 });
            let sum = (&A).plus(&shifted)?;
            println!("A + I = \n{}", sum.to_matrix());
        }
        _ => {
            println!("no example with number {}", example);
        }
    }
    Ok(())
}
