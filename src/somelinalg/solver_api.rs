//! Unified entry point `solve(A, b, method, params)` and the `LinearSolver` driver:
//! the driver owns the system, reads its settings from a task document, installs the
//! logger, times the phases and keeps the calculation statistics of the last solve.
//! # Example
//! ```
//! use RustedLinSolve::containers::{Matrix, Vector};
//! use RustedLinSolve::somelinalg::solver_api::LinearSolver;
//! let A = Matrix::from_rows(vec![vec![4.0, 1.0], vec![1.0, 3.0]]).unwrap();
//! let b = Vector::new(vec![1.0, 2.0]);
//! let mut solver = LinearSolver::new();
//! solver.from_document("solver\n method: cg\n tolerance: 1e-10\n loglevel: off").unwrap();
//! solver.set_system(A, b).unwrap();
//! let solution = solver.solve().unwrap();
//! assert!(solution.converged);
//! ```
use crate::Utils::logger::{default_log_file_name, init_logger};
use crate::Utils::timer::SolverTimer;
use crate::containers::{Matrix, Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::somelinalg::LU_factorization::{LUFactorization, lu_doolittle, lu_recursive, lup_factorize};
use crate::somelinalg::conjugate_gradient::{conjugate_gradient, preconditioned_conjugate_gradient};
use crate::somelinalg::linear_sys_diagnostics::{check_system_shape, residual_norm};
use crate::somelinalg::relaxation_methods::relaxation_solve;
use crate::somelinalg::solver_params::{Method, Solution, SolverParams, SolverStatus};
use log::{info, warn};
use std::collections::HashMap;
use tabled::{builder::Builder, settings::Style};

pub use crate::somelinalg::power_iteration::{
    EigenPair, inverse_power_iteration, power_iteration, rayleigh_quotient_iteration,
};

/// factorization used by a direct method
pub fn factorize_with<T: Real>(A: &Matrix<T>, method: Method, block_size: usize) -> Result<LUFactorization<T>> {
    match method {
        Method::LU => lu_doolittle(A),
        Method::LURecursive => lu_recursive(A, block_size),
        Method::LUP => lup_factorize(A),
        other => Err(LinAlgError::InvalidInput(format!(
            "{} is not a direct method",
            other
        ))),
    }
}

fn direct_solve<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    method: Method,
    params: &SolverParams<T>,
    timer: &mut SolverTimer,
) -> Result<Solution<T>> {
    params.validate()?;
    check_system_shape(A, b, "direct solve")?;
    timer.factorization_tic();
    let factorization = factorize_with(A, method, params.block_size);
    timer.factorization_tac();
    let factorization = factorization?;
    timer.iterations_tic();
    let x = factorization.solve(b);
    timer.iterations_tac();
    let x = x?;
    let r = residual_norm(A, &x, b, params.norm)?;
    if r > params.tolerance {
        warn!("{}: residual {} of the direct solve exceeds the tolerance {}", method, r, params.tolerance);
    }
    info!("{} solved {}x{} system, residual {}", method, A.nrows(), A.ncols(), r);
    Ok(Solution::new(method, x, SolverStatus::Converged, 1, vec![r])
        .with_factorization(factorization)
        .with_elapsed(timer.total()))
}

fn dispatch<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    method: Method,
    params: &SolverParams<T>,
    timer: &mut SolverTimer,
) -> Result<Solution<T>> {
    if method.is_direct() {
        return direct_solve(A, b, method, params, timer);
    }
    timer.iterations_tic();
    let solution = match method {
        Method::ConjugateGradient => conjugate_gradient(A, b, params),
        Method::PreconditionedConjugateGradient => preconditioned_conjugate_gradient(A, b, params),
        _ => relaxation_solve(A, b, method, params),
    };
    timer.iterations_tac();
    solution
}

/// Solve A·x = b with the given method.
/// Direct methods report one iteration, status `Converged` and carry their factorization.
/// Iterative methods report non-convergence through `Solution::status`; errors are kept for
/// invalid input, shape mismatch and singular pivots.
pub fn solve<T: Real>(
    A: &Matrix<T>,
    b: &Vector<T>,
    method: Method,
    params: &SolverParams<T>,
) -> Result<Solution<T>> {
    let mut timer = SolverTimer::new();
    dispatch(A, b, method, params, &mut timer)
}

/// Driver around [`solve`] in the manner of a solver instance: set the system and the
/// parameters, call `solve`, then read the result and the statistics.
pub struct LinearSolver<T> {
    pub A: Option<Matrix<T>>,
    pub b: Option<Vector<T>>,
    pub method: Method,
    pub params: SolverParams<T>,
    /// also write the log to this file; `Some("")` means a time-stamped default name
    pub log_file: Option<String>,
    result: Option<Solution<T>>,
    custom_timer: SolverTimer,
    calc_statistics: HashMap<String, usize>,
}

impl<T: Real> Default for LinearSolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> LinearSolver<T> {
    pub fn new() -> LinearSolver<T> {
        LinearSolver {
            A: None,
            b: None,
            method: Method::LUP,
            params: SolverParams::default(),
            log_file: None,
            result: None,
            custom_timer: SolverTimer::new(),
            calc_statistics: HashMap::new(),
        }
    }

    pub fn set_system(&mut self, A: Matrix<T>, b: Vector<T>) -> Result<()> {
        check_system_shape(&A, &b, "set system")?;
        self.A = Some(A);
        self.b = Some(b);
        self.result = None;
        Ok(())
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_params(&mut self, params: SolverParams<T>) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_log_file(&mut self, log_file: Option<String>) {
        self.log_file = log_file;
    }

    /// method and parameters from the `solver` section of a task document
    pub fn from_document(&mut self, document: &str) -> Result<()> {
        let (method, params) = SolverParams::from_document(document)?;
        self.method = method;
        self.params = params;
        Ok(())
    }

    fn solver(&mut self) -> Result<&Solution<T>> {
        let (A, b) = match (&self.A, &self.b) {
            (Some(A), Some(b)) => (A, b),
            _ => {
                return Err(LinAlgError::InvalidInput(
                    "system is not set, call set_system first".to_string(),
                ));
            }
        };
        self.custom_timer.start();
        let solution = dispatch(A, b, self.method, &self.params, &mut self.custom_timer)?;
        self.custom_timer.get_all();
        self.calc_statistics.clear();
        self.calc_statistics.insert("number of unknowns".to_string(), A.nrows());
        self.calc_statistics.insert("number of iterations".to_string(), solution.iterations);
        self.calc_statistics
            .insert("converged".to_string(), usize::from(solution.converged));
        self.calc_statistics
            .insert("threads".to_string(), self.params.threads);
        self.calc_statistics
            .insert("time elapsed, ms".to_string(), solution.elapsed.as_millis() as usize);
        self.calc_statistics();
        Ok(&*self.result.insert(solution))
    }

    /// Wrapper around the solve that installs the logger from `params.loglevel`
    /// ("off"/"none" disables it, unset means info).
    pub fn solve(&mut self) -> Result<&Solution<T>> {
        let loglevel = self.params.loglevel.clone().unwrap_or_else(|| "info".to_string());
        let log_file = self.log_file.as_ref().map(|name| {
            if name.is_empty() { default_log_file_name() } else { name.clone() }
        });
        if init_logger(&loglevel, log_file.as_deref())? {
            info!("program started with loglevel: {}", loglevel);
        }
        self.solver()
    }

    pub fn get_result(&self) -> Option<&Solution<T>> {
        self.result.as_ref()
    }

    pub fn get_statistics(&self) -> &HashMap<String, usize> {
        &self.calc_statistics
    }

    fn calc_statistics(&self) {
        let mut table = Builder::from(self.calc_statistics.clone()).build();
        table.with(Style::modern_rounded());
        info!("\n \n CALC STATISTICS \n \n {}", table.to_string());
    }

    /// calculation statistics and the residual history summary of the last solve as text tables
    pub fn report(&self) -> Result<String> {
        let solution = self.result.as_ref().ok_or_else(|| {
            LinAlgError::InvalidInput("no solution yet, call solve first".to_string())
        })?;
        let mut report = format!(
            "method: {}, status: {}, iterations: {}, residual: {}\n",
            solution.method, solution.status, solution.iterations, solution.residual
        );
        let mut table = Builder::from(self.calc_statistics.clone()).build();
        table.with(Style::modern_rounded());
        report.push_str(&table.to_string());
        report.push('\n');
        match solution.residual_summary() {
            Ok(summary) => report.push_str(&summary.to_table("residual history")),
            Err(e) => warn!("no residual summary: {}", e),
        }
        Ok(report)
    }
}
