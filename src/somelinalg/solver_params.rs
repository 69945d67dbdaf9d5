//! Method selection, solver parameters and the solution record shared by all solvers.
use crate::Utils::random::DEFAULT_SEED;
use crate::Utils::stats::{Stats, StatsSummary};
use crate::Utils::task_parser::{Value, parse_document};
use crate::containers::{Real, Vector};
use crate::error::{LinAlgError, Result};
use crate::somelinalg::LU_factorization::LUFactorization;
use std::str::FromStr;
use std::time::Duration;
use strum_macros::{Display, EnumIter, EnumString};

/// Solution method for `solve(A, b, method, params)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Method {
    #[strum(to_string = "jacobi", serialize = "point_jacobi")]
    PointJacobi,
    /// weighted (over-relaxed) Jacobi: `(1-ω)·x + ω·JacobiUpdate`
    #[strum(to_string = "sorj", serialize = "sorpj", serialize = "weighted_jacobi")]
    SORJacobi,
    #[strum(to_string = "gauss_seidel", serialize = "gs")]
    GaussSeidel,
    #[strum(to_string = "symmetric_gauss_seidel", serialize = "sgs")]
    SymmetricGaussSeidel,
    /// Gauss-Seidel flavoured over-relaxation
    #[strum(to_string = "sor")]
    SOR,
    #[strum(to_string = "ssor")]
    SSOR,
    #[strum(to_string = "cg", serialize = "conjugate_gradient")]
    ConjugateGradient,
    #[strum(to_string = "pcg", serialize = "preconditioned_conjugate_gradient")]
    PreconditionedConjugateGradient,
    /// Doolittle LU, no pivoting
    #[strum(to_string = "lu", serialize = "doolittle")]
    LU,
    /// recursive block LU with Schur complement update, no pivoting
    #[strum(to_string = "lu_recursive", serialize = "recursive")]
    LURecursive,
    /// LU with partial pivoting
    #[strum(to_string = "lup")]
    LUP,
}

impl Method {
    pub fn is_direct(&self) -> bool {
        matches!(self, Method::LU | Method::LURecursive | Method::LUP)
    }

    pub fn is_krylov(&self) -> bool {
        matches!(
            self,
            Method::ConjugateGradient | Method::PreconditionedConjugateGradient
        )
    }

    pub fn is_stationary(&self) -> bool {
        !self.is_direct() && !self.is_krylov()
    }

    /// methods that take a relaxation factor ω
    pub fn is_relaxed(&self) -> bool {
        matches!(self, Method::SOR | Method::SSOR | Method::SORJacobi)
    }
}

/// norm used for the residual `b - A·x` in convergence checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ResidualNorm {
    #[default]
    #[strum(to_string = "l2")]
    L2,
    #[strum(to_string = "max", serialize = "absmax", serialize = "inf")]
    AbsoluteMax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum PreconditionerKind {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "jacobi")]
    Jacobi,
    #[strum(to_string = "ssor")]
    SSOR,
}

/// Outcome of a solve. Only `Converged` sets `Solution::converged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SolverStatus {
    Converged,
    MaxItersReached,
    /// residual became non-finite, grew past `divergence_factor` times the initial residual,
    /// or grew on `max_residual_growth` consecutive iterations
    Diverged,
    TimedOut,
}

/// Solver parameters. Fields not used by a method are ignored by it.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams<T> {
    /// absolute tolerance on the residual norm (on the eigenvalue change for eigen iterations)
    pub tolerance: T,
    pub max_iterations: usize,
    /// ω for SOR, SSOR, weighted Jacobi and the SSOR preconditioner
    pub relaxation_factor: Option<T>,
    /// grid points per dimension of a model problem, used to estimate the optimal ω
    pub mesh_dimensions: Option<Vec<usize>>,
    /// worker threads for the sweeps of stationary methods
    pub threads: usize,
    pub norm: ResidualNorm,
    pub preconditioner: PreconditionerKind,
    pub timeout: Option<Duration>,
    pub initial_guess: Option<Vector<T>>,
    /// reject systems that are not (weakly) diagonally dominant instead of warning
    pub require_diagonal_dominance: bool,
    /// |a_ii| at or below this value fails the pre-checks
    pub diagonal_threshold: T,
    pub divergence_factor: T,
    /// consecutive residual increases treated as divergence; 0 disables the check
    pub max_residual_growth: usize,
    /// block size of the recursive LU
    pub block_size: usize,
    /// shift σ of inverse power iteration
    pub shift: Option<T>,
    /// seed of the starting vector for eigen iterations
    pub seed: u64,
    pub loglevel: Option<String>,
}

impl<T: Real> Default for SolverParams<T> {
    fn default() -> Self {
        SolverParams {
            tolerance: T::cast(1e-6),
            max_iterations: 100,
            relaxation_factor: None,
            mesh_dimensions: None,
            threads: 1,
            norm: ResidualNorm::L2,
            preconditioner: PreconditionerKind::None,
            timeout: None,
            initial_guess: None,
            require_diagonal_dominance: false,
            diagonal_threshold: T::zero(),
            divergence_factor: T::cast(1e8),
            max_residual_growth: 25,
            block_size: 64,
            shift: None,
            seed: DEFAULT_SEED,
            loglevel: None,
        }
    }
}

impl<T: Real> SolverParams<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
    pub fn with_relaxation_factor(mut self, omega: T) -> Self {
        self.relaxation_factor = Some(omega);
        self
    }
    pub fn with_mesh_dimensions(mut self, mesh: Vec<usize>) -> Self {
        self.mesh_dimensions = Some(mesh);
        self
    }
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
    pub fn with_norm(mut self, norm: ResidualNorm) -> Self {
        self.norm = norm;
        self
    }
    pub fn with_preconditioner(mut self, preconditioner: PreconditionerKind) -> Self {
        self.preconditioner = preconditioner;
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn with_initial_guess(mut self, x0: Vector<T>) -> Self {
        self.initial_guess = Some(x0);
        self
    }
    pub fn with_diagonal_dominance_required(mut self, required: bool) -> Self {
        self.require_diagonal_dominance = required;
        self
    }
    pub fn with_divergence_factor(mut self, factor: T) -> Self {
        self.divergence_factor = factor;
        self
    }
    pub fn with_max_residual_growth(mut self, steps: usize) -> Self {
        self.max_residual_growth = steps;
        self
    }
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
    pub fn with_shift(mut self, shift: T) -> Self {
        self.shift = Some(shift);
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    pub fn with_loglevel(mut self, loglevel: &str) -> Self {
        self.loglevel = Some(loglevel.to_string());
        self
    }

    /// tolerance > 0, max_iterations >= 1, threads >= 1, ω in (0, 2), divergence factor > 1
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > T::zero()) || !self.tolerance.is_finite() {
            return Err(LinAlgError::InvalidInput(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations < 1 {
            return Err(LinAlgError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.threads < 1 {
            return Err(LinAlgError::InvalidInput(
                "threads must be at least 1".to_string(),
            ));
        }
        if let Some(omega) = self.relaxation_factor {
            if !(omega > T::zero() && omega < T::cast(2.0)) {
                return Err(LinAlgError::InvalidInput(format!(
                    "relaxation factor must lie in (0, 2), got {}",
                    omega
                )));
            }
        }
        if let Some(mesh) = &self.mesh_dimensions {
            if mesh.is_empty() || mesh.contains(&0) {
                return Err(LinAlgError::InvalidInput(format!(
                    "mesh dimensions must be non-empty and positive, got {:?}",
                    mesh
                )));
            }
        }
        if !(self.divergence_factor > T::one()) {
            return Err(LinAlgError::InvalidInput(format!(
                "divergence factor must exceed 1, got {}",
                self.divergence_factor
            )));
        }
        if self.diagonal_threshold < T::zero() {
            return Err(LinAlgError::InvalidInput(
                "diagonal threshold must be non-negative".to_string(),
            ));
        }
        if self.block_size < 1 {
            return Err(LinAlgError::InvalidInput(
                "block size must be at least 1".to_string(),
            ));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(LinAlgError::InvalidInput(
                    "timeout must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Read the `solver` section of a task document:
    /// ```text
    /// solver
    ///   method: sor
    ///   tolerance: 1e-8
    ///   max_iterations: 500
    ///   relaxation_factor: 1.5
    /// ```
    /// Recognised keys: method, tolerance, max_iterations, relaxation_factor, mesh, threads,
    /// norm, preconditioner, timeout_ms, initial_guess, diagonal_dominance, diagonal_threshold,
    /// divergence_factor, max_residual_growth, block_size, shift, seed, loglevel. Unknown sections or keys are a
    /// `ConfigError`. A missing method means LUP. The result is validated.
    pub fn from_document(input: &str) -> Result<(Method, SolverParams<T>)> {
        let document = parse_document(input)?;
        if let Some(other) = document.keys().find(|title| title.as_str() != "solver") {
            return Err(LinAlgError::ConfigError(format!(
                "unknown section '{}'",
                other
            )));
        }
        let section = document
            .get("solver")
            .ok_or_else(|| LinAlgError::ConfigError("missing section 'solver'".to_string()))?;

        let mut method = Method::LUP;
        let mut params = SolverParams::<T>::default();
        for (key, values) in section {
            match key.as_str() {
                "method" => method = parse_enum(key, values)?,
                "tolerance" => params.tolerance = T::cast(single_f64(key, values)?),
                "max_iterations" => params.max_iterations = single_usize(key, values)?,
                "relaxation_factor" => {
                    params.relaxation_factor = Some(T::cast(single_f64(key, values)?))
                }
                "mesh" => {
                    params.mesh_dimensions = Some(
                        values
                            .iter()
                            .map(|v| as_usize(key, v))
                            .collect::<Result<Vec<usize>>>()?,
                    )
                }
                "threads" => params.threads = single_usize(key, values)?,
                "norm" => params.norm = parse_enum(key, values)?,
                "preconditioner" => params.preconditioner = parse_enum(key, values)?,
                "timeout_ms" => {
                    params.timeout = Some(Duration::from_millis(single_usize(key, values)? as u64))
                }
                "initial_guess" => {
                    let x0 = values
                        .iter()
                        .map(|v| as_f64(key, v).map(T::cast))
                        .collect::<Result<Vec<T>>>()?;
                    params.initial_guess = Some(Vector::new(x0));
                }
                "diagonal_dominance" => params.require_diagonal_dominance = single_bool(key, values)?,
                "diagonal_threshold" => params.diagonal_threshold = T::cast(single_f64(key, values)?),
                "divergence_factor" => params.divergence_factor = T::cast(single_f64(key, values)?),
                "max_residual_growth" => params.max_residual_growth = single_usize(key, values)?,
                "block_size" => params.block_size = single_usize(key, values)?,
                "shift" => params.shift = Some(T::cast(single_f64(key, values)?)),
                "seed" => params.seed = single_usize(key, values)? as u64,
                "loglevel" => params.loglevel = Some(single(key, values)?.to_string()),
                other => {
                    return Err(LinAlgError::ConfigError(format!("unknown key '{}'", other)));
                }
            }
        }
        params.validate()?;
        Ok((method, params))
    }
}

fn single<'a>(key: &str, values: &'a [Value]) -> Result<&'a Value> {
    match values {
        [v] => Ok(v),
        _ => Err(LinAlgError::ConfigError(format!(
            "key '{}' expects exactly one value, got {}",
            key,
            values.len()
        ))),
    }
}

fn as_f64(key: &str, v: &Value) -> Result<f64> {
    v.as_f64()
        .ok_or_else(|| LinAlgError::ConfigError(format!("key '{}': '{}' is not a number", key, v)))
}

fn as_usize(key: &str, v: &Value) -> Result<usize> {
    v.as_usize().ok_or_else(|| {
        LinAlgError::ConfigError(format!(
            "key '{}': '{}' is not a non-negative integer",
            key, v
        ))
    })
}

fn single_f64(key: &str, values: &[Value]) -> Result<f64> {
    as_f64(key, single(key, values)?)
}

fn single_usize(key: &str, values: &[Value]) -> Result<usize> {
    as_usize(key, single(key, values)?)
}

fn single_bool(key: &str, values: &[Value]) -> Result<bool> {
    let v = single(key, values)?;
    v.as_bool()
        .ok_or_else(|| LinAlgError::ConfigError(format!("key '{}': '{}' is not a boolean", key, v)))
}

fn parse_enum<E: FromStr>(key: &str, values: &[Value]) -> Result<E> {
    let text = single(key, values)?.to_string();
    E::from_str(&text)
        .map_err(|_| LinAlgError::ConfigError(format!("key '{}': unknown value '{}'", key, text)))
}

/// Result of one solve. Created once per call and not modified afterwards.
#[derive(Debug, Clone)]
pub struct Solution<T> {
    pub method: Method,
    pub x: Vector<T>,
    /// final residual norm in the norm chosen by the parameters
    pub residual: T,
    pub iterations: usize,
    pub converged: bool,
    pub status: SolverStatus,
    /// residual norm before the first iteration followed by one entry per iteration
    pub residual_history: Vec<T>,
    /// L, U and P of the direct methods
    pub factorization: Option<LUFactorization<T>>,
    pub elapsed: Duration,
}

impl<T: Real> Solution<T> {
    pub fn new(
        method: Method,
        x: Vector<T>,
        status: SolverStatus,
        iterations: usize,
        residual_history: Vec<T>,
    ) -> Solution<T> {
        let residual = residual_history.last().copied().unwrap_or_else(T::zero);
        Solution {
            method,
            x,
            residual,
            iterations,
            converged: status == SolverStatus::Converged,
            status,
            residual_history,
            factorization: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_factorization(mut self, factorization: LUFactorization<T>) -> Self {
        self.factorization = Some(factorization);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// descriptive statistics of the residual history
    pub fn residual_summary(&self) -> Result<StatsSummary<T>> {
        Ok(Stats::new(&self.residual_history)?.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_method_names_round_trip() {
        for method in Method::iter() {
            let name = method.to_string();
            assert_eq!(Method::from_str(&name).unwrap(), method);
        }
        assert_eq!(Method::from_str("SORPJ").unwrap(), Method::SORJacobi);
        assert_eq!(Method::from_str("Gauss_Seidel").unwrap(), Method::GaussSeidel);
        assert!(Method::from_str("bicgstab").is_err());
        assert!(Method::SOR.is_relaxed() && Method::SOR.is_stationary());
        assert!(Method::LUP.is_direct() && !Method::LUP.is_stationary());
    }

    #[test]
    fn test_defaults_and_validation() {
        let p = SolverParams::<f64>::default();
        assert_eq!(p.tolerance, 1e-6);
        assert_eq!(p.max_iterations, 100);
        assert_eq!(p.threads, 1);
        assert_eq!(p.seed, 42);
        assert_eq!(p.max_residual_growth, 25);
        assert!(p.validate().is_ok());
        assert!(p.clone().with_tolerance(0.0).validate().is_err());
        assert!(p.clone().with_max_iterations(0).validate().is_err());
        assert!(p.clone().with_threads(0).validate().is_err());
        assert!(p.clone().with_relaxation_factor(2.0).validate().is_err());
        assert!(p.clone().with_relaxation_factor(1.9).validate().is_ok());
        assert!(p.clone().with_mesh_dimensions(vec![]).validate().is_err());
        assert!(p.with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_from_document() {
        let doc = "
        solver
          method: sor
          tolerance: 1e-8
          max_iterations: 500
          relaxation_factor: 1.5
          norm: max
          threads: 4
          timeout_ms: 2000
          initial_guess: 0, 0.5, 1
          max_residual_growth: 0
          loglevel: warn
        ";
        let (method, params) = SolverParams::<f64>::from_document(doc).unwrap();
        assert_eq!(method, Method::SOR);
        assert_eq!(params.tolerance, 1e-8);
        assert_eq!(params.max_iterations, 500);
        assert_eq!(params.relaxation_factor, Some(1.5));
        assert_eq!(params.norm, ResidualNorm::AbsoluteMax);
        assert_eq!(params.threads, 4);
        assert_eq!(params.timeout, Some(Duration::from_millis(2000)));
        assert_eq!(
            params.initial_guess.unwrap().as_slice(),
            &[0.0, 0.5, 1.0]
        );
        assert_eq!(params.max_residual_growth, 0);
        assert_eq!(params.loglevel.as_deref(), Some("warn"));
    }

    #[test]
    fn test_from_document_errors() {
        let unknown_key = "solver method: cg speed: 3";
        assert!(matches!(
            SolverParams::<f64>::from_document(unknown_key),
            Err(LinAlgError::ConfigError(_))
        ));
        let bad_method = "solver method: bicgstab";
        assert!(SolverParams::<f64>::from_document(bad_method).is_err());
        let unknown_section = "output report: true";
        assert!(SolverParams::<f64>::from_document(unknown_section).is_err());
        // parsed fine, rejected by validation
        let bad_omega = "solver method: sor relaxation_factor: 2.5";
        assert!(matches!(
            SolverParams::<f64>::from_document(bad_omega),
            Err(LinAlgError::InvalidInput(_))
        ));
        let (method, _) = SolverParams::<f64>::from_document("solver tolerance: 1e-3").unwrap();
        assert_eq!(method, Method::LUP);
    }

    #[test]
    fn test_solution_flags() {
        let s = Solution::new(
            Method::PointJacobi,
            Vector::new(vec![1.0]),
            SolverStatus::MaxItersReached,
            100,
            vec![1.0, 0.5],
        );
        assert!(!s.converged);
        assert_eq!(s.residual, 0.5);
        let summary = s.residual_summary().unwrap();
        assert_eq!(summary.count, 2);
    }
}
