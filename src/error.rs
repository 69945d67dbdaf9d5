//! error types shared by containers, factorizations and solvers
use std::fmt;

/// Error types for linear algebra operations.
///
/// Numerical non-convergence is not an error: iterative solvers report it through
/// [`crate::somelinalg::solver_params::SolverStatus`] on the returned solution.
#[derive(Debug, Clone, PartialEq)]
pub enum LinAlgError {
    /// operand shapes are incompatible for `operation`
    DimensionMismatch {
        operation: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// element access outside of the container
    IndexOutOfRange {
        index: (usize, usize),
        bounds: (usize, usize),
    },
    /// zero pivot met during factorization (pivot column index)
    SingularMatrix { pivot: usize },
    /// precondition of an algorithm is violated
    InvalidInput(String),
    /// malformed textual configuration
    ConfigError(String),
}

impl fmt::Display for LinAlgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinAlgError::DimensionMismatch {
                operation,
                expected,
                found,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {}x{}, found {}x{}",
                operation, expected.0, expected.1, found.0, found.1
            ),
            LinAlgError::IndexOutOfRange { index, bounds } => write!(
                f,
                "Index ({}, {}) out of range for shape {}x{}",
                index.0, index.1, bounds.0, bounds.1
            ),
            LinAlgError::SingularMatrix { pivot } => {
                write!(f, "Matrix is singular: zero pivot in column {}", pivot)
            }
            LinAlgError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            LinAlgError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LinAlgError {}

pub type Result<T> = std::result::Result<T, LinAlgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = LinAlgError::DimensionMismatch {
            operation: "matrix addition",
            expected: (2, 2),
            found: (3, 2),
        };
        assert_eq!(
            e.to_string(),
            "Dimension mismatch in matrix addition: expected 2x2, found 3x2"
        );
        let e = LinAlgError::SingularMatrix { pivot: 1 };
        assert!(e.to_string().contains("column 1"));
        let e = LinAlgError::InvalidInput("omega = 2.5".to_string());
        assert_eq!(e.to_string(), "Invalid input: omega = 2.5");
    }
}
