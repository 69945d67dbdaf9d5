//! dense owning containers: `Matrix<T>` and `Vector<T>` over a generic real scalar
/// numeric trait the containers and solvers are generic over
pub mod numeric;
/// dense row-major matrix
pub mod matrix;
/// dense vector with row/column orientation tag
pub mod vector;
/// structural predicates (square, symmetric, triangular, permutation, ...)
pub mod predicates;

pub use matrix::Matrix;
pub use numeric::Real;
pub use vector::{Orientation, Vector};
