//! Lazy expression layer: elements are computed on demand and nothing is allocated
//! until an expression is assigned into a concrete container (`evaluate_into`) or
//! materialized explicitly (`to_matrix`, `as_row_vector`, `as_column_vector`).
//!
//! ```
//! use RustedLinSolve::containers::{Matrix, Vector};
//! use RustedLinSolve::lazy::{residual, VectorExpression};
//!
//! let a = Matrix::from_rows(vec![vec![4.0, 1.0], vec![2.0, 3.0]]).unwrap();
//! let x = Vector::new(vec![1.0, 1.0]);
//! let b = Vector::new(vec![5.0, 5.0]);
//! // b - A·x evaluated element by element, no temporary vector
//! let r = residual(&a, &x, &b).unwrap();
//! assert_eq!(r.norm_l2(), 0.0);
//! ```
/// expression traits and their implementations for concrete containers
pub mod expression;
/// `LazyMatrix`, `LazyVector` and their mutable proxies
pub mod lazy_containers;
/// elementwise binary and scalar nodes
pub mod elementwise;
/// container-level nodes: products and transpose
pub mod container;

pub use container::{ContainerExpression, TransposeExpression, residual};
pub use elementwise::{ElementwiseExpression, ElementwiseOp, MapExpression};
pub use expression::{MatrixExpression, VectorExpression};
pub use lazy_containers::{LazyMatrix, LazyMatrixMut, LazyVector, LazyVectorMut};
