//! Core compute primitives (Vector, Matrix).
//!
//! These types provide the foundation for all regressors in the crate.

mod cholesky;
mod matrix;
mod vector;

pub use cholesky::Cholesky;
pub use matrix::Matrix;
pub use vector::Vector;
