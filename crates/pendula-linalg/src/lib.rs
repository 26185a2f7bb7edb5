//! # pendula-linalg
//!
//! Dense linear solving for the small systems that come out of a pendulum
//! chain's equations of motion.
//!
//! This crate provides:
//! - A row-major dense matrix over any `num_traits::Float`
//! - Gauss-Jordan elimination of augmented matrices to reduced row-echelon
//!   form, with optional partial pivoting
//! - Singular and near-singular pivots reported as errors instead of being
//!   divided by
//!
//! ```
//! use pendula_linalg::{solve_augmented, DenseMatrix, SolverConfig};
//!
//! let system: DenseMatrix<f64> = DenseMatrix::from_rows(vec![
//!     vec![2.0, 1.0, 5.0],
//!     vec![1.0, 3.0, 10.0],
//! ]);
//! let x = solve_augmented(&system, &SolverConfig::default())?;
//! assert!((x[0] - 1.0).abs() < 1e-12);
//! assert!((x[1] - 3.0).abs() < 1e-12);
//! # Ok::<(), pendula_linalg::SolveError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dense_matrix;
pub mod gauss;

pub use dense_matrix::DenseMatrix;
pub use gauss::{gauss_eliminate, solve_augmented, Pivoting, SolveError, SolverConfig};

#[cfg(test)]
mod tests;
