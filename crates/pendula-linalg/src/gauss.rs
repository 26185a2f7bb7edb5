//! Gauss-Jordan elimination on augmented systems.
//!
//! An `n x (n+1)` matrix `[A | b]` is reduced in place to `[I | x]`:
//!
//! 1. Forward elimination zeroes everything below the diagonal, using the
//!    row multiplier `-a[sub][row] / a[row][row]`.
//! 2. Back substitution zeroes everything above the diagonal.
//! 3. Each row is divided by its diagonal entry.
//!
//! Every row carries a scale, the largest coefficient magnitude of the row as
//! given. A pivot whose magnitude is at most `tolerance * scale` of its own
//! row is reported as [`SolveError::SingularSystem`] instead of being divided
//! by, so rows of very different magnitude do not mask each other.

use num_traits::Float;
use thiserror::Error;
use tracing::debug;

use crate::dense_matrix::DenseMatrix;

/// Errors reported by the solver.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolveError {
    /// The matrix is not `n x (n+1)`.
    #[error("expected an n x (n+1) augmented matrix, got {rows} x {cols}")]
    ShapeMismatch {
        /// Rows in the input.
        rows: usize,
        /// Columns in the input.
        cols: usize,
    },

    /// The coefficient matrix passed to [`DenseMatrix::solve`] is not square.
    #[error("expected a square coefficient matrix, got {rows} x {cols}")]
    NotSquare {
        /// Rows in the coefficient matrix.
        rows: usize,
        /// Columns in the coefficient matrix.
        cols: usize,
    },

    /// The right-hand side does not have one entry per equation.
    #[error("right-hand side has {found} entries, expected {expected}")]
    RhsLength {
        /// Number of equations.
        expected: usize,
        /// Entries supplied.
        found: usize,
    },

    /// An input entry, or a computed solution value, is NaN or infinite.
    #[error("non-finite value at ({row}, {col})")]
    NonFinite {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
    },

    /// No usable pivot in a column: the system has no unique solution.
    #[error("singular system: pivot {pivot:e} in column {column}")]
    SingularSystem {
        /// Column whose pivot vanished.
        column: usize,
        /// The rejected pivot value.
        pivot: f64,
    },
}

/// Row exchange strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Pivoting {
    /// Eliminate in the given row order. Any vanishing diagonal entry is
    /// reported as singular, even if a row exchange would have avoided it.
    None,
    /// Before eliminating each column, move the entry at or below the
    /// diagonal that is largest relative to its row scale into the pivot
    /// position.
    #[default]
    Partial,
}

/// Configuration for the elimination solver.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Row exchange strategy.
    pub pivoting: Pivoting,
    /// Relative pivot threshold, scaled by the largest coefficient magnitude
    /// of the pivot row.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pivoting: Pivoting::Partial,
            tolerance: 1e-12,
        }
    }
}

impl SolverConfig {
    /// The plain algorithm without row exchanges.
    #[must_use]
    pub fn without_pivoting() -> Self {
        Self {
            pivoting: Pivoting::None,
            ..Self::default()
        }
    }
}

/// Reduces an augmented matrix `[A | b]` to reduced row-echelon form.
///
/// On success the coefficient block is the identity and column `n` holds the
/// solution. On error the matrix is left partially reduced; use
/// [`solve_augmented`] to keep the input intact.
///
/// # Errors
///
/// - [`SolveError::ShapeMismatch`] unless the matrix is `n x (n+1)`.
/// - [`SolveError::NonFinite`] if an input entry or a solution value is NaN
///   or infinite.
/// - [`SolveError::SingularSystem`] if a pivot vanishes.
pub fn gauss_eliminate<T: Float>(
    m: &mut DenseMatrix<T>,
    config: &SolverConfig,
) -> Result<(), SolveError> {
    let n = m.num_rows();
    if m.num_cols() != n + 1 {
        return Err(SolveError::ShapeMismatch {
            rows: n,
            cols: m.num_cols(),
        });
    }
    if let Some((row, col)) = m.find_non_finite() {
        return Err(SolveError::NonFinite { row, col });
    }

    let tolerance = T::from(config.tolerance).unwrap_or_else(T::epsilon);
    let mut scales: Vec<T> = (0..n).map(|row| m.row_max_abs(row, n)).collect();

    // Forward elimination
    for row in 0..n {
        if config.pivoting == Pivoting::Partial {
            let mut best = row;
            let mut best_ratio = relative(m[(row, row)], scales[row]);
            for candidate in row + 1..n {
                let ratio = relative(m[(candidate, row)], scales[candidate]);
                if ratio > best_ratio {
                    best = candidate;
                    best_ratio = ratio;
                }
            }
            if best != row {
                debug!(column = row, from = best, "exchanging pivot row");
                m.swap_rows(row, best);
                scales.swap(row, best);
            }
        }

        let pivot = m[(row, row)];
        if pivot.abs() <= tolerance * scales[row] {
            let pivot = pivot.to_f64().unwrap_or(f64::NAN);
            debug!(column = row, pivot, "vanishing pivot");
            return Err(SolveError::SingularSystem { column: row, pivot });
        }

        for sub in row + 1..n {
            let multiplier = -m[(sub, row)] / pivot;
            m[(sub, row)] = T::zero();
            for col in row + 1..=n {
                let delta = m[(row, col)] * multiplier;
                m[(sub, col)] = m[(sub, col)] + delta;
            }
        }
    }

    // Back substitution, then normalize each row by its diagonal.
    for row in 0..n {
        for sub in row + 1..n {
            let multiplier = -m[(row, sub)] / m[(sub, sub)];
            for col in sub + 1..=n {
                let delta = m[(sub, col)] * multiplier;
                m[(row, col)] = m[(row, col)] + delta;
            }
            m[(row, sub)] = T::zero();
        }
        let leading = m[(row, row)];
        m.scale_row(row, leading.recip());
        m[(row, row)] = T::one();
    }

    if let Some(row) = (0..n).find(|&row| !m[(row, n)].is_finite()) {
        return Err(SolveError::NonFinite { row, col: n });
    }
    Ok(())
}

/// `|value| / scale`, or zero for a row with no nonzero coefficient.
fn relative<T: Float>(value: T, scale: T) -> T {
    if scale > T::zero() {
        value.abs() / scale
    } else {
        T::zero()
    }
}

/// Solves the system described by an augmented matrix, leaving it untouched.
///
/// # Errors
///
/// See [`gauss_eliminate`].
pub fn solve_augmented<T: Float>(
    m: &DenseMatrix<T>,
    config: &SolverConfig,
) -> Result<Vec<T>, SolveError> {
    let mut work = m.clone();
    gauss_eliminate(&mut work, config)?;
    Ok(work.col(work.num_rows()))
}

impl<T: Float> DenseMatrix<T> {
    /// Solves `A x = b` for a square `A`.
    ///
    /// # Errors
    ///
    /// [`SolveError::NotSquare`] if `A` is not square,
    /// [`SolveError::RhsLength`] if `b` has the wrong length, and otherwise
    /// see [`gauss_eliminate`].
    pub fn solve(&self, b: &[T], config: &SolverConfig) -> Result<Vec<T>, SolveError> {
        if !self.is_square() {
            return Err(SolveError::NotSquare {
                rows: self.num_rows(),
                cols: self.num_cols(),
            });
        }
        let mut aug = self.augment(b)?;
        gauss_eliminate(&mut aug, config)?;
        Ok(aug.col(self.num_cols()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!(
                (a - e).abs() <= 1e-12 * e.abs().max(1.0),
                "expected {expected:?}, got {actual:?}"
            );
        }
    }

    #[test]
    fn test_reduces_to_identity() {
        let mut m = DenseMatrix::from_rows(vec![
            vec![2.0, 1.0, -1.0, 8.0],
            vec![-3.0, -1.0, 2.0, -11.0],
            vec![-2.0, 1.0, 2.0, -3.0],
        ]);
        gauss_eliminate(&mut m, &SolverConfig::default()).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
        }
        assert_close(&m.col(3), &[2.0, 3.0, -1.0]);
    }

    #[test]
    fn test_without_pivoting_matches() {
        let m = DenseMatrix::from_rows(vec![vec![4.0, 1.0, 9.0], vec![1.0, 3.0, 7.0]]);
        let plain = solve_augmented(&m, &SolverConfig::without_pivoting()).unwrap();
        let pivoted = solve_augmented(&m, &SolverConfig::default()).unwrap();
        assert_close(&plain, &[20.0 / 11.0, 19.0 / 11.0]);
        assert_close(&pivoted, &plain);
    }

    #[test]
    fn test_zero_leading_pivot() {
        // Solvable, but the first diagonal entry is zero.
        let m = DenseMatrix::from_rows(vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 3.0]]);

        let x = solve_augmented(&m, &SolverConfig::default()).unwrap();
        assert_close(&x, &[3.0, 2.0]);

        assert_eq!(
            solve_augmented(&m, &SolverConfig::without_pivoting()),
            Err(SolveError::SingularSystem { column: 0, pivot: 0.0 })
        );
    }

    #[test]
    fn test_identical_rows_are_singular() {
        let m = DenseMatrix::from_rows(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 0.5, 1.0, 1.0],
            vec![1.0, 2.0, 3.0, 4.0],
        ]);
        for config in [SolverConfig::default(), SolverConfig::without_pivoting()] {
            assert!(matches!(
                solve_augmented(&m, &config),
                Err(SolveError::SingularSystem { .. })
            ));
        }
    }

    #[test]
    fn test_zero_row_is_singular() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![0.0, 0.0, 0.0]]);
        assert_eq!(
            solve_augmented(&m, &SolverConfig::default()),
            Err(SolveError::SingularSystem { column: 1, pivot: 0.0 })
        );
    }

    #[test]
    fn test_all_zero_coefficients_are_singular() {
        let m = DenseMatrix::from_rows(vec![vec![0.0, 1.0]]);
        assert!(matches!(
            solve_augmented(&m, &SolverConfig::default()),
            Err(SolveError::SingularSystem { column: 0, .. })
        ));
    }

    #[test]
    fn test_near_zero_pivot_rejected() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, 1.0, 2.0], vec![1.0, 1.0 + 1e-15, 2.0]]);
        assert!(matches!(
            solve_augmented(&m, &SolverConfig::default()),
            Err(SolveError::SingularSystem { column: 1, .. })
        ));
    }

    #[test]
    fn test_small_row_is_not_singular() {
        // Each pivot is measured against its own row, not the largest entry.
        let m = DenseMatrix::from_rows(vec![vec![1.0, 0.0, 1.0], vec![0.0, 1e-13, 1e-13]]);
        for config in [SolverConfig::default(), SolverConfig::without_pivoting()] {
            assert_close(&solve_augmented(&m, &config).unwrap(), &[1.0, 1.0]);
        }
    }

    #[test]
    fn test_rows_of_different_magnitude() {
        let tiny = 2.0f64.powi(-30);
        let m = DenseMatrix::from_rows(vec![
            vec![1.0, tiny, 1.0 + 2.0 * tiny],
            vec![tiny, tiny / 1024.0, tiny + tiny / 512.0],
        ]);
        assert_close(&solve_augmented(&m, &SolverConfig::default()).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_scaled_pivot_choice() {
        // Row 1 has the larger leading entry, but relative to its own scale
        // row 0 is the better pivot.
        let m = DenseMatrix::from_rows(vec![vec![1.0, 1.0, 3.0], vec![2.0, 1000.0, 2002.0]]);
        assert_close(&solve_augmented(&m, &SolverConfig::default()).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_shape_checked() {
        let mut square: DenseMatrix<f64> = DenseMatrix::identity(2);
        assert_eq!(
            gauss_eliminate(&mut square, &SolverConfig::default()),
            Err(SolveError::ShapeMismatch { rows: 2, cols: 2 })
        );
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, f64::INFINITY]]);
        assert_eq!(
            solve_augmented(&m, &SolverConfig::default()),
            Err(SolveError::NonFinite { row: 0, col: 1 })
        );
    }

    #[test]
    fn test_empty_system() {
        let m: DenseMatrix<f64> = DenseMatrix::zeros(0, 1);
        assert_eq!(solve_augmented(&m, &SolverConfig::default()).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_solve_square() {
        let a = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let x = a.solve(&[5.0, 11.0], &SolverConfig::default()).unwrap();
        assert_close(&x, &[1.0, 2.0]);

        let wide = DenseMatrix::from_rows(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(
            wide.solve(&[1.0], &SolverConfig::default()),
            Err(SolveError::NotSquare { rows: 1, cols: 3 })
        );
    }

    #[test]
    fn test_input_untouched_by_solve_augmented() {
        let m = DenseMatrix::from_rows(vec![vec![2.0, 0.0, 4.0], vec![0.0, 4.0, 2.0]]);
        let before = m.clone();
        let _ = solve_augmented(&m, &SolverConfig::default()).unwrap();
        assert_eq!(m, before);
    }
}
