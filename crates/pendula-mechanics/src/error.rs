//! Errors raised while assembling or solving a chain's equations of motion.

use pendula_linalg::SolveError;
use thiserror::Error;

/// Errors that can occur for a pendulum chain.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MechanicsError {
    /// The chain has no links.
    #[error("chain has no links")]
    EmptyChain,

    /// A link has a non-positive or non-finite length or mass, or a
    /// non-finite angle or angular velocity.
    #[error("link {index} has invalid parameters")]
    InvalidLink {
        /// Index of the offending link, counted from the pivot.
        index: usize,
    },

    /// Gravity is not finite.
    #[error("gravity must be finite, got {0}")]
    InvalidGravity(f64),

    /// The linear solve failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
}
