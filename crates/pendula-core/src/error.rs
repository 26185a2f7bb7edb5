//! Errors raised by expression construction, evaluation, differentiation and
//! release.

use thiserror::Error;

use crate::handle::{ExprHandle, VarHandle};

/// Errors that can occur while working with expression trees.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The handle refers to a node that has been released (or to a slot that
    /// was never allocated). Releasing the same root twice reports this too.
    #[error("expression {0:?} has been released")]
    UseAfterRelease(ExprHandle),

    /// The variable handle does not refer to live storage.
    #[error("variable {0:?} is not bound to live storage")]
    UnknownVariable(VarHandle),

    /// A power node's exponent is not a constant, so the power rule does not
    /// apply.
    #[error("power {power} has non-constant exponent {exponent}")]
    NonConstantExponent {
        /// The offending power node.
        power: ExprHandle,
        /// Its exponent.
        exponent: ExprHandle,
    },

    /// The node already has an owning parent.
    #[error("expression {0} already has an owner")]
    AlreadyOwned(ExprHandle),

    /// The variable's storage is already owned by another node.
    #[error("storage of variable {0} is already owned by a node")]
    StorageAlreadyOwned(VarHandle),

    /// Only roots (nodes without an owning parent) can be released.
    #[error("expression {0} is owned by another node and cannot be released on its own")]
    NotARoot(ExprHandle),

    /// The node is still referenced by borrowed edges from live nodes
    /// outside the tree being released.
    #[error("expression {node} is still borrowed by {borrowers} live node(s)")]
    StillBorrowed {
        /// The borrowed node.
        node: ExprHandle,
        /// Number of outstanding borrowed edges.
        borrowers: u32,
    },

    /// The variable's storage is still read by live nodes.
    #[error("variable {var} is still referenced by {users} live node(s)")]
    VariableInUse {
        /// The variable.
        var: VarHandle,
        /// Number of live nodes that reference it.
        users: u32,
    },
}

impl ExprError {
    /// Returns true for errors that indicate a malformed input tree rather
    /// than a lifecycle mistake.
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, ExprError::NonConstantExponent { .. })
    }

    /// Returns true for errors caused by touching released nodes or storage.
    #[must_use]
    pub fn is_use_after_release(&self) -> bool {
        matches!(
            self,
            ExprError::UseAfterRelease(_) | ExprError::UnknownVariable(_)
        )
    }
}
