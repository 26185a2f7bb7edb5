//! Expression node types.
//!
//! Every child reference carries an [`Ownership`] tag decided when the node
//! is built. Release only follows [`Ownership::Owned`] edges, which is what
//! lets a derivative share subtrees with the expression it came from.

use smallvec::SmallVec;

use crate::handle::{ExprHandle, VarHandle};

/// Whether a reference controls the lifetime of its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The holder releases the target when it is released itself.
    Owned,
    /// The target belongs to someone else and outlives the holder.
    Borrowed,
}

/// A child reference from one node to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The referenced node.
    pub node: ExprHandle,
    /// Whether the parent owns the referenced node.
    pub ownership: Ownership,
}

impl Edge {
    /// An edge that owns its target.
    #[must_use]
    pub const fn owned(node: ExprHandle) -> Self {
        Self {
            node,
            ownership: Ownership::Owned,
        }
    }

    /// An edge that borrows its target.
    #[must_use]
    pub const fn borrowed(node: ExprHandle) -> Self {
        Self {
            node,
            ownership: Ownership::Borrowed,
        }
    }

    /// Returns true if this edge owns its target.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self.ownership, Ownership::Owned)
    }
}

/// An expression node stored in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    // === Atoms ===
    /// A literal.
    Const(f64),

    /// A free variable, read from its storage cell at evaluation time.
    Var {
        /// The storage cell.
        var: VarHandle,
        /// Whether this node retires the storage cell when released.
        storage: Ownership,
    },

    // === Operators ===
    /// `left + right`.
    Sum(Edge, Edge),

    /// `left * right`.
    Product(Edge, Edge),

    /// `base ^ exp`.
    Power {
        /// The base of the power.
        base: Edge,
        /// The exponent.
        exp: Edge,
    },

    /// Sine, in radians.
    Sin(Edge),

    /// Cosine, in radians.
    Cos(Edge),
}

impl ExprNode {
    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, ExprNode::Const(_) | ExprNode::Var { .. })
    }

    /// Returns the literal value if this is a constant.
    #[must_use]
    pub fn as_const(&self) -> Option<f64> {
        match self {
            ExprNode::Const(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the variable if this is a variable reference.
    #[must_use]
    pub fn as_var(&self) -> Option<VarHandle> {
        match self {
            ExprNode::Var { var, .. } => Some(*var),
            _ => None,
        }
    }

    /// Returns the child edges of this node, in operand order.
    #[must_use]
    pub fn edges(&self) -> SmallVec<[Edge; 2]> {
        match self {
            ExprNode::Const(_) | ExprNode::Var { .. } => SmallVec::new(),
            ExprNode::Sum(a, b) | ExprNode::Product(a, b) => smallvec::smallvec![*a, *b],
            ExprNode::Power { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Sin(arg) | ExprNode::Cos(arg) => smallvec::smallvec![*arg],
        }
    }

    /// Returns the children this node owns.
    #[must_use]
    pub fn owned_children(&self) -> SmallVec<[ExprHandle; 2]> {
        self.edges()
            .into_iter()
            .filter(|e| e.is_owned())
            .map(|e| e.node)
            .collect()
    }

    /// Returns the children this node only borrows.
    #[must_use]
    pub fn borrowed_children(&self) -> SmallVec<[ExprHandle; 2]> {
        self.edges()
            .into_iter()
            .filter(|e| !e.is_owned())
            .map(|e| e.node)
            .collect()
    }
}
