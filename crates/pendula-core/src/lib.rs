//! # pendula-core
//!
//! Symbolic expression engine for the Pendula workspace.
//!
//! This crate provides:
//! - Arena-allocated expression nodes behind generational handles
//! - Numeric evaluation against mutable variable storage
//! - Exact symbolic differentiation (sum, product, power and chain rules)
//! - Explicit ownership of every child edge, so derivatives can share
//!   subtrees with their input and still be released safely
//!
//! ## Ownership model
//!
//! - Every edge is either **owned** or **borrowed**; the tag is fixed when
//!   the parent is built.
//! - A node has at most one owner. Roots have none.
//! - [`ExprArena::release`] frees a root and its owned descendants, and
//!   refuses while anything it would free is borrowed from outside.
//! - Variable storage is either kept by the caller (`var`) or owned by a
//!   single node (`var_owning`).
//!
//! ```
//! use pendula_core::ExprArena;
//!
//! let mut arena = ExprArena::new();
//! let a = arena.variable_named("a", 2.0);
//! let va = arena.var(a)?;
//! let one = arena.constant(1.0);
//! let inner = arena.sum(va, one)?;
//! let two = arena.constant(2.0);
//! let f = arena.power(inner, two)?;
//!
//! let df = arena.differentiate(f, a)?;
//! assert_eq!(arena.evaluate(df)?, 6.0);
//!
//! arena.release(df)?;
//! arena.release(f)?;
//! assert_eq!(arena.live_nodes(), 0);
//! # Ok::<(), pendula_core::ExprError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod diff;
pub mod display;
pub mod error;
pub mod eval;
pub mod expr;
pub mod handle;
pub mod intern;

pub use arena::ExprArena;
pub use display::ExprDisplay;
pub use error::ExprError;
pub use expr::{Edge, ExprNode, Ownership};
pub use handle::{ExprHandle, VarHandle};

#[cfg(test)]
mod proptests;
