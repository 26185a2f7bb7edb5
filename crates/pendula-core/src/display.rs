//! Infix rendering of expressions.

use std::fmt;

use crate::arena::ExprArena;
use crate::expr::ExprNode;
use crate::handle::ExprHandle;

const SUM: u8 = 1;
const PRODUCT: u8 = 2;
const ATOM: u8 = 4;

/// Borrowed view that formats an expression in infix notation.
///
/// Created by [`ExprArena::display`]. Released nodes render as
/// `<released #n>` rather than failing the whole format.
pub struct ExprDisplay<'a> {
    arena: &'a ExprArena,
    root: ExprHandle,
}

impl ExprArena {
    /// Returns a value that formats `root`, e.g. `(x + 1)^2`.
    #[must_use]
    pub fn display(&self, root: ExprHandle) -> ExprDisplay<'_> {
        ExprDisplay { arena: self, root }
    }
}

fn precedence(node: &ExprNode) -> u8 {
    match node {
        ExprNode::Const(value) if *value < 0.0 => SUM,
        ExprNode::Sum(..) => SUM,
        ExprNode::Product(..) => PRODUCT,
        ExprNode::Power { .. } => 3,
        ExprNode::Const(_) | ExprNode::Var { .. } | ExprNode::Sin(_) | ExprNode::Cos(_) => ATOM,
    }
}

impl ExprDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, handle: ExprHandle, min: u8) -> fmt::Result {
        let Ok(node) = self.arena.get(handle) else {
            return write!(f, "<released {handle}>");
        };

        let parens = precedence(node) < min;
        if parens {
            f.write_str("(")?;
        }
        match node {
            ExprNode::Const(value) => write!(f, "{value}")?,
            ExprNode::Var { var, .. } => match self.arena.variable_name(*var) {
                Ok(Some(name)) => f.write_str(name)?,
                _ => write!(f, "{var}")?,
            },
            ExprNode::Sum(a, b) => {
                self.write(f, a.node, SUM)?;
                f.write_str(" + ")?;
                self.write(f, b.node, SUM)?;
            }
            ExprNode::Product(a, b) => {
                self.write(f, a.node, PRODUCT)?;
                f.write_str(" * ")?;
                self.write(f, b.node, PRODUCT)?;
            }
            ExprNode::Power { base, exp } => {
                self.write(f, base.node, ATOM)?;
                f.write_str("^")?;
                self.write(f, exp.node, ATOM)?;
            }
            ExprNode::Sin(arg) => {
                f.write_str("sin(")?;
                self.write(f, arg.node, 0)?;
                f.write_str(")")?;
            }
            ExprNode::Cos(arg) => {
                f.write_str("cos(")?;
                self.write(f, arg.node, 0)?;
                f.write_str(")")?;
            }
        }
        if parens {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.root, 0)
    }
}
