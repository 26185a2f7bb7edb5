//! Symbolic differentiation.
//!
//! The derivative is a new tree built in the same arena. Operands that the
//! rules reuse verbatim (the factors in the product rule, the base in the
//! power rule, the argument of `sin`/`cos`) are referenced through borrowed
//! edges; everything else is freshly allocated and owned.
//!
//! | input            | derivative                                  |
//! |------------------|---------------------------------------------|
//! | `c`              | `0`                                         |
//! | `x`              | `1` if `x` is the variable, else `0`        |
//! | `a + b`          | `a' + b'`                                   |
//! | `a * b`          | `a * b' + a' * b`                           |
//! | `x ^ k`          | `k * x^(k-1)`                               |
//! | `u ^ k`          | `(k * u') * u^(k-1)`                        |
//! | `sin(u)`         | `cos(u) * u'`                               |
//! | `cos(u)`         | `(-1 * sin(u)) * u'`                        |

use tracing::trace;

use crate::arena::ExprArena;
use crate::error::ExprError;
use crate::expr::{Edge, ExprNode};
use crate::handle::{ExprHandle, VarHandle};

impl ExprArena {
    /// Differentiates `root` with respect to `wrt`, holding every other
    /// variable constant.
    ///
    /// The result is a new root. It may borrow nodes of `root`, so it has to
    /// be released before `root` is (or detached with
    /// [`clone_tree`](ExprArena::clone_tree)).
    ///
    /// # Errors
    ///
    /// - [`ExprError::NonConstantExponent`] if any reachable power has a
    ///   non-constant exponent.
    /// - [`ExprError::UseAfterRelease`] if a reachable node was released.
    /// - [`ExprError::UnknownVariable`] if `wrt` is not bound.
    ///
    /// The whole input is checked before anything is allocated, so a failed
    /// call leaves the arena unchanged.
    pub fn differentiate(
        &mut self,
        root: ExprHandle,
        wrt: VarHandle,
    ) -> Result<ExprHandle, ExprError> {
        if !self.is_bound(wrt) {
            return Err(ExprError::UnknownVariable(wrt));
        }
        self.walk(root, |handle, node| {
            if let ExprNode::Power { exp, .. } = node {
                if self.get(exp.node)?.as_const().is_none() {
                    return Err(ExprError::NonConstantExponent {
                        power: handle,
                        exponent: exp.node,
                    });
                }
            }
            Ok(())
        })?;

        let before = self.live_nodes();
        let derivative = self.derive(root, wrt)?;
        trace!(
            root = ?root,
            wrt = ?wrt,
            allocated = self.live_nodes() - before,
            "differentiated expression"
        );
        Ok(derivative)
    }

    fn derive(&mut self, handle: ExprHandle, wrt: VarHandle) -> Result<ExprHandle, ExprError> {
        let node = self.get(handle)?.clone();
        let derivative = match node {
            ExprNode::Const(_) => self.constant(0.0),

            ExprNode::Var { var, .. } => self.constant(if var == wrt { 1.0 } else { 0.0 }),

            ExprNode::Sum(a, b) => {
                let da = self.derive(a.node, wrt)?;
                let db = self.derive(b.node, wrt)?;
                self.push(ExprNode::Sum(Edge::owned(da), Edge::owned(db)))
            }

            ExprNode::Product(a, b) => {
                let da = self.derive(a.node, wrt)?;
                let db = self.derive(b.node, wrt)?;
                let left = self.push(ExprNode::Product(Edge::borrowed(a.node), Edge::owned(db)));
                let right = self.push(ExprNode::Product(Edge::owned(da), Edge::borrowed(b.node)));
                self.push(ExprNode::Sum(Edge::owned(left), Edge::owned(right)))
            }

            ExprNode::Power { base, exp } => {
                let k = self
                    .get(exp.node)?
                    .as_const()
                    .ok_or(ExprError::NonConstantExponent {
                        power: handle,
                        exponent: exp.node,
                    })?;

                match self.get(base.node)?.as_var() {
                    // d/dx y^k = 0 for a different variable y.
                    Some(var) if var != wrt => self.constant(0.0),
                    Some(_) => {
                        let power = self.reduced_power(base.node, k);
                        let coeff = self.constant(k);
                        self.push(ExprNode::Product(Edge::owned(coeff), Edge::owned(power)))
                    }
                    None => {
                        let dbase = self.derive(base.node, wrt)?;
                        let coeff = self.constant(k);
                        let scaled =
                            self.push(ExprNode::Product(Edge::owned(coeff), Edge::owned(dbase)));
                        let power = self.reduced_power(base.node, k);
                        self.push(ExprNode::Product(Edge::owned(scaled), Edge::owned(power)))
                    }
                }
            }

            ExprNode::Sin(arg) => {
                let da = self.derive(arg.node, wrt)?;
                let cos = self.push(ExprNode::Cos(Edge::borrowed(arg.node)));
                self.push(ExprNode::Product(Edge::owned(cos), Edge::owned(da)))
            }

            ExprNode::Cos(arg) => {
                let da = self.derive(arg.node, wrt)?;
                let minus_one = self.constant(-1.0);
                let sin = self.push(ExprNode::Sin(Edge::borrowed(arg.node)));
                let negated =
                    self.push(ExprNode::Product(Edge::owned(minus_one), Edge::owned(sin)));
                self.push(ExprNode::Product(Edge::owned(negated), Edge::owned(da)))
            }
        };
        Ok(derivative)
    }

    /// `base ^ (k - 1)` with `base` borrowed.
    fn reduced_power(&mut self, base: ExprHandle, k: f64) -> ExprHandle {
        let exp = self.constant(k - 1.0);
        self.push(ExprNode::Power {
            base: Edge::borrowed(base),
            exp: Edge::owned(exp),
        })
    }
}
