//! Numeric evaluation.

use crate::arena::ExprArena;
use crate::error::ExprError;
use crate::expr::ExprNode;
use crate::handle::ExprHandle;

impl ExprArena {
    /// Evaluates an expression with the variables' current values.
    ///
    /// Variables are read at call time, so evaluating the same tree after a
    /// [`set_value`](ExprArena::set_value) gives the new result. Real-valued
    /// semantics apply throughout: a negative base with a fractional exponent
    /// yields NaN, and NaN or infinities propagate instead of being reported
    /// as errors. Angles are in radians.
    ///
    /// # Errors
    ///
    /// Fails only if a reachable node or variable has been released.
    pub fn evaluate(&self, root: ExprHandle) -> Result<f64, ExprError> {
        let value = match self.get(root)? {
            ExprNode::Const(value) => *value,
            ExprNode::Var { var, .. } => self.value(*var)?,
            ExprNode::Sum(a, b) => self.evaluate(a.node)? + self.evaluate(b.node)?,
            ExprNode::Product(a, b) => self.evaluate(a.node)? * self.evaluate(b.node)?,
            ExprNode::Power { base, exp } => {
                self.evaluate(base.node)?.powf(self.evaluate(exp.node)?)
            }
            ExprNode::Sin(arg) => self.evaluate(arg.node)?.sin(),
            ExprNode::Cos(arg) => self.evaluate(arg.node)?.cos(),
        };
        Ok(value)
    }
}
