//! Property-based tests for differentiation and release.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{ExprArena, ExprHandle, VarHandle};

    fn value() -> impl Strategy<Value = f64> {
        -100.0f64..100.0f64
    }

    fn positive() -> impl Strategy<Value = f64> {
        0.1f64..10.0f64
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    /// Builds `c0 + c1*x + c2*x^2 + c3*x^3`.
    fn cubic(arena: &mut ExprArena, x: VarHandle, coeffs: [f64; 4]) -> ExprHandle {
        let mut acc = arena.constant(coeffs[0]);
        for (power, &c) in coeffs.iter().enumerate().skip(1) {
            let coeff = arena.constant(c);
            let vx = arena.var(x).unwrap();
            let exp = arena.constant(power as f64);
            let pow = arena.power(vx, exp).unwrap();
            let term = arena.product(coeff, pow).unwrap();
            acc = arena.sum(acc, term).unwrap();
        }
        acc
    }

    proptest! {
        #[test]
        fn constant_derivative_is_zero(c in value(), x in value()) {
            let mut arena = ExprArena::new();
            let var = arena.variable(x);
            let node = arena.constant(c);
            let d = arena.differentiate(node, var).unwrap();
            prop_assert_eq!(arena.evaluate(d).unwrap(), 0.0);
        }

        #[test]
        fn product_derivative_is_other_factor(a in value(), b in value()) {
            let mut arena = ExprArena::new();
            let va = arena.variable(a);
            let vb = arena.variable(b);
            let na = arena.var(va).unwrap();
            let nb = arena.var(vb).unwrap();
            let f = arena.product(na, nb).unwrap();

            let da = arena.differentiate(f, va).unwrap();
            let db = arena.differentiate(f, vb).unwrap();
            prop_assert_eq!(arena.evaluate(da).unwrap(), b);
            prop_assert_eq!(arena.evaluate(db).unwrap(), a);
        }

        #[test]
        fn power_rule_matches_closed_form(x in positive(), k in -3i32..6) {
            let mut arena = ExprArena::new();
            let var = arena.variable(x);
            let vx = arena.var(var).unwrap();
            let exp = arena.constant(f64::from(k));
            let f = arena.power(vx, exp).unwrap();

            let d = arena.differentiate(f, var).unwrap();
            let expected = f64::from(k) * x.powi(k - 1);
            prop_assert!(close(arena.evaluate(d).unwrap(), expected));
        }

        #[test]
        fn cubic_derivative_matches_closed_form(
            x in -5.0f64..5.0,
            c in prop::array::uniform4(-10.0f64..10.0),
        ) {
            let mut arena = ExprArena::new();
            let var = arena.variable(x);
            let f = cubic(&mut arena, var, c);

            let d = arena.differentiate(f, var).unwrap();
            let expected = c[1] + 2.0 * c[2] * x + 3.0 * c[3] * x * x;
            prop_assert!(close(arena.evaluate(d).unwrap(), expected));
        }

        #[test]
        fn chain_rule_through_sin(x in -3.0f64..3.0, a in -4.0f64..4.0) {
            let mut arena = ExprArena::new();
            let var = arena.variable(x);
            let coeff = arena.constant(a);
            let vx = arena.var(var).unwrap();
            let arg = arena.product(coeff, vx).unwrap();
            let f = arena.sin(arg).unwrap();

            let d = arena.differentiate(f, var).unwrap();
            prop_assert!(close(arena.evaluate(d).unwrap(), a * (a * x).cos()));
        }

        #[test]
        fn releasing_derivative_restores_input(
            x in -5.0f64..5.0,
            c in prop::array::uniform4(-10.0f64..10.0),
        ) {
            let mut arena = ExprArena::new();
            let var = arena.variable(x);
            let f = cubic(&mut arena, var, c);
            let before = arena.live_nodes();
            let value = arena.evaluate(f).unwrap();

            let d = arena.differentiate(f, var).unwrap();
            arena.release(d).unwrap();

            prop_assert_eq!(arena.live_nodes(), before);
            prop_assert_eq!(arena.evaluate(f).unwrap(), value);
            prop_assert_eq!(arena.release(f).unwrap(), before);
            prop_assert_eq!(arena.live_nodes(), 0);
        }
    }
}
