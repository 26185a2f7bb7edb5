//! # Pendula
//!
//! The numerical core of a multi-link pendulum simulation.
//!
//! ## Features
//!
//! - **Symbolic engine**: expression trees with exact derivatives and
//!   explicit ownership of shared subtrees ([`core`])
//! - **Linear solver**: Gauss-Jordan elimination of augmented systems with
//!   singular pivots reported, not divided by ([`linalg`])
//! - **Chain model**: equations of motion for planar pendulum chains
//!   ([`mechanics`])
//!
//! Time stepping, rendering and input are left to the caller: a frame loop
//! asks [`mechanics::Chain::angular_accelerations`] for `α`, then integrates
//! `ω` and `θ` itself.
//!
//! ## Quick Start
//!
//! ```
//! use pendula::prelude::*;
//!
//! let chain = Chain::demo();
//! let alpha = chain.angular_accelerations(&SolverConfig::default())?;
//! assert_eq!(alpha.len(), 3);
//! # Ok::<(), pendula::mechanics::MechanicsError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use pendula_core as core;
pub use pendula_linalg as linalg;
pub use pendula_mechanics as mechanics;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use pendula_core::{Edge, ExprArena, ExprError, ExprHandle, ExprNode, Ownership, VarHandle};
    pub use pendula_linalg::{
        gauss_eliminate, solve_augmented, DenseMatrix, Pivoting, SolveError, SolverConfig,
    };
    pub use pendula_mechanics::{Chain, Link, MechanicsError, Point};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    /// Builds `V = -g Σ_i (Σ_{k≥i} m_k) L_i cos θ_i` over the given angle
    /// variables.
    fn potential(arena: &mut ExprArena, chain: &Chain, angles: &[VarHandle]) -> ExprHandle {
        let mut total = None;
        for (i, (link, &theta)) in chain.links.iter().zip(angles).enumerate() {
            let carried: f64 = chain.links[i..].iter().map(|l| l.mass).sum();
            let coeff = arena.constant(-chain.gravity * carried * link.length);
            let vt = arena.var(theta).unwrap();
            let cos = arena.cos(vt).unwrap();
            let term = arena.product(coeff, cos).unwrap();
            total = Some(match total {
                None => term,
                Some(acc) => arena.sum(acc, term).unwrap(),
            });
        }
        total.unwrap()
    }

    #[test]
    fn test_symbolic_gradient_matches_gravity_terms() {
        let mut chain = Chain::demo();
        chain.links[1].angle = 0.35;
        chain.links[2].angle = -1.2;

        let mut arena = ExprArena::new();
        let angles: Vec<VarHandle> = chain
            .links
            .iter()
            .enumerate()
            .map(|(i, link)| arena.variable_named(&format!("theta{i}"), link.angle))
            .collect();
        let v = potential(&mut arena, &chain, &angles);

        assert!((arena.evaluate(v).unwrap() - chain.potential_energy()).abs() < 1e-12);

        let expected = chain.gravity_terms();
        for (i, &theta) in angles.iter().enumerate() {
            let dv = arena.differentiate(v, theta).unwrap();
            let symbolic = arena.evaluate(dv).unwrap();
            assert!(
                (symbolic - expected[i]).abs() < 1e-12,
                "link {i}: {symbolic} vs {}",
                expected[i]
            );
            arena.release(dv).unwrap();
        }

        arena.release(v).unwrap();
        assert_eq!(arena.live_nodes(), 0);
    }

    #[test]
    fn test_symbolic_gradient_tracks_state_changes() {
        let chain = Chain::uniform(1, 0.5, 2.0, 9.81);
        let mut arena = ExprArena::new();
        let theta = arena.variable_named("theta", 0.0);
        let v = potential(&mut arena, &chain, &[theta]);
        let dv = arena.differentiate(v, theta).unwrap();

        for angle in [0.0, 0.3, 1.0, -2.5] {
            arena.set_value(theta, angle).unwrap();
            let mut state = chain.clone();
            state.links[0].angle = angle;

            // M α = -G for a chain at rest.
            let alpha = state.angular_accelerations(&SolverConfig::default()).unwrap();
            let m = state.mass_matrix()[(0, 0)];
            assert!((alpha[0] * m + arena.evaluate(dv).unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_links_rejected_before_solving() {
        // A zero-length link would make the mass matrix singular.
        let mut chain = Chain::uniform(2, 1.0, 1.0, 9.81);
        chain.links[1].length = 0.0;
        assert_eq!(
            chain.angular_accelerations(&SolverConfig::default()),
            Err(MechanicsError::InvalidLink { index: 1 })
        );

        // Links lying along the same line still give a regular system.
        let folded = Chain::new(
            vec![Link::new(1.0, 1.0).with_angle(0.5), Link::new(1.0, 1.0).with_angle(0.5)],
            9.81,
        );
        assert!(folded.angular_accelerations(&SolverConfig::default()).is_ok());
    }
}
