//! # pendula-mechanics
//!
//! Equations of motion for a planar chain of point-mass pendulum links.
//!
//! For angles `θ` measured from the downward vertical and angular
//! velocities `ω`, the Lagrangian equations take the form
//!
//! ```text
//! M(θ) α = −(C(θ, ω) + G(θ))
//! ```
//!
//! where `α` are the angular accelerations. [`Chain::augmented_system`]
//! assembles `[M | −(C + G)]` and [`Chain::angular_accelerations`] solves it.
//! Advancing the state in time is left to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chain;
pub mod error;

pub use chain::{Chain, Link, Point};
pub use error::MechanicsError;
