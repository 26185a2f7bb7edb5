//! Planar pendulum chains.

use std::f64::consts::PI;

use pendula_linalg::{solve_augmented, DenseMatrix, SolverConfig};
use tracing::trace;

use crate::error::MechanicsError;

/// A point in the plane, `y` pointing up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One rigid, massless rod with a point mass at its far end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    /// Rod length.
    pub length: f64,
    /// Mass at the end of the rod.
    pub mass: f64,
    /// Angle from the downward vertical, in radians.
    pub angle: f64,
    /// Angular velocity, in radians per unit time.
    pub angular_velocity: f64,
}

impl Link {
    /// A link hanging straight down at rest.
    #[must_use]
    pub const fn new(length: f64, mass: f64) -> Self {
        Self {
            length,
            mass,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Returns the link with its angle replaced.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Returns the link with its angular velocity replaced.
    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    fn is_valid(&self) -> bool {
        self.length.is_finite()
            && self.length > 0.0
            && self.mass.is_finite()
            && self.mass > 0.0
            && self.angle.is_finite()
            && self.angular_velocity.is_finite()
    }
}

/// A chain of links hanging from a fixed pivot, listed from the pivot out.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    /// The links, pivot first.
    pub links: Vec<Link>,
    /// Gravitational acceleration; positive pulls towards `-y`.
    pub gravity: f64,
}

impl Chain {
    /// Creates a chain.
    #[must_use]
    pub fn new(links: Vec<Link>, gravity: f64) -> Self {
        Self { links, gravity }
    }

    /// Creates `n` identical links hanging at rest.
    #[must_use]
    pub fn uniform(n: usize, length: f64, mass: f64, gravity: f64) -> Self {
        Self::new(vec![Link::new(length, mass); n], gravity)
    }

    /// Three unit-mass links of length 0.2 under gravity 0.5, with the first
    /// link raised to 3π/4.
    #[must_use]
    pub fn demo() -> Self {
        let mut chain = Self::uniform(3, 0.2, 1.0, 0.5);
        chain.links[0].angle = PI * 0.75;
        chain
    }

    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if the chain has no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Checks that the chain can be simulated.
    ///
    /// # Errors
    ///
    /// [`MechanicsError::EmptyChain`], [`MechanicsError::InvalidLink`] or
    /// [`MechanicsError::InvalidGravity`].
    pub fn validate(&self) -> Result<(), MechanicsError> {
        if self.links.is_empty() {
            return Err(MechanicsError::EmptyChain);
        }
        if let Some(index) = self.links.iter().position(|link| !link.is_valid()) {
            return Err(MechanicsError::InvalidLink { index });
        }
        if !self.gravity.is_finite() {
            return Err(MechanicsError::InvalidGravity(self.gravity));
        }
        Ok(())
    }

    /// Positions of each link's far end, starting from `pivot`.
    #[must_use]
    pub fn joints(&self, pivot: Point) -> Vec<Point> {
        self.links
            .iter()
            .scan(pivot, |at, link| {
                at.x += link.angle.sin() * link.length;
                at.y -= link.angle.cos() * link.length;
                Some(*at)
            })
            .collect()
    }

    /// Total mass carried by link `k` and everything beyond it.
    fn mass_from(&self, k: usize) -> f64 {
        self.links[k..].iter().map(|link| link.mass).sum()
    }

    /// The mass matrix `M`.
    #[must_use]
    pub fn mass_matrix(&self) -> DenseMatrix<f64> {
        let n = self.links.len();
        let mut m = DenseMatrix::zeros(n, n);
        for (i, li) in self.links.iter().enumerate() {
            for (j, lj) in self.links.iter().enumerate() {
                m[(i, j)] =
                    self.mass_from(i.max(j)) * li.length * lj.length * (li.angle - lj.angle).cos();
            }
        }
        m
    }

    /// The centripetal/Coriolis vector `C`.
    #[must_use]
    pub fn coriolis_terms(&self) -> Vec<f64> {
        self.links
            .iter()
            .enumerate()
            .map(|(i, li)| {
                self.links
                    .iter()
                    .enumerate()
                    .map(|(j, lj)| {
                        self.mass_from(i.max(j))
                            * li.length
                            * lj.length
                            * (li.angle - lj.angle).sin()
                            * lj.angular_velocity
                            * lj.angular_velocity
                    })
                    .sum()
            })
            .collect()
    }

    /// The gravity vector `G`, i.e. the gradient of
    /// [`potential_energy`](Self::potential_energy) with respect to the angles.
    #[must_use]
    pub fn gravity_terms(&self) -> Vec<f64> {
        self.links
            .iter()
            .enumerate()
            .map(|(i, link)| self.mass_from(i) * self.gravity * link.length * link.angle.sin())
            .collect()
    }

    /// Potential energy relative to the pivot height.
    #[must_use]
    pub fn potential_energy(&self) -> f64 {
        self.joints(Point::default())
            .iter()
            .zip(&self.links)
            .map(|(joint, link)| link.mass * self.gravity * joint.y)
            .sum()
    }

    /// Kinetic energy of the point masses.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        let mut vx = 0.0;
        let mut vy = 0.0;
        let mut energy = 0.0;
        for link in &self.links {
            vx += link.angle.cos() * link.length * link.angular_velocity;
            vy += link.angle.sin() * link.length * link.angular_velocity;
            energy += 0.5 * link.mass * (vx * vx + vy * vy);
        }
        energy
    }

    /// Builds the augmented system `[M | −(C + G)]` for the current state.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn augmented_system(&self) -> Result<DenseMatrix<f64>, MechanicsError> {
        self.validate()?;
        let rhs: Vec<f64> = self
            .coriolis_terms()
            .iter()
            .zip(self.gravity_terms())
            .map(|(c, g)| -(c + g))
            .collect();
        Ok(self.mass_matrix().augment(&rhs)?)
    }

    /// Solves for the angular accelerations at the current state.
    ///
    /// # Errors
    ///
    /// Validation errors from [`validate`](Self::validate), or
    /// [`MechanicsError::Solve`] if the system cannot be solved.
    pub fn angular_accelerations(&self, config: &SolverConfig) -> Result<Vec<f64>, MechanicsError> {
        let system = self.augmented_system()?;
        let accelerations = solve_augmented(&system, config)?;
        trace!(links = self.links.len(), ?accelerations, "solved chain");
        Ok(accelerations)
    }
}
