//! Generational handles into the arena.
//!
//! A handle is a slot index paired with the generation the slot had when the
//! handle was issued. Releasing a node bumps its slot's generation, so handles
//! that outlive their node are detected instead of silently aliasing whatever
//! reuses the slot.

use std::fmt;

/// A handle to an expression node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprHandle {
    index: u32,
    generation: u32,
}

impl ExprHandle {
    /// Creates a new handle from a slot index and generation.
    ///
    /// This is primarily for internal use by the arena.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw slot index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({}@{})", self.index, self.generation)
    }
}

impl fmt::Display for ExprHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// A handle to a scalar storage cell backing a free variable.
///
/// Identity is by handle, never by value: two variables that currently hold
/// the same number are still different variables.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarHandle {
    index: u32,
    generation: u32,
}

impl VarHandle {
    /// Creates a new variable handle.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw storage index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the storage generation this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for VarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({}@{})", self.index, self.generation)
    }
}

impl fmt::Display for VarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}
