//! Arena storage for expression nodes and variable cells.
//!
//! Nodes live in generational slots. Each slot records whether the node has an
//! owning parent and how many live borrowed edges point at it; together with
//! the per-edge [`Ownership`] tag this is enough to release a tree without
//! freeing anything still reachable from another live tree.

use hashbrown::{HashMap, HashSet};
use tracing::trace;

use crate::error::ExprError;
use crate::expr::{Edge, ExprNode, Ownership};
use crate::handle::{ExprHandle, VarHandle};
use crate::intern::{NameId, NameTable};

/// A live node plus its bookkeeping.
#[derive(Debug)]
struct Entry {
    node: ExprNode,
    /// Set once an owned edge points here.
    owned: bool,
    /// Number of live borrowed edges pointing here.
    borrowers: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// A scalar storage cell backing a variable.
#[derive(Debug)]
struct Storage {
    value: f64,
    name: Option<NameId>,
    /// Number of live `Var` nodes reading this cell.
    users: u32,
    /// Set while a `Var` node owns this cell.
    owned: bool,
}

#[derive(Debug, Default)]
struct VarSlot {
    generation: u32,
    storage: Option<Storage>,
}

/// The arena holding expression nodes and variable storage.
#[derive(Debug, Default)]
pub struct ExprArena {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
    vars: Vec<VarSlot>,
    free_vars: Vec<u32>,
    names: NameTable,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn live_variables(&self) -> usize {
        self.vars.iter().filter(|slot| slot.storage.is_some()).count()
    }

    // === Variables ===

    /// Allocates an unnamed storage cell holding `value`.
    pub fn variable(&mut self, value: f64) -> VarHandle {
        self.bind(value, None)
    }

    /// Allocates a named storage cell holding `value`.
    ///
    /// The name is only used for display; two variables may share a name and
    /// remain distinct.
    pub fn variable_named(&mut self, name: &str, value: f64) -> VarHandle {
        let id = self.names.intern(name);
        self.bind(value, Some(id))
    }

    fn bind(&mut self, value: f64, name: Option<NameId>) -> VarHandle {
        let storage = Storage {
            value,
            name,
            users: 0,
            owned: false,
        };

        if let Some(index) = self.free_vars.pop() {
            let slot = &mut self.vars[index as usize];
            slot.storage = Some(storage);
            return VarHandle::new(index, slot.generation);
        }

        let index = self.vars.len();
        assert!(index < u32::MAX as usize, "Variable capacity exceeded");
        self.vars.push(VarSlot {
            generation: 0,
            storage: Some(storage),
        });
        VarHandle::new(index as u32, 0)
    }

    fn storage(&self, var: VarHandle) -> Result<&Storage, ExprError> {
        self.vars
            .get(var.index() as usize)
            .filter(|slot| slot.generation == var.generation())
            .and_then(|slot| slot.storage.as_ref())
            .ok_or(ExprError::UnknownVariable(var))
    }

    fn storage_mut(&mut self, var: VarHandle) -> Result<&mut Storage, ExprError> {
        self.vars
            .get_mut(var.index() as usize)
            .filter(|slot| slot.generation == var.generation())
            .and_then(|slot| slot.storage.as_mut())
            .ok_or(ExprError::UnknownVariable(var))
    }

    /// Returns true if `var` refers to live storage.
    #[must_use]
    pub fn is_bound(&self, var: VarHandle) -> bool {
        self.storage(var).is_ok()
    }

    /// Reads the current value of a variable.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UnknownVariable`] if the storage was freed.
    pub fn value(&self, var: VarHandle) -> Result<f64, ExprError> {
        self.storage(var).map(|s| s.value)
    }

    /// Overwrites the value of a variable. Trees referencing it see the new
    /// value on their next evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UnknownVariable`] if the storage was freed.
    pub fn set_value(&mut self, var: VarHandle, value: f64) -> Result<(), ExprError> {
        self.storage_mut(var)?.value = value;
        Ok(())
    }

    /// Returns the display name of a variable, if it was given one.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UnknownVariable`] if the storage was freed.
    pub fn variable_name(&self, var: VarHandle) -> Result<Option<&str>, ExprError> {
        let storage = self.storage(var)?;
        Ok(storage.name.and_then(|id| self.names.name(id)))
    }

    /// Frees a variable's storage, returning its last value.
    ///
    /// This is for storage the caller kept for itself; storage owned by a
    /// node is freed together with that node.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::VariableInUse`] while any live node references
    /// the variable, and [`ExprError::UnknownVariable`] if it is already gone.
    pub fn free_variable(&mut self, var: VarHandle) -> Result<f64, ExprError> {
        let storage = self.storage(var)?;
        if storage.users > 0 {
            return Err(ExprError::VariableInUse {
                var,
                users: storage.users,
            });
        }
        let value = storage.value;
        self.retire_variable(var);
        Ok(value)
    }

    fn retire_variable(&mut self, var: VarHandle) {
        if let Some(slot) = self.vars.get_mut(var.index() as usize) {
            if slot.generation == var.generation() && slot.storage.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_vars.push(var.index());
            }
        }
    }

    // === Nodes ===

    fn entry(&self, handle: ExprHandle) -> Result<&Entry, ExprError> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(ExprError::UseAfterRelease(handle))
    }

    fn entry_mut(&mut self, handle: ExprHandle) -> Option<&mut Entry> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Gets the node at the given handle.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UseAfterRelease`] if the node was released.
    pub fn get(&self, handle: ExprHandle) -> Result<&ExprNode, ExprError> {
        self.entry(handle).map(|e| &e.node)
    }

    /// Returns true if the node has no owning parent and can be released.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UseAfterRelease`] if the node was released.
    pub fn is_root(&self, handle: ExprHandle) -> Result<bool, ExprError> {
        self.entry(handle).map(|e| !e.owned)
    }

    /// Returns how many live borrowed edges point at the node.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UseAfterRelease`] if the node was released.
    pub fn borrow_count(&self, handle: ExprHandle) -> Result<u32, ExprError> {
        self.entry(handle).map(|e| e.borrowers)
    }

    /// Checks that a node may be inserted: every child is live, no child is
    /// claimed by two owned edges, and storage is owned at most once.
    fn check(&self, node: &ExprNode) -> Result<(), ExprError> {
        let mut claimed: smallvec::SmallVec<[ExprHandle; 2]> = smallvec::SmallVec::new();
        for edge in node.edges() {
            let child = self.entry(edge.node)?;
            if edge.is_owned() {
                if child.owned || claimed.contains(&edge.node) {
                    return Err(ExprError::AlreadyOwned(edge.node));
                }
                claimed.push(edge.node);
            }
        }

        if let ExprNode::Var { var, storage } = node {
            let cell = self.storage(*var)?;
            if *storage == Ownership::Owned && cell.owned {
                return Err(ExprError::StorageAlreadyOwned(*var));
            }
        }
        Ok(())
    }

    /// Allocates a node without checking it. Callers must have validated the
    /// edges (see [`Self::check`]).
    pub(crate) fn push(&mut self, node: ExprNode) -> ExprHandle {
        for edge in node.edges() {
            if let Some(child) = self.entry_mut(edge.node) {
                match edge.ownership {
                    Ownership::Owned => child.owned = true,
                    Ownership::Borrowed => child.borrowers += 1,
                }
            }
        }
        if let ExprNode::Var { var, storage } = &node {
            if let Ok(cell) = self.storage_mut(*var) {
                cell.users += 1;
                if *storage == Ownership::Owned {
                    cell.owned = true;
                }
            }
        }

        let entry = Entry {
            node,
            owned: false,
            borrowers: 0,
        };
        self.live += 1;

        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return ExprHandle::new(index, slot.generation);
        }

        let index = self.slots.len();
        assert!(index < u32::MAX as usize, "Arena capacity exceeded");
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ExprHandle::new(index as u32, 0)
    }

    /// Inserts a node with explicitly tagged edges.
    ///
    /// # Errors
    ///
    /// Fails if a child was released, if an owned child already has an
    /// owner, or if variable storage would be owned twice.
    pub fn insert(&mut self, node: ExprNode) -> Result<ExprHandle, ExprError> {
        self.check(&node)?;
        Ok(self.push(node))
    }

    // === Convenience constructors ===
    //
    // The plain constructors take ownership of their operands; the `_with`
    // variants accept explicit edges.

    /// Creates a constant.
    pub fn constant(&mut self, value: f64) -> ExprHandle {
        self.push(ExprNode::Const(value))
    }

    /// Creates a variable reference that borrows the storage.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UnknownVariable`] if the storage was freed.
    pub fn var(&mut self, var: VarHandle) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Var {
            var,
            storage: Ownership::Borrowed,
        })
    }

    /// Creates a variable reference that owns the storage: releasing the
    /// node frees the variable.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::StorageAlreadyOwned`] if another node already
    /// owns the storage.
    pub fn var_owning(&mut self, var: VarHandle) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Var {
            var,
            storage: Ownership::Owned,
        })
    }

    /// Creates `a + b`, taking ownership of both operands.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn sum(&mut self, a: ExprHandle, b: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.sum_with(Edge::owned(a), Edge::owned(b))
    }

    /// Creates `a + b` with explicit edges.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn sum_with(&mut self, a: Edge, b: Edge) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Sum(a, b))
    }

    /// Creates `a * b`, taking ownership of both operands.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn product(&mut self, a: ExprHandle, b: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.product_with(Edge::owned(a), Edge::owned(b))
    }

    /// Creates `a * b` with explicit edges.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn product_with(&mut self, a: Edge, b: Edge) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Product(a, b))
    }

    /// Creates `base ^ exp`, taking ownership of both operands.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn power(&mut self, base: ExprHandle, exp: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.power_with(Edge::owned(base), Edge::owned(exp))
    }

    /// Creates `base ^ exp` with explicit edges.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn power_with(&mut self, base: Edge, exp: Edge) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Power { base, exp })
    }

    /// Creates `sin(arg)`, taking ownership of the argument.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn sin(&mut self, arg: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Sin(Edge::owned(arg)))
    }

    /// Creates `sin(arg)` with an explicit edge.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn sin_with(&mut self, arg: Edge) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Sin(arg))
    }

    /// Creates `cos(arg)`, taking ownership of the argument.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn cos(&mut self, arg: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Cos(Edge::owned(arg)))
    }

    /// Creates `cos(arg)` with an explicit edge.
    ///
    /// # Errors
    ///
    /// See [`Self::insert`].
    pub fn cos_with(&mut self, arg: Edge) -> Result<ExprHandle, ExprError> {
        self.insert(ExprNode::Cos(arg))
    }

    // === Traversal ===

    /// Visits every node reachable from `root` through any edge, once each.
    pub(crate) fn walk<F>(&self, root: ExprHandle, mut visit: F) -> Result<(), ExprError>
    where
        F: FnMut(ExprHandle, &ExprNode) -> Result<(), ExprError>,
    {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            if !seen.insert(handle) {
                continue;
            }
            let node = self.get(handle)?;
            visit(handle, node)?;
            stack.extend(node.edges().iter().map(|e| e.node));
        }
        Ok(())
    }

    /// Collects `root` and every node reachable from it through owned edges.
    fn owned_subtree(&self, root: ExprHandle) -> Result<Vec<ExprHandle>, ExprError> {
        let mut nodes = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let entry = self.entry(handle)?;
            nodes.push(handle);
            stack.extend(entry.node.owned_children());
        }
        Ok(nodes)
    }

    /// Makes a deep copy of `root` in which every edge is owned.
    ///
    /// Variable nodes in the copy borrow their storage. Copying a derivative
    /// detaches it from the expression it was taken of, so the original can
    /// be released first.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UseAfterRelease`] if any reachable node was
    /// released.
    pub fn clone_tree(&mut self, root: ExprHandle) -> Result<ExprHandle, ExprError> {
        self.walk(root, |_, node| match node {
            ExprNode::Var { var, .. } => self.storage(*var).map(|_| ()),
            _ => Ok(()),
        })?;
        self.copy_owned(root)
    }

    fn copy_owned(&mut self, handle: ExprHandle) -> Result<ExprHandle, ExprError> {
        let node = self.get(handle)?.clone();
        let copy = match node {
            ExprNode::Const(value) => ExprNode::Const(value),
            ExprNode::Var { var, .. } => ExprNode::Var {
                var,
                storage: Ownership::Borrowed,
            },
            ExprNode::Sum(a, b) => ExprNode::Sum(
                Edge::owned(self.copy_owned(a.node)?),
                Edge::owned(self.copy_owned(b.node)?),
            ),
            ExprNode::Product(a, b) => ExprNode::Product(
                Edge::owned(self.copy_owned(a.node)?),
                Edge::owned(self.copy_owned(b.node)?),
            ),
            ExprNode::Power { base, exp } => ExprNode::Power {
                base: Edge::owned(self.copy_owned(base.node)?),
                exp: Edge::owned(self.copy_owned(exp.node)?),
            },
            ExprNode::Sin(arg) => ExprNode::Sin(Edge::owned(self.copy_owned(arg.node)?)),
            ExprNode::Cos(arg) => ExprNode::Cos(Edge::owned(self.copy_owned(arg.node)?)),
        };
        Ok(self.push(copy))
    }

    // === Release ===

    /// Releases a root and every node it owns, returning the number of nodes
    /// freed.
    ///
    /// Only owned edges are followed, so subtrees borrowed from another tree
    /// are left alone. Nothing is freed unless the whole release can succeed.
    ///
    /// # Errors
    ///
    /// - [`ExprError::UseAfterRelease`] if `root` is already released.
    /// - [`ExprError::NotARoot`] if `root` is owned by another node.
    /// - [`ExprError::StillBorrowed`] if a node in the tree is borrowed by a
    ///   live node outside it.
    /// - [`ExprError::VariableInUse`] if the tree owns variable storage that
    ///   live nodes outside it still read.
    pub fn release(&mut self, root: ExprHandle) -> Result<usize, ExprError> {
        if self.entry(root)?.owned {
            return Err(ExprError::NotARoot(root));
        }

        let doomed = self.owned_subtree(root)?;

        // Borrows and variable uses that originate inside the tree vanish
        // with it.
        let mut inner_borrows: HashMap<ExprHandle, u32> = HashMap::new();
        let mut inner_uses: HashMap<VarHandle, u32> = HashMap::new();
        for &handle in &doomed {
            let node = self.get(handle)?;
            for target in node.borrowed_children() {
                *inner_borrows.entry(target).or_insert(0) += 1;
            }
            if let Some(var) = node.as_var() {
                *inner_uses.entry(var).or_insert(0) += 1;
            }
        }

        for &handle in &doomed {
            let entry = self.entry(handle)?;
            let inner = inner_borrows.get(&handle).copied().unwrap_or(0);
            if entry.borrowers > inner {
                return Err(ExprError::StillBorrowed {
                    node: handle,
                    borrowers: entry.borrowers - inner,
                });
            }
            if let ExprNode::Var {
                var,
                storage: Ownership::Owned,
            } = entry.node
            {
                let users = self.storage(var)?.users;
                let inner = inner_uses.get(&var).copied().unwrap_or(0);
                if users > inner {
                    return Err(ExprError::VariableInUse {
                        var,
                        users: users - inner,
                    });
                }
            }
        }

        for &handle in &doomed {
            self.free_slot(handle);
        }
        trace!(root = ?root, freed = doomed.len(), live = self.live, "released expression");
        Ok(doomed.len())
    }

    fn free_slot(&mut self, handle: ExprHandle) {
        let Some(slot) = self.slots.get_mut(handle.index() as usize) else {
            return;
        };
        if slot.generation != handle.generation() {
            return;
        }
        let Some(entry) = slot.entry.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index());
        self.live -= 1;

        for target in entry.node.borrowed_children() {
            if let Some(child) = self.entry_mut(target) {
                child.borrowers = child.borrowers.saturating_sub(1);
            }
        }
        if let ExprNode::Var { var, storage } = entry.node {
            if let Ok(cell) = self.storage_mut(var) {
                cell.users = cell.users.saturating_sub(1);
            }
            if storage == Ownership::Owned {
                self.retire_variable(var);
            }
        }
    }
}
