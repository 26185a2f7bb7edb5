//! Interning of variable names.
//!
//! Names are only used for display, so the table maps each distinct name to a
//! small id and never forgets one; storage cells carry the id.

use hashbrown::HashMap;

/// Identifier of an interned name.
pub type NameId = u32;

/// A table assigning each distinct name a stable id.
#[derive(Debug, Default)]
pub struct NameTable {
    /// Maps names to their IDs.
    ids: HashMap<String, NameId>,
    /// Stores names by ID for reverse lookup.
    names: Vec<String>,
}

impl NameTable {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, returning its id.
    ///
    /// Interning the same name twice returns the same id.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = NameId::try_from(self.names.len()).unwrap_or(NameId::MAX);
        self.ids.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        id
    }

    /// Looks up a name by id.
    #[must_use]
    pub fn name(&self, id: NameId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Gets the id of a name, if it was interned.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<NameId> {
        self.ids.get(name).copied()
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
