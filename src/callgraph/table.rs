//! Resolution state: the set of every id declared in the run.
//!
//! The two phases are separate types. [`SymbolTableBuilder`] only accepts
//! writes and has no lookup method; resolution needs a [`SymbolTable`], which
//! only exists once the builder has been frozen after the collection pass.

use std::collections::HashSet;

use crate::types::DeclaredSymbol;

/// Accumulating phase. Writes are additive only.
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    ids: HashSet<String>,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one id. A repeated id is absorbed silently.
    pub fn register(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    /// Register every symbol collected from one file.
    pub fn register_all<'a>(&mut self, symbols: impl IntoIterator<Item = &'a DeclaredSymbol>) {
        self.ids.extend(symbols.into_iter().map(|s| s.id.clone()));
    }

    /// End the accumulating phase.
    pub fn freeze(self) -> SymbolTable {
        SymbolTable { ids: self.ids }
    }
}

/// Frozen phase. Read-only, shared by all resolution workers.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    ids: HashSet<String>,
}

impl SymbolTable {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut builder = SymbolTableBuilder::new();
        for id in iter {
            builder.register(id);
        }
        builder.freeze()
    }
}
