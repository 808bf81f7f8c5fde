//! Bidirectional mapping between timestamps and pose symbols.

use std::collections::{BTreeMap, HashMap};

use crate::core::time::Time;
use crate::error::{Error, Result};

use super::symbol::Symbol;

/// Bijective timestamp ↔ pose-symbol index.
///
/// One symbol per distinct timestamp; the allocation counter is monotonic
/// and never reused, including across out-of-order timestamp requests.
/// Callers are serialized externally (the index lives behind the mapper's
/// state lock, owned by the pose chain).
#[derive(Debug, Default)]
pub struct TimeSymbolIndex {
    by_time: BTreeMap<Time, Symbol>,
    by_symbol: HashMap<Symbol, Time>,
    next_index: u64,
}

impl TimeSymbolIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the symbol for `t`, allocating a new one if `t` has never
    /// been indexed. Never fails.
    pub fn symbol_for_time(&mut self, t: Time) -> Symbol {
        if let Some(sym) = self.by_time.get(&t) {
            return *sym;
        }
        let sym = Symbol::pose(self.next_index);
        self.next_index += 1;
        self.by_time.insert(t, sym);
        self.by_symbol.insert(sym, t);
        sym
    }

    /// Symbol for `t` without allocating.
    pub fn get(&self, t: Time) -> Option<Symbol> {
        self.by_time.get(&t).copied()
    }

    /// Timestamp for a symbol allocated through this index.
    ///
    /// Fails with `NotFound` for symbols from other namespaces (landmarks,
    /// walls) or pose symbols never allocated here.
    pub fn time_for_symbol(&self, sym: Symbol) -> Result<Time> {
        self.by_symbol
            .get(&sym)
            .copied()
            .ok_or_else(|| Error::unknown_symbol(sym))
    }

    /// Number of indexed timestamps.
    pub fn len(&self) -> usize {
        self.by_time.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }

    /// Clear all entries and restart symbol allocation from zero.
    pub fn clear(&mut self) {
        self.by_time.clear();
        self.by_symbol.clear();
        self.next_index = 0;
    }
}
