//! Interned BSON symbols.
//!
//! Every symbol handed out by a [`SymbolTable`] for a given name shares one
//! allocation, so two symbols with the same name are the same instance.
//! Symbols are never evicted.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::trace;

/// BSON symbol. Construct through [`BsonSymbol::new`] or a [`SymbolTable`].
#[derive(Debug, Clone, Eq)]
pub struct BsonSymbol {
    name: Arc<str>,
}

impl BsonSymbol {
    /// Returns the canonical symbol for `name` from the process-wide table.
    pub fn new(name: &str) -> Self {
        SymbolTable::global().lookup(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when both handles point at the same interned instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.name, &b.name)
    }
}

impl PartialEq for BsonSymbol {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.name == other.name
    }
}

impl Hash for BsonSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for BsonSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

static SYMBOL_TABLE: Lazy<SymbolTable> = Lazy::new(SymbolTable::new);

/// Name to canonical-symbol registry.
///
/// Lookup-or-insert runs under a single lock so two threads interning the
/// same name always receive the same instance.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Mutex<HashSet<Arc<str>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table, created on first use.
    pub fn global() -> &'static SymbolTable {
        &SYMBOL_TABLE
    }

    pub fn lookup(&self, name: &str) -> BsonSymbol {
        let mut symbols = self.symbols.lock();
        if let Some(existing) = symbols.get(name) {
            return BsonSymbol {
                name: Arc::clone(existing),
            };
        }
        let interned: Arc<str> = Arc::from(name);
        symbols.insert(Arc::clone(&interned));
        trace!(symbol = name, "interned new symbol");
        BsonSymbol { name: interned }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
