//! Global symbol environment.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use super::domain::Domain;
use super::symbol::Symbol;
use crate::error::{CalcError, Result};

/// Name → symbol map.  Redefining a name replaces the previous symbol;
/// already compiled code keeps the symbol it resolved.
pub struct Environment<D: Domain> {
    symbols: HashMap<String, Arc<dyn Symbol<D>>>,
}

impl<D: Domain> Default for Environment<D> {
    fn default() -> Self {
        Environment { symbols: HashMap::new() }
    }
}

impl<D: Domain> fmt::Debug for Environment<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("domain", &D::NAME)
            .field("symbols", &self.names())
            .finish()
    }
}

impl<D: Domain> Environment<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a global symbol.
    pub fn define(&mut self, name: impl Into<String>, symbol: impl Symbol<D> + 'static) {
        self.define_shared(name, Arc::new(symbol));
    }

    pub fn define_shared(&mut self, name: impl Into<String>, symbol: Arc<dyn Symbol<D>>) {
        self.symbols.insert(name.into(), symbol);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Symbol<D>>> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| CalcError::UnknownSymbol(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Sorted snapshot of every defined name.
    pub fn names(&self) -> BTreeSet<String> {
        self.symbols.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
