//! Namespaces: named tables of interned vars and aliases.
//!
//! The tables themselves are persistent [`Map`]s. Writers swap in an updated
//! map under a lock, so readers can take a snapshot and keep using it while
//! the namespace moves on.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::language::Value;
use crate::map::Map;
use crate::symbol::Symbol;

struct NamespaceState {
    mappings: Map<Symbol, Value>,
    aliases: Map<Symbol, Symbol>,
}

/// A named namespace.
///
/// Cloning is cheap (just an Arc increment) and clones share state.
#[derive(Clone)]
pub struct Namespace {
    name: Symbol,
    state: Arc<RwLock<NamespaceState>>,
}

impl Namespace {
    pub fn new(name: Symbol) -> Self {
        Namespace {
            name,
            state: Arc::new(RwLock::new(NamespaceState {
                mappings: Map::new(),
                aliases: Map::new(),
            })),
        }
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Bind `sym` to `value`, replacing any existing binding.
    pub fn intern(&self, sym: Symbol, value: Value) {
        tracing::trace!(ns = %self.name, sym = %sym, "intern");
        let mut state = self.state.write();
        state.mappings = state.mappings.assoc(sym, value);
    }

    /// The value bound to `sym` in this namespace.
    pub fn find(&self, sym: &Symbol) -> Option<Value> {
        self.state.read().mappings.get(sym).cloned()
    }

    /// Remove the binding for `sym`, if any.
    pub fn unmap(&self, sym: &Symbol) {
        tracing::trace!(ns = %self.name, sym = %sym, "unmap");
        let mut state = self.state.write();
        state.mappings = state.mappings.dissoc(sym);
    }

    /// Make `alias` refer to the namespace named `target`.
    pub fn add_alias(&self, alias: Symbol, target: Symbol) {
        tracing::trace!(ns = %self.name, alias = %alias, target = %target, "add alias");
        let mut state = self.state.write();
        state.aliases = state.aliases.assoc(alias, target);
    }

    pub fn resolve_alias(&self, alias: &Symbol) -> Option<Symbol> {
        self.state.read().aliases.get(alias).cloned()
    }

    /// A snapshot of every binding. Later changes are not reflected.
    pub fn mappings(&self) -> Map<Symbol, Value> {
        self.state.read().mappings.clone()
    }

    pub fn aliases(&self) -> Map<Symbol, Symbol> {
        self.state.read().aliases.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol;

    #[test]
    fn test_intern_and_find() {
        let ns = Namespace::new(symbol("user"));
        ns.intern(symbol("x"), Value::Int(1));
        assert_eq!(ns.find(&symbol("x")), Some(Value::Int(1)));
        assert_eq!(ns.find(&symbol("y")), None);
        ns.intern(symbol("x"), Value::Int(2));
        assert_eq!(ns.find(&symbol("x")), Some(Value::Int(2)));
    }

    #[test]
    fn test_snapshot_is_stable() {
        let ns = Namespace::new(symbol("user"));
        ns.intern(symbol("a"), Value::Int(1));
        let before = ns.mappings();
        ns.unmap(&symbol("a"));
        assert_eq!(before.len(), 1);
        assert!(ns.mappings().is_empty());
    }

    #[test]
    fn test_aliases() {
        let ns = Namespace::new(symbol("user"));
        ns.add_alias(symbol("str"), symbol("clojure.string"));
        assert_eq!(ns.resolve_alias(&symbol("str")), Some(symbol("clojure.string")));
        assert_eq!(ns.resolve_alias(&symbol("set")), None);
    }
}
