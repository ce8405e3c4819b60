//! Symbols and keywords.
//!
//! Both are a pair of interned names. Symbols additionally carry metadata,
//! which never takes part in equality or hashing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{Meta, MetaMap, merge_meta};
use crate::interner::Interned;

/// A self-evaluating name such as `:tag` or `:user/tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keyword {
    ns: Option<Interned>,
    name: Interned,
}

impl Keyword {
    pub fn new(name: &str) -> Self {
        Keyword {
            ns: None,
            name: Interned::new(name),
        }
    }

    pub fn namespaced(ns: &str, name: &str) -> Self {
        Keyword {
            ns: Some(Interned::new(ns)),
            name: Interned::new(name),
        }
    }

    pub fn name(&self) -> String {
        self.name.resolve()
    }

    pub fn ns(&self) -> Option<String> {
        self.ns.map(|ns| ns.resolve())
    }
}

/// Intern a keyword without a namespace.
pub fn keyword(name: &str) -> Keyword {
    Keyword::new(name)
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns {
            Some(ns) => write!(f, ":{ns}/{}", self.name),
            None => write!(f, ":{}", self.name),
        }
    }
}

/// A name that refers to something, optionally qualified by a namespace.
#[derive(Clone)]
pub struct Symbol {
    ns: Option<Interned>,
    name: Interned,
    meta: Option<Arc<MetaMap>>,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol {
            ns: None,
            name: Interned::new(name),
            meta: None,
        }
    }

    pub fn namespaced(ns: &str, name: &str) -> Self {
        Symbol {
            ns: Some(Interned::new(ns)),
            name: Interned::new(name),
            meta: None,
        }
    }

    pub fn name(&self) -> String {
        self.name.resolve()
    }

    pub fn ns(&self) -> Option<String> {
        self.ns.map(|ns| ns.resolve())
    }

    /// The same name with its namespace dropped.
    pub fn unqualified(&self) -> Symbol {
        Symbol {
            ns: None,
            ..self.clone()
        }
    }
}

pub fn symbol(name: &str) -> Symbol {
    Symbol::new(name)
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ns == other.ns && self.name == other.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ns.hash(state);
        self.name.hash(state);
    }
}

impl Meta for Symbol {
    fn meta(&self) -> Option<&MetaMap> {
        self.meta.as_deref()
    }

    fn with_meta(&self, meta: MetaMap) -> Self {
        Symbol {
            meta: merge_meta(self.meta.as_ref(), meta),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
