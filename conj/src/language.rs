use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{Meta, MetaMap};
use crate::equality::hash_ordered;
use crate::list::{self, List};
use crate::map::{Map, MapEntry};
use crate::printer::{PrintOptions, write_value};
use crate::seq::{self, Seq};
use crate::set::Set;
use crate::symbol::{Keyword, Symbol};
use crate::vector::{self, Vector};

// ============================================================================
// Core Type System
// ============================================================================

/// A runtime value as seen by the reader, compiler and printer.
///
/// Collections hold `Value`s and are themselves `Value`s, so every kind
/// nests freely. Cloning is cheap: collections share their structure.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Keyword(Keyword),
    Symbol(Symbol),
    List(List<Value>),
    Vector(Vector<Value>),
    Map(Map<Value, Value>),
    Set(Set<Value>),
    Seq(Seq<Value>),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Short lowercase name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Seq(_) => "seq",
        }
    }

    /// Metadata attached to this value, for the kinds that carry it.
    pub fn attached_meta(&self) -> Option<&MetaMap> {
        match self {
            Value::Symbol(s) => s.meta(),
            Value::List(l) => l.meta(),
            Value::Vector(v) => v.meta(),
            Value::Map(m) => m.meta(),
            Value::Set(s) => s.meta(),
            _ => None,
        }
    }

    /// Elements in order, for lists, vectors and seqs.
    pub(crate) fn sequential(&self) -> Option<Sequential<'_>> {
        match self {
            Value::List(l) => Some(Sequential::List(l.iter())),
            Value::Vector(v) => Some(Sequential::Vector(v.iter())),
            Value::Seq(s) => Some(Sequential::Seq(s.iter())),
            _ => None,
        }
    }
}

/// Borrowing iterator over any sequential kind.
pub(crate) enum Sequential<'a> {
    List(list::Iter<'a, Value>),
    Vector(vector::Iter<'a, Value>),
    Seq(seq::Iter<'a, Value>),
}

impl<'a> Iterator for Sequential<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self {
            Sequential::List(it) => it.next(),
            Sequential::Vector(it) => it.next(),
            Sequential::Seq(it) => it.next(),
        }
    }
}

// Lists, vectors and seqs with the same elements are equal regardless of
// kind, so they must also hash alike.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            _ => match (self.sequential(), other.sequential()) {
                (Some(a), Some(b)) => a.eq(b),
                _ => false,
            },
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(items) = self.sequential() {
            state.write_u8(6);
            hash_ordered(items, state);
            return;
        }
        match self {
            Value::Nil => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(n) => {
                state.write_u8(2);
                n.hash(state);
            }
            Value::Str(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Value::Keyword(k) => {
                state.write_u8(4);
                k.hash(state);
            }
            Value::Symbol(s) => {
                state.write_u8(5);
                s.hash(state);
            }
            Value::Map(m) => {
                state.write_u8(7);
                m.hash(state);
            }
            Value::Set(s) => {
                state.write_u8(8);
                s.hash(state);
            }
            Value::List(_) | Value::Vector(_) | Value::Seq(_) => {}
        }
    }
}

// ============================================================================
// Display Implementation
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_value(f, self, &PrintOptions::default())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<List<Value>> for Value {
    fn from(l: List<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Vector<Value>> for Value {
    fn from(v: Vector<Value>) -> Self {
        Value::Vector(v)
    }
}

impl From<Map<Value, Value>> for Value {
    fn from(m: Map<Value, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Set<Value>> for Value {
    fn from(s: Set<Value>) -> Self {
        Value::Set(s)
    }
}

impl From<Seq<Value>> for Value {
    fn from(s: Seq<Value>) -> Self {
        Value::Seq(s)
    }
}

/// A map entry becomes the two-element vector `[key value]`.
impl From<MapEntry<Value, Value>> for Value {
    fn from(entry: MapEntry<Value, Value>) -> Self {
        let (key, value) = entry.into_pair();
        Value::Vector(crate::vector::vector([key, value]))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}
