//! Polymorphic operations over [`Value`].
//!
//! These functions dispatch on the kind of their collection argument and
//! give every kind the same Clojure-style behavior: `conj` adds at the
//! natural position, `get` never fails, `nil` behaves as an empty
//! collection. Kinds that do not support an operation report
//! [`CollectionError::Unsupported`].

use std::sync::Arc;

use crate::contracts::{Meta, MetaMap, Seqable};
use crate::error::{CollectionError, Result};
use crate::language::Value;
use crate::list::List;
use crate::map::{Map, MapEntry};
use crate::seq::Seq;
use crate::set::Set;

// ============================================================================
// Seq Abstraction - Uniform iteration over values
// ============================================================================

/// A seq over `value`, or `None` when it is `nil` or empty.
///
/// Maps seq as `[key value]` vectors and strings as one-character strings.
pub fn seq(value: &Value) -> Result<Option<Seq<Value>>> {
    let s = match value {
        Value::Nil => return Ok(None),
        Value::List(l) => l.seq(),
        Value::Vector(v) => v.seq(),
        Value::Set(s) => s.seq(),
        Value::Seq(s) => s.clone(),
        Value::Map(m) if m.is_empty() => Seq::new(),
        Value::Map(m) => Seq::lazy(
            m.clone()
                .into_iter()
                .map(|(k, v)| Value::from(MapEntry::new(k, v))),
        ),
        Value::Str(s) if s.is_empty() => Seq::new(),
        Value::Str(s) => Seq::lazy(StrChars {
            text: Arc::clone(s),
            pos: 0,
        }),
        other => return Err(CollectionError::unsupported("seq", other.kind_name())),
    };
    Ok(if s.is_empty() { None } else { Some(s) })
}

/// Owning iterator over the characters of a shared string.
struct StrChars {
    text: Arc<str>,
    pos: usize,
}

impl Iterator for StrChars {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let c = self.text.get(self.pos..)?.chars().next()?;
        self.pos += c.len_utf8();
        Some(Value::from(c.to_string()))
    }
}

/// The first element of `value`, or `nil`.
pub fn first(value: &Value) -> Result<Value> {
    Ok(seq(value)?
        .and_then(|s| s.first().cloned())
        .unwrap_or(Value::Nil))
}

/// Everything after the first element; an empty seq rather than `nil`.
pub fn rest(value: &Value) -> Result<Value> {
    Ok(Value::Seq(seq(value)?.map(|s| s.rest()).unwrap_or_default()))
}

/// Everything after the first element, or `nil` when nothing remains.
pub fn next(value: &Value) -> Result<Value> {
    let rest = seq(value)?.map(|s| s.rest()).unwrap_or_default();
    Ok(if rest.is_empty() {
        Value::Nil
    } else {
        Value::Seq(rest)
    })
}

// ============================================================================
// Counted
// ============================================================================

/// Number of elements. Constant time except for seqs, which are realized.
pub fn count(value: &Value) -> Result<usize> {
    match value {
        Value::Nil => Ok(0),
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(l) => Ok(l.len()),
        Value::Vector(v) => Ok(v.len()),
        Value::Map(m) => Ok(m.len()),
        Value::Set(s) => Ok(s.len()),
        Value::Seq(s) => Ok(s.count()),
        other => Err(CollectionError::unsupported("count", other.kind_name())),
    }
}

// ============================================================================
// Indexed
// ============================================================================

/// The element at `index` of a sequential value.
///
/// Out of range returns `default` when one is given and fails otherwise.
pub fn nth(value: &Value, index: i64, default: Option<&Value>) -> Result<Value> {
    let found = match value {
        Value::Nil => None,
        Value::Vector(v) => usize::try_from(index).ok().and_then(|i| v.get(i)).cloned(),
        Value::List(_) | Value::Seq(_) => match (value.sequential(), usize::try_from(index)) {
            (Some(mut items), Ok(i)) => items.nth(i).cloned(),
            _ => None,
        },
        Value::Str(s) => usize::try_from(index)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::from(c.to_string())),
        other => return Err(CollectionError::unsupported("nth", other.kind_name())),
    };
    match (found, default) {
        (Some(found), _) => Ok(found),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(CollectionError::index_out_of_range(index, count(value)?)),
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// Look up `key` in `coll`, returning `default` (or `nil`) on a miss.
/// Never fails: non-collections simply have no keys.
pub fn get(coll: &Value, key: &Value, default: Option<&Value>) -> Value {
    let found = match (coll, key) {
        (Value::Map(m), _) => m.get(key).cloned(),
        (Value::Set(s), _) => s.get(key).cloned(),
        (Value::Vector(v), Value::Int(i)) => v.entry(*i).cloned(),
        (Value::Str(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::from(c.to_string())),
        _ => None,
    };
    found.unwrap_or_else(|| default.cloned().unwrap_or(Value::Nil))
}

/// Whether `key` is present. For vectors the key is an index.
pub fn contains(coll: &Value, key: &Value) -> Result<bool> {
    match (coll, key) {
        (Value::Nil, _) => Ok(false),
        (Value::Map(m), _) => Ok(m.contains(key)),
        (Value::Set(s), _) => Ok(s.contains(key)),
        (Value::Vector(v), Value::Int(i)) => Ok(v.contains(*i)),
        (Value::Vector(_), _) => Ok(false),
        (other, _) => Err(CollectionError::unsupported("contains", other.kind_name())),
    }
}

// ============================================================================
// Associative
// ============================================================================

/// Bind `key` to `val`. `nil` is treated as an empty map; vectors require an
/// integer index no greater than their length.
pub fn assoc(coll: &Value, key: Value, val: Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Map(Map::new().assoc(key, val))),
        Value::Map(m) => Ok(Value::Map(m.assoc(key, val))),
        Value::Vector(v) => match key {
            Value::Int(i) => Ok(Value::Vector(v.assoc(i, val)?)),
            other => Err(CollectionError::invalid_key("vector", other)),
        },
        other => Err(CollectionError::unsupported("assoc", other.kind_name())),
    }
}

/// Remove `key` from a map. Absent keys and `nil` are no-ops.
pub fn dissoc(coll: &Value, key: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Map(m) => Ok(Value::Map(m.dissoc(key))),
        other => Err(CollectionError::unsupported("dissoc", other.kind_name())),
    }
}

// ============================================================================
// Conj - Polymorphic insertion
// ============================================================================

/// Add `item` at the collection's natural position.
///
/// - `nil` and lists: prepend, producing a list
/// - vectors: append
/// - sets: add if absent
/// - seqs: prepend
/// - maps: `item` must be a `[key value]` vector or another map
pub fn conj(coll: &Value, item: Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::List(List::new().cons(item))),
        Value::List(l) => Ok(Value::List(l.cons(item))),
        Value::Vector(v) => Ok(Value::Vector(v.cons(item))),
        Value::Set(s) => Ok(Value::Set(s.cons(item))),
        Value::Seq(s) => Ok(Value::Seq(s.cons(item))),
        Value::Map(m) => match item {
            Value::Vector(pair) if pair.len() == 2 => {
                let mut kv = pair.iter().cloned();
                match (kv.next(), kv.next()) {
                    (Some(k), Some(v)) => Ok(Value::Map(m.assoc(k, v))),
                    _ => Err(CollectionError::invalid_key("map", Value::Vector(pair))),
                }
            }
            Value::Map(other) => Ok(Value::Map(m.merge(&other))),
            other => Err(CollectionError::invalid_key("map", other)),
        },
        other => Err(CollectionError::unsupported("conj", other.kind_name())),
    }
}

/// Remove `item` from a set. `nil` is a no-op.
pub fn disj(coll: &Value, item: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Set(s) => Ok(Value::Set(s.disj(item))),
        other => Err(CollectionError::unsupported("disj", other.kind_name())),
    }
}

// ============================================================================
// Stack
// ============================================================================

/// Head of a list or last element of a vector; `nil` when empty.
pub fn peek(coll: &Value) -> Result<Value> {
    let top = match coll {
        Value::Nil => None,
        Value::List(l) => l.peek(),
        Value::Vector(v) => v.peek(),
        other => return Err(CollectionError::unsupported("peek", other.kind_name())),
    };
    Ok(top.cloned().unwrap_or(Value::Nil))
}

/// The collection without its `peek` element. Popping an empty list or
/// vector is an error; popping `nil` is `nil`.
pub fn pop(coll: &Value) -> Result<Value> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::List(l) => Ok(Value::List(l.pop()?)),
        Value::Vector(v) => Ok(Value::Vector(v.pop()?)),
        other => Err(CollectionError::unsupported("pop", other.kind_name())),
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// The metadata of `value` as a map, or `nil`.
pub fn meta(value: &Value) -> Value {
    value
        .attached_meta()
        .map_or(Value::Nil, |m| Value::Map(m.clone()))
}

/// `value` with `meta` merged over its existing metadata.
pub fn with_meta(value: &Value, meta: MetaMap) -> Result<Value> {
    match value {
        Value::Symbol(s) => Ok(Value::Symbol(s.with_meta(meta))),
        Value::List(l) => Ok(Value::List(l.with_meta(meta))),
        Value::Vector(v) => Ok(Value::Vector(v.with_meta(meta))),
        Value::Map(m) => Ok(Value::Map(m.with_meta(meta))),
        Value::Set(s) => Ok(Value::Set(s.with_meta(meta))),
        other => Err(CollectionError::unsupported("with-meta", other.kind_name())),
    }
}

// ============================================================================
// Callable abstraction - IFn-like behavior
// ============================================================================

/// Whether `value` can be invoked as a function.
pub fn is_callable(value: &Value) -> bool {
    matches!(
        value,
        Value::Map(_) | Value::Set(_) | Value::Vector(_) | Value::Keyword(_)
    )
}

/// Invoke `f` on `arg`.
///
/// Maps look `arg` up in themselves, keywords look themselves up in `arg`,
/// and vectors return the element at index `arg`. A set returns its stored
/// member equal to `arg` or `nil`; it never uses `default`.
pub fn call(f: &Value, arg: &Value, default: Option<&Value>) -> Result<Value> {
    match f {
        Value::Map(_) => Ok(get(f, arg, default)),
        Value::Set(s) => Ok(s.get(arg).cloned().unwrap_or(Value::Nil)),
        Value::Keyword(_) => Ok(get(arg, f, default)),
        Value::Vector(v) => match arg {
            Value::Int(i) => v
                .entry(*i)
                .cloned()
                .ok_or_else(|| CollectionError::index_out_of_range(*i, v.len())),
            other => Err(CollectionError::invalid_key("vector", other)),
        },
        other => Err(CollectionError::unsupported("call", other.kind_name())),
    }
}

// ============================================================================
// Constructor helpers
// ============================================================================

pub fn empty_map() -> Value {
    Value::Map(Map::new())
}

/// A map from key/value pairs; later pairs win.
pub fn hash_map<I: IntoIterator<Item = (Value, Value)>>(pairs: I) -> Value {
    Value::Map(pairs.into_iter().collect())
}

pub fn empty_set() -> Value {
    Value::Set(Set::new())
}

pub fn hash_set<I: IntoIterator<Item = Value>>(elements: I) -> Value {
    Value::Set(elements.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keyword, list, vector};

    fn ints(ns: &[i64]) -> Vec<Value> {
        ns.iter().copied().map(Value::Int).collect()
    }

    fn kw(name: &str) -> Value {
        Value::Keyword(keyword(name))
    }

    #[test]
    fn test_seq_list() {
        let l = Value::List(list(ints(&[1, 2, 3])));
        let s = seq(&l).unwrap().unwrap();
        assert_eq!(s.first(), Some(&Value::Int(1)));
        assert_eq!(s.rest().first(), Some(&Value::Int(2)));
        assert!(s.rest().rest().rest().is_empty());
    }

    #[test]
    fn test_seq_nil_and_empty() {
        assert!(seq(&Value::Nil).unwrap().is_none());
        assert!(seq(&Value::Vector(Default::default())).unwrap().is_none());
        assert!(seq(&empty_map()).unwrap().is_none());
        assert!(seq(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_seq_map_yields_pairs() {
        let m = hash_map([(kw("a"), Value::Int(1))]);
        assert_eq!(
            first(&m).unwrap(),
            Value::Vector(vector([kw("a"), Value::Int(1)]))
        );
    }

    #[test]
    fn test_seq_string() {
        let s = Value::str("abc");
        assert_eq!(first(&s).unwrap(), Value::str("a"));
        assert_eq!(first(&next(&s).unwrap()).unwrap(), Value::str("b"));
        assert_eq!(count(&s).unwrap(), 3);
    }

    #[test]
    fn test_rest_and_next_at_end() {
        let v = Value::Vector(vector(ints(&[1])));
        assert_eq!(next(&v).unwrap(), Value::Nil);
        assert_eq!(rest(&v).unwrap(), Value::Seq(Seq::new()));
        assert_eq!(rest(&Value::Nil).unwrap(), Value::Seq(Seq::new()));
    }

    #[test]
    fn test_count() {
        assert_eq!(count(&Value::List(list(ints(&[1, 2])))).unwrap(), 2);
        assert_eq!(count(&Value::Nil).unwrap(), 0);
        assert_eq!(count(&hash_set(ints(&[1, 1, 2]))).unwrap(), 2);
        assert!(count(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_nth() {
        let v = Value::Vector(vector(ints(&[10, 20, 30])));
        assert_eq!(nth(&v, 2, None).unwrap(), Value::Int(30));
        assert_eq!(nth(&v, 3, Some(&Value::Nil)).unwrap(), Value::Nil);
        assert_eq!(
            nth(&v, 3, None),
            Err(CollectionError::IndexOutOfRange { index: 3, len: 3 })
        );
        let l = Value::List(list(ints(&[10, 20])));
        assert_eq!(nth(&l, 1, None).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_get() {
        let m = hash_map([(kw("a"), Value::Int(1))]);
        assert_eq!(get(&m, &kw("a"), None), Value::Int(1));
        assert_eq!(get(&m, &kw("b"), None), Value::Nil);
        assert_eq!(get(&m, &kw("b"), Some(&Value::Int(0))), Value::Int(0));

        let v = Value::Vector(vector(ints(&[10, 20])));
        assert_eq!(get(&v, &Value::Int(1), None), Value::Int(20));
        assert_eq!(get(&v, &Value::Int(-1), None), Value::Int(20));
        assert_eq!(get(&v, &kw("x"), None), Value::Nil);
        assert_eq!(get(&Value::Int(5), &kw("x"), None), Value::Nil);
    }

    #[test]
    fn test_assoc() {
        let m = assoc(&Value::Nil, kw("a"), Value::Int(1)).unwrap();
        assert_eq!(get(&m, &kw("a"), None), Value::Int(1));

        let v = Value::Vector(vector(ints(&[1, 2])));
        let v2 = assoc(&v, Value::Int(2), Value::Int(3)).unwrap();
        assert_eq!(v2, Value::Vector(vector(ints(&[1, 2, 3]))));
        assert_eq!(
            assoc(&v, Value::Int(5), Value::Nil),
            Err(CollectionError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(matches!(
            assoc(&v, kw("k"), Value::Nil),
            Err(CollectionError::InvalidKey { kind: "vector", .. })
        ));
        assert!(assoc(&Value::Int(1), kw("k"), Value::Nil).is_err());
    }

    #[test]
    fn test_dissoc_and_disj() {
        let m = hash_map([(kw("a"), Value::Int(1)), (kw("b"), Value::Int(2))]);
        assert_eq!(
            dissoc(&m, &kw("a")).unwrap(),
            hash_map([(kw("b"), Value::Int(2))])
        );
        let s = hash_set(ints(&[1, 2]));
        assert_eq!(disj(&s, &Value::Int(1)).unwrap(), hash_set(ints(&[2])));
        assert_eq!(disj(&Value::Nil, &Value::Int(1)).unwrap(), Value::Nil);
    }

    #[test]
    fn test_conj_positions() {
        let l = conj(&Value::List(list(ints(&[2, 3]))), Value::Int(1)).unwrap();
        assert_eq!(first(&l).unwrap(), Value::Int(1));

        let v = conj(&Value::Vector(vector(ints(&[1, 2]))), Value::Int(3)).unwrap();
        assert_eq!(peek(&v).unwrap(), Value::Int(3));

        let n = conj(&Value::Nil, Value::Int(1)).unwrap();
        assert_eq!(n, Value::List(list(ints(&[1]))));

        let m = conj(&empty_map(), Value::Vector(vector([kw("a"), Value::Int(1)]))).unwrap();
        assert_eq!(get(&m, &kw("a"), None), Value::Int(1));
        assert!(conj(&empty_map(), Value::Int(1)).is_err());
    }

    #[test]
    fn test_peek_pop() {
        let l = Value::List(list(ints(&[1, 2])));
        assert_eq!(peek(&l).unwrap(), Value::Int(1));
        assert_eq!(pop(&l).unwrap(), Value::List(list(ints(&[2]))));
        assert_eq!(
            pop(&Value::Vector(Default::default())),
            Err(CollectionError::Underflow { kind: "vector" })
        );
        assert_eq!(peek(&Value::List(Default::default())).unwrap(), Value::Nil);
    }

    #[test]
    fn test_meta_round_trip() {
        let v = Value::Vector(vector(ints(&[1])));
        assert_eq!(meta(&v), Value::Nil);
        let tagged = with_meta(&v, crate::map([(kw("tag"), Value::Int(1))])).unwrap();
        assert_eq!(get(&meta(&tagged), &kw("tag"), None), Value::Int(1));
        assert_eq!(tagged, v);
        assert!(with_meta(&Value::Int(1), Map::new()).is_err());
    }

    #[test]
    fn test_call() {
        let m = hash_map([(kw("a"), Value::Int(1))]);
        assert!(is_callable(&m));
        assert_eq!(call(&m, &kw("a"), None).unwrap(), Value::Int(1));
        assert_eq!(call(&kw("a"), &m, None).unwrap(), Value::Int(1));

        let s = hash_set(ints(&[7]));
        assert_eq!(call(&s, &Value::Int(7), None).unwrap(), Value::Int(7));
        assert_eq!(call(&s, &Value::Int(8), None).unwrap(), Value::Nil);

        let v = Value::Vector(vector(ints(&[5])));
        assert_eq!(call(&v, &Value::Int(0), None).unwrap(), Value::Int(5));
        assert!(call(&v, &Value::Int(1), None).is_err());
        assert!(!is_callable(&Value::Int(1)));
        assert!(call(&Value::Int(1), &Value::Nil, None).is_err());
    }

    #[test]
    fn test_call_set_ignores_default() {
        let s = hash_set(ints(&[1, 2, 3]));
        let fallback = Value::Int(99);
        assert_eq!(call(&s, &Value::Int(5), Some(&fallback)).unwrap(), Value::Nil);
        assert_eq!(call(&s, &Value::Int(2), Some(&fallback)).unwrap(), Value::Int(2));

        let m = hash_map([(kw("a"), Value::Int(1))]);
        assert_eq!(call(&m, &kw("b"), Some(&fallback)).unwrap(), fallback);
    }

    #[test]
    fn test_seq_string_pulls_lazily() {
        let s = seq(&Value::str("héllo")).unwrap().unwrap();
        assert_eq!(s.first(), Some(&Value::str("h")));
        assert_eq!(s.rest().first(), Some(&Value::str("é")));
        assert_eq!(count(&Value::Seq(s)).unwrap(), 5);
        assert!(seq(&Value::str("")).unwrap().is_none());
    }
}
