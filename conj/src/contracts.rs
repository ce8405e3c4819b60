//! Capability contracts implemented by the persistent collections.
//!
//! Each contract is a narrow trait. A concrete kind composes as many as it
//! supports: `Vector` is `Associative<i64, T>`, `Stack<T>` and `Seqable<T>`
//! at once, and callers pick the view they need.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::language::Value;
use crate::map::Map;
use crate::seq::Seq;

/// Metadata attached to a value. Never part of equality or hashing.
pub type MetaMap = Map<Value, Value>;

/// Values that carry an optional metadata map.
pub trait Meta: Sized {
    /// The attached metadata, if any.
    fn meta(&self) -> Option<&MetaMap>;

    /// Return the same value with `meta` merged over the existing metadata.
    /// Keys in `meta` win on conflict.
    fn with_meta(&self, meta: MetaMap) -> Self;
}

/// Values that can be dereferenced to a single underlying value.
pub trait Dereference {
    type Target;

    fn deref(&self) -> &Self::Target;
}

/// Dereference that gives up after `timeout`, yielding `timeout_value`
/// instead of blocking indefinitely.
pub trait BlockingDereference: Dereference {
    fn deref_timeout<'a>(
        &'a self,
        timeout: Duration,
        timeout_value: &'a Self::Target,
    ) -> &'a Self::Target;
}

/// Values that can produce a [`Seq`] over their elements.
pub trait Seqable<T> {
    fn seq(&self) -> Seq<T>;
}

/// A persistent collection of `T`.
pub trait Collection<T>: Seqable<T> + Clone {
    /// Add one element in the kind's natural position.
    fn cons(&self, elem: T) -> Self;

    /// Add each element in order.
    fn cons_all<I: IntoIterator<Item = T>>(&self, elems: I) -> Self {
        elems.into_iter().fold(self.clone(), |coll, elem| coll.cons(elem))
    }

    /// The canonical empty collection of this kind.
    fn empty() -> Self;

    fn count(&self) -> usize;
}

/// Collections with last-in first-out access.
///
/// `peek` on an empty stack is `None`; `pop` on an empty stack is an
/// [`Underflow`](crate::CollectionError::Underflow) error for every kind.
pub trait Stack<T>: Collection<T> {
    fn peek(&self) -> Option<&T>;

    fn pop(&self) -> Result<Self>;
}

/// Key to value lookup and update.
pub trait Associative<K, V>: Clone {
    fn assoc(&self, key: K, value: V) -> Result<Self>;

    /// Apply each pair left to right. Stops at the first failure; the
    /// receiver is unaffected either way.
    fn assoc_all<I: IntoIterator<Item = (K, V)>>(&self, pairs: I) -> Result<Self> {
        pairs
            .into_iter()
            .try_fold(self.clone(), |coll, (key, value)| coll.assoc(key, value))
    }

    fn contains(&self, key: &K) -> bool;

    fn entry(&self, key: &K) -> Option<&V>;

    fn entry_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.entry(key).unwrap_or(default)
    }
}

/// An immutable key/value pair yielded by associative iteration.
pub trait Entry<K, V> {
    fn key(&self) -> &K;

    fn value(&self) -> &V;
}

/// Associative collections that support key removal.
pub trait PersistentMap<K, V>: Associative<K, V> {
    /// Remove `key`. Absent keys are a no-op.
    fn dissoc(&self, key: &K) -> Self;

    fn dissoc_all<'a, I>(&self, keys: I) -> Self
    where
        K: 'a,
        I: IntoIterator<Item = &'a K>,
    {
        keys.into_iter()
            .fold(self.clone(), |coll, key| coll.dissoc(key))
    }
}

/// Collections of unique elements.
pub trait PersistentSet<T>: Collection<T> {
    /// Remove `elem`. Absent elements are a no-op.
    fn disj(&self, elem: &T) -> Self;

    fn disj_all<'a, I>(&self, elems: I) -> Self
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        elems
            .into_iter()
            .fold(self.clone(), |coll, elem| coll.disj(elem))
    }

    /// Membership function: the stored element equal to `elem`, if any.
    fn get(&self, elem: &T) -> Option<&T>;
}

/// Marker for linked-list collections.
pub trait PersistentList<T>: Stack<T> {}

/// Marker for integer-indexed vectors.
pub trait PersistentVector<T>: Associative<i64, T> + Stack<T> {}

/// Marker for record values: maps with a fixed set of named fields.
pub trait Record {}

/// Marker for user-defined types.
pub trait Type {}

/// Merge `meta` over `existing`, producing the metadata of a derived value.
pub(crate) fn merge_meta(existing: Option<&Arc<MetaMap>>, meta: MetaMap) -> Option<Arc<MetaMap>> {
    let merged = match existing {
        Some(old) => old.merge(&meta),
        None => meta,
    };
    Some(Arc::new(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keyword, map};

    #[derive(Clone, Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Record for Point {}

    fn is_record<R: Record>(_: &R) -> bool {
        true
    }

    #[test]
    fn test_record_marker_is_implementable() {
        assert!(is_record(&Point { x: 1, y: 2 }));
    }

    #[test]
    fn test_merge_meta_new_keys_win() {
        let tag = Value::Keyword(keyword("tag"));
        let line = Value::Keyword(keyword("line"));
        let old = Arc::new(map([(tag.clone(), Value::Int(1)), (line.clone(), Value::Int(7))]));
        let merged = merge_meta(Some(&old), map([(tag.clone(), Value::Int(2))])).unwrap();
        assert_eq!(merged.get(&tag), Some(&Value::Int(2)));
        assert_eq!(merged.get(&line), Some(&Value::Int(7)));
    }

    #[test]
    fn test_merge_meta_without_existing() {
        let tag = Value::Keyword(keyword("tag"));
        let merged = merge_meta(None, map([(tag.clone(), Value::Nil)])).unwrap();
        assert_eq!(merged.len(), 1);
    }
}
