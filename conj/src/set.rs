//! Persistent hash set, a [`Map`] from element to unit.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{Collection, Meta, MetaMap, PersistentSet, Seqable, merge_meta};
use crate::equality::hash_unordered;
use crate::map::Map;
use crate::printer::write_sequence;
use crate::seq::Seq;

/// An immutable set of unique elements.
pub struct Set<T> {
    inner: Map<T, ()>,
    meta: Option<Arc<MetaMap>>,
}

impl<T> Set<T> {
    pub const fn new() -> Self {
        Set {
            inner: Map::new(),
            meta: None,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.keys()
    }
}

impl<T: Hash + Eq> Set<T> {
    /// The stored element equal to `elem`. Calling a set as a function
    /// means exactly this.
    pub fn get(&self, elem: &T) -> Option<&T> {
        self.inner.get_key_value(elem).map(|(k, _)| k)
    }

    pub fn contains(&self, elem: &T) -> bool {
        self.inner.contains(elem)
    }

    /// Alias for [`Set::get`], matching the call syntax of the language.
    pub fn call(&self, elem: &T) -> Option<&T> {
        self.get(elem)
    }

    /// The membership function as a closure borrowing this set.
    pub fn as_fn<'a>(&'a self) -> impl Fn(&T) -> Option<&'a T> + 'a {
        move |elem: &T| self.get(elem)
    }

    pub fn is_subset(&self, other: &Set<T>) -> bool {
        self.len() <= other.len() && self.iter().all(|e| other.contains(e))
    }
}

impl<T: Clone + Hash + Eq> Set<T> {
    /// A set with `elem` added. Adding a present element is a no-op.
    pub fn cons(&self, elem: T) -> Self {
        if self.contains(&elem) {
            return self.clone();
        }
        Set {
            inner: self.inner.assoc(elem, ()),
            meta: self.meta.clone(),
        }
    }

    pub fn cons_all<I: IntoIterator<Item = T>>(&self, elems: I) -> Self {
        let mut next = self.clone();
        next.extend(elems);
        next
    }

    pub fn disj(&self, elem: &T) -> Self {
        Set {
            inner: self.inner.dissoc(elem),
            meta: self.meta.clone(),
        }
    }

    pub fn disj_all<'a, I>(&self, elems: I) -> Self
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        Set {
            inner: self.inner.dissoc_all(elems),
            meta: self.meta.clone(),
        }
    }

    pub fn union(&self, other: &Set<T>) -> Self {
        self.cons_all(other.iter().cloned())
    }

    pub fn intersection(&self, other: &Set<T>) -> Self {
        let keep = self.iter().filter(|e| other.contains(e)).cloned();
        Set {
            inner: keep.map(|e| (e, ())).collect(),
            meta: self.meta.clone(),
        }
    }

    pub fn difference(&self, other: &Set<T>) -> Self {
        self.disj_all(other.iter())
    }
}

/// Build a set from `elements`, dropping duplicates.
pub fn set<T, I>(elements: I) -> Set<T>
where
    T: Clone + Hash + Eq,
    I: IntoIterator<Item = T>,
{
    elements.into_iter().collect()
}

/// [`set`] carrying `meta`, if any.
pub fn set_with_meta<T, I>(elements: I, meta: Option<MetaMap>) -> Set<T>
where
    T: Clone + Hash + Eq,
    I: IntoIterator<Item = T>,
{
    let mut s = set(elements);
    s.meta = meta.and_then(|m| merge_meta(None, m));
    s
}

impl<T> Clone for Set<T> {
    fn clone(&self) -> Self {
        Set {
            inner: self.inner.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Set::new()
    }
}

impl<T: Clone + Hash + Eq> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(|e| (e, ())));
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Set::new();
        set.extend(iter);
        set
    }
}

impl<T> Meta for Set<T> {
    fn meta(&self) -> Option<&MetaMap> {
        self.meta.as_deref()
    }

    fn with_meta(&self, meta: MetaMap) -> Self {
        Set {
            inner: self.inner.clone(),
            meta: merge_meta(self.meta.as_ref(), meta),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Seqable<T> for Set<T> {
    fn seq(&self) -> Seq<T> {
        if self.is_empty() {
            Seq::new()
        } else {
            Seq::lazy(self.inner.clone().into_iter().map(|(elem, ())| elem))
        }
    }
}

impl<T: Clone + Hash + Eq + Send + Sync + 'static> Collection<T> for Set<T> {
    fn cons(&self, elem: T) -> Self {
        Set::cons(self, elem)
    }

    fn cons_all<I: IntoIterator<Item = T>>(&self, elems: I) -> Self {
        Set::cons_all(self, elems)
    }

    fn empty() -> Self {
        Set::new()
    }

    fn count(&self) -> usize {
        self.len()
    }
}

impl<T: Clone + Hash + Eq + Send + Sync + 'static> PersistentSet<T> for Set<T> {
    fn disj(&self, elem: &T) -> Self {
        Set::disj(self, elem)
    }

    fn get(&self, elem: &T) -> Option<&T> {
        Set::get(self, elem)
    }
}

impl<T: Hash + Eq> PartialEq for Set<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Hash + Eq> Eq for Set<T> {}

impl<T: Hash> Hash for Set<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_unordered(self.iter(), state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.iter(), "#{", " ", "}")
    }
}
