//! Persistent vector backed by a bit-partitioned trie.
//!
//! Interior nodes fan out 32 ways and leaves hold up to 32 elements. All
//! updates go through `Arc::make_mut`: a node that is shared with another
//! version is copied, a node owned only by the value being built is updated
//! in place. Building a fresh vector from an iterator therefore never copies,
//! while `cons`/`assoc`/`pop` on a shared vector copy just one root-to-leaf
//! path.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use crate::contracts::{
    Associative, Collection, Meta, MetaMap, PersistentVector, Seqable, Stack, merge_meta,
};
use crate::error::{CollectionError, Result};
use crate::equality::hash_ordered;
use crate::printer::write_sequence;
use crate::seq::Seq;

const BITS: u32 = 5;
const WIDTH: usize = 1 << BITS;
const MASK: usize = WIDTH - 1;

#[derive(Clone)]
enum Node<T> {
    Leaf(Vec<T>),
    Interior(Vec<Arc<Node<T>>>),
}

/// `idx` is the global index and we are a node at `height` (leaves are at
/// height zero). Which child does the index belong to?
fn extract_index(idx: usize, height: u32) -> usize {
    (idx >> (BITS * height)) & MASK
}

impl<T: Clone> Node<T> {
    /// Set the element at `idx`. The index may point one past the last
    /// element, in which case the element is appended and any missing path
    /// below this node is created.
    fn set(&mut self, height: u32, idx: usize, elt: T) {
        match self {
            Node::Leaf(data) => {
                let idx = idx & MASK;
                if idx < data.len() {
                    data[idx] = elt;
                } else {
                    data.push(elt);
                }
            }
            Node::Interior(children) => {
                let bucket = extract_index(idx, height);
                if let Some(child) = children.get_mut(bucket) {
                    Arc::make_mut(child).set(height - 1, idx, elt);
                } else {
                    let mut child = Node::Leaf(vec![elt]);
                    for _ in 1..height {
                        child = Node::Interior(vec![Arc::new(child)]);
                    }
                    children.push(Arc::new(child));
                }
            }
        }
    }

    /// Remove the last element of this subtree. Returns true if the subtree
    /// is now empty.
    fn pop(&mut self) -> bool {
        match self {
            Node::Leaf(data) => {
                data.pop();
                data.is_empty()
            }
            Node::Interior(children) => {
                if let Some(last) = children.last_mut() {
                    if Arc::make_mut(last).pop() {
                        children.pop();
                    }
                }
                children.is_empty()
            }
        }
    }
}

/// An immutable, integer-indexed vector.
pub struct Vector<T> {
    root: Option<Arc<Node<T>>>,
    len: usize,
    height: u32,
    meta: Option<Arc<MetaMap>>,
}

impl<T> Vector<T> {
    pub const fn new() -> Self {
        Vector {
            root: None,
            len: 0,
            height: 0,
            meta: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The leaf chunk holding `idx`.
    fn leaf(&self, idx: usize) -> Option<&[T]> {
        if idx >= self.len {
            return None;
        }
        let mut node = self.root.as_deref()?;
        let mut height = self.height;
        loop {
            match node {
                Node::Leaf(data) => return Some(data),
                Node::Interior(children) => {
                    node = children.get(extract_index(idx, height))?;
                    height = height.checked_sub(1)?;
                }
            }
        }
    }

    /// Element at a non-negative position.
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.leaf(idx)?.get(idx & MASK)
    }

    /// Map a possibly negative index onto `[0, len)`. Negative indices
    /// count from the end, `-1` being the last element.
    fn resolve(&self, index: i64) -> Option<usize> {
        let len = i64::try_from(self.len).ok()?;
        let idx = if index < 0 { len + index } else { index };
        if (0..len).contains(&idx) {
            usize::try_from(idx).ok()
        } else {
            None
        }
    }

    /// Element at `index`, negative indices counting from the end.
    pub fn entry(&self, index: i64) -> Option<&T> {
        self.get(self.resolve(index)?)
    }

    /// Same domain as [`entry`](Self::entry): `[-len, len)`.
    pub fn contains(&self, index: i64) -> bool {
        self.resolve(index).is_some()
    }

    /// The last element, or `None` when empty.
    pub fn peek(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|idx| self.get(idx))
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.iter_range(0, self.len)
    }

    fn iter_range(&self, start: usize, end: usize) -> Iter<'_, T> {
        Iter {
            vec: self,
            index: start,
            end: end.min(self.len),
            chunk: &[],
        }
    }

    fn is_full(&self) -> bool {
        self.root.is_none() || self.len == WIDTH.pow(self.height + 1)
    }
}

impl<T: Clone> Vector<T> {
    /// A vector with `elem` appended.
    pub fn cons(&self, elem: T) -> Self {
        let mut next = self.clone();
        next.push_mut(elem);
        next
    }

    /// A vector with each element appended in order.
    pub fn cons_all<I: IntoIterator<Item = T>>(&self, elems: I) -> Self {
        let mut next = self.clone();
        next.extend(elems);
        next
    }

    /// Replace the element at `index`, or append when `index == len`.
    /// Negative indices address existing elements from the end.
    pub fn assoc(&self, index: i64, value: T) -> Result<Self> {
        let mut next = self.clone();
        next.assoc_mut(index, value)?;
        Ok(next)
    }

    /// Apply index/value pairs left to right; each index is checked against
    /// the length produced by the pairs before it.
    pub fn assoc_all<I: IntoIterator<Item = (i64, T)>>(&self, pairs: I) -> Result<Self> {
        let mut next = self.clone();
        for (index, value) in pairs {
            next.assoc_mut(index, value)?;
        }
        Ok(next)
    }

    /// The vector without its last element.
    pub fn pop(&self) -> Result<Self> {
        if self.is_empty() {
            return Err(CollectionError::underflow("vector"));
        }
        let mut next = self.clone();
        next.pop_mut();
        Ok(next)
    }

    /// The elements in `range`, clamped to the vector's bounds, as a new
    /// vector carrying the same metadata.
    pub fn subvec<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        let mut sub: Vector<T> = self.iter_range(start, end).cloned().collect();
        sub.meta = self.meta.clone();
        sub
    }

    fn assoc_mut(&mut self, index: i64, value: T) -> Result<()> {
        if usize::try_from(index).is_ok_and(|idx| idx == self.len) {
            self.push_mut(value);
            return Ok(());
        }
        let idx = self
            .resolve(index)
            .ok_or_else(|| CollectionError::index_out_of_range(index, self.len))?;
        if let Some(root) = self.root.as_mut() {
            Arc::make_mut(root).set(self.height, idx, value);
        }
        Ok(())
    }

    // Increases the height of the tree by one; the new root has a single
    // child until the next push fills in a second one.
    fn add_level(&mut self) {
        match self.root.take() {
            None => self.root = Some(Arc::new(Node::Leaf(Vec::with_capacity(WIDTH)))),
            Some(old_root) => {
                self.root = Some(Arc::new(Node::Interior(vec![old_root])));
                self.height += 1;
            }
        }
    }

    fn push_mut(&mut self, elt: T) {
        if self.is_full() {
            self.add_level();
        }
        let idx = self.len;
        if let Some(root) = self.root.as_mut() {
            Arc::make_mut(root).set(self.height, idx, elt);
            self.len += 1;
        }
    }

    fn pop_mut(&mut self) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let root = Arc::make_mut(root);
        root.pop();
        self.len -= 1;

        // Shrunk to a single child: drop a level.
        let collapsed = match root {
            Node::Interior(children) if children.len() == 1 => children.pop(),
            _ => None,
        };
        if let Some(child) = collapsed {
            self.root = Some(child);
            self.height -= 1;
        }
        if self.len == 0 {
            self.root = None;
            self.height = 0;
        }
    }
}

/// Build a vector holding `elements` in order.
pub fn vector<T: Clone, I: IntoIterator<Item = T>>(elements: I) -> Vector<T> {
    elements.into_iter().collect()
}

/// [`vector`] carrying `meta`, if any.
pub fn vector_with_meta<T, I>(elements: I, meta: Option<MetaMap>) -> Vector<T>
where
    T: Clone,
    I: IntoIterator<Item = T>,
{
    let mut v = vector(elements);
    v.meta = meta.and_then(|m| merge_meta(None, m));
    v
}

impl<T> Clone for Vector<T> {
    fn clone(&self) -> Self {
        Vector {
            root: self.root.clone(),
            len: self.len,
            height: self.height,
            meta: self.meta.clone(),
        }
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Vector::new()
    }
}

impl<T: Clone> Extend<T> for Vector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elt in iter {
            self.push_mut(elt);
        }
    }
}

impl<T: Clone> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Vector::new();
        vec.extend(iter);
        vec
    }
}

/// Borrowing iterator; walks the trie one leaf chunk at a time.
pub struct Iter<'a, T> {
    vec: &'a Vector<T>,
    index: usize,
    end: usize,
    chunk: &'a [T],
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.index >= self.end {
            return None;
        }
        let offset = self.index & MASK;
        if offset == 0 || self.chunk.is_empty() {
            self.chunk = self.vec.leaf(self.index)?;
        }
        self.index += 1;
        self.chunk.get(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Owning iterator; holds the vector (a few reference counts) and clones
/// elements out by index.
pub struct IntoIter<T> {
    vec: Vector<T>,
    index: usize,
}

impl<T: Clone> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.vec.get(self.index).cloned()?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vec.len.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T: Clone> IntoIterator for Vector<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            vec: self,
            index: 0,
        }
    }
}

impl<T> Meta for Vector<T> {
    fn meta(&self) -> Option<&MetaMap> {
        self.meta.as_deref()
    }

    fn with_meta(&self, meta: MetaMap) -> Self {
        Vector {
            meta: merge_meta(self.meta.as_ref(), meta),
            ..self.clone()
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Seqable<T> for Vector<T> {
    fn seq(&self) -> Seq<T> {
        if self.is_empty() {
            Seq::new()
        } else {
            Seq::lazy(self.clone())
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Collection<T> for Vector<T> {
    fn cons(&self, elem: T) -> Self {
        Vector::cons(self, elem)
    }

    fn cons_all<I: IntoIterator<Item = T>>(&self, elems: I) -> Self {
        Vector::cons_all(self, elems)
    }

    fn empty() -> Self {
        Vector::new()
    }

    fn count(&self) -> usize {
        self.len
    }
}

impl<T: Clone + Send + Sync + 'static> Stack<T> for Vector<T> {
    fn peek(&self) -> Option<&T> {
        Vector::peek(self)
    }

    fn pop(&self) -> Result<Self> {
        Vector::pop(self)
    }
}

impl<T: Clone> Associative<i64, T> for Vector<T> {
    fn assoc(&self, key: i64, value: T) -> Result<Self> {
        Vector::assoc(self, key, value)
    }

    fn assoc_all<I: IntoIterator<Item = (i64, T)>>(&self, pairs: I) -> Result<Self> {
        Vector::assoc_all(self, pairs)
    }

    fn contains(&self, key: &i64) -> bool {
        Vector::contains(self, *key)
    }

    fn entry(&self, key: &i64) -> Option<&T> {
        Vector::entry(self, *key)
    }
}

impl<T: Clone + Send + Sync + 'static> PersistentVector<T> for Vector<T> {}

impl<T: PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T: Hash> Hash for Vector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ordered(self.iter(), state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.iter(), "[", " ", "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl<T> Vector<T> {
        fn check_invariants(&self) {
            fn count<T>(node: &Node<T>) -> usize {
                match node {
                    Node::Leaf(data) => data.len(),
                    Node::Interior(children) => children.iter().map(|c| count(c)).sum(),
                }
            }
            assert_eq!(self.len, self.root.as_deref().map_or(0, count));
            if let Some(Node::Interior(children)) = self.root.as_deref() {
                assert!(children.len() > 1);
            }
        }
    }

    #[test]
    fn test_push_across_levels() {
        let mut v = Vector::new();
        for i in 0..(WIDTH * WIDTH + 5) {
            v = v.cons(i);
            v.check_invariants();
        }
        assert_eq!(v.len(), WIDTH * WIDTH + 5);
        for i in 0..v.len() {
            assert_eq!(v.get(i), Some(&i));
        }
        assert_eq!(v.get(v.len()), None);
    }

    #[test]
    fn test_pop_back_down() {
        let mut v: Vector<usize> = (0..(WIDTH * 3 + 1)).collect();
        while !v.is_empty() {
            let last = v.len() - 1;
            assert_eq!(v.peek(), Some(&last));
            v = v.pop().unwrap();
            v.check_invariants();
        }
        assert!(v.root.is_none());
        assert_eq!(v.pop(), Err(CollectionError::Underflow { kind: "vector" }));
    }

    #[test]
    fn test_assoc_copies_path_only() {
        let v1: Vector<usize> = (0..100).collect();
        let v2 = v1.assoc(50, 500).unwrap();
        assert_eq!(v1.get(50), Some(&50));
        assert_eq!(v2.get(50), Some(&500));
        let (Some(Node::Interior(a)), Some(Node::Interior(b))) =
            (v1.root.as_deref(), v2.root.as_deref())
        else {
            panic!("expected interior roots");
        };
        assert!(Arc::ptr_eq(&a[0], &b[0]));
        assert!(!Arc::ptr_eq(&a[1], &b[1]));
    }

    #[test]
    fn test_assoc_bounds() {
        let v = vector(["a", "b"]);
        assert_eq!(v.assoc(2, "c").unwrap(), vector(["a", "b", "c"]));
        assert_eq!(v.assoc(-1, "z").unwrap(), vector(["a", "z"]));
        assert_eq!(
            v.assoc(3, "c"),
            Err(CollectionError::IndexOutOfRange { index: 3, len: 2 })
        );
        assert!(v.assoc(-3, "c").is_err());
    }

    #[test]
    fn test_assoc_all_checks_running_length() {
        let v = Vector::new();
        assert_eq!(v.assoc_all([(0, "a"), (1, "b")]).unwrap(), vector(["a", "b"]));
        assert!(v.assoc_all([(0, "a"), (2, "b")]).is_err());
        assert!(v.is_empty());
    }

    #[test]
    fn test_negative_entry() {
        let v = vector(["a", "b", "c"]);
        assert_eq!(v.entry(-1), Some(&"c"));
        assert_eq!(v.entry(-3), Some(&"a"));
        assert_eq!(v.entry(-4), None);
        assert_eq!(v.entry(3), None);
        assert!(v.contains(-3));
        assert!(!v.contains(-4));
        assert!(!v.contains(3));
        assert!(!Vector::<i64>::new().contains(0));
        assert!(!Vector::<i64>::new().contains(-1));
    }

    #[test]
    fn test_subvec_clamps() {
        let v: Vector<usize> = (0..70).collect();
        let s = v.subvec(30..40);
        assert_eq!(s, (30..40).collect::<Vector<usize>>());
        assert_eq!(v.subvec(65..), (65..70).collect::<Vector<usize>>());
        assert_eq!(v.subvec(60..100).len(), 10);
        assert!(v.subvec(50..10).is_empty());
    }

    #[test]
    fn test_iter_and_into_iter() {
        let v: Vector<usize> = (0..1000).collect();
        assert!(v.iter().copied().eq(0..1000));
        assert!(v.clone().into_iter().eq(0..1000));
        assert_eq!(v.iter().len(), 1000);
    }

    #[test]
    fn test_display() {
        assert_eq!(vector([1, 2, 3]).to_string(), "[1 2 3]");
        assert_eq!(Vector::<i64>::new().to_string(), "[]");
    }
}
