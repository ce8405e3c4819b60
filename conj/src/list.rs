//! Persistent singly-linked list.
//!
//! `cons` shares the whole receiver as the tail of the new list, so prepend,
//! `peek` and `pop` are O(1). The list is also its own seq: `seq()` hands
//! out the head node without copying.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{Collection, Meta, MetaMap, PersistentList, Seqable, Stack, merge_meta};
use crate::error::{CollectionError, Result};
use crate::equality::hash_ordered;
use crate::printer::write_sequence;
use crate::seq::Seq;

pub(crate) struct Node<T> {
    pub(crate) first: T,
    pub(crate) rest: Option<Arc<Node<T>>>,
}

// Unlink iteratively so dropping a long list can't overflow the stack.
impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        let mut next = self.rest.take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(mut node) => node.rest.take(),
                Err(_) => None,
            };
        }
    }
}

/// An immutable cons list.
pub struct List<T> {
    head: Option<Arc<Node<T>>>,
    len: usize,
    meta: Option<Arc<MetaMap>>,
}

impl<T> List<T> {
    pub const fn new() -> Self {
        List {
            head: None,
            len: 0,
            meta: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Prepend `elem`. The receiver is shared as the tail.
    pub fn cons(&self, elem: T) -> Self {
        List {
            head: Some(Arc::new(Node {
                first: elem,
                rest: self.head.clone(),
            })),
            len: self.len + 1,
            meta: self.meta.clone(),
        }
    }

    /// The head element, or `None` when empty.
    pub fn peek(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &node.first)
    }

    /// The list without its head.
    pub fn pop(&self) -> Result<Self> {
        let head = self
            .head
            .as_deref()
            .ok_or_else(|| CollectionError::underflow("list"))?;
        Ok(List {
            head: head.rest.clone(),
            len: self.len - 1,
            meta: self.meta.clone(),
        })
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            node: self.head.as_deref(),
            remaining: self.len,
        }
    }
}

/// Build a list holding `elements` in order.
pub fn list<T, I: IntoIterator<Item = T>>(elements: I) -> List<T> {
    elements.into_iter().collect()
}

/// [`list`] carrying `meta`, if any.
pub fn list_with_meta<T, I>(elements: I, meta: Option<MetaMap>) -> List<T>
where
    I: IntoIterator<Item = T>,
{
    let mut l = list(elements);
    l.meta = meta.and_then(|m| merge_meta(None, m));
    l
}

impl<T> Clone for List<T> {
    fn clone(&self) -> Self {
        List {
            head: self.head.clone(),
            len: self.len,
            meta: self.meta.clone(),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List::new()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(List::new(), |list, elem| list.cons(elem))
    }
}

pub struct Iter<'a, T> {
    node: Option<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.node?;
        self.node = node.rest.as_deref();
        self.remaining -= 1;
        Some(&node.first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T> Meta for List<T> {
    fn meta(&self) -> Option<&MetaMap> {
        self.meta.as_deref()
    }

    fn with_meta(&self, meta: MetaMap) -> Self {
        List {
            head: self.head.clone(),
            len: self.len,
            meta: merge_meta(self.meta.as_ref(), meta),
        }
    }
}

impl<T> Seqable<T> for List<T> {
    fn seq(&self) -> Seq<T> {
        Seq::from_list(self.head.clone())
    }
}

impl<T> Collection<T> for List<T> {
    fn cons(&self, elem: T) -> Self {
        List::cons(self, elem)
    }

    fn empty() -> Self {
        List::new()
    }

    fn count(&self) -> usize {
        self.len
    }
}

impl<T> Stack<T> for List<T> {
    fn peek(&self) -> Option<&T> {
        List::peek(self)
    }

    fn pop(&self) -> Result<Self> {
        List::pop(self)
    }
}

impl<T> PersistentList<T> for List<T> {}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: Hash> Hash for List<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ordered(self.iter(), state);
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.iter(), "(", " ", ")")
    }
}
