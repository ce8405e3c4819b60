//! Lazy, restartable sequences.
//!
//! A [`Seq`] is a chain of cells. Cells are either realized cons cells, a
//! shared node of a [`List`](crate::List), or a lazy cell that pulls exactly
//! one element from a host iterator the first time it is looked at. Realized
//! cells are memoized, so a seq can be traversed any number of times, from
//! any number of threads, and the underlying iterator is advanced once per
//! element.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::contracts::{Collection, Seqable};
use crate::equality::hash_ordered;
use crate::list::Node;
use crate::printer::write_sequence;

type Source<T> = Arc<Mutex<Box<dyn Iterator<Item = T> + Send>>>;

/// A possibly lazy view over zero or more elements.
pub struct Seq<T> {
    cell: Option<Arc<Cell<T>>>,
}

enum Cell<T> {
    Cons { first: T, rest: Seq<T> },
    List(Arc<Node<T>>),
    Lazy(Lazy<T>),
}

struct Lazy<T> {
    step: OnceCell<Option<(T, Seq<T>)>>,
    source: Source<T>,
}

impl<T> Lazy<T> {
    fn force(&self) -> Option<(&T, &Seq<T>)> {
        self.step
            .get_or_init(|| {
                let next = self.source.lock().next();
                next.map(|first| (first, Seq::pending(Arc::clone(&self.source))))
            })
            .as_ref()
            .map(|(first, rest)| (first, rest))
    }
}

impl<T> Seq<T> {
    /// The empty seq.
    pub const fn new() -> Self {
        Seq { cell: None }
    }

    /// Wrap a host iterator. Elements are pulled one at a time, only when a
    /// cell is first inspected, so infinite iterators are fine as long as
    /// only a finite prefix is consumed.
    pub fn lazy<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let source: Box<dyn Iterator<Item = T> + Send> = Box::new(iter.into_iter());
        Seq::pending(Arc::new(Mutex::new(source)))
    }

    fn pending(source: Source<T>) -> Self {
        Seq {
            cell: Some(Arc::new(Cell::Lazy(Lazy {
                step: OnceCell::new(),
                source,
            }))),
        }
    }

    pub(crate) fn from_list(head: Option<Arc<Node<T>>>) -> Self {
        Seq {
            cell: head.map(|node| Arc::new(Cell::List(node))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    /// Everything after `first`. The rest of an empty seq is empty.
    pub fn rest(&self) -> Seq<T> {
        match self.cell.as_deref() {
            None => Seq::new(),
            Some(Cell::Cons { rest, .. }) => rest.clone(),
            Some(Cell::List(node)) => Seq::from_list(node.rest.clone()),
            Some(Cell::Lazy(lazy)) => lazy.force().map_or_else(Seq::new, |(_, rest)| rest.clone()),
        }
    }

    /// Prepend `elem` in O(1); the receiver becomes the rest.
    pub fn cons(&self, elem: T) -> Seq<T> {
        Seq {
            cell: Some(Arc::new(Cell::Cons {
                first: elem,
                rest: self.clone(),
            })),
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            cursor: Cursor::Seq(self),
        }
    }

    /// Number of elements; realizes the whole seq.
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Build a seq from any [`Seqable`] source.
pub fn sequence<T, S>(source: &S) -> Seq<T>
where
    S: Seqable<T> + ?Sized,
{
    source.seq()
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Seq {
            cell: self.cell.clone(),
        }
    }
}

impl<T> Default for Seq<T> {
    fn default() -> Self {
        Seq::new()
    }
}

// Long realized chains would otherwise drop recursively.
impl<T> Drop for Seq<T> {
    fn drop(&mut self) {
        let mut next = self.cell.take();
        while let Some(cell) = next {
            next = match Arc::try_unwrap(cell) {
                Ok(Cell::Cons { mut rest, .. }) => rest.cell.take(),
                Ok(Cell::Lazy(lazy)) => lazy
                    .step
                    .into_inner()
                    .flatten()
                    .and_then(|(_, mut rest)| rest.cell.take()),
                Ok(Cell::List(_)) | Err(_) => None,
            };
        }
    }
}

enum Cursor<'a, T> {
    Seq(&'a Seq<T>),
    List(Option<&'a Node<T>>),
}

/// Borrowing iterator over a [`Seq`].
pub struct Iter<'a, T> {
    cursor: Cursor<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        match self.cursor {
            Cursor::Seq(seq) => match seq.cell.as_deref()? {
                Cell::Cons { first, rest } => {
                    self.cursor = Cursor::Seq(rest);
                    Some(first)
                }
                Cell::List(node) => {
                    self.cursor = Cursor::List(node.rest.as_deref());
                    Some(&node.first)
                }
                Cell::Lazy(lazy) => {
                    let (first, rest) = lazy.force()?;
                    self.cursor = Cursor::Seq(rest);
                    Some(first)
                }
            },
            Cursor::List(node) => {
                let node = node?;
                self.cursor = Cursor::List(node.rest.as_deref());
                Some(&node.first)
            }
        }
    }
}

impl<'a, T> IntoIterator for &'a Seq<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Collects eagerly into realized cons cells.
impl<T> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Seq::new(), |rest, first| rest.cons(first))
    }
}

impl<T> Seqable<T> for Seq<T> {
    fn seq(&self) -> Seq<T> {
        self.clone()
    }
}

impl<T> Collection<T> for Seq<T> {
    fn cons(&self, elem: T) -> Self {
        Seq::cons(self, elem)
    }

    fn empty() -> Self {
        Seq::new()
    }

    fn count(&self) -> usize {
        Seq::count(self)
    }
}

/// Element-wise; seqs of different lengths are never equal.
impl<T: PartialEq> PartialEq for Seq<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Seq<T> {}

impl<T: Hash> Hash for Seq<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ordered(self.iter(), state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, self.iter(), "(", " ", ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_seq() {
        let s: Seq<i64> = Seq::new();
        assert!(s.is_empty());
        assert_eq!(s.first(), None);
        assert!(s.rest().is_empty());
        assert!(s.rest().rest().is_empty());
    }

    #[test]
    fn test_cons_prepends_without_copy() {
        let s: Seq<i64> = [2, 3].into_iter().collect();
        let s2 = s.cons(1);
        assert_eq!(s2.first(), Some(&1));
        assert_eq!(s2.rest(), s);
        assert_eq!(s.count(), 2);
        assert_eq!(s2.count(), 3);
    }

    #[test]
    fn test_lazy_pulls_on_demand() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let s = Seq::lazy((0..).map(move |n: i64| {
            counter.fetch_add(1, Ordering::SeqCst);
            n
        }));
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
        let prefix: Vec<i64> = s.iter().take(3).copied().collect();
        assert_eq!(prefix, vec![0, 1, 2]);
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_lazy_seq_is_restartable() {
        let s = Seq::lazy(vec![1, 2, 3]);
        let once: Vec<i64> = s.iter().copied().collect();
        let twice: Vec<i64> = s.iter().copied().collect();
        assert_eq!(once, twice);
        assert_eq!(s.rest().first(), Some(&2));
        assert_eq!(s.first(), Some(&1));
    }

    #[test]
    fn test_equality_length_mismatch() {
        let a: Seq<i64> = [1, 2].into_iter().collect();
        let b: Seq<i64> = [1, 2, 3].into_iter().collect();
        assert_ne!(a, b);
        assert_ne!(b, a);
        assert_eq!(a, Seq::lazy(vec![1, 2]));
    }

    #[test]
    fn test_display() {
        let s: Seq<i64> = [1, 2, 3].into_iter().collect();
        assert_eq!(s.to_string(), "(1 2 3)");
        assert_eq!(Seq::<i64>::new().to_string(), "()");
    }

    #[test]
    fn test_long_chain_drops() {
        let s = (0..200_000).fold(Seq::new(), |s, n: i64| s.cons(n));
        assert_eq!(s.first(), Some(&199_999));
        drop(s);

        let lazy = Seq::lazy(0..200_000i64);
        assert_eq!(lazy.count(), 200_000);
    }
}
