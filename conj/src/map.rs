//! Persistent hash map backed by a hash array mapped trie.
//!
//! Each level consumes five bits of the key's 64-bit hash. Bitmap nodes
//! store only the occupied slots, each either an entry or a child node.
//! Keys whose full hashes are equal share a collision node. Updates use
//! `Arc::make_mut`, so only the touched path is copied when a node is
//! shared with another version.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contracts::{
    Associative, Collection, Entry, Meta, MetaMap, PersistentMap, Seqable, merge_meta,
};
use crate::error::Result;
use crate::equality::{hash_of, hash_unordered};
use crate::printer::write_sequence;
use crate::seq::Seq;

const BITS: u32 = 5;
const MASK: u64 = (1 << BITS) - 1;

fn fragment(hash: u64, shift: u32) -> u32 {
    (hash.checked_shr(shift).unwrap_or(0) & MASK) as u32
}

fn bit_for(hash: u64, shift: u32) -> u32 {
    1 << fragment(hash, shift)
}

/// Position of `bit`'s slot in a compressed slot array.
fn slot_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

#[derive(Clone)]
enum Slot<K, V> {
    Entry(u64, K, V),
    Child(Arc<Node<K, V>>),
}

#[derive(Clone)]
enum Node<K, V> {
    Bitmap { bitmap: u32, slots: Vec<Slot<K, V>> },
    Collision { hash: u64, entries: Vec<(K, V)> },
}

impl<K, V> Node<K, V> {
    const fn empty() -> Self {
        Node::Bitmap {
            bitmap: 0,
            slots: Vec::new(),
        }
    }

    /// A node at `shift` holding two slots whose hashes differ, or a
    /// collision node when two entries share a full hash.
    fn pair(shift: u32, h1: u64, s1: Slot<K, V>, h2: u64, s2: Slot<K, V>) -> Self {
        if h1 == h2 {
            tracing::trace!(hash = h1, "hash collision");
            let entries = [s1, s2]
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Entry(_, k, v) => Some((k, v)),
                    Slot::Child(_) => None,
                })
                .collect();
            return Node::Collision { hash: h1, entries };
        }
        let (f1, f2) = (fragment(h1, shift), fragment(h2, shift));
        if f1 == f2 {
            let child = Node::pair(shift + BITS, h1, s1, h2, s2);
            Node::Bitmap {
                bitmap: 1 << f1,
                slots: vec![Slot::Child(Arc::new(child))],
            }
        } else {
            let slots = if f1 < f2 { vec![s1, s2] } else { vec![s2, s1] };
            Node::Bitmap {
                bitmap: (1 << f1) | (1 << f2),
                slots,
            }
        }
    }
}

impl<K: Eq, V> Node<K, V> {
    fn get(&self, hash: u64, shift: u32, key: &K) -> Option<(&K, &V)> {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let bit = bit_for(hash, shift);
                if bitmap & bit == 0 {
                    return None;
                }
                match slots.get(slot_index(*bitmap, bit))? {
                    Slot::Entry(h, k, v) => (*h == hash && k == key).then_some((k, v)),
                    Slot::Child(child) => child.get(hash, shift + BITS, key),
                }
            }
            Node::Collision { hash: h, entries } => {
                if *h != hash {
                    return None;
                }
                entries.iter().find(|(k, _)| k == key).map(|(k, v)| (k, v))
            }
        }
    }
}

impl<K: Clone + Eq, V: Clone> Node<K, V> {
    /// Bind `key` to `value` below this node. Returns true when the key was
    /// not present before.
    fn insert(&mut self, hash: u64, shift: u32, key: K, value: V) -> bool {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let bit = bit_for(hash, shift);
                let idx = slot_index(*bitmap, bit);
                if *bitmap & bit == 0 {
                    slots.insert(idx, Slot::Entry(hash, key, value));
                    *bitmap |= bit;
                    return true;
                }
                match &mut slots[idx] {
                    Slot::Child(child) => Arc::make_mut(child).insert(hash, shift + BITS, key, value),
                    Slot::Entry(h, k, v) if *h == hash && *k == key => {
                        *v = value;
                        false
                    }
                    slot => {
                        let placeholder = Slot::Child(Arc::new(Node::empty()));
                        if let Slot::Entry(h, k, v) = std::mem::replace(slot, placeholder) {
                            let child = Node::pair(
                                shift + BITS,
                                h,
                                Slot::Entry(h, k, v),
                                hash,
                                Slot::Entry(hash, key, value),
                            );
                            *slot = Slot::Child(Arc::new(child));
                        }
                        true
                    }
                }
            }
            Node::Collision { hash: h, entries } => {
                if *h == hash {
                    if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
                        entry.1 = value;
                        return false;
                    }
                    entries.push((key, value));
                    return true;
                }
                // A different hash reached this collision node; push it one
                // level down next to the new entry.
                let existing_hash = *h;
                let existing = std::mem::replace(self, Node::empty());
                *self = Node::pair(
                    shift,
                    existing_hash,
                    Slot::Child(Arc::new(existing)),
                    hash,
                    Slot::Entry(hash, key, value),
                );
                true
            }
        }
    }

    /// Remove `key` from below this node. Returns true when it was present.
    /// Children left with a single entry are folded back into their parent.
    fn remove(&mut self, hash: u64, shift: u32, key: &K) -> bool {
        match self {
            Node::Bitmap { bitmap, slots } => {
                let bit = bit_for(hash, shift);
                if *bitmap & bit == 0 {
                    return false;
                }
                let idx = slot_index(*bitmap, bit);
                let Some(slot) = slots.get_mut(idx) else {
                    return false;
                };
                let child = match slot {
                    Slot::Entry(h, k, _) => {
                        if *h != hash || k != key {
                            return false;
                        }
                        None
                    }
                    Slot::Child(child) => Some(Arc::make_mut(child)),
                };
                let Some(child) = child else {
                    slots.remove(idx);
                    *bitmap &= !bit;
                    return true;
                };
                if !child.remove(hash, shift + BITS, key) {
                    return false;
                }
                let replacement = match child {
                    Node::Bitmap { slots: inner, .. } if inner.is_empty() => Some(None),
                    Node::Bitmap { slots: inner, .. }
                        if inner.len() == 1 && matches!(inner[0], Slot::Entry(..)) =>
                    {
                        inner.pop().map(Some)
                    }
                    Node::Collision { hash, entries } if entries.len() == 1 => {
                        let hash = *hash;
                        entries.pop().map(|(k, v)| Some(Slot::Entry(hash, k, v)))
                    }
                    _ => None,
                };
                match replacement {
                    Some(Some(single)) => slots[idx] = single,
                    Some(None) => {
                        slots.remove(idx);
                        *bitmap &= !bit;
                    }
                    None => {}
                }
                true
            }
            Node::Collision { hash: h, entries } => {
                if *h != hash {
                    return false;
                }
                match entries.iter().position(|(k, _)| k == key) {
                    Some(i) => {
                        entries.remove(i);
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

/// A key/value pair yielded when iterating a map as a collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapEntry<K, V> {
    key: K,
    value: V,
}

impl<K, V> MapEntry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        MapEntry { key, value }
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> Entry<K, V> for MapEntry<K, V> {
    fn key(&self) -> &K {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }
}

impl<K, V> From<(K, V)> for MapEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        MapEntry { key, value }
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for MapEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.key, self.value)
    }
}

/// An immutable hash map. Iteration order is unspecified but stable for a
/// given value.
pub struct Map<K, V> {
    root: Option<Arc<Node<K, V>>>,
    len: usize,
    meta: Option<Arc<MetaMap>>,
}

impl<K, V> Map<K, V> {
    pub const fn new() -> Self {
        Map {
            root: None,
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

    pub fn iter(&self) -> Iter<'_, K, V> {
        let stack = match self.root.as_deref() {
            Some(Node::Bitmap { slots, .. }) => vec![slots.iter()],
            _ => Vec::new(),
        };
        Iter {
            stack,
            collision: [].iter(),
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: Hash + Eq, V> Map<K, V> {
    /// The stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.root.as_ref()?.get(hash_of(key), 0, key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Value bound to `key`, or `None`.
    pub fn entry(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    pub fn entry_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Map<K, V> {
    /// A map with `key` bound to `value`, inserting or overwriting.
    pub fn assoc(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        next.insert_mut(key, value);
        next
    }

    /// Apply each pair left to right; later pairs win.
    pub fn assoc_all<I: IntoIterator<Item = (K, V)>>(&self, pairs: I) -> Self {
        let mut next = self.clone();
        next.extend(pairs);
        next
    }

    /// A map without `key`. Removing an absent key returns an equal map.
    pub fn dissoc(&self, key: &K) -> Self {
        let mut next = self.clone();
        next.remove_mut(key);
        next
    }

    pub fn dissoc_all<'a, I>(&self, keys: I) -> Self
    where
        K: 'a,
        I: IntoIterator<Item = &'a K>,
    {
        let mut next = self.clone();
        for key in keys {
            next.remove_mut(key);
        }
        next
    }

    /// Every entry of `other` assoc'd over this map.
    pub fn merge(&self, other: &Map<K, V>) -> Self {
        self.assoc_all(other.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    fn insert_mut(&mut self, key: K, value: V) {
        let hash = hash_of(&key);
        let root = self.root.get_or_insert_with(|| Arc::new(Node::empty()));
        if Arc::make_mut(root).insert(hash, 0, key, value) {
            self.len += 1;
        }
    }

    fn remove_mut(&mut self, key: &K) {
        // Checked first so a miss never copies the path.
        if !self.contains(key) {
            return;
        }
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let root = Arc::make_mut(root);
        if root.remove(hash_of(key), 0, key) {
            self.len -= 1;
        }
        if self.len == 0 {
            self.root = None;
        }
    }
}

/// Build a map from key/value pairs; later pairs win.
pub fn map<K, V, I>(pairs: I) -> Map<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().collect()
}

/// [`map`] carrying `meta`, if any.
pub fn map_with_meta<K, V, I>(pairs: I, meta: Option<MetaMap>) -> Map<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
    I: IntoIterator<Item = (K, V)>,
{
    let mut m = map(pairs);
    m.meta = meta.and_then(|m| merge_meta(None, m));
    m
}

impl<K, V> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Map {
            root: self.root.clone(),
            len: self.len,
            meta: self.meta.clone(),
        }
    }
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Map::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Extend<(K, V)> for Map<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_mut(key, value);
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

/// Borrowing iterator over `(key, value)` pairs.
pub struct Iter<'a, K, V> {
    stack: Vec<std::slice::Iter<'a, Slot<K, V>>>,
    collision: std::slice::Iter<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.collision.next() {
                self.remaining -= 1;
                return Some((k, v));
            }
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Slot::Entry(_, k, v)) => {
                    self.remaining -= 1;
                    return Some((k, v));
                }
                Some(Slot::Child(child)) => match &**child {
                    Node::Bitmap { slots, .. } => self.stack.push(slots.iter()),
                    Node::Collision { entries, .. } => self.collision = entries.iter(),
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a Map<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Owning iterator. Keeps the trie nodes alive through reference counts and
/// clones entries out as it goes.
pub struct IntoIter<K, V> {
    stack: Vec<(Arc<Node<K, V>>, usize)>,
    remaining: usize,
}

enum Step<K, V> {
    Pop,
    Yield(K, V),
    Descend(Arc<Node<K, V>>),
}

impl<K: Clone, V: Clone> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        loop {
            let step = {
                let (node, pos) = self.stack.last_mut()?;
                let step = match &**node {
                    Node::Bitmap { slots, .. } => match slots.get(*pos) {
                        None => Step::Pop,
                        Some(Slot::Entry(_, k, v)) => Step::Yield(k.clone(), v.clone()),
                        Some(Slot::Child(child)) => Step::Descend(Arc::clone(child)),
                    },
                    Node::Collision { entries, .. } => match entries.get(*pos) {
                        None => Step::Pop,
                        Some((k, v)) => Step::Yield(k.clone(), v.clone()),
                    },
                };
                *pos += 1;
                step
            };
            match step {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Yield(k, v) => {
                    self.remaining -= 1;
                    return Some((k, v));
                }
                Step::Descend(child) => self.stack.push((child, 0)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            stack: self.root.clone().map(|root| (root, 0)).into_iter().collect(),
            remaining: self.len,
        }
    }
}

impl<K, V> Meta for Map<K, V> {
    fn meta(&self) -> Option<&MetaMap> {
        self.meta.as_deref()
    }

    fn with_meta(&self, meta: MetaMap) -> Self {
        Map {
            meta: merge_meta(self.meta.as_ref(), meta),
            ..self.clone()
        }
    }
}

impl<K, V> Seqable<MapEntry<K, V>> for Map<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn seq(&self) -> Seq<MapEntry<K, V>> {
        if self.is_empty() {
            Seq::new()
        } else {
            Seq::lazy(self.clone().into_iter().map(MapEntry::from))
        }
    }
}

impl<K, V> Collection<MapEntry<K, V>> for Map<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn cons(&self, entry: MapEntry<K, V>) -> Self {
        let (key, value) = entry.into_pair();
        self.assoc(key, value)
    }

    fn empty() -> Self {
        Map::new()
    }

    fn count(&self) -> usize {
        self.len
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Associative<K, V> for Map<K, V> {
    fn assoc(&self, key: K, value: V) -> Result<Self> {
        Ok(Map::assoc(self, key, value))
    }

    fn assoc_all<I: IntoIterator<Item = (K, V)>>(&self, pairs: I) -> Result<Self> {
        Ok(Map::assoc_all(self, pairs))
    }

    fn contains(&self, key: &K) -> bool {
        Map::contains(self, key)
    }

    fn entry(&self, key: &K) -> Option<&V> {
        Map::get(self, key)
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentMap<K, V> for Map<K, V> {
    fn dissoc(&self, key: &K) -> Self {
        Map::dissoc(self, key)
    }
}

/// Same keys, and equal values under every key.
impl<K: Hash + Eq, V: PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Hash + Eq, V: Eq> Eq for Map<K, V> {}

impl<K: Hash, V: Hash> Hash for Map<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_unordered(self.iter(), state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.iter().map(|(k, v)| format!("{k} {v}"));
        write_sequence(f, entries, "{", ", ", "}")
    }
}
