//! Hash combinators shared by every collection kind.
//!
//! Sequential collections hash their elements in order, so a list, a vector
//! and a seq holding the same elements hash identically. Maps and sets use
//! an additive hash over their entries which is independent of trie shape
//! and insertion history. Metadata never reaches either path.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Hash a single value with the crate's trie hasher.
pub(crate) fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Feed `items` into `state` in order, followed by their count.
pub fn hash_ordered<T, I, H>(items: I, state: &mut H)
where
    T: Hash,
    I: IntoIterator<Item = T>,
    H: Hasher,
{
    let mut count = 0usize;
    for item in items {
        item.hash(state);
        count += 1;
    }
    state.write_usize(count);
}

/// Feed the order-independent sum of item hashes into `state`.
pub fn hash_unordered<T, I, H>(items: I, state: &mut H)
where
    T: Hash,
    I: IntoIterator<Item = T>,
    H: Hasher,
{
    let mut count = 0usize;
    let mut sum = 0u64;
    for item in items {
        sum = sum.wrapping_add(hash_of(&item));
        count += 1;
    }
    state.write_usize(count);
    state.write_u64(sum);
}
