//! Persistent collections for the Conj Lisp runtime
//!
//! This crate contains the immutable data structures the language is built
//! on: a bit-partitioned [`Vector`], a hash array mapped [`Map`] and [`Set`],
//! a linked [`List`] and the lazy [`Seq`] engine, together with the
//! capability traits they implement and the dynamic [`Value`] type that
//! lets them nest. Every collection is `Send + Sync` and shares structure
//! between versions.

pub mod abstractions;
pub mod contracts;
pub mod delay;
pub mod equality;
pub mod error;
pub mod interner;
pub mod language;
pub mod list;
pub mod map;
pub mod namespace;
pub mod printer;
pub mod seq;
pub mod set;
pub mod symbol;
pub mod vector;

// Re-export commonly used items for convenience
pub use contracts::{
    Associative, BlockingDereference, Collection, Dereference, Entry, Meta, MetaMap,
    PersistentList, PersistentMap, PersistentSet, PersistentVector, Record, Seqable, Stack, Type,
};
pub use delay::Delay;
pub use error::{CollectionError, ExceptionInfo, Result};
pub use interner::Interned;
pub use language::Value;
pub use list::{List, list, list_with_meta};
pub use map::{Map, MapEntry, map, map_with_meta};
pub use namespace::Namespace;
pub use printer::{PrintOptions, lrepr};
pub use seq::{Seq, sequence};
pub use set::{Set, set, set_with_meta};
pub use symbol::{Keyword, Symbol, keyword, symbol};
pub use vector::{Vector, vector, vector_with_meta};
