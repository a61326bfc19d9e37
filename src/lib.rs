#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod arena;
mod config;
mod error;
mod hash_table;

/// A hash set using separate chaining with split-based growth.
///
/// This module provides a `HashSet` that wraps the chained table and provides
/// a standard set interface with configurable hashers.
pub mod hash_set;

/// A hash set that iterates in insertion order.
///
/// This module provides a `LinkedHashSet` that threads an intrusive
/// doubly-linked list through the same chained table the plain set uses.
pub mod linked_hash_set;

pub mod set;

pub use config::DEFAULT_LOAD_FACTOR;
pub use config::MAX_CAPACITY;
pub use config::MIN_CAPACITY;
pub use config::TableConfig;
pub use error::Error;
pub use error::Result;
pub use hash_set::HashSet;
#[cfg(feature = "stats")]
pub use hash_table::TableStats;
pub use linked_hash_set::LinkedHashSet;
pub use set::Set;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder when no default hasher is available. It cannot be
        /// constructed, so sets must be built with an explicit hasher.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
