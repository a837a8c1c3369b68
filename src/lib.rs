#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A hash map implementation backed by the dense chained table.
///
/// This module provides a `DenseMap` that wraps the `DenseTable` and
/// offers a standard key-value map interface with configurable hashers.
pub mod dense_map;

pub mod dense_table;

/// A hash set implementation backed by the dense chained table.
///
/// This module provides a `DenseSet` that wraps the `DenseTable` and
/// offers a standard set interface with configurable hashers.
pub mod dense_set;

mod error;

pub use dense_map::DenseMap;
pub use dense_map::Entry;
pub use dense_set::DenseSet;
pub use dense_table::DenseTable;
pub use error::Error;

#[cfg(test)]
mod proptests;
