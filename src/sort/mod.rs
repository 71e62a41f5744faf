//! Sorting
//!
//! - `Sort<R>`: in-memory combinator over any value type
//! - `SortDescriptor<E>`: typed store-level key built from an attribute

mod combinator;
mod descriptor;

pub use combinator::Sort;
pub use descriptor::{SortDescriptor, SortDirection, SortKey, ValueComparator};
