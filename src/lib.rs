//! recordbind - Typed field bindings, staged queries and live result streams
//! over record stores
//!
//! Domain models wrap store records. Field bindings convert and validate
//! attribute values, the request builder compiles typed predicates and sort
//! keys into store requests, and live sources push fresh results as the
//! store changes.

pub mod config;
pub mod convert;
pub mod error;
pub mod field;
pub mod live;
pub mod model;
pub mod observability;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod sort;
pub mod store;

pub use error::{BindError, BindResult};
pub use model::{DatabaseModel, ModelCollection};
