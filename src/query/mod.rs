//! Fetch requests
//!
//! `FetchRequest` is what a store context executes. `RequestBuilder` builds
//! one in stages with the model type, the stage and the result shape
//! tracked at compile time.

mod builder;
mod request;

pub use builder::{
    Created, Executable, Filtered, Many, One, RequestBuilder, ResultShape, Sorted, Targeted,
};
pub use request::FetchRequest;

pub(crate) use request::execute;
