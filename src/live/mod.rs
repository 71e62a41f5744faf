//! Live updates
//!
//! A live source re-runs when the store announces a change to its entity
//! and pushes full snapshots to a single subscriber, honoring demand:
//!
//! - `FetchUpdates`: results of a fetch request
//! - `FieldUpdates`: one field of one record
//! - `ChildrenUpdates`: sorted children of one record
//! - `SnapshotStream`: any of them as a `futures` stream
//!
//! `AssignSink`, `ToggleSink` and `try_validate` feed values back into
//! model fields.

mod bridge;
mod children;
mod demand;
mod fetch;
mod field;
mod operators;
mod stream;

pub use bridge::Subscription;
pub use children::ChildrenUpdates;
pub use demand::{Demand, Subscriber};
pub use fetch::FetchUpdates;
pub use field::FieldUpdates;
pub use operators::{try_validate, AssignSink, ToggleSink};
pub use stream::{SnapshotStream, StreamSink};
