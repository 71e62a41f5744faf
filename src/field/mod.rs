//! Field and relationship bindings

mod binding;
mod relationship;

pub use binding::FieldBinding;
pub use relationship::{ChildrenBinding, ParentBinding};
