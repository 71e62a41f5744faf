//! Entity registration
//!
//! Every entity registers its storage attributes once. Typed selectors are
//! checked against the table, so a selector naming an unknown attribute or
//! the wrong kind fails immediately instead of misbehaving at query time.

mod entity;
mod errors;
mod types;
mod validator;

pub use entity::{Attribute, Entity};
pub use errors::{SchemaError, SchemaResult};
pub use types::{AttributeDef, AttributeKind, EntitySchema};
pub use validator::SchemaValidator;
