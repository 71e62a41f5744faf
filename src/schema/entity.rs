//! Entities and typed attribute selectors

use std::fmt;
use std::marker::PhantomData;

use crate::config;
use crate::convert::StoragePrimitive;
use crate::store::SharedContext;

use super::errors::SchemaResult;
use super::types::EntitySchema;

/// A stored entity type: its storage name and registration table.
///
/// ```
/// use std::sync::OnceLock;
/// use recordbind::schema::{AttributeKind, Entity, EntitySchema};
///
/// struct PlayerEntity;
///
/// impl Entity for PlayerEntity {
///     const NAME: &'static str = "PlayerEntity";
///
///     fn schema() -> &'static EntitySchema {
///         static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             EntitySchema::new(Self::NAME).attribute("name", AttributeKind::String)
///         })
///     }
/// }
///
/// assert_eq!(PlayerEntity::model_name(), "Player");
/// ```
pub trait Entity: Send + Sync + 'static {
    /// Entity name in the store
    const NAME: &'static str;

    /// The registration table for this entity
    fn schema() -> &'static EntitySchema;

    /// Human-facing model name: the entity name without an `Entity` suffix
    fn model_name() -> &'static str {
        match Self::NAME.strip_suffix("Entity") {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => Self::NAME,
        }
    }

    /// Context used by `fetch()` when none is passed
    fn default_context() -> Option<SharedContext> {
        config::default_context()
    }
}

/// Typed selector of one attribute of entity `E`, stored as `S`
pub struct Attribute<E, S> {
    name: &'static str,
    _marker: PhantomData<fn() -> (E, S)>,
}

impl<E, S> Attribute<E, S> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Name as written, without checking registration
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<E: Entity, S: StoragePrimitive> Attribute<E, S> {
    /// Checked storage name.
    ///
    /// # Panics
    ///
    /// Panics when the selector is not registered on `E` with the kind of
    /// `S`. A selector that does not resolve is a programming error.
    pub fn storage_name(&self) -> &'static str {
        match self.resolve() {
            Ok(name) => name,
            Err(err) => panic!("unresolvable attribute selector: {}", err),
        }
    }

    /// Non-panicking form of `storage_name`
    pub fn resolve(&self) -> SchemaResult<&'static str> {
        E::schema().check::<S>(self.name)?;
        Ok(self.name)
    }
}

impl<E, S> Clone for Attribute<E, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, S> Copy for Attribute<E, S> {}

impl<E, S> PartialEq for Attribute<E, S> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<E, S> Eq for Attribute<E, S> {}

impl<E, S> fmt::Debug for Attribute<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attribute").field(&self.name).finish()
    }
}
