//! Domain models
//!
//! A domain model wraps exactly one record and exposes its field bindings as
//! associated functions:
//!
//! ```
//! use std::sync::OnceLock;
//! use recordbind::convert::Rule;
//! use recordbind::field::FieldBinding;
//! use recordbind::schema::{Attribute, AttributeKind, Entity, EntitySchema};
//! use recordbind::store::{MemoryStore, RecordHandle, SharedContext};
//! use recordbind::DatabaseModel;
//!
//! struct PlayerEntity;
//!
//! impl Entity for PlayerEntity {
//!     const NAME: &'static str = "PlayerEntity";
//!
//!     fn schema() -> &'static EntitySchema {
//!         static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             EntitySchema::new(Self::NAME).attribute("name", AttributeKind::String)
//!         })
//!     }
//! }
//!
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct Player(RecordHandle);
//!
//! impl Player {
//!     fn name() -> FieldBinding<PlayerEntity, String, String> {
//!         FieldBinding::new(Attribute::new("name")).validated_by(Rule::not_empty())
//!     }
//! }
//!
//! impl DatabaseModel for Player {
//!     type Entity = PlayerEntity;
//!
//!     fn from_record(record: RecordHandle) -> Self {
//!         Player(record)
//!     }
//!
//!     fn record(&self) -> &RecordHandle {
//!         &self.0
//!     }
//! }
//!
//! let context: SharedContext = MemoryStore::new();
//! let player = Player::create_in(&context)?;
//! player.assign(&Player::name(), "Donald".to_string())?;
//!
//! let found = Player::request()
//!     .first()
//!     .filter(Player::name().eq("Donald"))
//!     .fetch_in(&context)?;
//! assert!(found == Some(player));
//! # Ok::<(), recordbind::BindError>(())
//! ```

use crate::convert::StoragePrimitive;
use crate::error::{BindError, BindResult};
use crate::field::{ChildrenBinding, FieldBinding, ParentBinding};
use crate::live::{ChildrenUpdates, FieldUpdates};
use crate::observability::{log_event, metrics, Event};
use crate::predicate::Predicate;
use crate::query::{Created, Many, RequestBuilder};
use crate::schema::Entity;
use crate::sort::Sort;
use crate::store::{RecordHandle, RecordId, SharedContext, StoreError};

/// A value wrapping one record of `Self::Entity`
pub trait DatabaseModel: Sized + Send + 'static {
    type Entity: Entity;

    fn from_record(record: RecordHandle) -> Self;

    fn record(&self) -> &RecordHandle;

    fn id(&self) -> RecordId {
        self.record().id()
    }

    /// Entry point of the staged request builder
    fn request() -> RequestBuilder<Self, Created, Many> {
        RequestBuilder::new()
    }

    /// New record in `context`, pending until the next save
    fn create_in(context: &SharedContext) -> BindResult<Self> {
        let record = context.insert(<Self::Entity as Entity>::NAME)?;
        Ok(Self::from_record(record))
    }

    /// New record in the entity's default context
    fn create() -> BindResult<Self> {
        let context =
            <Self::Entity as Entity>::default_context().ok_or(BindError::ConfigurationMissing)?;
        Self::create_in(&context)
    }

    /// First model matching `predicate` in the default context
    fn find_first(predicate: Predicate<Self::Entity>) -> BindResult<Option<Self>> {
        Self::request().first().filter(predicate).fetch()
    }

    /// First model matching `predicate` in `context`
    fn find_first_in(
        context: &SharedContext,
        predicate: Predicate<Self::Entity>,
    ) -> BindResult<Option<Self>> {
        Self::request().first().filter(predicate).fetch_in(context)
    }

    fn current<S, D>(&self, field: &FieldBinding<Self::Entity, S, D>) -> BindResult<D>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        field.current_value(self.record())
    }

    fn validate<S, D>(&self, field: &FieldBinding<Self::Entity, S, D>, value: &D) -> BindResult<()>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        field.validate(value, self.record())
    }

    /// Validate and write without saving
    fn set<S, D>(&self, field: &FieldBinding<Self::Entity, S, D>, value: D) -> BindResult<()>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        field.set(value, self.record())
    }

    /// Validate, write, then save the owning context
    fn assign<S, D>(&self, field: &FieldBinding<Self::Entity, S, D>, value: D) -> BindResult<()>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        field.set(value, self.record())?;
        self.save()
    }

    fn toggle(&self, field: &FieldBinding<Self::Entity, bool, bool>) -> BindResult<()> {
        field.toggle(self.record())
    }

    /// Live stream of one field's converted value. Fails for a record with
    /// no live context.
    fn watch<S, D>(
        &self,
        field: &FieldBinding<Self::Entity, S, D>,
    ) -> BindResult<FieldUpdates<Self::Entity, S, D>>
    where
        S: StoragePrimitive,
        D: Send + 'static,
    {
        FieldUpdates::new(field.clone(), self.record().clone())
    }

    /// Delete the record from its context. The deletion is pending until
    /// the next save. Fails with `StoreError::Detached` for a record with no
    /// live context.
    fn remove(&self) -> BindResult<()> {
        let context = self
            .record()
            .context()
            .ok_or(BindError::Store(StoreError::Detached))?;
        context.delete(self.record())?;
        Ok(())
    }

    /// Save the owning context. Every failure is reported as `SaveFailure`.
    fn save(&self) -> BindResult<()> {
        let entity = <Self::Entity as Entity>::NAME;
        let result = match self.record().context() {
            Some(context) => context.save().map_err(|err| err.to_string()),
            None => Err("the record has no live context".to_string()),
        };

        match result {
            Ok(()) => {
                metrics().increment_saves();
                log_event(Event::SaveCompleted, &[("entity", entity)]);
                Ok(())
            }
            Err(reason) => {
                metrics().increment_save_failures();
                log_event(Event::SaveFailed, &[("entity", entity), ("reason", &reason)]);
                Err(BindError::SaveFailure(reason))
            }
        }
    }

    fn parent<P: DatabaseModel>(&self, relation: &ParentBinding<Self::Entity, P>) -> BindResult<Option<P>> {
        relation.current(self.record())
    }

    fn set_parent<P: DatabaseModel>(
        &self,
        relation: &ParentBinding<Self::Entity, P>,
        parent: Option<&P>,
    ) -> BindResult<()> {
        relation.set(parent, self.record())
    }

    fn children<C: DatabaseModel>(&self, relation: &ChildrenBinding<Self::Entity, C>) -> BindResult<Vec<C>> {
        relation.children(self.record())
    }

    /// Live stream of the children ordered by `sort`. A snapshot is pushed
    /// when membership or order changes. Fails for a record with no live
    /// context.
    fn watch_children<C: DatabaseModel>(
        &self,
        relation: &ChildrenBinding<Self::Entity, C>,
        sort: Sort<C>,
    ) -> BindResult<ChildrenUpdates<Self::Entity, C>> {
        ChildrenUpdates::new(relation.clone(), sort, self.record().clone())
    }

    fn add_child<C: DatabaseModel>(
        &self,
        relation: &ChildrenBinding<Self::Entity, C>,
        child: &C,
    ) -> BindResult<()> {
        relation.add(child, self.record())
    }

    fn remove_child<C: DatabaseModel>(
        &self,
        relation: &ChildrenBinding<Self::Entity, C>,
        child: &C,
    ) -> BindResult<()> {
        relation.remove(child, self.record())
    }
}

/// Field reads over a slice of models
pub trait ModelCollection<M: DatabaseModel> {
    /// Current value of `field` for every model, in order
    fn map_current<S, D>(&self, field: &FieldBinding<M::Entity, S, D>) -> BindResult<Vec<D>>
    where
        S: StoragePrimitive,
        D: 'static;

    /// Present values of an optional field; `None` entries are skipped
    fn compact_map_current<S, T>(
        &self,
        field: &FieldBinding<M::Entity, S, Option<T>>,
    ) -> BindResult<Vec<T>>
    where
        S: StoragePrimitive,
        T: 'static;

    /// Concatenation of a collection-valued field over every model
    fn flat_map_current<S, D>(
        &self,
        field: &FieldBinding<M::Entity, S, D>,
    ) -> BindResult<Vec<D::Item>>
    where
        S: StoragePrimitive,
        D: IntoIterator + 'static;
}

impl<M: DatabaseModel> ModelCollection<M> for [M] {
    fn map_current<S, D>(&self, field: &FieldBinding<M::Entity, S, D>) -> BindResult<Vec<D>>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        self.iter().map(|model| model.current(field)).collect()
    }

    fn compact_map_current<S, T>(
        &self,
        field: &FieldBinding<M::Entity, S, Option<T>>,
    ) -> BindResult<Vec<T>>
    where
        S: StoragePrimitive,
        T: 'static,
    {
        let values = self.map_current(field)?;
        Ok(values.into_iter().flatten().collect())
    }

    fn flat_map_current<S, D>(
        &self,
        field: &FieldBinding<M::Entity, S, D>,
    ) -> BindResult<Vec<D::Item>>
    where
        S: StoragePrimitive,
        D: IntoIterator + 'static,
    {
        let mut flattened = Vec::new();
        for model in self {
            flattened.extend(model.current(field)?);
        }
        Ok(flattened)
    }
}
