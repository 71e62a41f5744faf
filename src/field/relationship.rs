//! Relationship bindings
//!
//! `ParentBinding` reads and writes a to-one reference. `ChildrenBinding`
//! manages an ordered to-many reference list with set semantics: a child
//! appears at most once and keeps its insertion position.

use std::fmt;
use std::marker::PhantomData;

use crate::convert::StoragePrimitive;
use crate::error::{BindError, BindResult};
use crate::model::DatabaseModel;
use crate::schema::{Attribute, Entity};
use crate::sort::Sort;
use crate::store::{RecordHandle, RecordId, SharedContext, StoreError};

use super::binding::FieldBinding;

fn owning_context(record: &RecordHandle) -> BindResult<SharedContext> {
    record
        .context()
        .ok_or(BindError::Store(StoreError::Detached))
}

/// To-one relationship from entity `E` to model `P`
pub struct ParentBinding<E, P> {
    attribute: Attribute<E, Option<RecordId>>,
    name: &'static str,
    _parent: PhantomData<fn() -> P>,
}

impl<E, P> Clone for ParentBinding<E, P> {
    fn clone(&self) -> Self {
        Self {
            attribute: self.attribute,
            name: self.name,
            _parent: PhantomData,
        }
    }
}

impl<E, P> fmt::Debug for ParentBinding<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParentBinding")
            .field(&self.name)
            .finish()
    }
}

impl<E: Entity, P: DatabaseModel> ParentBinding<E, P> {
    /// # Panics
    ///
    /// Panics when `attribute` is not a registered relationship of `E`.
    pub fn new(attribute: Attribute<E, Option<RecordId>>) -> Self {
        Self {
            name: attribute.storage_name(),
            attribute,
            _parent: PhantomData,
        }
    }

    pub fn attribute(&self) -> &Attribute<E, Option<RecordId>> {
        &self.attribute
    }

    /// The referenced parent, if any
    pub fn current(&self, record: &RecordHandle) -> BindResult<Option<P>> {
        let raw = record.read(self.name);
        let Some(Some(id)) = <Option<RecordId>>::from_storage(&raw) else {
            return Ok(None);
        };
        let context = owning_context(record)?;
        Ok(Some(P::from_record(context.record(id)?)))
    }

    /// Point the relationship at `parent`, or clear it
    pub fn set(&self, parent: Option<&P>, record: &RecordHandle) -> BindResult<()> {
        let value = parent.map(|parent| parent.id());
        record.write(self.name, value.into_storage());
        Ok(())
    }

    /// A field of the parent read through the relationship
    pub fn value_of<S, D>(
        &self,
        record: &RecordHandle,
        field: &FieldBinding<P::Entity, S, D>,
    ) -> BindResult<Option<D>>
    where
        S: StoragePrimitive,
        D: 'static,
    {
        match self.current(record)? {
            Some(parent) => field.current_value(parent.record()).map(Some),
            None => Ok(None),
        }
    }
}

/// Ordered to-many relationship from entity `E` to model `C`
pub struct ChildrenBinding<E, C> {
    attribute: Attribute<E, Vec<RecordId>>,
    name: &'static str,
    _child: PhantomData<fn() -> C>,
}

impl<E, C> Clone for ChildrenBinding<E, C> {
    fn clone(&self) -> Self {
        Self {
            attribute: self.attribute,
            name: self.name,
            _child: PhantomData,
        }
    }
}

impl<E, C> fmt::Debug for ChildrenBinding<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChildrenBinding")
            .field(&self.name)
            .finish()
    }
}

impl<E: Entity, C: DatabaseModel> ChildrenBinding<E, C> {
    /// # Panics
    ///
    /// Panics when `attribute` is not a registered relationship of `E`.
    pub fn new(attribute: Attribute<E, Vec<RecordId>>) -> Self {
        Self {
            name: attribute.storage_name(),
            attribute,
            _child: PhantomData,
        }
    }

    pub fn attribute(&self) -> &Attribute<E, Vec<RecordId>> {
        &self.attribute
    }

    /// Child identities in relationship order
    pub fn ids(&self, record: &RecordHandle) -> Vec<RecordId> {
        <Vec<RecordId>>::from_storage(&record.read(self.name)).unwrap_or_default()
    }

    fn write_ids(&self, record: &RecordHandle, ids: Vec<RecordId>) {
        record.write(self.name, ids.into_storage());
    }

    /// Children in relationship order
    pub fn children(&self, record: &RecordHandle) -> BindResult<Vec<C>> {
        let ids = self.ids(record);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let context = owning_context(record)?;
        ids.into_iter()
            .map(|id| Ok(C::from_record(context.record(id)?)))
            .collect()
    }

    /// Children ordered by `sort`
    pub fn children_sorted(&self, record: &RecordHandle, sort: &Sort<C>) -> BindResult<Vec<C>>
    where
        C: 'static,
    {
        Ok(sort.sorted(self.children(record)?))
    }

    /// Append `child`; a child already present keeps its position
    pub fn add(&self, child: &C, record: &RecordHandle) -> BindResult<()> {
        let mut ids = self.ids(record);
        if !ids.contains(&child.id()) {
            ids.push(child.id());
            self.write_ids(record, ids);
        }
        Ok(())
    }

    /// Remove `child` if present
    pub fn remove(&self, child: &C, record: &RecordHandle) -> BindResult<()> {
        let mut ids = self.ids(record);
        let before = ids.len();
        ids.retain(|id| *id != child.id());
        if ids.len() != before {
            self.write_ids(record, ids);
        }
        Ok(())
    }

    /// Place `child` at `index`, moving it if already present. An index past
    /// the end appends.
    pub fn insert(&self, child: &C, index: usize, record: &RecordHandle) -> BindResult<()> {
        let mut ids = self.ids(record);
        ids.retain(|id| *id != child.id());
        let index = index.min(ids.len());
        ids.insert(index, child.id());
        self.write_ids(record, ids);
        Ok(())
    }

    /// Remove the child at `index`
    pub fn remove_at(&self, index: usize, record: &RecordHandle) -> BindResult<()> {
        let mut ids = self.ids(record);
        if index >= ids.len() {
            return Err(BindError::validation(format!(
                "Index {} is out of bounds for {} children",
                index,
                ids.len()
            )));
        }
        ids.remove(index);
        self.write_ids(record, ids);
        Ok(())
    }
}
