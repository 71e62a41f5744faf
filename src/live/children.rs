//! Live updates of an ordered relationship
//!
//! The source observes both the owning entity and the child entity, so a
//! child saved with a new sort key re-orders the snapshot. A snapshot is
//! emitted only when the membership or the sorted order changed.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{BindError, BindResult};
use crate::field::ChildrenBinding;
use crate::model::DatabaseModel;
use crate::schema::Entity;
use crate::sort::Sort;
use crate::store::{RecordHandle, RecordId, SharedContext, StoreError};

use super::bridge::{subscribe, Subscription};
use super::demand::Subscriber;
use super::stream::SnapshotStream;

/// Sorted children of one record, re-emitted as they change
pub struct ChildrenUpdates<E, C> {
    relation: ChildrenBinding<E, C>,
    sort: Sort<C>,
    record: RecordHandle,
    context: SharedContext,
}

impl<E, C> fmt::Debug for ChildrenUpdates<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildrenUpdates")
            .field("relation", &self.relation)
            .field("record", &self.record)
            .finish()
    }
}

impl<E: Entity, C: DatabaseModel> ChildrenUpdates<E, C> {
    /// Fails when the record has no live context to observe
    pub(crate) fn new(
        relation: ChildrenBinding<E, C>,
        sort: Sort<C>,
        record: RecordHandle,
    ) -> BindResult<Self> {
        let context = record
            .context()
            .ok_or(BindError::Store(StoreError::Detached))?;
        Ok(Self {
            relation,
            sort,
            record,
            context,
        })
    }

    pub fn subscribe(self, subscriber: impl Subscriber<Vec<C>>) -> Subscription {
        let Self {
            relation,
            sort,
            record,
            context,
        } = self;
        let child_entity = <C::Entity as Entity>::NAME;
        let mut entities = vec![E::NAME];
        if child_entity != E::NAME {
            entities.push(child_entity);
        }
        let last: Arc<Mutex<Option<Vec<RecordId>>>> = Arc::new(Mutex::new(None));

        subscribe(
            context,
            &entities,
            move || {
                let children = relation.children_sorted(&record, &sort)?;
                let order: Vec<RecordId> = children.iter().map(DatabaseModel::id).collect();
                let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                if last.as_ref() == Some(&order) {
                    return Ok(None);
                }
                *last = Some(order);
                Ok(Some(children))
            },
            subscriber,
        )
    }

    pub fn into_stream(self) -> SnapshotStream<Vec<C>> {
        SnapshotStream::new(|sink| self.subscribe(sink))
    }
}
