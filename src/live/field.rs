//! Live updates of one field of one record

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::convert::StoragePrimitive;
use crate::error::{BindError, BindResult};
use crate::field::FieldBinding;
use crate::schema::Entity;
use crate::store::{RecordHandle, SharedContext, StorageValue, StoreError};

use super::bridge::{subscribe, Subscription};
use super::demand::Subscriber;
use super::stream::SnapshotStream;

/// Emits a field's converted value, then again each time the stored value
/// changes. Saves that leave the field untouched emit nothing.
///
/// Conversion failures reach the subscriber through `receive_stale`.
pub struct FieldUpdates<E, S, D> {
    binding: FieldBinding<E, S, D>,
    record: RecordHandle,
    context: SharedContext,
}

impl<E, S, D> fmt::Debug for FieldUpdates<E, S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldUpdates")
            .field("binding", &self.binding)
            .field("record", &self.record)
            .finish()
    }
}

impl<E: Entity, S: StoragePrimitive, D: Send + 'static> FieldUpdates<E, S, D> {
    /// Fails when the record has no live context to observe
    pub(crate) fn new(binding: FieldBinding<E, S, D>, record: RecordHandle) -> BindResult<Self> {
        let context = record
            .context()
            .ok_or(BindError::Store(StoreError::Detached))?;
        Ok(Self {
            binding,
            record,
            context,
        })
    }

    pub fn subscribe(self, subscriber: impl Subscriber<D>) -> Subscription {
        let Self {
            binding,
            record,
            context,
        } = self;
        let last: Arc<Mutex<Option<StorageValue>>> = Arc::new(Mutex::new(None));

        subscribe(
            context,
            &[E::NAME],
            move || {
                let raw = record.read(binding.name());
                {
                    let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                    if last.as_ref() == Some(&raw) {
                        return Ok(None);
                    }
                    *last = Some(raw);
                }
                binding.current_value(&record).map(Some)
            },
            subscriber,
        )
    }

    pub fn into_stream(self) -> SnapshotStream<D> {
        SnapshotStream::new(|sink| self.subscribe(sink))
    }
}
