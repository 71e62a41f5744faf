//! Live updates of a fetch request

use std::fmt;
use std::marker::PhantomData;

use crate::model::DatabaseModel;
use crate::query::{execute, FetchRequest, ResultShape};
use crate::store::SharedContext;

use super::bridge::{subscribe, Subscription};
use super::demand::Subscriber;
use super::stream::SnapshotStream;

/// Re-executes a request whenever its entity changes and delivers full
/// result snapshots
pub struct FetchUpdates<M, Shape> {
    request: FetchRequest,
    context: SharedContext,
    _marker: PhantomData<fn() -> (M, Shape)>,
}

impl<M, Shape> fmt::Debug for FetchUpdates<M, Shape> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchUpdates").field(&self.request).finish()
    }
}

impl<M: DatabaseModel, Shape: ResultShape> FetchUpdates<M, Shape> {
    pub(crate) fn new(request: FetchRequest, context: SharedContext) -> Self {
        Self {
            request,
            context,
            _marker: PhantomData,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Attach `subscriber`. Nothing is fetched until demand is requested
    /// through the returned handle.
    pub fn subscribe(self, subscriber: impl Subscriber<Shape::Output<M>>) -> Subscription {
        let entity = self.request.entity.clone();
        let context = self.context.clone();
        let request = self.request;
        let source_context = self.context;

        subscribe(
            context,
            &[entity.as_str()],
            move || {
                let records = execute(&source_context, &request)?;
                Ok(Some(Shape::collect(
                    records.into_iter().map(M::from_record).collect(),
                )))
            },
            subscriber,
        )
    }

    /// Pull-based `Stream` of snapshots
    pub fn into_stream(self) -> SnapshotStream<Shape::Output<M>> {
        SnapshotStream::new(|sink| self.subscribe(sink))
    }
}
