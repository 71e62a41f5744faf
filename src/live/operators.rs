//! Writing upstream values into model fields
//!
//! - `AssignSink`: subscriber that assigns every value to a field and saves
//! - `ToggleSink`: subscriber that toggles a boolean field on every value
//! - `try_validate`: stream adapter checking each item against a field's rules
//!
//! Both sinks ask for unlimited demand after their first value. Failures go
//! to the error handler when one is set; they are always logged by the
//! model operation itself.

use std::fmt;

use futures_util::{Stream, StreamExt};

use crate::convert::StoragePrimitive;
use crate::error::{BindError, BindResult};
use crate::field::FieldBinding;
use crate::model::DatabaseModel;

use super::demand::{Demand, Subscriber};

type ErrorHandler = Box<dyn FnMut(BindError) + Send>;

/// Assigns every received value to `field` of `model`, saving each time
pub struct AssignSink<M: DatabaseModel, S, D> {
    field: FieldBinding<M::Entity, S, D>,
    model: M,
    on_error: Option<ErrorHandler>,
}

impl<M: DatabaseModel, S, D> AssignSink<M, S, D> {
    pub fn new(field: FieldBinding<M::Entity, S, D>, model: M) -> Self {
        Self {
            field,
            model,
            on_error: None,
        }
    }

    /// Receive assignment failures and upstream re-fetch failures
    pub fn on_error(mut self, handler: impl FnMut(BindError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    fn fail(&mut self, err: BindError) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(err);
        }
    }
}

impl<M: DatabaseModel, S, D> fmt::Debug for AssignSink<M, S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignSink")
            .field("field", &self.field)
            .field("record", self.model.record())
            .finish()
    }
}

impl<M, S, D> Subscriber<D> for AssignSink<M, S, D>
where
    M: DatabaseModel,
    S: StoragePrimitive,
    D: 'static,
    FieldBinding<M::Entity, S, D>: Send,
{
    fn receive(&mut self, value: D) -> Demand {
        if let Err(err) = self.model.assign(&self.field, value) {
            self.fail(err);
        }
        Demand::unlimited()
    }

    fn receive_stale(&mut self, error: &BindError) {
        self.fail(error.clone());
    }
}

/// Toggles a boolean `field` of `model` and saves, once per received value
pub struct ToggleSink<M: DatabaseModel> {
    field: FieldBinding<M::Entity, bool, bool>,
    model: M,
    on_error: Option<ErrorHandler>,
}

impl<M: DatabaseModel> ToggleSink<M> {
    pub fn new(field: FieldBinding<M::Entity, bool, bool>, model: M) -> Self {
        Self {
            field,
            model,
            on_error: None,
        }
    }

    pub fn on_error(mut self, handler: impl FnMut(BindError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }
}

impl<M: DatabaseModel> fmt::Debug for ToggleSink<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleSink")
            .field("field", &self.field)
            .field("record", self.model.record())
            .finish()
    }
}

impl<M, T> Subscriber<T> for ToggleSink<M>
where
    M: DatabaseModel,
    FieldBinding<M::Entity, bool, bool>: Send,
{
    fn receive(&mut self, _signal: T) -> Demand {
        let result = self
            .model
            .toggle(&self.field)
            .and_then(|()| self.model.save());
        if let Err(err) = result {
            if let Some(handler) = self.on_error.as_mut() {
                handler(err);
            }
        }
        Demand::unlimited()
    }
}

/// Pass each item through the rules of `field` for `model`. Invalid items
/// become `Err` and the stream goes on.
pub fn try_validate<St, M, S, D>(
    stream: St,
    field: FieldBinding<M::Entity, S, D>,
    model: M,
) -> impl Stream<Item = BindResult<D>>
where
    St: Stream<Item = D>,
    M: DatabaseModel,
    S: StoragePrimitive,
    D: 'static,
{
    stream.map(move |value| model.validate(&field, &value).map(|()| value))
}
