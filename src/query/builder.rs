//! Staged request builder
//!
//! Stages are phantom types, so an out-of-order call does not compile:
//!
//! ```text
//! Created --first/first_n/all--> Targeted --filter--> Filtered --sorted_by--> Sorted
//!                                                        |  and/or               | then
//! ```
//!
//! `Targeted`, `Filtered` and `Sorted` are executable. Executing consumes
//! the builder.
//!
//! A request must be filtered before it can be sorted:
//!
//! ```compile_fail
//! # use recordbind::query::{RequestBuilder, Targeted, Many};
//! # use recordbind::sort::SortDescriptor;
//! fn sort<M: recordbind::DatabaseModel>(
//!     builder: RequestBuilder<M, Targeted, Many>,
//!     by: SortDescriptor<M::Entity>,
//! ) {
//!     let _ = builder.sorted_by(by);
//! }
//! ```
//!
//! A request with no target cannot be executed:
//!
//! ```compile_fail
//! # use recordbind::query::{RequestBuilder, Created, Many};
//! fn run<M: recordbind::DatabaseModel>(builder: RequestBuilder<M, Created, Many>) {
//!     let _ = builder.fetch();
//! }
//! ```
//!
//! A built request is executed once:
//!
//! ```compile_fail
//! # use recordbind::query::{RequestBuilder, Targeted, Many};
//! fn run<M: recordbind::DatabaseModel>(builder: RequestBuilder<M, Targeted, Many>) {
//!     let _ = builder.fetch();
//!     let _ = builder.fetch();
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::error::{BindError, BindResult};
use crate::live::FetchUpdates;
use crate::model::DatabaseModel;
use crate::observability::{log_event, Event};
use crate::predicate::{NativeFilter, Predicate};
use crate::schema::Entity;
use crate::sort::SortDescriptor;
use crate::store::SharedContext;

use super::request::{execute, FetchRequest};

/// Stage: nothing chosen yet
pub enum Created {}
/// Stage: target chosen, no predicate
pub enum Targeted {}
/// Stage: at least one predicate
pub enum Filtered {}
/// Stage: at least one sort key
pub enum Sorted {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Targeted {}
    impl Sealed for super::Filtered {}
    impl Sealed for super::Sorted {}
    impl Sealed for super::One {}
    impl Sealed for super::Many {}
}

/// Stages from which a request can be executed
pub trait Executable: sealed::Sealed {}

impl Executable for Targeted {}
impl Executable for Filtered {}
impl Executable for Sorted {}

/// Result shape: first match only
pub enum One {}
/// Result shape: ordered list
pub enum Many {}

/// How fetched models are collected
pub trait ResultShape: sealed::Sealed + 'static {
    type Output<M: Send + 'static>: Send + 'static;

    fn collect<M: Send + 'static>(models: Vec<M>) -> Self::Output<M>;
}

impl ResultShape for One {
    type Output<M: Send + 'static> = Option<M>;

    fn collect<M: Send + 'static>(models: Vec<M>) -> Option<M> {
        models.into_iter().next()
    }
}

impl ResultShape for Many {
    type Output<M: Send + 'static> = Vec<M>;

    fn collect<M: Send + 'static>(models: Vec<M>) -> Vec<M> {
        models
    }
}

/// Request for models of type `M` at stage `Step` with result shape `Shape`
pub struct RequestBuilder<M, Step, Shape = Many> {
    request: FetchRequest,
    _marker: PhantomData<fn() -> (M, Step, Shape)>,
}

impl<M, Step, Shape> RequestBuilder<M, Step, Shape> {
    fn advance<Next, NextShape>(request: FetchRequest) -> RequestBuilder<M, Next, NextShape> {
        RequestBuilder {
            request,
            _marker: PhantomData,
        }
    }

    /// Request built so far
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn compiled_filter(&self) -> Option<NativeFilter> {
        self.request.compiled_filter()
    }
}

impl<M, Step, Shape> fmt::Debug for RequestBuilder<M, Step, Shape> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestBuilder").field(&self.request).finish()
    }
}

impl<M: DatabaseModel> RequestBuilder<M, Created, Many> {
    pub fn new() -> Self {
        Self::advance(FetchRequest::new(<M::Entity as Entity>::NAME))
    }

    /// First matching model, or none
    pub fn first(self) -> RequestBuilder<M, Targeted, One> {
        Self::advance(self.request.with_limit(1))
    }

    /// Up to `count` matching models
    pub fn first_n(self, count: usize) -> RequestBuilder<M, Targeted, Many> {
        Self::advance(self.request.with_limit(count))
    }

    /// Up to `count` matching models after skipping `offset`
    pub fn first_n_after(self, count: usize, offset: usize) -> RequestBuilder<M, Targeted, Many> {
        Self::advance(self.request.with_limit(count).with_offset(offset))
    }

    /// Every matching model
    pub fn all(self) -> RequestBuilder<M, Targeted, Many> {
        Self::advance(self.request)
    }

    /// Every matching model after skipping `offset`
    pub fn all_after(self, offset: usize) -> RequestBuilder<M, Targeted, Many> {
        Self::advance(self.request.with_offset(offset))
    }
}

impl<M: DatabaseModel> Default for RequestBuilder<M, Created, Many> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: DatabaseModel, Shape> RequestBuilder<M, Targeted, Shape> {
    pub fn filter(self, predicate: Predicate<M::Entity>) -> RequestBuilder<M, Filtered, Shape> {
        Self::advance(self.request.with_predicate(predicate.into_expression()))
    }
}

impl<M: DatabaseModel, Shape> RequestBuilder<M, Filtered, Shape> {
    /// Conjoin another predicate with the current one
    pub fn and(mut self, predicate: Predicate<M::Entity>) -> Self {
        self.request.predicate = Some(match self.request.predicate.take() {
            Some(current) => current.and(predicate.into_expression()),
            None => predicate.into_expression(),
        });
        self
    }

    /// Disjoin another predicate with the current one
    pub fn or(mut self, predicate: Predicate<M::Entity>) -> Self {
        self.request.predicate = Some(match self.request.predicate.take() {
            Some(current) => current.or(predicate.into_expression()),
            None => predicate.into_expression(),
        });
        self
    }

    pub fn sorted_by(self, sort: SortDescriptor<M::Entity>) -> RequestBuilder<M, Sorted, Shape> {
        Self::advance(self.request.with_sort_key(sort.into_key()))
    }
}

impl<M: DatabaseModel, Shape> RequestBuilder<M, Sorted, Shape> {
    /// Secondary sort key for ties
    pub fn then(self, sort: SortDescriptor<M::Entity>) -> Self {
        Self::advance(self.request.with_sort_key(sort.into_key()))
    }
}

impl<M: DatabaseModel, Step: Executable, Shape: ResultShape> RequestBuilder<M, Step, Shape> {
    /// Execute in the entity's default context
    pub fn fetch(self) -> BindResult<Shape::Output<M>> {
        let context = resolve_context::<M>()?;
        self.fetch_in(&context)
    }

    /// Execute in `context`
    pub fn fetch_in(self, context: &SharedContext) -> BindResult<Shape::Output<M>> {
        let records = execute(context, &self.request)?;
        Ok(Shape::collect(records.into_iter().map(M::from_record).collect()))
    }

    /// Live updates of this request in the entity's default context
    pub fn updates(self) -> BindResult<FetchUpdates<M, Shape>> {
        let context = resolve_context::<M>()?;
        Ok(self.updates_in(&context))
    }

    /// Live updates of this request in `context`
    pub fn updates_in(self, context: &SharedContext) -> FetchUpdates<M, Shape> {
        FetchUpdates::new(self.request, context.clone())
    }

    pub fn into_request(self) -> FetchRequest {
        self.request
    }
}

fn resolve_context<M: DatabaseModel>() -> BindResult<SharedContext> {
    <M::Entity as Entity>::default_context().ok_or_else(|| {
        log_event(
            Event::ContextMissing,
            &[("entity", <M::Entity as Entity>::NAME)],
        );
        BindError::ConfigurationMissing
    })
}
