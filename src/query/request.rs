//! Untyped fetch request as handed to a store context

use crate::error::{BindError, BindResult};
use crate::observability::{log_event, metrics, Event};
use crate::predicate::{compile, Expression, NativeFilter};
use crate::sort::SortKey;
use crate::store::{RecordHandle, SharedContext};

/// Target entity, optional predicate, ordered sort keys, limit and offset
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub entity: String,
    pub predicate: Option<Expression>,
    pub sort_keys: Vec<SortKey>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl FetchRequest {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            predicate: None,
            sort_keys: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    pub fn with_predicate(mut self, predicate: Expression) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_sort_key(mut self, key: SortKey) -> Self {
        self.sort_keys.push(key);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Predicate in native filter syntax, if any
    pub fn compiled_filter(&self) -> Option<NativeFilter> {
        self.predicate.as_ref().map(compile)
    }
}

/// Execute `request` on `context` with logging and metrics
pub(crate) fn execute(
    context: &SharedContext,
    request: &FetchRequest,
) -> BindResult<Vec<RecordHandle>> {
    match context.execute(request) {
        Ok(records) => {
            metrics().record_fetch(records.len());
            log_event(
                Event::FetchExecuted,
                &[
                    ("count", &records.len().to_string()),
                    ("entity", &request.entity),
                ],
            );
            Ok(records)
        }
        Err(err) => {
            metrics().increment_fetches_failed();
            log_event(
                Event::FetchFailed,
                &[
                    ("code", err.code()),
                    ("entity", &request.entity),
                    ("reason", &err.to_string()),
                ],
            );
            Err(BindError::Store(err))
        }
    }
}
