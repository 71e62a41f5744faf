//! Store execution and change-notification contract
//!
//! A context owns records, executes fetch requests over them, persists them on
//! `save`, and notifies registered observers when an entity's records change.

use std::fmt;
use std::sync::Arc;

use super::errors::StoreResult;
use super::record::{RecordHandle, RecordId};
use crate::query::FetchRequest;

/// Callback invoked when records of an observed entity change.
///
/// Callbacks carry no payload; observers re-read what they need.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Registration handle returned by `register_observer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(pub u64);

impl fmt::Display for ObserverToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// A record store: executes requests, owns records and announces changes
pub trait StoreContext: Send + Sync {
    /// Execute a request and return matching records in request order
    fn execute(&self, request: &FetchRequest) -> StoreResult<Vec<RecordHandle>>;

    /// Look up one record by identity
    fn record(&self, id: RecordId) -> StoreResult<RecordHandle>;

    /// Create an empty record of `entity`, pending until the next save
    fn insert(&self, entity: &str) -> StoreResult<RecordHandle>;

    /// Remove a record from the context
    fn delete(&self, record: &RecordHandle) -> StoreResult<()>;

    /// Persist pending changes and notify observers of changed entities
    fn save(&self) -> StoreResult<()>;

    /// True when there are unsaved changes
    fn has_changes(&self) -> bool;

    /// Observe changes to records of `entity`
    fn register_observer(&self, entity: &str, callback: ChangeCallback) -> ObserverToken;

    /// Stop observing. Unknown tokens are ignored.
    fn unregister_observer(&self, token: ObserverToken);

    /// Hook called by `RecordHandle::write` after an attribute changed
    fn record_did_change(&self, _record: &RecordHandle) {}
}

/// Shared, dynamically dispatched context
pub type SharedContext = Arc<dyn StoreContext>;
