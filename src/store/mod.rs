//! Storage layer
//!
//! - `StorageValue`: the store's primitive values
//! - `RecordHandle`: shared handle to one record
//! - `StoreContext`: execution and change-notification contract
//! - `MemoryStore`: reference context kept in process memory

mod context;
mod errors;
mod evaluate;
mod memory;
mod record;
mod value;

pub use context::{ChangeCallback, ObserverToken, SharedContext, StoreContext};
pub use errors::{StoreError, StoreResult};
pub use evaluate::PredicateEvaluator;
pub use memory::MemoryStore;
pub use record::{RecordHandle, RecordId};
pub use value::StorageValue;
