//! Records and record handles
//!
//! A record has an identity, an entity name and a map of named attributes.
//! `RecordHandle` is the shareable reference to one record; clones point at
//! the same attributes. Handles compare and hash by identity.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, Weak};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::{SharedContext, StoreContext};
use super::value::StorageValue;

/// Stable identity of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct RecordInner {
    id: RecordId,
    entity: String,
    attributes: RwLock<BTreeMap<String, StorageValue>>,
    context: Option<Weak<dyn StoreContext>>,
}

/// Shared handle to one record
#[derive(Clone)]
pub struct RecordHandle {
    inner: Arc<RecordInner>,
}

impl RecordHandle {
    /// Create a handle owned by `context`
    pub fn attached(
        entity: impl Into<String>,
        id: RecordId,
        attributes: BTreeMap<String, StorageValue>,
        context: Weak<dyn StoreContext>,
    ) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                id,
                entity: entity.into(),
                attributes: RwLock::new(attributes),
                context: Some(context),
            }),
        }
    }

    /// Create a handle with no owning context
    pub fn detached(entity: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                id: RecordId::new(),
                entity: entity.into(),
                attributes: RwLock::new(BTreeMap::new()),
                context: None,
            }),
        }
    }

    pub fn id(&self) -> RecordId {
        self.inner.id
    }

    /// Entity name this record belongs to
    pub fn entity(&self) -> &str {
        &self.inner.entity
    }

    /// The owning context, if it is still alive
    pub fn context(&self) -> Option<SharedContext> {
        self.inner.context.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_detached(&self) -> bool {
        self.context().is_none()
    }

    /// Read one attribute; missing attributes read as `Null`
    pub fn read(&self, attribute: &str) -> StorageValue {
        self.inner
            .attributes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(attribute)
            .cloned()
            .unwrap_or(StorageValue::Null)
    }

    /// Write one attribute and tell the owning context the record changed.
    ///
    /// Writing `Null` removes the attribute.
    pub fn write(&self, attribute: &str, value: StorageValue) {
        {
            let mut attributes = self
                .inner
                .attributes
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if value.is_null() {
                attributes.remove(attribute);
            } else {
                attributes.insert(attribute.to_string(), value);
            }
        }
        if let Some(context) = self.context() {
            context.record_did_change(self);
        }
    }

    /// Copy of all attributes
    pub fn attributes(&self) -> BTreeMap<String, StorageValue> {
        self.inner
            .attributes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PartialEq for RecordHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for RecordHandle {}

impl Hash for RecordHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("id", &self.inner.id)
            .field("entity", &self.inner.entity)
            .finish()
    }
}
