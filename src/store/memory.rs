//! In-memory store context
//!
//! Records live in per-entity tables in insertion order. Attribute writes are
//! visible to fetches at once. `save` validates changed entities against
//! their registered schemas, optionally writes a JSON snapshot of every
//! table, then notifies observers of the entities that changed.
//!
//! Observers are called after every store lock is released, so a callback
//! may fetch from the same store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use serde::{Deserialize, Serialize};

use crate::query::FetchRequest;
use crate::schema::{Entity, EntitySchema, SchemaValidator};
use crate::sort::SortKey;

use super::context::{ChangeCallback, ObserverToken, StoreContext};
use super::errors::{StoreError, StoreResult};
use super::evaluate::PredicateEvaluator;
use super::record::{RecordHandle, RecordId};
use super::value::StorageValue;

#[derive(Default)]
struct Tables {
    records: BTreeMap<String, Vec<RecordHandle>>,
    /// Entities changed since the last save
    dirty: BTreeSet<String>,
}

struct Observer {
    entity: String,
    callback: ChangeCallback,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    entities: BTreeMap<String, Vec<PersistedRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    id: RecordId,
    attributes: BTreeMap<String, StorageValue>,
}

/// Reference store context backed by process memory
pub struct MemoryStore {
    this: Weak<MemoryStore>,
    tables: RwLock<Tables>,
    schemas: RwLock<HashMap<String, &'static EntitySchema>>,
    observers: Mutex<BTreeMap<u64, Observer>>,
    next_observer: AtomicU64,
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// Empty store with no persistence
    pub fn new() -> Arc<Self> {
        Self::build(PersistedState::default(), None)
    }

    /// Store persisted to `path`, loading its previous content if present
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            PersistedState::default()
        };
        Ok(Self::build(state, Some(path)))
    }

    fn build(state: PersistedState, path: Option<PathBuf>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<MemoryStore>| {
            let context: Weak<dyn StoreContext> = this.clone();
            let records = state
                .entities
                .into_iter()
                .map(|(entity, rows)| {
                    let handles = rows
                        .into_iter()
                        .map(|row| {
                            RecordHandle::attached(
                                entity.clone(),
                                row.id,
                                row.attributes,
                                context.clone(),
                            )
                        })
                        .collect();
                    (entity, handles)
                })
                .collect();

            Self {
                this: this.clone(),
                tables: RwLock::new(Tables {
                    records,
                    dirty: BTreeSet::new(),
                }),
                schemas: RwLock::new(HashMap::new()),
                observers: Mutex::new(BTreeMap::new()),
                next_observer: AtomicU64::new(1),
                path,
            }
        })
    }

    /// Validate records of `E` against its schema on every save
    pub fn register<E: Entity>(&self) {
        let schema = E::schema();
        self.schemas
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(schema.entity().to_string(), schema);
    }

    /// Number of records of `entity`
    pub fn count(&self, entity: &str) -> usize {
        self.tables
            .read()
            .map(|tables| tables.records.get(entity).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Notify observers of `entity` without a save
    pub fn notify_changed(&self, entity: &str) {
        self.notify(&BTreeSet::from([entity.to_string()]));
    }

    fn notify(&self, entities: &BTreeSet<String>) {
        let callbacks: Vec<ChangeCallback> = {
            let observers = self
                .observers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            observers
                .values()
                .filter(|observer| entities.contains(&observer.entity))
                .map(|observer| Arc::clone(&observer.callback))
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    fn mark_dirty(&self, entity: &str) {
        if let Ok(mut tables) = self.tables.write() {
            tables.dirty.insert(entity.to_string());
        }
    }

    fn validate(&self, tables: &Tables) -> StoreResult<()> {
        let schemas = self.schemas.read().map_err(|_| StoreError::LockPoisoned)?;
        for entity in &tables.dirty {
            let Some(schema) = schemas.get(entity) else {
                continue;
            };
            for record in tables.records.get(entity).into_iter().flatten() {
                SchemaValidator::validate_record(schema, record)
                    .map_err(|err| StoreError::SchemaViolation(err.to_string()))?;
            }
        }
        Ok(())
    }

    fn persist(&self, tables: &Tables, path: &Path) -> StoreResult<()> {
        let state = PersistedState {
            entities: tables
                .records
                .iter()
                .map(|(entity, records)| {
                    let rows = records
                        .iter()
                        .map(|record| PersistedRecord {
                            id: record.id(),
                            attributes: record.attributes(),
                        })
                        .collect();
                    (entity.clone(), rows)
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        // Write beside the target, then rename over it
        let staging = path.with_extension("tmp");
        let mut file = File::create(&staging)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

impl StoreContext for MemoryStore {
    fn execute(&self, request: &FetchRequest) -> StoreResult<Vec<RecordHandle>> {
        let candidates = {
            let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
            tables
                .records
                .get(&request.entity)
                .cloned()
                .unwrap_or_default()
        };

        let mut evaluator = PredicateEvaluator::new();
        let mut matched = Vec::with_capacity(candidates.len());
        for record in candidates {
            let keep = match &request.predicate {
                Some(predicate) => evaluator.matches(&record, predicate)?,
                None => true,
            };
            if keep {
                matched.push(record);
            }
        }

        if !request.sort_keys.is_empty() {
            SortKey::combine(&request.sort_keys).sort_slice(&mut matched);
        }

        let window = matched.into_iter().skip(request.offset);
        Ok(match request.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        })
    }

    fn record(&self, id: RecordId) -> StoreResult<RecordHandle> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        tables
            .records
            .values()
            .flatten()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or(StoreError::RecordNotFound(id))
    }

    fn insert(&self, entity: &str) -> StoreResult<RecordHandle> {
        let context: Weak<dyn StoreContext> = self.this.clone();
        let record = RecordHandle::attached(entity, RecordId::new(), BTreeMap::new(), context);

        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        tables
            .records
            .entry(entity.to_string())
            .or_default()
            .push(record.clone());
        tables.dirty.insert(entity.to_string());
        Ok(record)
    }

    fn delete(&self, record: &RecordHandle) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        let table = tables
            .records
            .get_mut(record.entity())
            .ok_or(StoreError::RecordNotFound(record.id()))?;
        let position = table
            .iter()
            .position(|candidate| candidate == record)
            .ok_or(StoreError::RecordNotFound(record.id()))?;
        table.remove(position);
        tables.dirty.insert(record.entity().to_string());
        Ok(())
    }

    fn save(&self) -> StoreResult<()> {
        let changed = {
            let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
            if tables.dirty.is_empty() {
                return Ok(());
            }
            self.validate(&tables)?;
            if let Some(path) = &self.path {
                self.persist(&tables, path)?;
            }
            std::mem::take(&mut tables.dirty)
        };

        self.notify(&changed);
        Ok(())
    }

    fn has_changes(&self) -> bool {
        self.tables
            .read()
            .map(|tables| !tables.dirty.is_empty())
            .unwrap_or(false)
    }

    fn register_observer(&self, entity: &str, callback: ChangeCallback) -> ObserverToken {
        let id = self.next_observer.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                id,
                Observer {
                    entity: entity.to_string(),
                    callback,
                },
            );
        ObserverToken(id)
    }

    fn unregister_observer(&self, token: ObserverToken) {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&token.0);
    }

    fn record_did_change(&self, record: &RecordHandle) {
        self.mark_dirty(record.entity());
    }
}
