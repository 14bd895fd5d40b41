//! RecordStore - versioned keyed storage for the Employee, Student and Room collections.
//!
//! ## Example
//!
//! ```ignore
//! use campus_records::{Employee, MemoryMedium, RecordStore};
//!
//! let store = RecordStore::open(MemoryMedium::new()).await?;
//! store.records::<Employee>().insert(&Employee::new("E1", "Ani")).await?;
//! let ani = store.records::<Employee>().get("E1").await?;
//! ```
//!
//! Each write is one transaction scoped to one collection: it holds that
//! collection's write lock while the new collection document is written to the
//! medium, and swaps the in-memory table only once the write succeeded. Reads
//! take the collection's read lock, so they never see a half-applied write.
//! Different collections have independent locks and do not wait on each other.
//!
//! Medium calls run on tokio's blocking pool, never on a runtime worker.
//!
//! Opening the same database twice (on media reporting the same
//! [`locate`](StorageMedium::locate)) yields handles to one shared store, so
//! writes through either handle are seen by both and none overwrite the other.

mod change;
mod repository;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use serde_json::Value;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::medium::{MediumError, StorageMedium};
use crate::record::Collection;
use crate::schema::{self, CollectionSchema, Schema};

use change::Notifier;
pub use change::{ChangeEvent, ChangeKind, RESET_EVENT};
pub use repository::RecordRepository;

/// Logical name of the application's database.
pub const DEFAULT_NAME: &str = "USTI";

/// Schema version this build of the store opens by default.
pub const SCHEMA_VERSION: u32 = 1;

/// Document holding the persisted [`Schema`].
const SCHEMA_DOCUMENT: &str = "_schema";

/// Records of one collection by key. Ordered, so `get_all` returns ascending keys.
type Table = BTreeMap<String, Value>;

/// Open stores by medium location. Entries die with their last handle.
type Registry = Mutex<HashMap<String, Weak<dyn Any + Send + Sync>>>;

fn registry() -> &'static Registry {
    static OPEN_STORES: OnceLock<Registry> = OnceLock::new();
    OPEN_STORES.get_or_init(Default::default)
}

/// Handle to an open store. Clones share the same underlying store.
pub struct RecordStore<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for RecordStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<M> {
    medium: M,
    name: String,
    schema: Schema,
    tables: HashMap<String, RwLock<Table>>,
    /// Every operation holds a read guard for its whole duration; `reset`
    /// takes the write guard.
    gate: RwLock<()>,
    /// Set by `reset` under the write guard once the database is gone.
    closed: AtomicBool,
    notifier: Notifier,
}

impl<M: StorageMedium> RecordStore<M> {
    /// Open the default database (`USTI`, version 1), creating it if absent.
    pub async fn open(medium: M) -> Result<Self> {
        Self::open_with(medium, DEFAULT_NAME, SCHEMA_VERSION).await
    }

    /// Open the database named by `config`.
    pub async fn open_config(medium: M, config: &StoreConfig) -> Result<Self> {
        Self::open_with(medium, &config.name, config.version).await
    }

    /// Open `name` at `version`, running any pending schema migrations.
    ///
    /// If the database is already open in this process, the returned handle
    /// shares that store. Its version must then equal `version`: a lower one
    /// fails with `VersionTooNew`, a higher one with `StoreUnavailable` until
    /// the other handles are dropped.
    pub async fn open_with(medium: M, name: &str, version: u32) -> Result<Self> {
        let location = medium.locate(name);
        let mut open = registry().lock().await;
        open.retain(|_, store| store.strong_count() > 0);

        if let Some(inner) = open
            .get(&location)
            .and_then(Weak::upgrade)
            .and_then(|store| store.downcast::<Inner<M>>().ok())
            .filter(|inner| !inner.closed.load(Ordering::SeqCst))
        {
            let current = inner.schema.version;
            if version < current {
                return Err(StoreError::VersionTooNew {
                    stored: current,
                    requested: version,
                });
            }
            if version > current {
                return Err(StoreError::StoreUnavailable(format!(
                    "store {} is open at version {}; close it before upgrading to {}",
                    name, current, version
                )));
            }
            debug!(database = name, %location, "sharing open store");
            return Ok(Self { inner });
        }

        let store = Self::initialize(medium, name, version, Notifier::new()).await?;
        store.register(&mut open, location);
        Ok(store)
    }

    async fn initialize(medium: M, name: &str, version: u32, notifier: Notifier) -> Result<Self> {
        let stored = match read_document(&medium, name, SCHEMA_DOCUMENT).await? {
            Some(bytes) => decode_document::<Schema>(&bytes, SCHEMA_DOCUMENT)?,
            None => Schema::default(),
        };

        let mut schema = stored.clone();
        let applied = schema::upgrade(&mut schema, version)?;
        if schema != stored {
            let bytes = serde_json::to_vec(&schema)?;
            write_document(&medium, name, SCHEMA_DOCUMENT, bytes).await?;
            info!(
                database = name,
                from = stored.version,
                to = schema.version,
                migrations = ?applied,
                "upgraded store schema"
            );
        }

        let mut tables = HashMap::new();
        for collection in schema.collection_names() {
            let table = match read_document(&medium, name, collection).await? {
                Some(bytes) => decode_document::<Table>(&bytes, collection)?,
                None => Table::new(),
            };
            tables.insert(collection.to_string(), RwLock::new(table));
        }

        info!(
            database = name,
            version = schema.version,
            collections = tables.len(),
            "opened store"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                medium,
                name: name.to_string(),
                schema,
                tables,
                gate: RwLock::new(()),
                closed: AtomicBool::new(false),
                notifier,
            }),
        })
    }

    fn register(&self, open: &mut HashMap<String, Weak<dyn Any + Send + Sync>>, location: String) {
        let shared: Arc<dyn Any + Send + Sync> = self.inner.clone();
        open.insert(location, Arc::downgrade(&shared));
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn version(&self) -> u32 {
        self.inner.schema.version
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn medium(&self) -> &M {
        &self.inner.medium
    }

    /// Whether this handle is still usable (it has not been reset).
    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    /// Insert a new record and return its key.
    pub async fn insert(&self, collection: impl AsRef<str>, record: Value) -> Result<String> {
        let _open = self.inner.enter().await?;
        let (schema, table) = self.inner.table(collection.as_ref())?;
        let key = record_key(schema, &record)?.to_string();
        check_shape(schema, &record)?;

        let mut rows = table.write().await;
        if rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                collection: schema.name.clone(),
                key,
            });
        }

        let mut next = rows.clone();
        next.insert(key.clone(), record);
        self.inner.persist(&schema.name, &next).await?;
        *rows = next;
        drop(rows);

        debug!(collection = %schema.name, key = %key, "inserted record");
        self.inner
            .notifier
            .notify(&ChangeEvent::write(ChangeKind::Inserted, &schema.name, &key));
        Ok(key)
    }

    /// Every record in the collection, ordered by key.
    pub async fn get_all(&self, collection: impl AsRef<str>) -> Result<Vec<Value>> {
        let _open = self.inner.enter().await?;
        let (_, table) = self.inner.table(collection.as_ref())?;
        let rows = table.read().await;
        Ok(rows.values().cloned().collect())
    }

    /// Point lookup. Fails with `NotFound` when no record has `key`.
    pub async fn get_by_key(&self, collection: impl AsRef<str>, key: &str) -> Result<Value> {
        let _open = self.inner.enter().await?;
        let (schema, table) = self.inner.table(collection.as_ref())?;
        let rows = table.read().await;
        rows.get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(&schema.name, key))
    }

    /// Replace the record stored at `key` as a whole.
    ///
    /// The key inside `record` must equal `key`: keys never change.
    pub async fn update(&self, collection: impl AsRef<str>, key: &str, record: Value) -> Result<()> {
        let _open = self.inner.enter().await?;
        let (schema, table) = self.inner.table(collection.as_ref())?;
        let embedded = record_key(schema, &record)?;
        if embedded != key {
            return Err(StoreError::invalid(
                &schema.name,
                format!("record key `{}` does not match `{}`", embedded, key),
            ));
        }
        check_shape(schema, &record)?;

        let mut rows = table.write().await;
        let mut next = rows.clone();
        match next.get_mut(key) {
            Some(slot) => *slot = record,
            None => return Err(StoreError::not_found(&schema.name, key)),
        }
        self.inner.persist(&schema.name, &next).await?;
        *rows = next;
        drop(rows);

        debug!(collection = %schema.name, key = %key, "updated record");
        self.inner
            .notifier
            .notify(&ChangeEvent::write(ChangeKind::Updated, &schema.name, key));
        Ok(())
    }

    /// Remove the record at `key`. Deleting a missing key succeeds and changes nothing.
    pub async fn delete(&self, collection: impl AsRef<str>, key: &str) -> Result<()> {
        let _open = self.inner.enter().await?;
        let (schema, table) = self.inner.table(collection.as_ref())?;

        let mut rows = table.write().await;
        if !rows.contains_key(key) {
            return Ok(());
        }
        let mut next = rows.clone();
        next.remove(key);
        self.inner.persist(&schema.name, &next).await?;
        *rows = next;
        drop(rows);

        debug!(collection = %schema.name, key = %key, "deleted record");
        self.inner
            .notifier
            .notify(&ChangeEvent::write(ChangeKind::Deleted, &schema.name, key));
        Ok(())
    }

    /// Records whose indexed field equals `value`, ordered by key.
    ///
    /// Like the key, a null or absent field is not indexed.
    pub async fn find_by_index(
        &self,
        collection: impl AsRef<str>,
        index: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let _open = self.inner.enter().await?;
        let (schema, table) = self.inner.table(collection.as_ref())?;
        let index = schema
            .index(index)
            .ok_or_else(|| StoreError::UnknownIndex {
                collection: schema.name.clone(),
                index: index.to_string(),
            })?;

        let rows = table.read().await;
        Ok(rows
            .values()
            .filter(|record| match record.get(&index.key_path) {
                Some(field) => !field.is_null() && field == value,
                None => false,
            })
            .cloned()
            .collect())
    }

    pub async fn count(&self, collection: impl AsRef<str>) -> Result<usize> {
        let _open = self.inner.enter().await?;
        let (_, table) = self.inner.table(collection.as_ref())?;
        let rows = table.read().await;
        Ok(rows.len())
    }

    /// Typed access to the collection holding `R`.
    pub fn records<R: crate::Record>(&self) -> RecordRepository<'_, M, R> {
        RecordRepository::new(self)
    }

    /// Discard the whole database and recreate it empty at the same version.
    ///
    /// Waits for operations already in flight on this store to finish, then
    /// invalidates every handle to it: later calls through those handles fail
    /// with `StoreUnavailable`. Use the returned handle (or a new `open`) from
    /// then on. If recreating the database fails after it was destroyed, the
    /// old handles stay invalid and the error is returned; the next `open`
    /// starts from the empty database.
    /// This cannot be undone; asking the user first is up to the caller.
    pub async fn reset(&self) -> Result<Self> {
        let inner = &self.inner;
        let location = inner.medium.locate(&inner.name);
        let mut open = registry().lock().await;
        let _gate = inner.gate.write().await;
        if inner.closed.load(Ordering::SeqCst) {
            return Err(inner.closed_error());
        }

        destroy_database(&inner.medium, &inner.name).await?;
        inner.closed.store(true, Ordering::SeqCst);
        info!(database = %inner.name, "destroyed store, reinitializing");

        let store = Self::initialize(
            inner.medium.clone(),
            &inner.name,
            inner.schema.version,
            inner.notifier.clone(),
        )
        .await?;
        store.register(&mut open, location);
        drop(open);

        store.inner.notifier.notify(&ChangeEvent::reset());
        Ok(store)
    }

    /// Register a listener for changes to `event` (a collection name or `reset`).
    ///
    /// Listeners run on background threads after the write has committed.
    /// Returns an id for [`remove_listener`](Self::remove_listener).
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&self, event: &str, listener: F) -> Option<String>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.inner.notifier.on(event, listener)
    }

    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, listener_id: &str) -> bool {
        self.inner.notifier.remove(listener_id)
    }
}

impl<M: StorageMedium> Inner<M> {
    async fn enter(&self) -> Result<RwLockReadGuard<'_, ()>> {
        let gate = self.gate.read().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }
        Ok(gate)
    }

    fn closed_error(&self) -> StoreError {
        StoreError::StoreUnavailable(format!(
            "store {} was reset; use the handle returned by reset",
            self.name
        ))
    }

    fn table(&self, collection: &str) -> Result<(&CollectionSchema, &RwLock<Table>)> {
        match (self.schema.collection(collection), self.tables.get(collection)) {
            (Some(schema), Some(table)) => Ok((schema, table)),
            _ => Err(StoreError::UnknownCollection(collection.to_string())),
        }
    }

    async fn persist(&self, collection: &str, rows: &Table) -> Result<()> {
        let bytes = serde_json::to_vec(rows)?;
        write_document(&self.medium, &self.name, collection, bytes).await
    }
}

/// The record's key, which must be a non-empty string.
fn record_key<'a>(schema: &CollectionSchema, record: &'a Value) -> Result<&'a str> {
    let fields = record
        .as_object()
        .ok_or_else(|| StoreError::invalid(&schema.name, "record must be an object"))?;

    match fields.get(&schema.key_path) {
        Some(Value::String(key)) if !key.is_empty() => Ok(key),
        Some(Value::String(_)) | Some(Value::Null) | None => Err(StoreError::invalid(
            &schema.name,
            format!("key field `{}` is empty", schema.key_path),
        )),
        Some(_) => Err(StoreError::invalid(
            &schema.name,
            format!("key field `{}` must be a string", schema.key_path),
        )),
    }
}

/// Records of the built-in collections must decode as their record type.
fn check_shape(schema: &CollectionSchema, record: &Value) -> Result<()> {
    match schema.name.parse::<Collection>() {
        Ok(collection) => collection.check(record),
        Err(_) => Ok(()),
    }
}

/// Run a medium call on the blocking pool.
async fn blocking<M, T, F>(medium: &M, call: F) -> Result<T>
where
    M: StorageMedium,
    T: Send + 'static,
    F: FnOnce(M) -> std::result::Result<T, MediumError> + Send + 'static,
{
    let medium = medium.clone();
    let result = tokio::task::spawn_blocking(move || call(medium))
        .await
        .map_err(|err| StoreError::StoreUnavailable(format!("storage task failed: {}", err)))?;
    Ok(result?)
}

async fn read_document<M: StorageMedium>(
    medium: &M,
    database: &str,
    document: &str,
) -> Result<Option<Vec<u8>>> {
    let (db, doc) = (database.to_string(), document.to_string());
    let result = blocking(medium, move |medium| medium.read(&db, &doc)).await;
    if let Err(err) = &result {
        warn!(database, document, error = %err, "storage read failed");
    }
    result
}

async fn write_document<M: StorageMedium>(
    medium: &M,
    database: &str,
    document: &str,
    bytes: Vec<u8>,
) -> Result<()> {
    let (db, doc) = (database.to_string(), document.to_string());
    let result = blocking(medium, move |medium| medium.write(&db, &doc, &bytes)).await;
    if let Err(err) = &result {
        warn!(database, document, error = %err, "storage write failed");
    }
    result
}

async fn destroy_database<M: StorageMedium>(medium: &M, database: &str) -> Result<()> {
    let db = database.to_string();
    let result = blocking(medium, move |medium| medium.destroy(&db)).await;
    if let Err(err) = &result {
        warn!(database, error = %err, "failed to destroy store");
    }
    result
}

fn decode_document<T: serde::de::DeserializeOwned>(bytes: &[u8], document: &str) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|err| {
        let err = MediumError::Corrupt {
            document: document.to_string(),
            reason: err.to_string(),
        };
        warn!(error = %err, "stored document is unreadable");
        err.into()
    })
}
