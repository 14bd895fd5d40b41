//! RecordRepository - typed accessor for one collection.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;

use super::RecordStore;
use crate::error::{Result, StoreError};
use crate::medium::StorageMedium;
use crate::Record;

/// Typed repository wrapper for the collection holding `R`.
pub struct RecordRepository<'a, M, R> {
    store: &'a RecordStore<M>,
    _marker: PhantomData<R>,
}

impl<'a, M: StorageMedium, R: Record> RecordRepository<'a, M, R> {
    pub fn new(store: &'a RecordStore<M>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Insert a new record. Fails if its key is taken or empty.
    pub async fn insert(&self, record: &R) -> Result<String> {
        let value = serde_json::to_value(record)?;
        self.store.insert(R::COLLECTION, value).await
    }

    /// Get a record by key.
    pub async fn get(&self, key: &str) -> Result<R> {
        let value = self.store.get_by_key(R::COLLECTION, key).await?;
        decode(value)
    }

    /// Every record in the collection, ordered by key.
    pub async fn all(&self) -> Result<Vec<R>> {
        self.store
            .get_all(R::COLLECTION)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Replace the record at `key`. `record.key()` must equal `key`.
    pub async fn update(&self, key: &str, record: &R) -> Result<()> {
        if record.key() != key {
            return Err(StoreError::invalid(
                R::COLLECTION,
                format!("record key `{}` does not match `{}`", record.key(), key),
            ));
        }
        let value = serde_json::to_value(record)?;
        self.store.update(R::COLLECTION, key, value).await
    }

    /// Delete a record by key. Missing keys are ignored.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(R::COLLECTION, key).await
    }

    /// Records whose `index` field equals `value`.
    pub async fn find_by_index<V: Serialize + ?Sized>(&self, index: &str, value: &V) -> Result<Vec<R>> {
        let value = serde_json::to_value(value)?;
        self.store
            .find_by_index(R::COLLECTION, index, &value)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count(R::COLLECTION).await
    }
}

fn decode<R: Record>(value: Value) -> Result<R> {
    Ok(serde_json::from_value(value)?)
}
