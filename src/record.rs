//! Record - typed rows addressed by a natural key.

use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Employee, Room, Student};
use crate::schema::CollectionSchema;

/// Trait for types that can be stored in a collection.
///
/// Usually derived with `#[derive(Record)]`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Name of the collection holding this record type (e.g. "Employee").
    const COLLECTION: &'static str;

    /// Name of the field carrying the natural key.
    const KEY_FIELD: &'static str;

    /// Fields with a non-unique secondary index.
    const INDEXES: &'static [&'static str];

    /// Returns the natural key of this record.
    fn key(&self) -> &str;
}

/// The three collections managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Employee,
    Student,
    Room,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Employee, Collection::Student, Collection::Room];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Employee => Employee::COLLECTION,
            Collection::Student => Student::COLLECTION,
            Collection::Room => Room::COLLECTION,
        }
    }

    pub fn key_field(self) -> &'static str {
        match self {
            Collection::Employee => Employee::KEY_FIELD,
            Collection::Student => Student::KEY_FIELD,
            Collection::Room => Room::KEY_FIELD,
        }
    }

    /// Schema used when a migration creates this collection.
    pub fn schema(self) -> CollectionSchema {
        match self {
            Collection::Employee => CollectionSchema::of::<Employee>(),
            Collection::Student => CollectionSchema::of::<Student>(),
            Collection::Room => CollectionSchema::of::<Room>(),
        }
    }

    /// Check that `record` decodes as this collection's record type, so typed
    /// reads of the collection never trip over it.
    pub fn check(self, record: &Value) -> Result<(), StoreError> {
        let decoded = match self {
            Collection::Employee => Employee::deserialize(record).map(drop),
            Collection::Student => Student::deserialize(record).map(drop),
            Collection::Room => Room::deserialize(record).map(drop),
        };
        decoded.map_err(|err| StoreError::invalid(self.name(), err.to_string()))
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    /// Names are case-sensitive: `Employee` parses, `employee` does not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| StoreError::UnknownCollection(s.to_string()))
    }
}
