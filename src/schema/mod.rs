//! Schema - the collections and indexes a store version contains.
//!
//! The schema is persisted next to the data and only ever changed by the
//! versioned migrations in [`migrations`], which run once when a store is
//! opened at a newer version than the one on the medium.

mod migrations;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Record;

pub use migrations::{upgrade, Migration, MIGRATIONS};

/// A secondary index over one field of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    pub key_path: String,
    pub unique: bool,
}

/// Layout of one collection: its key field and secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub key_path: String,
    pub indexes: Vec<IndexSchema>,
}

impl CollectionSchema {
    /// Schema for a record type, with one non-unique index per `#[record(index)]` field.
    pub fn of<R: Record>() -> Self {
        Self {
            name: R::COLLECTION.to_string(),
            key_path: R::KEY_FIELD.to_string(),
            indexes: R::INDEXES
                .iter()
                .map(|field| IndexSchema {
                    name: field.to_string(),
                    key_path: field.to_string(),
                    unique: false,
                })
                .collect(),
        }
    }

    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

/// The full schema of a store at a given version.
///
/// Version 0 is the empty schema of a store that has never been opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    pub collections: BTreeMap<String, CollectionSchema>,
}

impl Schema {
    pub fn contains(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.get(name)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Adds a collection unless one with the same name already exists.
    /// Returns whether the collection was created.
    pub fn create_collection(&mut self, collection: CollectionSchema) -> bool {
        if self.contains(&collection.name) {
            return false;
        }
        self.collections.insert(collection.name.clone(), collection);
        true
    }
}
