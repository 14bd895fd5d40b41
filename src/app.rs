//! Application state for a front end driving the store.
//!
//! A front end shows one section (collection) at a time and edits at most one
//! record. That state lives here and is passed in explicitly; the store keeps
//! none of it.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::Result;
use crate::medium::StorageMedium;
use crate::record::Collection;
use crate::store::RecordStore;

/// The section currently shown, one per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Employee,
    Student,
    Room,
}

impl Section {
    pub fn collection(self) -> Collection {
        match self {
            Section::Employee => Collection::Employee,
            Section::Student => Collection::Student,
            Section::Room => Collection::Room,
        }
    }
}

impl From<Collection> for Section {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::Employee => Section::Employee,
            Collection::Student => Section::Student,
            Collection::Room => Section::Room,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    section: Section,
    editing: Option<String>,
}

/// What a form submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Inserted(String),
    Updated(String),
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Key of the record being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Show another section, abandoning any edit in progress.
    pub fn switch_section(&mut self, section: Section) {
        self.section = section;
        self.editing = None;
    }

    pub fn begin_add(&mut self) {
        self.editing = None;
    }

    pub fn begin_edit(&mut self, key: impl Into<String>) {
        self.editing = Some(key.into());
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }
}

/// Save a submitted form for the current section.
///
/// While editing, the record replaces the one at the edited key; the key field
/// is taken from the edit session, never from the form. Otherwise the record
/// is inserted, which requires a key. The edit session ends only on success.
pub async fn submit<M: StorageMedium>(
    store: &RecordStore<M>,
    state: &mut AppState,
    mut record: Value,
) -> Result<Submitted> {
    let collection = state.section.collection();

    let outcome = match state.editing.as_deref() {
        Some(key) => {
            if let Some(fields) = record.as_object_mut() {
                fields.insert(
                    collection.key_field().to_string(),
                    Value::String(key.to_string()),
                );
            }
            store.update(collection, key, record).await?;
            Submitted::Updated(key.to_string())
        }
        None => Submitted::Inserted(store.insert(collection, record).await?),
    };

    state.editing = None;
    Ok(outcome)
}

/// Render a date the way the record lists show it: `d/m/yyyy`, blank when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%-d/%-m/%Y").to_string(),
        None => String::new(),
    }
}
