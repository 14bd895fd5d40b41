// Lets `#[derive(Record)]` refer to `campus_records::Record` from inside this crate.
extern crate self as campus_records;

pub mod app;
mod config;
mod error;
pub mod medium;
mod models;
mod record;
pub mod schema;
mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use medium::{FsMedium, MediumError, MemoryMedium, StorageMedium};
pub use models::{Employee, MaritalStatus, Room, Student};
pub use record::{Collection, Record};
pub use schema::{CollectionSchema, IndexSchema, Schema};
pub use store::{
    ChangeEvent, ChangeKind, RecordRepository, RecordStore, DEFAULT_NAME, RESET_EVENT,
    SCHEMA_VERSION,
};

// Re-export the derive macro alongside the trait it implements
pub use campus_records_macros::Record;
