//! Storage media - where a store's documents physically live.
//!
//! A database is a named set of documents (the schema plus one document per
//! collection). Media only move bytes; encoding and transactions belong to
//! the store.

mod fs;
mod memory;

use thiserror::Error;

pub use fs::FsMedium;
pub use memory::MemoryMedium;

/// Failure of the underlying storage medium.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediumError {
    /// Access refused (disabled or blocked storage, permissions).
    #[error("storage access denied: {0}")]
    Denied(String),
    /// Reading or writing failed (quota exceeded, device errors).
    #[error("storage I/O error: {0}")]
    Io(String),
    /// The stored bytes could not be decoded.
    #[error("corrupt document {document}: {reason}")]
    Corrupt { document: String, reason: String },
}

impl From<std::io::Error> for MediumError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => MediumError::Denied(err.to_string()),
            _ => MediumError::Io(err.to_string()),
        }
    }
}

/// Byte-level document storage backing a record store.
///
/// Media are cheap handles: clones address the same storage, and the store
/// moves a clone onto the blocking thread pool for every call.
pub trait StorageMedium: Clone + Send + Sync + 'static {
    /// Where `database` physically lives. Media that return equal locations
    /// reach the same documents, so stores opened on them share one instance.
    fn locate(&self, database: &str) -> String;

    /// Read a document. Returns None if it has never been written.
    fn read(&self, database: &str, document: &str) -> Result<Option<Vec<u8>>, MediumError>;

    /// Replace a document as a whole. Readers see either the old or the new bytes.
    fn write(&self, database: &str, document: &str, bytes: &[u8]) -> Result<(), MediumError>;

    /// Remove a database and all of its documents. Missing databases are not an error.
    fn destroy(&self, database: &str) -> Result<(), MediumError>;
}
