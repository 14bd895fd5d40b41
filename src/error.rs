use thiserror::Error;

use crate::medium::MediumError;

/// Errors reported by record store operations.
///
/// Every error reaches the immediate caller. The store never retries; a failed
/// operation leaves the collection exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage medium cannot be opened or used (denied, I/O failure,
    /// corrupt contents, or a handle invalidated by `reset`).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The stored schema is newer than the version the caller asked for.
    #[error("store version {stored} is newer than requested version {requested}")]
    VersionTooNew { stored: u32, requested: u32 },

    #[error("duplicate key {collection}:{key}")]
    DuplicateKey { collection: String, key: String },

    #[error("record not found: {collection}:{key}")]
    NotFound { collection: String, key: String },

    #[error("invalid {collection} record: {reason}")]
    InvalidRecord { collection: String, reason: String },

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("unknown index {index} on {collection}")]
    UnknownIndex { collection: String, index: String },

    /// A record could not be converted to or from its typed form.
    #[error("record serialization error: {0}")]
    Serde(String),
}

impl StoreError {
    /// True for failures of the storage medium itself rather than of the
    /// request. Callers that want a retry policy key it off this.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::StoreUnavailable(_) | StoreError::VersionTooNew { .. }
        )
    }

    pub(crate) fn invalid(collection: &str, reason: impl Into<String>) -> Self {
        StoreError::InvalidRecord {
            collection: collection.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(collection: &str, key: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<MediumError> for StoreError {
    fn from(err: MediumError) -> Self {
        StoreError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
