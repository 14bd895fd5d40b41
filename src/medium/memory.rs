//! MemoryMedium - HashMap-backed medium for tests and throwaway stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::{MediumError, StorageMedium};

#[derive(Default)]
struct Shared {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    denied: AtomicBool,
    failing_writes: AtomicBool,
}

/// In-memory medium backed by a HashMap.
///
/// Storage key is `"database/document"`. Clone-friendly via Arc; clones share
/// documents, so reopening a store on a clone sees earlier writes.
#[derive(Clone, Default)]
pub struct MemoryMedium {
    shared: Arc<Shared>,
}

impl MemoryMedium {
    /// Create a new empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every access, like a browser with storage disabled.
    pub fn set_denied(&self, denied: bool) {
        self.shared.denied.store(denied, Ordering::SeqCst);
    }

    /// Fail writes with an I/O error (e.g. quota exceeded) while reads keep working.
    pub fn set_failing_writes(&self, failing: bool) {
        self.shared.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Names of the documents stored for `database`.
    pub fn documents(&self, database: &str) -> Vec<String> {
        let prefix = format!("{}/", database);
        let documents = match self.shared.documents.read() {
            Ok(documents) => documents,
            Err(_) => return Vec::new(),
        };
        let mut names: Vec<String> = documents
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn make_key(database: &str, document: &str) -> String {
        format!("{}/{}", database, document)
    }

    fn check_access(&self) -> Result<(), MediumError> {
        if self.shared.denied.load(Ordering::SeqCst) {
            return Err(MediumError::Denied("memory medium is disabled".into()));
        }
        Ok(())
    }
}

impl StorageMedium for MemoryMedium {
    fn locate(&self, database: &str) -> String {
        format!("memory:{:p}/{}", Arc::as_ptr(&self.shared), database)
    }

    fn read(&self, database: &str, document: &str) -> Result<Option<Vec<u8>>, MediumError> {
        self.check_access()?;
        let documents = self
            .shared
            .documents
            .read()
            .map_err(|_| MediumError::Io("lock poisoned".into()))?;
        Ok(documents.get(&Self::make_key(database, document)).cloned())
    }

    fn write(&self, database: &str, document: &str, bytes: &[u8]) -> Result<(), MediumError> {
        self.check_access()?;
        if self.shared.failing_writes.load(Ordering::SeqCst) {
            return Err(MediumError::Io("quota exceeded".into()));
        }
        let mut documents = self
            .shared
            .documents
            .write()
            .map_err(|_| MediumError::Io("lock poisoned".into()))?;
        documents.insert(Self::make_key(database, document), bytes.to_vec());
        Ok(())
    }

    fn destroy(&self, database: &str) -> Result<(), MediumError> {
        self.check_access()?;
        let prefix = format!("{}/", database);
        let mut documents = self
            .shared
            .documents
            .write()
            .map_err(|_| MediumError::Io("lock poisoned".into()))?;
        documents.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
