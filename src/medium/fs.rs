//! FsMedium - one directory per database, one JSON file per document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{MediumError, StorageMedium};

const EXTENSION: &str = "json";

/// Filesystem medium rooted at a data directory.
///
/// Layout: `<root>/<database>/<document>.json`. Writes go to a temporary file
/// that is synced and renamed over the target, so a crash mid-write leaves the
/// previous document intact.
#[derive(Debug, Clone)]
pub struct FsMedium {
    root: PathBuf,
}

impl FsMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_dir(&self, database: &str) -> PathBuf {
        self.root.join(database)
    }

    fn document_path(&self, database: &str, document: &str) -> PathBuf {
        self.database_dir(database)
            .join(format!("{}.{}", document, EXTENSION))
    }
}

impl StorageMedium for FsMedium {
    fn locate(&self, database: &str) -> String {
        let root = fs::canonicalize(&self.root)
            .or_else(|_| std::path::absolute(&self.root))
            .unwrap_or_else(|_| self.root.clone());
        format!("fs:{}", root.join(database).display())
    }

    fn read(&self, database: &str, document: &str) -> Result<Option<Vec<u8>>, MediumError> {
        match fs::read(self.document_path(database, document)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, database: &str, document: &str, bytes: &[u8]) -> Result<(), MediumError> {
        let dir = self.database_dir(database);
        fs::create_dir_all(&dir)?;

        let target = self.document_path(database, document);
        let staging = dir.join(format!(".{}.{}.tmp", document, EXTENSION));
        {
            let mut file = fs::File::create(&staging)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&staging, &target)?;
        Ok(())
    }

    fn destroy(&self, database: &str) -> Result<(), MediumError> {
        match fs::remove_dir_all(self.database_dir(database)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
