//! Store configuration, read from the environment.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{DEFAULT_NAME, SCHEMA_VERSION};

pub const ENV_DB_NAME: &str = "CAMPUS_RECORDS_DB";
pub const ENV_DB_VERSION: &str = "CAMPUS_RECORDS_VERSION";
pub const ENV_DATA_DIR: &str = "CAMPUS_RECORDS_DIR";

/// Which database to open and where it lives.
///
/// Without a `data_dir` the store is kept in memory and lost on exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub name: String,
    pub version: u32,
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            version: SCHEMA_VERSION,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source; unset or blank values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let version = match value(ENV_DB_VERSION) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(version) if version > 0 => version,
                _ => {
                    warn!(
                        variable = ENV_DB_VERSION,
                        value = %raw,
                        "invalid schema version, using {}",
                        defaults.version
                    );
                    defaults.version
                }
            },
            None => defaults.version,
        };

        Self {
            name: value(ENV_DB_NAME).unwrap_or(defaults.name),
            version,
            data_dir: value(ENV_DATA_DIR).map(PathBuf::from),
        }
    }
}
