use tracing::info;

use super::Schema;
use crate::error::{Result, StoreError};
use crate::record::Collection;

/// One schema upgrade step, taking a store from `version - 1` to `version`.
///
/// Steps must only add what is missing so that re-running them against an
/// already upgraded schema changes nothing.
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub apply: fn(&mut Schema),
}

/// Ordered by ascending version.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create Employee, Student and Room collections",
    apply: create_initial_collections,
}];

fn create_initial_collections(schema: &mut Schema) {
    for collection in Collection::ALL {
        schema.create_collection(collection.schema());
    }
}

/// Brings `schema` up to `target`, returning the versions of the migrations applied.
///
/// Versions without a migration step are accepted and only move the version
/// number. Asking for a version older than the stored one is an error.
pub fn upgrade(schema: &mut Schema, target: u32) -> Result<Vec<u32>> {
    if target == 0 {
        return Err(StoreError::StoreUnavailable(
            "schema version must be at least 1".into(),
        ));
    }
    if schema.version > target {
        return Err(StoreError::VersionTooNew {
            stored: schema.version,
            requested: target,
        });
    }

    let from = schema.version;
    let mut applied = Vec::new();
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > from && m.version <= target)
    {
        (migration.apply)(schema);
        schema.version = migration.version;
        info!(
            version = migration.version,
            description = migration.description,
            "applied schema migration"
        );
        applied.push(migration.version);
    }
    schema.version = target;

    Ok(applied)
}
