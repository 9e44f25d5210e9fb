//! Ordered schema steps for the shell database.
//!
//! # Invariants
//! - Versions start at 1 and increase by one per step.
//! - `PRAGMA user_version` always equals the last committed step.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "kv_entries",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "personal_info",
        sql: include_str!("0002_personal_info.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Versions that still have to run on a database at `current`.
pub fn pending_versions(current: u32) -> Vec<u32> {
    MIGRATIONS
        .iter()
        .map(|migration| migration.version)
        .filter(|version| *version > current)
        .collect()
}

/// Brings the schema up to [`latest_version`] inside one transaction.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is ahead of this build.
/// - `Migration` naming the first step that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }
    let pending = pending_versions(from);
    if pending.is_empty() {
        return Ok(());
    }
    info!("event=db_migrate module=db status=start from={from} pending={pending:?}");

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| pending.contains(&migration.version))
    {
        let step = format!(
            "{}\nPRAGMA user_version = {};",
            migration.sql, migration.version
        );
        tx.execute_batch(&step).map_err(|source| DbError::Migration {
            version: migration.version,
            source,
        })?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
