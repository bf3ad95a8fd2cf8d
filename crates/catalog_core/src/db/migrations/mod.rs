//! Ordered schema scripts for the catalog store.
//!
//! The schema version lives in `PRAGMA user_version`. All pending scripts
//! run inside one IMMEDIATE transaction, so two processes opening a fresh
//! file at the same time serialize and only the first does any work.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// `(schema version, script)`, strictly increasing.
const SCRIPTS: &[(u32, &str)] = &[
    (1, include_str!("0001_catalog.sql")),
    (2, include_str!("0002_users.sql")),
];

/// Schema version produced by this build.
pub fn latest_version() -> u32 {
    SCRIPTS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this build.
/// - `Migration` naming the first script that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let target = latest_version();
    if is_current(schema_version(conn)?, target)? {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let found = schema_version(&tx)?;
    if is_current(found, target)? {
        return Ok(());
    }

    for (version, script) in SCRIPTS.iter().filter(|(version, _)| *version > found) {
        tx.execute_batch(script)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration {
                version: *version,
                source,
            })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={target}");
    Ok(())
}

fn is_current(found: u32, target: u32) -> DbResult<bool> {
    if found > target {
        return Err(DbError::SchemaTooNew {
            found,
            supported: target,
        });
    }
    Ok(found == target)
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
