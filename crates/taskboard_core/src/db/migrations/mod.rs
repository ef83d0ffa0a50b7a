//! Schema steps for the key-value table.
//!
//! Step `n` in [`STEPS`] upgrades the schema to version `n + 1`. Pending
//! steps run in one transaction together with the `user_version` bump, so a
//! failing step leaves the stored version where it was.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;
use std::cmp::Ordering;

const STEPS: &[&str] = &[include_str!("0001_kv_entries.sql")];

/// Schema version produced by running every known step.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Version recorded in `PRAGMA user_version`; 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings the schema up to [`latest_version`].
///
/// # Errors
/// - `DbError::SchemaTooNew` when the database is ahead of this build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let latest = latest_version();

    match found.cmp(&latest) {
        Ordering::Greater => {
            return Err(DbError::SchemaTooNew {
                found,
                supported: latest,
            });
        }
        Ordering::Equal => {
            debug!("event=db_migrate module=db status=current version={found}");
            return Ok(());
        }
        Ordering::Less => {}
    }

    let tx = conn.transaction()?;
    for (version, sql) in (1u32..).zip(STEPS).skip(found as usize) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={latest}");
    Ok(())
}
