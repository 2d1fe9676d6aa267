//! PRAGMA configuration applied to every SQLite connection.
//!
//! The writer runs in WAL with NORMAL sync. Readers are query-only. Both
//! share the configured busy timeout.

use rusqlite::Connection;

use corral_core::errors::CorralResult;

use crate::to_storage_err;

/// Apply the writer pragmas.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> CorralResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Apply the reader pragmas.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> CorralResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA query_only = ON;
        PRAGMA busy_timeout = {busy_timeout_ms};
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
