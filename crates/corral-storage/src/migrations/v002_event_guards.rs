//! v002: reject UPDATE and DELETE on the append-only event table.

use rusqlite::Connection;

use corral_core::errors::CorralResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CorralResult<()> {
    conn.execute_batch(
        "
        CREATE TRIGGER IF NOT EXISTS events_no_update
        BEFORE UPDATE ON events
        BEGIN
            SELECT RAISE(ABORT, 'events are append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS events_no_delete
        BEFORE DELETE ON events
        BEGIN
            SELECT RAISE(ABORT, 'events are append-only');
        END;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
