//! Schema migrations, applied in order on the write connection at open.

mod v001_records;
mod v002_event_guards;

use rusqlite::{params, Connection};

use corral_core::errors::{CorralResult, StoreError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> CorralResult<()>;

const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[
    (1, "records", v001_records::migrate),
    (2, "event_guards", v002_event_guards::migrate),
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: u32 = 2;

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> CorralResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_version(conn)?;
    for (version, name, migrate) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration begin: {e}")))?;
        migrate(&tx).map_err(|e| StoreError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO schema_version (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![version, name, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| StoreError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        tx.commit().map_err(|e| StoreError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        tracing::info!(version, name, "applied migration");
    }
    current_version(conn)
}

/// Highest applied schema version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> CorralResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
