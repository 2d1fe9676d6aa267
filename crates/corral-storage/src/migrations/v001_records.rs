//! v001: entity and event tables keyed by kind, with scope columns.

use rusqlite::Connection;

use corral_core::errors::CorralResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CorralResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            kind        TEXT NOT NULL,
            id          TEXT NOT NULL,
            org         TEXT NOT NULL CHECK (length(trim(org)) > 0),
            team        TEXT NOT NULL CHECK (length(trim(team)) > 0),
            repo        TEXT NOT NULL CHECK (length(trim(repo)) > 0),
            host        TEXT NOT NULL CHECK (length(trim(host)) > 0),
            payload     TEXT NOT NULL DEFAULT '{}',
            created_at  TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            deleted_at  TEXT,
            PRIMARY KEY (kind, id)
        );

        CREATE INDEX IF NOT EXISTS idx_entities_live
            ON entities(kind, deleted_at);
        CREATE INDEX IF NOT EXISTS idx_entities_scope
            ON entities(kind, org, team, repo, host);

        CREATE TABLE IF NOT EXISTS events (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            kind        TEXT NOT NULL,
            entity_id   TEXT NOT NULL,
            org         TEXT NOT NULL CHECK (length(trim(org)) > 0),
            team        TEXT NOT NULL CHECK (length(trim(team)) > 0),
            repo        TEXT NOT NULL CHECK (length(trim(repo)) > 0),
            host        TEXT NOT NULL CHECK (length(trim(host)) > 0),
            payload     TEXT NOT NULL DEFAULT '{}',
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_entity
            ON events(kind, entity_id);
        CREATE INDEX IF NOT EXISTS idx_events_scope
            ON events(kind, org, team, repo, host);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
