//! Upsert, get, list, soft delete, and count for entities.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use corral_core::errors::CorralResult;
use corral_core::models::{Entity, Scope};

use super::{decode_payload, encode_payload, parse_ts, ts};
use crate::filters::CompiledFilter;
use crate::to_storage_err;

const COLUMNS: &str =
    "kind, id, org, team, repo, host, payload, created_at, modified_at, deleted_at";

/// Raw row, decoded outside the rusqlite closure so JSON errors propagate.
struct EntityRow {
    kind: String,
    id: String,
    scope: Scope,
    payload: String,
    created_at: String,
    modified_at: String,
    deleted_at: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<EntityRow> {
    Ok(EntityRow {
        kind: row.get(0)?,
        id: row.get(1)?,
        scope: Scope::new(
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ),
        payload: row.get(6)?,
        created_at: row.get(7)?,
        modified_at: row.get(8)?,
        deleted_at: row.get(9)?,
    })
}

fn decode(row: EntityRow) -> CorralResult<Entity> {
    Ok(Entity {
        kind: row.kind,
        id: row.id,
        scope: row.scope,
        payload: decode_payload(&row.payload)?,
        created_at: parse_ts(&row.created_at)?,
        modified_at: parse_ts(&row.modified_at)?,
        deleted_at: row.deleted_at.as_deref().map(parse_ts).transpose()?,
    })
}

/// Insert or replace by `(kind, id)`.
///
/// The first `created_at` is kept across upserts. Saving a soft-deleted id
/// revives it. Returns the entity as stored.
pub fn upsert_entity(conn: &Connection, entity: &Entity, now: DateTime<Utc>) -> CorralResult<Entity> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("upsert_entity begin: {e}")))?;

    let existing_created: Option<String> = tx
        .query_row(
            "SELECT created_at FROM entities WHERE kind = ?1 AND id = ?2",
            params![entity.kind, entity.id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let created_at = match existing_created {
        Some(s) => parse_ts(&s)?,
        None => entity.created_at,
    };

    tx.execute(
        "INSERT INTO entities (kind, id, org, team, repo, host, payload, created_at, modified_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
         ON CONFLICT(kind, id) DO UPDATE SET
            org = excluded.org,
            team = excluded.team,
            repo = excluded.repo,
            host = excluded.host,
            payload = excluded.payload,
            modified_at = excluded.modified_at,
            deleted_at = NULL",
        params![
            entity.kind,
            entity.id,
            entity.scope.org,
            entity.scope.team,
            entity.scope.repo,
            entity.scope.host,
            encode_payload(&entity.payload)?,
            ts(created_at),
            ts(now),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("upsert_entity commit: {e}")))?;

    Ok(Entity {
        created_at,
        modified_at: now,
        deleted_at: None,
        ..entity.clone()
    })
}

/// Live entity by id. Soft-deleted rows read as absent.
pub fn get_entity(conn: &Connection, kind: &str, id: &str) -> CorralResult<Option<Entity>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM entities
                 WHERE kind = ?1 AND id = ?2 AND deleted_at IS NULL"
            ),
            params![kind, id],
            read_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(decode).transpose()
}

/// Live entities matching a compiled filter, oldest first.
pub fn list_entities(conn: &Connection, filter: &CompiledFilter) -> CorralResult<Vec<Entity>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM entities
             WHERE {} AND deleted_at IS NULL
             ORDER BY created_at, id",
            filter.sql
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(filter.params.iter()), read_row)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(decode(row.map_err(|e| to_storage_err(e.to_string()))?)?);
    }
    Ok(out)
}

/// Set `deleted_at`. Returns `false` when absent or already deleted.
pub fn soft_delete(conn: &Connection, kind: &str, id: &str, now: DateTime<Utc>) -> CorralResult<bool> {
    let changed = conn
        .execute(
            "UPDATE entities SET deleted_at = ?3
             WHERE kind = ?1 AND id = ?2 AND deleted_at IS NULL",
            params![kind, id, ts(now)],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed > 0)
}

pub fn count_entities(conn: &Connection, filter: &CompiledFilter) -> CorralResult<usize> {
    let n: i64 = conn
        .query_row(
            &format!(
                "SELECT COUNT(*) FROM entities WHERE {} AND deleted_at IS NULL",
                filter.sql
            ),
            params_from_iter(filter.params.iter()),
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}
