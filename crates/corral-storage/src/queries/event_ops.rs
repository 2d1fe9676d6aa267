//! Append, list, and count for events.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use corral_core::errors::{CorralResult, StoreError};
use corral_core::models::{Event, Scope};

use super::{decode_payload, encode_payload, parse_ts, ts};
use crate::filters::CompiledFilter;
use crate::to_storage_err;

const COLUMNS: &str = "id, kind, entity_id, org, team, repo, host, payload, created_at";

struct EventRow {
    id: String,
    kind: String,
    entity_id: String,
    scope: Scope,
    payload: String,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        entity_id: row.get(2)?,
        scope: Scope::new(
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ),
        payload: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn decode(row: EventRow) -> CorralResult<Event> {
    Ok(Event {
        id: row.id,
        kind: row.kind,
        entity_id: row.entity_id,
        scope: row.scope,
        payload: decode_payload(&row.payload)?,
        created_at: parse_ts(&row.created_at)?,
    })
}

/// Append an event. An id that was already appended is rejected.
pub fn insert_event(conn: &Connection, event: &Event) -> CorralResult<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT seq FROM events WHERE id = ?1", params![event.id], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    if exists.is_some() {
        return Err(StoreError::InvalidRecord {
            kind: event.kind.clone(),
            id: event.id.clone(),
            reason: "event id already appended; events are immutable".to_string(),
        }
        .into());
    }

    conn.execute(
        "INSERT INTO events (id, kind, entity_id, org, team, repo, host, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            event.id,
            event.kind,
            event.entity_id,
            event.scope.org,
            event.scope.team,
            event.scope.repo,
            event.scope.host,
            encode_payload(&event.payload)?,
            ts(event.created_at),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Events matching a compiled filter, in append order.
pub fn list_events(conn: &Connection, filter: &CompiledFilter) -> CorralResult<Vec<Event>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLUMNS} FROM events WHERE {} ORDER BY seq",
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

pub fn count_events(conn: &Connection, filter: &CompiledFilter) -> CorralResult<usize> {
    let n: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM events WHERE {}", filter.sql),
            params_from_iter(filter.params.iter()),
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n as usize)
}
