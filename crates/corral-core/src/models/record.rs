//! Entities (mutable, soft-deletable) and Events (immutable, append-only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scope::Scope;

/// Free-form record payload: a JSON object of field name to value.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Whether a kind stores mutable entities or append-only events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordClass {
    Entity,
    Event,
}

impl RecordClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordClass::Entity => "entity",
            RecordClass::Event => "event",
        }
    }
}

/// A mutable, identified record. Upserted by `(kind, id)` and never
/// physically removed; `delete` only sets `deleted_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub id: String,
    pub scope: Scope,
    #[serde(default)]
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// New entity with an empty payload, stamped now.
    pub fn new(kind: impl Into<String>, id: impl Into<String>, scope: Scope) -> Self {
        let now = Utc::now();
        Self {
            kind: kind.into(),
            id: id.into(),
            scope,
            payload: Payload::new(),
            created_at: now,
            modified_at: now,
            deleted_at: None,
        }
    }

    /// Builder-style payload field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(field.into(), value.into());
        self
    }

    /// String value of a payload field, if present and a string.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(|v| v.as_str())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// An immutable fact about an entity. Appended once; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable event identifier, used to key shadow records.
    pub id: String,
    pub kind: String,
    pub entity_id: String,
    pub scope: Scope,
    #[serde(default)]
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// New event with a fresh UUID, stamped now.
    pub fn new(kind: impl Into<String>, entity_id: impl Into<String>, scope: Scope) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            entity_id: entity_id.into(),
            scope,
            payload: Payload::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(field.into(), value.into());
        self
    }
}

/// Which mutation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Save,
    Append,
}

/// Emitted by the gateway after a `save` or `append` commits.
///
/// Carries a snapshot of the record so consumers never read back from the
/// primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteNotification {
    pub op: WriteOp,
    pub kind: String,
    /// Entity id for saves, event id for appends.
    pub id: String,
    /// For events, the entity the event is about. Equal to `id` for saves.
    pub entity_id: String,
    pub scope: Scope,
    pub payload: Payload,
    pub committed_at: DateTime<Utc>,
}

impl WriteNotification {
    pub fn saved(entity: &Entity) -> Self {
        Self {
            op: WriteOp::Save,
            kind: entity.kind.clone(),
            id: entity.id.clone(),
            entity_id: entity.id.clone(),
            scope: entity.scope.clone(),
            payload: entity.payload.clone(),
            committed_at: entity.modified_at,
        }
    }

    pub fn appended(event: &Event) -> Self {
        Self {
            op: WriteOp::Append,
            kind: event.kind.clone(),
            id: event.id.clone(),
            entity_id: event.entity_id.clone(),
            scope: event.scope.clone(),
            payload: event.payload.clone(),
            committed_at: event.created_at,
        }
    }
}
