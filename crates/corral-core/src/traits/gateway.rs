use std::collections::HashMap;
use std::future::Future;

use crate::errors::CorralResult;
use crate::models::{Entity, Event};

/// Unordered `field = value` equality filters for `list`, `events`, and `count`.
pub type Filters = HashMap<String, serde_json::Value>;

/// Typed access to the primary operational record.
///
/// Reads never wait on the write lock. `save` and `append` are serialized
/// and, on success, emit a write-completed notification. A successful write
/// guarantees only that the primary record is durable; derived views catch
/// up later.
pub trait IGateway: Send + Sync {
    /// Live entity by id. Absent and soft-deleted ids both return `None`.
    fn get(&self, kind: &str, id: &str)
        -> impl Future<Output = CorralResult<Option<Entity>>> + Send;

    /// Live entities matching every filter.
    fn list(&self, kind: &str, filters: &Filters)
        -> impl Future<Output = CorralResult<Vec<Entity>>> + Send;

    /// Upsert by `(kind, id)`. Returns the id.
    fn save(&self, entity: Entity) -> impl Future<Output = CorralResult<String>> + Send;

    /// Soft delete. Returns `false` when the id was absent or already deleted.
    fn delete(&self, kind: &str, id: &str) -> impl Future<Output = CorralResult<bool>> + Send;

    /// Append an immutable event. Returns the event id.
    fn append(&self, event: Event) -> impl Future<Output = CorralResult<String>> + Send;

    /// Events of `kind` matching every filter, oldest first.
    fn events(&self, kind: &str, filters: &Filters)
        -> impl Future<Output = CorralResult<Vec<Event>>> + Send;

    /// Number of live entities (or events) of `kind` matching every filter.
    fn count(&self, kind: &str, filters: &Filters)
        -> impl Future<Output = CorralResult<usize>> + Send;
}
