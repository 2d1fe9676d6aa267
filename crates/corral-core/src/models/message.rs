//! In-memory messages exchanged between agents. Never persisted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery priority. Urgent messages sort first in a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

/// What the sender expects the recipient to do with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// An instruction to act.
    Directive,
    /// Information only.
    #[default]
    Inform,
    /// Something needs attention.
    Flag,
}

/// A single message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Sender address (e.g. `mason.inst-a3f7@avalon`).
    pub from: String,
    /// Recipient address as sent (e.g. `mason@avalon`, `@anyone`).
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub priority: Priority,
    pub sent_at: DateTime<Utc>,
    /// Instance ids that have already seen this message.
    #[serde(default)]
    pub read_by: HashSet<String>,
}

impl Message {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        body: impl Into<String>,
        kind: MessageKind,
        priority: Priority,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            from: from.into(),
            to: to.into(),
            body: body.into(),
            kind,
            priority,
            sent_at: Utc::now(),
            read_by: HashSet::new(),
        }
    }

    /// Whether the message has outlived `ttl` as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.sent_at >= ttl
    }
}
