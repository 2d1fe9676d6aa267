//! SQL for the entity and event tables.

pub mod entity_ops;
pub mod event_ops;

use chrono::{DateTime, SecondsFormat, Utc};

use corral_core::errors::CorralResult;
use corral_core::models::Payload;

use crate::to_storage_err;

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(s: &str) -> CorralResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("bad timestamp '{s}': {e}")))
}

pub(crate) fn encode_payload(payload: &Payload) -> CorralResult<String> {
    Ok(serde_json::to_string(payload)?)
}

pub(crate) fn decode_payload(s: &str) -> CorralResult<Payload> {
    Ok(serde_json::from_str(s)?)
}
