//! In-process meaning store.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use corral_core::errors::ShadowError;
use corral_core::models::SemanticRecord;
use corral_core::traits::ISemanticStore;

/// [`ISemanticStore`] over a `DashMap`, keyed by record key.
#[derive(Default)]
pub struct InMemorySemanticStore {
    records: DashMap<String, SemanticRecord>,
}

impl InMemorySemanticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records derived from one source, across mapping versions.
    pub fn by_source(&self, kind: &str, id: &str) -> Vec<SemanticRecord> {
        self.records
            .iter()
            .filter(|r| r.source_kind == kind && r.source_id == id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Case-insensitive substring match over record text, newest first.
    pub fn search(&self, needle: &str, limit: usize) -> Vec<SemanticRecord> {
        let needle = needle.to_lowercase();
        let mut hits: Vec<SemanticRecord> = self
            .records
            .iter()
            .filter(|r| r.text.to_lowercase().contains(&needle))
            .map(|r| r.value().clone())
            .collect();
        hits.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        hits.truncate(limit);
        hits
    }
}

impl ISemanticStore for InMemorySemanticStore {
    fn upsert(&self, record: SemanticRecord) -> Result<(), ShadowError> {
        match self.records.entry(record.key.clone()) {
            Entry::Occupied(mut slot) => {
                if record.recorded_at >= slot.get().recorded_at {
                    slot.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<SemanticRecord> {
        self.records.get(key).map(|r| r.value().clone())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use corral_core::models::{Payload, Scope};

    fn record(text: &str, at: chrono::DateTime<Utc>) -> SemanticRecord {
        SemanticRecord {
            key: "k1".into(),
            source_kind: "ticket".into(),
            source_id: "T-1".into(),
            text: text.into(),
            metadata: Payload::new(),
            scope: Scope::new("acme", "avalon", "herd", "mac-01"),
            mapping_version: 1,
            recorded_at: at,
        }
    }

    #[test]
    fn late_upsert_keeps_the_newer_record() {
        let store = InMemorySemanticStore::new();
        let now = Utc::now();
        store.upsert(record("Fix login v2", now)).unwrap();
        store.upsert(record("Fix login", now - Duration::seconds(5))).unwrap();
        assert_eq!(store.get("k1").unwrap().text, "Fix login v2");

        store.upsert(record("Fix login v3", now + Duration::seconds(1))).unwrap();
        assert_eq!(store.get("k1").unwrap().text, "Fix login v3");
        assert_eq!(store.len(), 1);
    }
}
