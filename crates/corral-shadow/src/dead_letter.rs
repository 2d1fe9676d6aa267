//! Bounded ring of dropped propagations, kept for inspection.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use corral_core::models::WriteNotification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    /// `kind/id` of the source record.
    pub key: String,
    pub attempts: u32,
    pub error: String,
    pub notification: WriteNotification,
    pub dropped_at: DateTime<Utc>,
}

/// Oldest entries are evicted once `capacity` is reached.
pub struct DeadLetterSink {
    entries: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
}

impl DeadLetterSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1_024))),
            capacity,
        }
    }

    pub fn push(&self, letter: DeadLetter) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(letter);
    }

    /// Copy of the retained letters, oldest first.
    pub fn snapshot(&self) -> Vec<DeadLetter> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::models::{Entity, Scope};

    fn letter(n: usize) -> DeadLetter {
        let e = Entity::new("ticket", format!("T-{n}"), Scope::new("a", "b", "c", "d"));
        DeadLetter {
            key: format!("ticket/T-{n}"),
            attempts: 3,
            error: "down".into(),
            notification: WriteNotification::saved(&e),
            dropped_at: Utc::now(),
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let sink = DeadLetterSink::new(2);
        sink.push(letter(1));
        sink.push(letter(2));
        sink.push(letter(3));
        let keys: Vec<_> = sink.snapshot().into_iter().map(|l| l.key).collect();
        assert_eq!(keys, vec!["ticket/T-2", "ticket/T-3"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let sink = DeadLetterSink::new(0);
        sink.push(letter(1));
        assert!(sink.is_empty());
    }
}
