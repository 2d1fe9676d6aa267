//! Coordination counters.
//!
//! [`CoordinationMetrics`] is shared via `Arc` by every component and
//! only ever incremented. [`MetricsSnapshot`] is the serializable view.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lock-free counters for every coordination path.
#[derive(Debug, Default)]
pub struct CoordinationMetrics {
    writes_committed: AtomicU64,
    write_timeouts: AtomicU64,
    shadow_propagated: AtomicU64,
    shadow_retries: AtomicU64,
    shadow_failures: AtomicU64,
    messages_sent: AtomicU64,
    messages_delivered: AtomicU64,
    messages_pushed: AtomicU64,
    messages_pruned: AtomicU64,
    checkins: AtomicU64,
    checkin_rejections: AtomicU64,
    pane_timeouts: AtomicU64,
}

/// Point-in-time copy of [`CoordinationMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub writes_committed: u64,
    pub write_timeouts: u64,
    pub shadow_propagated: u64,
    pub shadow_retries: u64,
    pub shadow_failures: u64,
    pub messages_sent: u64,
    pub messages_delivered: u64,
    pub messages_pushed: u64,
    pub messages_pruned: u64,
    pub checkins: u64,
    pub checkin_rejections: u64,
    pub pane_timeouts: u64,
    pub taken_at: DateTime<Utc>,
}

fn bump(counter: &AtomicU64, n: u64) {
    counter.fetch_add(n, Ordering::Relaxed);
}

impl CoordinationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_write(&self) {
        bump(&self.writes_committed, 1);
    }

    pub fn record_write_timeout(&self) {
        bump(&self.write_timeouts, 1);
    }

    pub fn record_propagated(&self) {
        bump(&self.shadow_propagated, 1);
    }

    pub fn record_shadow_retry(&self) {
        bump(&self.shadow_retries, 1);
    }

    pub fn record_shadow_failure(&self) {
        bump(&self.shadow_failures, 1);
    }

    pub fn record_sent(&self) {
        bump(&self.messages_sent, 1);
    }

    pub fn record_delivered(&self, n: usize) {
        bump(&self.messages_delivered, n as u64);
    }

    pub fn record_pushed(&self) {
        bump(&self.messages_pushed, 1);
    }

    pub fn record_pruned(&self, n: usize) {
        bump(&self.messages_pruned, n as u64);
    }

    pub fn record_checkin(&self) {
        bump(&self.checkins, 1);
    }

    pub fn record_checkin_rejection(&self) {
        bump(&self.checkin_rejections, 1);
    }

    pub fn record_pane_timeout(&self) {
        bump(&self.pane_timeouts, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            writes_committed: get(&self.writes_committed),
            write_timeouts: get(&self.write_timeouts),
            shadow_propagated: get(&self.shadow_propagated),
            shadow_retries: get(&self.shadow_retries),
            shadow_failures: get(&self.shadow_failures),
            messages_sent: get(&self.messages_sent),
            messages_delivered: get(&self.messages_delivered),
            messages_pushed: get(&self.messages_pushed),
            messages_pruned: get(&self.messages_pruned),
            checkins: get(&self.checkins),
            checkin_rejections: get(&self.checkin_rejections),
            pane_timeouts: get(&self.pane_timeouts),
            taken_at: Utc::now(),
        }
    }
}
