use std::sync::Arc;

use corral_observability::{events, init_tracing_with_filter, CoordinationMetrics};

#[test]
fn counters_accumulate_across_threads() {
    let metrics = Arc::new(CoordinationMetrics::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let m = Arc::clone(&metrics);
            std::thread::spawn(move || {
                for _ in 0..250 {
                    m.record_write();
                }
                m.record_delivered(3);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let snap = metrics.snapshot();
    assert_eq!(snap.writes_committed, 1_000);
    assert_eq!(snap.messages_delivered, 12);
    assert_eq!(snap.shadow_failures, 0);
}

#[test]
fn snapshot_serializes_every_counter() {
    let metrics = CoordinationMetrics::new();
    metrics.record_shadow_failure();
    metrics.record_pane_timeout();
    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["shadow_failures"], 1);
    assert_eq!(json["pane_timeouts"], 1);
    assert!(json.get("taken_at").is_some());
}

#[test]
fn events_emit_without_a_subscriber_and_with_one() {
    events::write_committed("ticket", "T-1", "save");
    init_tracing_with_filter("debug");
    init_tracing_with_filter("debug");
    events::shadow_dropped("Ticket:T-1", 3, "graph unavailable");
    events::presence_transition("inst-1", "active", "deregistered");
}
