//! Shadow propagation: idempotence, retries, containment of failures.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use corral_core::errors::ShadowError;
use corral_core::models::{Entity, Event, Scope, SemanticRecord, WriteNotification};
use corral_core::traits::{IGateway, ISemanticStore, IStructuralStore};
use corral_observability::CoordinationMetrics;
use corral_shadow::{
    DeadLetterSink, GraphStore, InMemorySemanticStore, PropagationOutcome, RetryPolicy,
    ShadowMapping, ShadowPropagator,
};
use corral_storage::StorageEngine;
use serde_json::json;

fn scope() -> Scope {
    Scope::new("acme", "avalon", "herd", "mac-01")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

/// Semantic store that fails its first `failures` upserts.
struct FlakySemanticStore {
    failures: u32,
    calls: AtomicU32,
    inner: InMemorySemanticStore,
}

impl FlakySemanticStore {
    fn failing(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            inner: InMemorySemanticStore::new(),
        }
    }
}

impl ISemanticStore for FlakySemanticStore {
    fn upsert(&self, record: SemanticRecord) -> Result<(), ShadowError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(ShadowError::SemanticWrite {
                key: record.key,
                reason: "index offline".into(),
            });
        }
        self.inner.upsert(record)
    }

    fn get(&self, key: &str) -> Option<SemanticRecord> {
        self.inner.get(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

struct Harness {
    propagator: Arc<ShadowPropagator>,
    graph: Arc<GraphStore>,
    metrics: Arc<CoordinationMetrics>,
}

fn harness(semantic: Arc<dyn ISemanticStore>) -> Harness {
    let graph = Arc::new(GraphStore::new());
    let metrics = Arc::new(CoordinationMetrics::new());
    let propagator = Arc::new(ShadowPropagator::new(
        ShadowMapping::builtin().unwrap(),
        semantic,
        graph.clone(),
        fast_retry(),
        Arc::new(DeadLetterSink::new(8)),
        metrics.clone(),
    ));
    Harness {
        propagator,
        graph,
        metrics,
    }
}

fn blocked_ticket() -> Entity {
    Entity::new("ticket", "T-1", scope())
        .with("title", "Fix login")
        .with("status", "blocked")
        .with("assignee", "mason")
        .with("blocked_by", json!(["T-7"]))
}

#[tokio::test]
async fn repeated_propagation_creates_no_duplicates() {
    let semantic = Arc::new(InMemorySemanticStore::new());
    let h = harness(semantic.clone());
    let n = WriteNotification::saved(&blocked_ticket());

    for _ in 0..3 {
        let outcome = h.propagator.dispatch(n.clone()).await.unwrap();
        assert_eq!(outcome, PropagationOutcome::Applied { attempts: 1 });
    }

    // Ticket:T-1, Agent:mason, Ticket:T-7
    assert_eq!(h.graph.node_count(), 3);
    assert_eq!(h.graph.edge_count(), 2);
    assert_eq!(semantic.len(), 1);
    assert_eq!(semantic.by_source("ticket", "T-1").len(), 1);
    assert!(semantic.by_source("ticket", "T-7").is_empty());
    assert_eq!(h.metrics.snapshot().shadow_propagated, 3);
}

#[tokio::test]
async fn event_replay_is_idempotent_by_event_id() {
    let h = harness(Arc::new(InMemorySemanticStore::new()));
    let ev = Event::new("ticket_event", "T-1", scope())
        .with("event_type", "transition")
        .with("note", "waiting on auth")
        .with("blocked_by", "T-9");
    let n = WriteNotification::appended(&ev);

    h.propagator.propagate(n.clone()).await;
    h.propagator.propagate(n).await;
    assert_eq!(h.graph.edge_count(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let h = harness(Arc::new(FlakySemanticStore::failing(2)));
    let outcome = h
        .propagator
        .propagate(WriteNotification::saved(&blocked_ticket()))
        .await;
    assert_eq!(outcome, PropagationOutcome::Applied { attempts: 3 });

    let snap = h.metrics.snapshot();
    assert_eq!(snap.shadow_retries, 2);
    assert_eq!(snap.shadow_failures, 0);
    assert!(h.propagator.dead_letters().is_empty());
}

#[tokio::test]
async fn exhausted_retries_are_dead_lettered_not_raised() {
    let h = harness(Arc::new(FlakySemanticStore::failing(u32::MAX)));
    let outcome = h
        .propagator
        .propagate(WriteNotification::saved(&blocked_ticket()))
        .await;
    assert_eq!(outcome, PropagationOutcome::Dropped { attempts: 3 });

    assert_eq!(h.metrics.snapshot().shadow_failures, 1);
    let letters = h.propagator.dead_letters().snapshot();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].key, "ticket/T-1");
    assert!(letters[0].error.contains("index offline"));
}

#[tokio::test]
async fn reassignment_retracts_the_old_edge() {
    let h = harness(Arc::new(InMemorySemanticStore::new()));
    let first = Entity::new("ticket", "T-2", scope()).with("assignee", "mason");
    let second = Entity::new("ticket", "T-2", scope()).with("assignee", "fresco");

    h.propagator.propagate(WriteNotification::saved(&first)).await;
    h.propagator.propagate(WriteNotification::saved(&second)).await;

    let edges = h.graph.edges_of("Ticket:T-2");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to, "Agent:fresco");
}

#[tokio::test]
async fn late_older_save_does_not_roll_back_the_views() {
    let semantic = Arc::new(InMemorySemanticStore::new());
    let h = harness(semantic.clone());
    let newer = Entity::new("ticket", "T-3", scope())
        .with("title", "Rotate keys (rescoped)")
        .with("assignee", "fresco");
    let mut older = Entity::new("ticket", "T-3", scope())
        .with("title", "Rotate keys")
        .with("assignee", "mason");
    older.modified_at = newer.modified_at - chrono::Duration::seconds(5);

    let first = h.propagator.propagate(WriteNotification::saved(&newer)).await;
    assert_eq!(first, PropagationOutcome::Applied { attempts: 1 });
    let late = h.propagator.propagate(WriteNotification::saved(&older)).await;
    assert_eq!(late, PropagationOutcome::Superseded);

    let targets: Vec<String> = h
        .graph
        .edges_of("Ticket:T-3")
        .into_iter()
        .map(|e| e.to)
        .collect();
    assert_eq!(targets, vec!["Agent:fresco".to_string()]);
    let records = semantic.by_source("ticket", "T-3");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "Rotate keys (rescoped)");

    // A genuinely later save still lands.
    let mut latest = Entity::new("ticket", "T-3", scope()).with("assignee", "mason");
    latest.modified_at = newer.modified_at + chrono::Duration::seconds(1);
    let outcome = h.propagator.propagate(WriteNotification::saved(&latest)).await;
    assert_eq!(outcome, PropagationOutcome::Applied { attempts: 1 });
    assert_eq!(h.graph.edges_of("Ticket:T-3")[0].to, "Agent:mason");
}

#[tokio::test]
async fn unmapped_kinds_are_skipped() {
    let h = harness(Arc::new(InMemorySemanticStore::new()));
    let ev = Event::new("token_event", "mason", scope()).with("event_type", "usage");
    let outcome = h.propagator.propagate(WriteNotification::appended(&ev)).await;
    assert_eq!(outcome, PropagationOutcome::Skipped);
    assert_eq!(h.graph.node_count(), 0);
}

#[tokio::test]
async fn primary_write_succeeds_even_when_shadow_stores_fail() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let h = harness(Arc::new(FlakySemanticStore::failing(u32::MAX)));
    let task = h.propagator.clone().spawn(engine.subscribe());

    let id = engine.save(blocked_ticket()).await.unwrap();
    assert_eq!(id, "T-1");
    assert!(engine.get("ticket", "T-1").await.unwrap().is_some());

    assert!(h.propagator.wait_for(1, Duration::from_secs(2)).await);
    assert_eq!(h.metrics.snapshot().shadow_failures, 1);

    drop(engine);
    task.await.unwrap();
}

#[tokio::test]
async fn committed_writes_reach_the_graph() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let h = harness(Arc::new(InMemorySemanticStore::new()));
    h.propagator.clone().spawn(engine.subscribe());

    engine.save(blocked_ticket()).await.unwrap();
    engine
        .save(
            Entity::new("decision", "HDR-0042", scope())
                .with("title", "Use SQLite for the primary store")
                .with("decision_maker", "steve")
                .with("ticket_id", "T-1"),
        )
        .await
        .unwrap();

    assert!(h.propagator.wait_for(2, Duration::from_secs(2)).await);
    let node = h.graph.node("Decision:HDR-0042").expect("decision node");
    assert!(node.summary.contains("Use SQLite"));
    assert!(h.graph.node("Agent:steve").is_some());
}

#[test]
fn custom_mapping_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.toml");
    std::fs::write(
        &path,
        r#"
version = 7

[kinds.incident.node]
label = "Incident"
summary = ["severity"]
"#,
    )
    .unwrap();
    let mapping = ShadowMapping::load(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(mapping.version, 7);
    assert!(mapping.get("incident").is_some());
    assert!(mapping.get("ticket").is_none());

    assert!(ShadowMapping::load(Some("/definitely/not/here.toml")).is_err());
}
