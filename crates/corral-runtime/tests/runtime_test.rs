//! End-to-end: gateway writes flow into the derived views, messages and
//! presence flow through checkin.

use std::time::Duration;

use chrono::Utc;
use corral_checkin::CheckinRequest;
use corral_core::config::CorralConfig;
use corral_core::errors::{BusError, CorralError};
use corral_core::models::{AgentInstance, Entity, Event, Liveness, MessageKind, Priority, Scope};
use corral_core::traits::{Filters, IGateway};
use corral_runtime::{CoordinationEngine, RuntimeOptions};
use corral_shadow::ShadowMapping;
use corral_storage::{KindRegistry, KindSpec};
use serde_json::{json, Value};
use test_fixtures::{fixture_path, MessagingScenario, ScopeFixture, SprintBoard, CUSTOM_MAPPING};

const SETTLE: Duration = Duration::from_secs(3);

fn scope_of(s: &ScopeFixture) -> Scope {
    Scope::new(&s.org, &s.team, &s.repo, &s.host)
}

async fn save_entities(engine: &CoordinationEngine, board: &SprintBoard) {
    let scope = scope_of(&board.scope);
    for e in &board.entities {
        let mut entity = Entity::new(&e.kind, &e.id, scope.clone());
        entity.payload = e.payload.clone();
        engine.save(entity).await.unwrap();
    }
}

async fn load_board(engine: &CoordinationEngine) {
    let board = SprintBoard::load();
    save_entities(engine, &board).await;
    let scope = scope_of(&board.scope);
    for e in &board.events {
        let mut event = Event::new(&e.kind, &e.entity_id, scope.clone());
        event.payload = e.payload.clone();
        engine.append(event).await.unwrap();
    }
    assert!(engine.settle(SETTLE).await, "shadow views did not settle");
}

fn filters(pairs: &[(&str, Value)]) -> Filters {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn parse_label<T: serde::de::DeserializeOwned>(label: &str) -> T {
    serde_json::from_value(Value::String(label.to_string())).unwrap()
}

#[tokio::test]
async fn sprint_board_reaches_every_view() {
    let dir = tempfile::tempdir().unwrap();
    let engine = CoordinationEngine::open(&dir.path().join("board.db")).unwrap();
    load_board(&engine).await;

    let snap = engine.metrics();
    assert_eq!(snap.writes_committed, 10);
    assert_eq!(snap.shadow_failures, 0);
    assert!(engine.dead_letters().is_empty());

    let mine = engine
        .list("ticket", &filters(&[("assignee", json!("mason"))]))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, "T-1");

    let t1_events = engine
        .events("ticket_event", &filters(&[("entity_id", json!("T-1"))]))
        .await
        .unwrap();
    assert_eq!(t1_events.len(), 1);

    let hits = engine.search("sqlite", 5);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source_id, "HDR-0042");

    let (nodes, edges) = engine.shadow_counts();
    assert!(nodes >= 8, "expected the board's nodes, got {nodes}");
    assert!(edges >= 7, "expected the board's edges, got {edges}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn board_reads_on_disk_do_not_wait_for_the_writer() {
    let dir = tempfile::tempdir().unwrap();
    let engine = CoordinationEngine::open(&dir.path().join("board.db")).unwrap();
    load_board(&engine).await;

    let holder = engine.storage().writer().clone();
    let hold = tokio::spawn(async move { holder.hold_for(Duration::from_millis(500)).await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    let read = tokio::time::timeout(Duration::from_millis(200), async {
        let mine = engine
            .list("ticket", &filters(&[("assignee", json!("mason"))]))
            .await
            .unwrap();
        let t7 = engine.get("ticket", "T-7").await.unwrap();
        (mine.len(), t7.is_some())
    })
    .await
    .expect("reads waited on the held writer");
    assert_eq!(read, (1, true));
    assert!(!hold.is_finished());
    hold.await.unwrap();
}

#[tokio::test]
async fn reloading_the_board_is_idempotent_in_the_graph() {
    let engine = CoordinationEngine::in_memory().unwrap();
    load_board(&engine).await;
    let first = engine.shadow_counts();

    save_entities(&engine, &SprintBoard::load()).await;
    assert!(engine.settle(SETTLE).await);
    assert_eq!(engine.shadow_counts(), first);
}

#[tokio::test]
async fn checkin_pane_reflects_the_board() {
    let engine = CoordinationEngine::in_memory().unwrap();
    load_board(&engine).await;

    let resp = engine
        .checkin(CheckinRequest::new("mason", "inst-1").in_scope("avalon").with_status("on T-1"))
        .await
        .unwrap();
    let pane = resp.context.expect("mason has assignments");
    let text = pane.render();
    assert!(text.contains("Ticket T-7"), "pane was:\n{text}");
    assert!(text.contains("PullRequest PR-12"), "pane was:\n{text}");
    assert!(pane.used_tokens <= pane.budget);
}

#[tokio::test]
async fn messaging_scenario_delivers_as_addressed() {
    let engine = CoordinationEngine::in_memory().unwrap();
    let scenario = MessagingScenario::load();

    for i in &scenario.instances {
        let mut inst = AgentInstance::new(&i.agent, &i.instance).in_scope(&i.scope);
        if i.mechanical {
            inst = inst.mechanical();
        }
        for scope in &i.leads {
            inst = inst.leading(scope);
        }
        engine.register(inst).unwrap();
        engine
            .checkin(CheckinRequest::new(&i.agent, &i.instance))
            .await
            .unwrap();
    }

    for m in &scenario.messages {
        let kind: MessageKind = parse_label(&m.kind);
        let priority: Priority = parse_label(&m.priority);
        engine.send_kind(&m.from, &m.to, &m.body, kind, priority).unwrap();
    }

    for id in &scenario.drain_order {
        let agent = scenario.agent_of(id).unwrap();
        let resp = engine.checkin(CheckinRequest::new(agent, id)).await.unwrap();
        assert_eq!(resp.messages.len(), scenario.expected[id], "deliveries for {id}");
    }
    assert_eq!(engine.hub().pending_count(), 0);
    assert_eq!(engine.metrics().messages_sent, 5);
}

#[tokio::test]
async fn soft_delete_hides_but_keeps_history() {
    let engine = CoordinationEngine::in_memory().unwrap();
    let scope = Scope::new("acme", "avalon", "herd", "mac-01");
    engine
        .save(Entity::new("ticket", "T-3", scope.clone()).with("status", "open"))
        .await
        .unwrap();
    engine
        .append(Event::new("ticket_event", "T-3", scope).with("event_type", "created"))
        .await
        .unwrap();

    assert!(engine.delete("ticket", "T-3").await.unwrap());
    assert!(engine.get("ticket", "T-3").await.unwrap().is_none());
    assert!(!engine.delete("ticket", "T-3").await.unwrap());
    assert_eq!(engine.count("ticket", &Filters::new()).await.unwrap(), 0);
    assert_eq!(engine.count("ticket_event", &Filters::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn file_backed_engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corral.db");
    let scope = Scope::new("acme", "avalon", "herd", "mac-01");

    {
        let engine = CoordinationEngine::open(&path).unwrap();
        engine
            .save(Entity::new("ticket", "T-1", scope.clone()).with("title", "persist me"))
            .await
            .unwrap();
        engine.send("steve", "mason", "lost on restart", Priority::Normal).unwrap();
        engine.shutdown();
    }

    let engine = CoordinationEngine::open(&path).unwrap();
    let t1 = engine.get("ticket", "T-1").await.unwrap().unwrap();
    assert_eq!(t1.field_str("title"), Some("persist me"));
    assert_eq!(engine.hub().pending_count(), 0);
}

#[tokio::test]
async fn custom_mapping_replaces_the_builtin() {
    let mapping = ShadowMapping::from_file(&fixture_path(CUSTOM_MAPPING)).unwrap();
    let engine = CoordinationEngine::start(RuntimeOptions::in_memory().with_mapping(mapping)).unwrap();
    let scope = Scope::new("acme", "avalon", "herd", "mac-01");

    engine
        .save(Entity::new("ticket", "T-1", scope.clone()).with("title", "x").with("assignee", "mason"))
        .await
        .unwrap();
    engine
        .save(Entity::new("decision", "HDR-1", scope).with("title", "unmapped here"))
        .await
        .unwrap();
    assert!(engine.settle(SETTLE).await);

    assert_eq!(engine.shadow_counts(), (2, 1));
    assert!(engine.search("unmapped", 5).is_empty());
}

#[tokio::test]
async fn liveness_is_derived_from_checkins() {
    let engine = CoordinationEngine::in_memory().unwrap();
    assert_eq!(engine.liveness("nobody"), None);
    engine
        .hub()
        .heartbeat("mason", "inst-1", None, "", Utc::now() - chrono::Duration::seconds(700))
        .unwrap();
    assert_eq!(engine.liveness("inst-1"), Some(Liveness::Unresponsive));
}

#[tokio::test]
async fn invalid_recipient_is_rejected_before_queueing() {
    let engine = CoordinationEngine::in_memory().unwrap();
    let err = engine.send("steve", "mason@ava lon", "hi", Priority::Normal).unwrap_err();
    assert!(matches!(err, CorralError::Bus(BusError::InvalidAddress { .. })));
    assert_eq!(engine.hub().pending_count(), 0);
    assert_eq!(engine.metrics().messages_sent, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_writer_surfaces_a_retryable_timeout() {
    let mut config = CorralConfig::default();
    config.serializer.write_timeout_ms = 50;
    let engine = CoordinationEngine::start(RuntimeOptions::in_memory().with_config(config)).unwrap();
    let scope = Scope::new("acme", "avalon", "herd", "mac-01");

    let holder = engine.storage().writer().clone();
    let hold = tokio::spawn(async move { holder.hold_for(Duration::from_millis(400)).await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    let err = engine
        .save(Entity::new("ticket", "T-5", scope.clone()).with("status", "todo"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(engine.metrics().write_timeouts, 1);

    hold.await.unwrap();
    engine
        .save(Entity::new("ticket", "T-5", scope).with("status", "todo"))
        .await
        .unwrap();
    assert_eq!(engine.metrics().writes_committed, 1);
}

#[tokio::test]
async fn options_resolve_from_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("from-file.db");
    let cfg = dir.path().join("corral.toml");
    std::fs::write(
        &cfg,
        format!(
            "[storage]\ndb_path = {:?}\n\n[checkin.tier_budgets]\nexecution = 50\n",
            db.display().to_string()
        ),
    )
    .unwrap();

    let engine = CoordinationEngine::start(RuntimeOptions::from_config_file(Some(&cfg)).unwrap()).unwrap();
    assert_eq!(engine.config().checkin.tier_budgets.execution, 50);
    assert_eq!(engine.config().checkin.tier_budgets.leader, 500);

    engine
        .save(Entity::new("ticket", "T-1", Scope::new("acme", "avalon", "herd", "mac-01")))
        .await
        .unwrap();
    assert!(db.exists());
}

#[tokio::test]
async fn custom_kinds_register_before_start() {
    let registry = KindRegistry::builder()
        .with_defaults()
        .register(KindSpec::entity("incident").required(["severity"]).filterable(["severity"]))
        .build();
    let engine = CoordinationEngine::start(RuntimeOptions::in_memory().with_registry(registry)).unwrap();
    let scope = Scope::new("acme", "avalon", "herd", "mac-01");

    engine
        .save(Entity::new("incident", "INC-1", scope.clone()).with("severity", "sev2"))
        .await
        .unwrap();
    let sev2 = engine
        .list("incident", &filters(&[("severity", json!("sev2"))]))
        .await
        .unwrap();
    assert_eq!(sev2.len(), 1);

    let missing = engine.save(Entity::new("incident", "INC-2", scope)).await.unwrap_err();
    assert!(!missing.is_retryable());

    // Unmapped in the shadow views, but still counted as propagated work.
    assert!(engine.settle(SETTLE).await);
    assert_eq!(engine.shadow_counts(), (0, 0));
}
