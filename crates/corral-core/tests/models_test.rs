use std::collections::HashSet;

use chrono::{Duration, Utc};
use corral_core::models::*;

fn scope() -> Scope {
    Scope::new("acme", "avalon", "herd", "mac-01")
}

#[test]
fn entity_builder_sets_payload_and_timestamps() {
    let e = Entity::new("ticket", "T-1", scope())
        .with("status", "in_progress")
        .with("priority", 2);
    assert_eq!(e.field_str("status"), Some("in_progress"));
    assert_eq!(e.payload["priority"], 2);
    assert_eq!(e.created_at, e.modified_at);
    assert!(!e.is_deleted());
}

#[test]
fn events_get_unique_ids() {
    let a = Event::new("ticket_event", "T-1", scope());
    let b = Event::new("ticket_event", "T-1", scope());
    assert_ne!(a.id, b.id);
}

#[test]
fn notifications_snapshot_the_record() {
    let e = Entity::new("ticket", "T-1", scope()).with("status", "blocked");
    let n = WriteNotification::saved(&e);
    assert_eq!(n.op, WriteOp::Save);
    assert_eq!(n.id, "T-1");
    assert_eq!(n.entity_id, "T-1");
    assert_eq!(n.payload["status"], "blocked");

    let ev = Event::new("ticket_event", "T-1", scope());
    let n = WriteNotification::appended(&ev);
    assert_eq!(n.op, WriteOp::Append);
    assert_eq!(n.id, ev.id);
    assert_eq!(n.entity_id, "T-1");
}

#[test]
fn address_renders_canonically() {
    let direct = Address::Direct {
        agent: "mason".into(),
        instance: Some("inst-1".into()),
        scope: Some("avalon".into()),
    };
    assert_eq!(direct.to_string(), "mason.inst-1@avalon");
    assert_eq!(direct.scope(), Some("avalon"));

    assert_eq!(Address::Anyone { scope: None }.to_string(), "@anyone");
    assert_eq!(
        Address::Everyone {
            scope: Some("avalon".into())
        }
        .to_string(),
        "@everyone@avalon"
    );
}

#[test]
fn message_expiry_uses_ttl() {
    let mut m = Message::new("a", "b", "hi", MessageKind::Inform, Priority::Normal);
    let ttl = Duration::hours(1);
    assert!(!m.is_expired(Utc::now(), ttl));
    m.sent_at = Utc::now() - Duration::minutes(61);
    assert!(m.is_expired(Utc::now(), ttl));
    assert_eq!(m.read_by, HashSet::new());
}

#[test]
fn instance_address_includes_scope_when_present() {
    let inst = AgentInstance::new("mason", "inst-1").in_scope("avalon");
    assert_eq!(inst.address(), "mason.inst-1@avalon");
    assert_eq!(AgentInstance::new("rook", "r1").address(), "rook.r1");
}

mod liveness_props {
    use chrono::Duration;
    use corral_core::config::PresenceConfig;
    use corral_core::models::Liveness;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn liveness_never_improves_with_age(a in 0i64..5_000, b in 0i64..5_000) {
            let cfg = PresenceConfig::default();
            let (young, old) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                Liveness::from_elapsed(Duration::seconds(young), &cfg)
                    <= Liveness::from_elapsed(Duration::seconds(old), &cfg)
            );
        }

        #[test]
        fn only_the_first_two_bands_are_live(secs in 0i64..5_000) {
            let cfg = PresenceConfig::default();
            let l = Liveness::from_elapsed(Duration::seconds(secs), &cfg);
            prop_assert_eq!(l.is_live(), (secs as u64) <= cfg.busy_secs);
        }
    }
}
