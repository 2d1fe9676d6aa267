use std::collections::HashMap;

use corral_core::config::*;
use corral_core::errors::ConfigError;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = CorralConfig::from_toml("").unwrap();

    assert_eq!(config.storage.db_path, "corral.db");
    assert_eq!(config.storage.read_pool_size, 4);
    assert_eq!(config.serializer.write_timeout_ms, 5_000);

    assert_eq!(config.shadow.max_attempts, 3);
    assert!(config.shadow.mapping_path.is_none());

    assert_eq!(config.bus.message_ttl_secs, 3_600);
    assert!(config.bus.mechanical_agents.is_empty());

    assert_eq!(config.presence.active_secs, 120);
    assert_eq!(config.presence.busy_secs, 300);
    assert_eq!(config.presence.stale_secs, 600);

    assert_eq!(config.checkin.tier_budgets.mechanical, 0);
    assert_eq!(config.checkin.tier_budgets.execution, 200);
    assert_eq!(config.checkin.tier_budgets.senior, 300);
    assert_eq!(config.checkin.tier_budgets.leader, 500);
    assert_eq!(config.checkin.hop_radius, 2);
    assert_eq!(config.checkin.pane_timeout_ms, 2_000);

    assert_eq!(config.observability.log_level, "info");
    config.validate().unwrap();
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[storage]
db_path = "/var/lib/corral/ops.db"

[bus]
message_ttl_secs = 600
mechanical_agents = ["rook", "vigil"]
leader_agents = ["steve"]

[checkin.tier_budgets]
leader = 800
"#;
    let config = CorralConfig::from_toml(toml).unwrap();
    assert_eq!(config.storage.db_path, "/var/lib/corral/ops.db");
    assert_eq!(config.storage.read_pool_size, 4);
    assert_eq!(config.bus.message_ttl_secs, 600);
    assert!(config.bus.is_mechanical("rook"));
    assert!(!config.bus.is_mechanical("mason"));
    assert!(config.bus.is_leader("steve"));
    assert_eq!(config.checkin.tier_budgets.leader, 800);
    assert_eq!(config.checkin.tier_budgets.execution, 200);
}

#[test]
fn config_env_overrides_win_over_file_values() {
    let mut config = CorralConfig::from_toml("[serializer]\nwrite_timeout_ms = 100\n").unwrap();
    let env: HashMap<&str, &str> = HashMap::from([
        ("CORRAL_WRITE_TIMEOUT_MS", "250"),
        ("CORRAL_DB_PATH", "/tmp/env.db"),
        ("CORRAL_MESSAGE_TTL_SECS", "not-a-number"),
    ]);
    config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(config.serializer.write_timeout_ms, 250);
    assert_eq!(config.storage.db_path, "/tmp/env.db");
    // Unparseable values are ignored.
    assert_eq!(config.bus.message_ttl_secs, 3_600);
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corral.toml");
    std::fs::write(&path, "[presence]\nactive_secs = 60\n").unwrap();

    let config = CorralConfig::from_file(&path).unwrap();
    assert_eq!(config.presence.active_secs, 60);

    let missing = CorralConfig::from_file(&dir.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn config_rejects_invalid_values() {
    let bad_thresholds = CorralConfig::from_toml("[presence]\nactive_secs = 900\n").unwrap();
    assert!(matches!(
        bad_thresholds.validate(),
        Err(ConfigError::ValidationFailed { field, .. }) if field == "presence"
    ));

    let zero_attempts = CorralConfig::from_toml("[shadow]\nmax_attempts = 0\n").unwrap();
    assert!(zero_attempts.validate().is_err());

    let zero_timeout = CorralConfig::from_toml("[serializer]\nwrite_timeout_ms = 0\n").unwrap();
    assert!(zero_timeout.validate().is_err());

    let garbage = CorralConfig::from_toml("[storage\n");
    assert!(matches!(garbage, Err(ConfigError::ParseError { .. })));
}
