//! Scenario fixtures shared by Corral integration tests.
//!
//! Files live under `test-fixtures/` at the workspace root. The two JSON
//! scenarios have typed forms ([`SprintBoard`], [`MessagingScenario`]) so
//! tests don't index raw JSON. Loaders panic on a missing or malformed file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const SPRINT_BOARD: &str = "scenarios/sprint_board.json";
pub const MESSAGING: &str = "scenarios/messaging.json";
pub const CUSTOM_MAPPING: &str = "scenarios/custom_mapping.toml";

static ROOT: OnceLock<PathBuf> = OnceLock::new();

fn fixtures_root() -> &'static Path {
    ROOT.get_or_init(|| {
        let crate_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        crate_dir
            .ancestors()
            .map(|dir| dir.join("test-fixtures"))
            .find(|dir| dir.is_dir())
            .unwrap_or_else(|| panic!("no test-fixtures directory above {}", crate_dir.display()))
    })
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixture_path(relative_path).is_file()
}

pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    let raw = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parse {}: {e}", path.display()))
}

/// JSON files directly under `subdir`, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(fixture_path(subdir)) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| Some(entry.ok()?.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopeFixture {
    pub org: String,
    pub team: String,
    pub repo: String,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityFixture {
    pub kind: String,
    pub id: String,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFixture {
    pub kind: String,
    pub entity_id: String,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A small sprint: agents, tickets with a blocker, a PR, a decision, and a
/// few events, all in one scope.
#[derive(Debug, Clone, Deserialize)]
pub struct SprintBoard {
    pub scope: ScopeFixture,
    pub entities: Vec<EntityFixture>,
    pub events: Vec<EventFixture>,
}

impl SprintBoard {
    pub fn load() -> Self {
        load_fixture(SPRINT_BOARD)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceFixture {
    pub agent: String,
    pub instance: String,
    pub scope: String,
    #[serde(default)]
    pub mechanical: bool,
    #[serde(default)]
    pub leads: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageFixture {
    pub from: String,
    pub to: String,
    pub body: String,
    /// `directive`, `inform`, or `flag`.
    pub kind: String,
    /// `normal` or `urgent`.
    pub priority: String,
}

/// Instances, messages sent after every instance has checked in once, and
/// how many messages each instance should receive when drained in order.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingScenario {
    pub instances: Vec<InstanceFixture>,
    pub messages: Vec<MessageFixture>,
    pub drain_order: Vec<String>,
    pub expected: BTreeMap<String, usize>,
}

impl MessagingScenario {
    pub fn load() -> Self {
        load_fixture(MESSAGING)
    }

    pub fn agent_of(&self, instance_id: &str) -> Option<&str> {
        self.instances
            .iter()
            .find(|i| i.instance == instance_id)
            .map(|i| i.agent.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_file_is_present() {
        for f in [SPRINT_BOARD, MESSAGING, CUSTOM_MAPPING] {
            assert!(fixture_exists(f), "missing fixture {f}");
        }
        assert_eq!(list_fixtures("scenarios").len(), 2);
        assert!(list_fixtures("nope").is_empty());
    }

    #[test]
    fn sprint_board_is_typed() {
        let board = SprintBoard::load();
        assert_eq!(board.scope.team, "avalon");
        assert_eq!(board.entities.len(), 7);
        assert_eq!(board.events.len(), 3);
        assert!(board.entities.iter().any(|e| e.kind == "decision" && e.id == "HDR-0042"));
    }

    #[test]
    fn messaging_expectations_cover_the_drain_order() {
        let s = MessagingScenario::load();
        for id in &s.drain_order {
            assert!(s.expected.contains_key(id), "no expectation for {id}");
            assert!(s.agent_of(id).is_some(), "no instance {id}");
        }
        let linter = s.instances.iter().find(|i| i.agent == "linter").unwrap();
        assert!(linter.mechanical);
        assert_eq!(s.instances[0].leads, vec!["avalon"]);
    }
}
