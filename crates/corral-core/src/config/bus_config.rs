use serde::{Deserialize, Serialize};

use super::defaults;

/// Presence & Messaging Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Messages older than this are pruned, read or not. Default: 3600.
    pub message_ttl_secs: u64,
    /// Interval of the background GC loop. Default: 60.
    pub gc_interval_secs: u64,
    /// Agents registered as mechanical when no explicit flag is given.
    pub mechanical_agents: Vec<String>,
    /// Agents that lead their own scope when no explicit leadership is given.
    pub leader_agents: Vec<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            message_ttl_secs: defaults::DEFAULT_MESSAGE_TTL_SECS,
            gc_interval_secs: defaults::DEFAULT_GC_INTERVAL_SECS,
            mechanical_agents: Vec::new(),
            leader_agents: Vec::new(),
        }
    }
}

impl BusConfig {
    pub fn message_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.message_ttl_secs as i64)
    }

    pub fn is_mechanical(&self, agent_id: &str) -> bool {
        self.mechanical_agents.iter().any(|a| a == agent_id)
    }

    pub fn is_leader(&self, agent_id: &str) -> bool {
        self.leader_agents.iter().any(|a| a == agent_id)
    }
}
