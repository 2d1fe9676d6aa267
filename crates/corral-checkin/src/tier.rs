use serde::{Deserialize, Serialize};

use corral_core::config::{CheckinConfig, TierBudgets};
use corral_core::models::AgentInstance;

/// Context tier. Decides how many tokens of context a checkin gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Mechanical,
    Execution,
    Senior,
    Leader,
}

impl Tier {
    /// Mechanical beats leader beats senior; everyone else executes.
    ///
    /// An instance flagged mechanical that also leads a scope gets the
    /// mechanical tier and no context.
    pub fn for_instance(instance: &AgentInstance, config: &CheckinConfig) -> Self {
        if instance.mechanical {
            Tier::Mechanical
        } else if !instance.leader_of.is_empty() {
            Tier::Leader
        } else if config.senior_agents.contains(&instance.agent_id) {
            Tier::Senior
        } else {
            Tier::Execution
        }
    }

    pub fn budget(&self, budgets: &TierBudgets) -> usize {
        match self {
            Tier::Mechanical => budgets.mechanical,
            Tier::Execution => budgets.execution,
            Tier::Senior => budgets.senior,
            Tier::Leader => budgets.leader,
        }
    }
}
