use serde::{Deserialize, Serialize};

use super::defaults;

/// Context budget per tier, in tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBudgets {
    pub mechanical: usize,
    pub execution: usize,
    pub senior: usize,
    pub leader: usize,
}

impl Default for TierBudgets {
    fn default() -> Self {
        Self {
            mechanical: defaults::DEFAULT_MECHANICAL_BUDGET,
            execution: defaults::DEFAULT_EXECUTION_BUDGET,
            senior: defaults::DEFAULT_SENIOR_BUDGET,
            leader: defaults::DEFAULT_LEADER_BUDGET,
        }
    }
}

/// Checkin / Context Assembler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinConfig {
    pub tier_budgets: TierBudgets,
    /// Agents assigned the senior tier.
    pub senior_agents: Vec<String>,
    /// Graph hops explored around the caller's assignments. Default: 2.
    pub hop_radius: usize,
    /// Bound on pane assembly before returning no context. Default: 2000.
    pub pane_timeout_ms: u64,
    /// Maximum graph items considered for one pane. Default: 24.
    pub max_pane_items: usize,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            tier_budgets: TierBudgets::default(),
            senior_agents: Vec::new(),
            hop_radius: defaults::DEFAULT_HOP_RADIUS,
            pane_timeout_ms: defaults::DEFAULT_PANE_TIMEOUT_MS,
            max_pane_items: defaults::DEFAULT_MAX_PANE_ITEMS,
        }
    }
}
