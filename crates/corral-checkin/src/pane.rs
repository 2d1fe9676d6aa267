//! Context pane: ranked graph neighbors rendered to lines and cut to a
//! token budget.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use corral_core::errors::ShadowError;
use corral_core::traits::IStructuralStore;
use corral_tokens::{TokenBudget, TokenCounter};

use crate::ranking;
use crate::tier::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneItem {
    pub key: String,
    /// Rendered line, e.g. `[BlockedBy] Ticket T-7: Auth outage, open`.
    pub line: String,
    pub depth: usize,
    pub score: f64,
    pub tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPane {
    pub tier: Tier,
    pub budget: usize,
    pub used_tokens: usize,
    pub items: Vec<PaneItem>,
    /// Ranked items left out for lack of budget.
    pub omitted: usize,
}

impl ContextPane {
    /// The pane as newline-separated text.
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|i| i.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds panes from the structural store.
#[derive(Clone)]
pub struct PaneBuilder {
    structural: Arc<dyn IStructuralStore>,
    counter: Arc<TokenCounter>,
    hop_radius: usize,
    max_items: usize,
}

impl PaneBuilder {
    pub fn new(
        structural: Arc<dyn IStructuralStore>,
        counter: Arc<TokenCounter>,
        hop_radius: usize,
        max_items: usize,
    ) -> Self {
        Self {
            structural,
            counter,
            hop_radius,
            max_items,
        }
    }

    /// Build a pane around `seeds`. `None` when the budget is zero or
    /// nothing relevant is connected to the seeds.
    pub fn build(
        &self,
        seeds: &[String],
        tier: Tier,
        budget: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<ContextPane>, ShadowError> {
        if budget == 0 || seeds.is_empty() {
            return Ok(None);
        }
        let neighbors = self
            .structural
            .neighborhood(seeds, self.hop_radius, self.max_items)?;
        if neighbors.is_empty() {
            return Ok(None);
        }

        let ranked = ranking::rank(neighbors, now);
        let lines: Vec<String> = ranked
            .iter()
            .map(|(n, _)| format!("[{}] {}", n.via, n.node.summary))
            .collect();

        let packed = TokenBudget::new(&self.counter, budget).pack(&lines);
        if packed.is_empty() {
            return Ok(None);
        }
        let items: Vec<PaneItem> = packed
            .lines
            .into_iter()
            .map(|l| {
                let (neighbor, score) = &ranked[l.index];
                PaneItem {
                    key: neighbor.node.key.clone(),
                    line: l.text,
                    depth: neighbor.depth,
                    score: *score,
                    tokens: l.tokens,
                }
            })
            .collect();

        Ok(Some(ContextPane {
            tier,
            budget,
            used_tokens: packed.used,
            omitted: packed.omitted,
            items,
        }))
    }
}
