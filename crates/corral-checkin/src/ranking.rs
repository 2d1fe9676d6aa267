//! Relevance of a graph neighbor to the caller.
//!
//! Score = path weight × recency ÷ depth. Recency decays exponentially
//! with a 24-hour time constant from the node's last update.

use chrono::{DateTime, Utc};

use corral_core::models::Neighbor;

const RECENCY_HOURS: f64 = 24.0;

pub fn score(neighbor: &Neighbor, now: DateTime<Utc>) -> f64 {
    let hours = (now - neighbor.node.updated_at).num_minutes().max(0) as f64 / 60.0;
    let recency = (-hours / RECENCY_HOURS).exp();
    neighbor.path_weight * recency / neighbor.depth.max(1) as f64
}

/// Sort by score descending; ties broken by node key for stable output.
pub fn rank(neighbors: Vec<Neighbor>, now: DateTime<Utc>) -> Vec<(Neighbor, f64)> {
    let mut scored: Vec<(Neighbor, f64)> = neighbors
        .into_iter()
        .map(|n| {
            let s = score(&n, now);
            (n, s)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.node.key.cmp(&b.0.node.key))
    });
    scored
}
