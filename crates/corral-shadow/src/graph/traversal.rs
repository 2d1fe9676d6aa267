//! Bounded neighborhood traversal, ignoring edge direction.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use corral_core::models::Neighbor;

use super::indexed::IndexedGraph;

/// Nodes within `radius` hops of any seed, excluding the seeds.
///
/// Each node keeps its shallowest depth and, at that depth, the best
/// product of edge weights. Results are ordered by depth, then weight,
/// then recency, and cut to `limit`.
pub fn neighborhood(g: &IndexedGraph, seeds: &[String], radius: usize, limit: usize) -> Vec<Neighbor> {
    let seed_idx: HashSet<NodeIndex> = seeds.iter().filter_map(|s| g.node_index.get(s).copied()).collect();
    if seed_idx.is_empty() || radius == 0 || limit == 0 {
        return Vec::new();
    }

    // node -> (depth, path weight, via)
    let mut best: HashMap<NodeIndex, (usize, f64, String)> = HashMap::new();
    let mut frontier: Vec<(NodeIndex, f64)> = seed_idx.iter().map(|&i| (i, 1.0)).collect();

    for depth in 1..=radius {
        let mut next: HashMap<NodeIndex, f64> = HashMap::new();
        for &(node, weight) in &frontier {
            let edges = g
                .graph
                .edges_directed(node, Direction::Outgoing)
                .map(|e| (e.target(), e.weight()))
                .chain(
                    g.graph
                        .edges_directed(node, Direction::Incoming)
                        .map(|e| (e.source(), e.weight())),
                );
            for (other, edge) in edges {
                if seed_idx.contains(&other) {
                    continue;
                }
                let w = weight * edge.weight;
                match best.get_mut(&other) {
                    Some(entry) if entry.0 < depth => continue,
                    Some(entry) => {
                        if w > entry.1 {
                            *entry = (depth, w, edge.edge_type.clone());
                        }
                    }
                    None => {
                        best.insert(other, (depth, w, edge.edge_type.clone()));
                    }
                }
                let slot = next.entry(other).or_insert(0.0);
                if w > *slot {
                    *slot = w;
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next.into_iter().collect();
    }

    let mut out: Vec<Neighbor> = best
        .into_iter()
        .map(|(idx, (depth, path_weight, via))| Neighbor {
            node: g.graph[idx].clone(),
            depth,
            path_weight,
            via,
        })
        .collect();
    out.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then(b.path_weight.total_cmp(&a.path_weight))
            .then(b.node.updated_at.cmp(&a.node.updated_at))
            .then(a.node.key.cmp(&b.node.key))
    });
    out.truncate(limit);
    out
}
