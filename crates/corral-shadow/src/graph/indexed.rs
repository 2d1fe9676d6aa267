//! `StableGraph` wrapper with key → index maps for O(1) merges.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Directed;

use corral_core::models::{GraphEdge, GraphNode, Payload};

/// The underlying directed graph type.
pub type ShadowGraph = StableGraph<GraphNode, GraphEdge, Directed>;

/// Graph plus indexes by node key and edge key.
#[derive(Default)]
pub struct IndexedGraph {
    pub graph: ShadowGraph,
    pub node_index: HashMap<String, NodeIndex>,
    pub edge_index: HashMap<String, EdgeIndex>,
    /// Keys of nodes created only as edge endpoints.
    stubs: HashSet<String>,
}

impl IndexedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node by key. An older node never replaces a
    /// newer one, except over a stub.
    pub fn merge_node(&mut self, node: GraphNode) -> NodeIndex {
        match self.node_index.get(&node.key) {
            Some(&idx) => {
                let stub = self.stubs.remove(&node.key);
                if stub || node.updated_at >= self.graph[idx].updated_at {
                    self.graph[idx] = node;
                }
                idx
            }
            None => {
                let key = node.key.clone();
                let idx = self.graph.add_node(node);
                self.node_index.insert(key, idx);
                idx
            }
        }
    }

    /// Existing node for `key`, or a stub with an empty payload.
    fn ensure_node(&mut self, key: &str, at: chrono::DateTime<chrono::Utc>) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(key) {
            return idx;
        }
        let (label, source_id) = key.split_once(':').unwrap_or((key, ""));
        self.stubs.insert(key.to_string());
        self.merge_node(GraphNode {
            key: key.to_string(),
            label: label.to_string(),
            source_id: source_id.to_string(),
            summary: format!("{label} {source_id}"),
            properties: Payload::new(),
            updated_at: at,
        })
    }

    /// Insert or replace an edge by key, creating stub endpoints as needed.
    pub fn merge_edge(&mut self, edge: GraphEdge) -> EdgeIndex {
        if let Some(&idx) = self.edge_index.get(&edge.key) {
            if let Some(w) = self.graph.edge_weight_mut(idx) {
                if edge.updated_at >= w.updated_at {
                    *w = edge;
                }
                return idx;
            }
        }
        let from = self.ensure_node(&edge.from, edge.updated_at);
        let to = self.ensure_node(&edge.to, edge.updated_at);
        let key = edge.key.clone();
        let idx = self.graph.add_edge(from, to, edge);
        self.edge_index.insert(key, idx);
        idx
    }

    /// Remove edges derived from `source` that are not in `keep`.
    pub fn retract_stale(&mut self, source: &str, keep: &[String]) -> usize {
        let stale: Vec<String> = self
            .graph
            .edge_weights()
            .filter(|e| e.source == source && !keep.contains(&e.key))
            .map(|e| e.key.clone())
            .collect();
        for key in &stale {
            if let Some(idx) = self.edge_index.remove(key) {
                self.graph.remove_edge(idx);
            }
        }
        stale.len()
    }

    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.node_index.get(key).map(|&idx| &self.graph[idx])
    }

    pub fn edges_of(&self, key: &str) -> Vec<GraphEdge> {
        let Some(&idx) = self.node_index.get(key) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, petgraph::Direction::Incoming))
            .map(|e| e.weight().clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn edge(key: &str, from: &str, to: &str, source: &str) -> GraphEdge {
        GraphEdge {
            key: key.into(),
            edge_type: "BlockedBy".into(),
            from: from.into(),
            to: to.into(),
            weight: 0.8,
            source: source.into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let mut g = IndexedGraph::new();
        g.merge_edge(edge("e1", "Ticket:T-1", "Ticket:T-2", "ticket/T-1"));
        g.merge_edge(edge("e1", "Ticket:T-1", "Ticket:T-2", "ticket/T-1"));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node("Ticket:T-2").unwrap().summary, "Ticket T-2");
    }

    #[test]
    fn full_node_replaces_stub() {
        let mut g = IndexedGraph::new();
        g.merge_edge(edge("e1", "Ticket:T-1", "Agent:mason", "ticket/T-1"));
        g.merge_node(GraphNode {
            key: "Agent:mason".into(),
            label: "Agent".into(),
            source_id: "mason".into(),
            summary: "Agent mason: running".into(),
            properties: Payload::new(),
            updated_at: Utc::now(),
        });
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node("Agent:mason").unwrap().summary, "Agent mason: running");
        assert_eq!(g.edges_of("Agent:mason").len(), 1);
    }

    #[test]
    fn older_node_does_not_replace_newer() {
        let mut g = IndexedGraph::new();
        let now = Utc::now();
        let node = |summary: &str, at| GraphNode {
            key: "Ticket:T-1".into(),
            label: "Ticket".into(),
            source_id: "T-1".into(),
            summary: summary.into(),
            properties: Payload::new(),
            updated_at: at,
        };
        g.merge_node(node("Ticket T-1: done", now));
        g.merge_node(node("Ticket T-1: open", now - chrono::Duration::seconds(5)));
        assert_eq!(g.node("Ticket:T-1").unwrap().summary, "Ticket T-1: done");
    }

    #[test]
    fn stub_yields_to_an_older_full_node() {
        let mut g = IndexedGraph::new();
        let now = Utc::now();
        g.merge_edge(edge("e1", "Ticket:T-1", "Agent:mason", "ticket/T-1"));
        g.merge_node(GraphNode {
            key: "Agent:mason".into(),
            label: "Agent".into(),
            source_id: "mason".into(),
            summary: "Agent mason: idle".into(),
            properties: Payload::new(),
            updated_at: now - chrono::Duration::minutes(1),
        });
        assert_eq!(g.node("Agent:mason").unwrap().summary, "Agent mason: idle");
    }

    #[test]
    fn retract_only_touches_the_given_source() {
        let mut g = IndexedGraph::new();
        g.merge_edge(edge("a", "Ticket:T-1", "Agent:mason", "ticket/T-1"));
        g.merge_edge(edge("b", "Ticket:T-1", "Agent:fresco", "ticket/T-1"));
        g.merge_edge(edge("c", "Ticket:T-1", "Agent:mason", "agent/inst-1"));
        assert_eq!(g.retract_stale("ticket/T-1", &["b".to_string()]), 1);
        assert_eq!(g.edge_count(), 2);
        assert!(g.edge_index.contains_key("c"));
    }
}
