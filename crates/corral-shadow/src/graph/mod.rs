//! In-process structural store over `petgraph::StableGraph`.

pub mod indexed;
pub mod traversal;

use std::sync::RwLock;

use corral_core::errors::ShadowError;
use corral_core::models::{GraphEdge, GraphNode, Neighbor};
use corral_core::traits::IStructuralStore;

pub use indexed::IndexedGraph;

/// Thread-safe [`IStructuralStore`] holding an [`IndexedGraph`].
#[derive(Default)]
pub struct GraphStore {
    graph: RwLock<IndexedGraph>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_err(key: &str, e: impl std::fmt::Display) -> ShadowError {
        ShadowError::StructuralWrite {
            key: key.to_string(),
            reason: format!("graph lock poisoned: {e}"),
        }
    }

    /// Edges leaving or entering `key`.
    pub fn edges_of(&self, key: &str) -> Vec<GraphEdge> {
        match self.graph.read() {
            Ok(g) => g.edges_of(key),
            Err(_) => Vec::new(),
        }
    }
}

impl IStructuralStore for GraphStore {
    fn merge_node(&self, node: GraphNode) -> Result<(), ShadowError> {
        let key = node.key.clone();
        let mut g = self.graph.write().map_err(|e| Self::write_err(&key, e))?;
        g.merge_node(node);
        Ok(())
    }

    fn merge_edge(&self, edge: GraphEdge) -> Result<(), ShadowError> {
        let key = edge.key.clone();
        let mut g = self.graph.write().map_err(|e| Self::write_err(&key, e))?;
        g.merge_edge(edge);
        Ok(())
    }

    fn retract_stale(&self, source: &str, keep: &[String]) -> Result<usize, ShadowError> {
        let mut g = self.graph.write().map_err(|e| Self::write_err(source, e))?;
        Ok(g.retract_stale(source, keep))
    }

    fn node(&self, key: &str) -> Option<GraphNode> {
        self.graph.read().ok()?.node(key).cloned()
    }

    fn neighborhood(
        &self,
        seeds: &[String],
        radius: usize,
        limit: usize,
    ) -> Result<Vec<Neighbor>, ShadowError> {
        let g = self
            .graph
            .read()
            .map_err(|e| ShadowError::StructuralQuery(format!("graph lock poisoned: {e}")))?;
        Ok(traversal::neighborhood(&g, seeds, radius, limit))
    }

    fn node_count(&self) -> usize {
        self.graph.read().map(|g| g.node_count()).unwrap_or(0)
    }

    fn edge_count(&self) -> usize {
        self.graph.read().map(|g| g.edge_count()).unwrap_or(0)
    }
}
