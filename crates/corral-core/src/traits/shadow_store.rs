use crate::errors::ShadowError;
use crate::models::{GraphEdge, GraphNode, Neighbor, SemanticRecord};

/// The meaning store: free text plus metadata, upserted by key.
pub trait ISemanticStore: Send + Sync {
    /// Insert or replace the record under `record.key`. A stored record
    /// with a later `recorded_at` is kept.
    fn upsert(&self, record: SemanticRecord) -> Result<(), ShadowError>;

    fn get(&self, key: &str) -> Option<SemanticRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The structural store: typed nodes and weighted edges.
///
/// Merges are idempotent: merging the same key twice updates in place.
/// A merge older than what is stored under its key is ignored.
pub trait IStructuralStore: Send + Sync {
    fn merge_node(&self, node: GraphNode) -> Result<(), ShadowError>;

    /// Merge an edge. Endpoints that do not exist yet are created as stubs.
    fn merge_edge(&self, edge: GraphEdge) -> Result<(), ShadowError>;

    /// Remove edges derived from `source` whose key is not in `keep`.
    /// Returns how many were removed.
    fn retract_stale(&self, source: &str, keep: &[String]) -> Result<usize, ShadowError>;

    fn node(&self, key: &str) -> Option<GraphNode>;

    /// Nodes within `radius` hops of any seed (seeds excluded), at most `limit`.
    fn neighborhood(
        &self,
        seeds: &[String],
        radius: usize,
        limit: usize,
    ) -> Result<Vec<Neighbor>, ShadowError>;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
