//! Derived records written into the semantic and structural stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::Payload;
use super::scope::Scope;

/// Free text plus metadata, keyed deterministically from its source record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRecord {
    pub key: String,
    pub source_kind: String,
    pub source_id: String,
    pub text: String,
    pub metadata: Payload,
    pub scope: Scope,
    pub mapping_version: u32,
    pub recorded_at: DateTime<Utc>,
}

/// A typed node in the structural graph. `key` is `Label:source_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: String,
    pub label: String,
    pub source_id: String,
    /// One-line description used by the context pane.
    pub summary: String,
    pub properties: Payload,
    pub updated_at: DateTime<Utc>,
}

impl GraphNode {
    pub fn node_key(label: &str, source_id: &str) -> String {
        format!("{label}:{source_id}")
    }
}

/// A typed, weighted edge between two node keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub key: String,
    pub edge_type: String,
    pub from: String,
    pub to: String,
    /// Relevance weight in (0.0, 1.0].
    pub weight: f64,
    /// `kind/id` of the record this edge was derived from.
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

/// A node reached from a set of seeds by a bounded traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub node: GraphNode,
    /// Hops from the nearest seed (1 = direct neighbor).
    pub depth: usize,
    /// Product of edge weights along the best path.
    pub path_weight: f64,
    /// Type of the last edge on that path.
    pub via: String,
}
