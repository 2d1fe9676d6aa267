//! Pure derivation of shadow records from a write notification.

use serde_json::Value;
use uuid::Uuid;

use corral_core::models::{
    GraphEdge, GraphNode, Payload, SemanticRecord, WriteNotification, WriteOp,
};

use super::{KindMapping, NodeRule, ShadowMapping};

/// Namespace for semantic record keys.
const SEMANTIC_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_2f0a_93d4_4b8e_a1c7_5d20_88f3_1e42);

/// Everything one notification projects into the shadow stores.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPlan {
    /// `kind/id` of the source record.
    pub source: String,
    pub semantic: Option<SemanticRecord>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Saves replace the edges previously derived from the same record.
    /// Events only ever add.
    pub replaces_edges: bool,
}

impl ShadowPlan {
    /// Key used for logging and dead letters.
    pub fn key(&self) -> &str {
        &self.source
    }

    pub fn edge_keys(&self) -> Vec<String> {
        self.edges.iter().map(|e| e.key.clone()).collect()
    }
}

impl ShadowMapping {
    /// Deterministic semantic key for a record under this mapping version.
    pub fn semantic_key(&self, kind: &str, id: &str) -> String {
        let name = format!("v{}:{kind}:{id}", self.version);
        Uuid::new_v5(&SEMANTIC_NAMESPACE, name.as_bytes()).to_string()
    }

    /// Derive the plan for a notification. `None` when the kind is unmapped.
    pub fn plan(&self, n: &WriteNotification) -> Option<ShadowPlan> {
        let mapping = self.get(&n.kind)?;
        let source = format!("{}/{}", n.kind, n.id);
        let now = n.committed_at;

        let semantic = self.derive_semantic(mapping, n);
        let nodes = mapping
            .node
            .as_ref()
            .and_then(|rule| derive_node(rule, n))
            .into_iter()
            .collect();

        let mut edges = Vec::new();
        for rule in &mapping.edges {
            let froms = resolve(n, &rule.from.field);
            let tos = resolve(n, &rule.to.field);
            for from_id in &froms {
                for to_id in &tos {
                    let from = GraphNode::node_key(&rule.from.label, from_id);
                    let to = GraphNode::node_key(&rule.to.label, to_id);
                    if from == to {
                        continue;
                    }
                    edges.push(GraphEdge {
                        key: format!(
                            "v{}|{source}|{}|{from}|{to}",
                            self.version, rule.edge_type
                        ),
                        edge_type: rule.edge_type.clone(),
                        from,
                        to,
                        weight: rule.weight,
                        source: source.clone(),
                        updated_at: now,
                    });
                }
            }
        }

        Some(ShadowPlan {
            source,
            semantic,
            nodes,
            edges,
            replaces_edges: n.op == WriteOp::Save,
        })
    }

    fn derive_semantic(&self, mapping: &KindMapping, n: &WriteNotification) -> Option<SemanticRecord> {
        let rule = mapping.semantic.as_ref()?;
        let text = rule
            .text
            .iter()
            .flat_map(|f| resolve(n, f))
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return None;
        }

        let mut metadata = Payload::new();
        metadata.insert("kind".into(), Value::String(n.kind.clone()));
        metadata.insert("entity_id".into(), Value::String(n.entity_id.clone()));
        for field in &rule.metadata {
            if let Some(v) = n.payload.get(field).filter(|v| !v.is_null()) {
                metadata.insert(field.clone(), v.clone());
            }
        }

        Some(SemanticRecord {
            key: self.semantic_key(&n.kind, &n.id),
            source_kind: n.kind.clone(),
            source_id: n.id.clone(),
            text,
            metadata,
            scope: n.scope.clone(),
            mapping_version: self.version,
            recorded_at: n.committed_at,
        })
    }
}

fn derive_node(rule: &NodeRule, n: &WriteNotification) -> Option<GraphNode> {
    let source_id = resolve(n, &rule.id).into_iter().next()?;

    let parts: Vec<String> = rule.summary.iter().flat_map(|f| resolve(n, f)).collect();
    let summary = if parts.is_empty() {
        format!("{} {source_id}", rule.label)
    } else {
        format!("{} {source_id}: {}", rule.label, parts.join(", "))
    };

    let mut properties = Payload::new();
    for field in &rule.properties {
        if let Some(v) = n.payload.get(field).filter(|v| !v.is_null()) {
            properties.insert(field.clone(), v.clone());
        }
    }

    Some(GraphNode {
        key: GraphNode::node_key(&rule.label, &source_id),
        label: rule.label.clone(),
        source_id,
        summary,
        properties,
        updated_at: n.committed_at,
    })
}

/// Resolve a field reference to zero or more string values.
fn resolve(n: &WriteNotification, field: &str) -> Vec<String> {
    match field {
        "id" => return vec![n.id.clone()],
        "entity_id" => return vec![n.entity_id.clone()],
        _ => {}
    }
    match n.payload.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(v) => scalar(v).into_iter().collect(),
        None => Vec::new(),
    }
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
