//! Declarative, versioned mapping from record `kind` to shadow schema.
//!
//! A mapping is data, not code: it can be loaded from TOML and swapped
//! without touching the propagator. The `version` is folded into every
//! semantic and edge key, so a new mapping version never collides with
//! records written under an older one.

mod derive;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use corral_core::errors::ShadowError;

pub use derive::ShadowPlan;

const BUILTIN_V1: &str = include_str!("default_v1.toml");

/// The full mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowMapping {
    pub version: u32,
    #[serde(default)]
    pub kinds: BTreeMap<String, KindMapping>,
}

/// Shadow schema for one kind. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KindMapping {
    #[serde(default)]
    pub node: Option<NodeRule>,
    #[serde(default)]
    pub semantic: Option<SemanticRule>,
    #[serde(default)]
    pub edges: Vec<EdgeRule>,
}

/// The node a record is projected to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRule {
    pub label: String,
    /// Field naming the node. Default: the record id.
    #[serde(default = "default_id_field")]
    pub id: String,
    /// Fields rendered into the one-line summary.
    #[serde(default)]
    pub summary: Vec<String>,
    /// Fields copied onto the node.
    #[serde(default)]
    pub properties: Vec<String>,
}

/// The free-text record written to the meaning store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRule {
    /// Fields joined, in order, into the record text.
    pub text: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<String>,
}

/// A typed edge derived from two field references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRule {
    #[serde(rename = "type")]
    pub edge_type: String,
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub label: String,
    pub field: String,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_weight() -> f64 {
    1.0
}

impl ShadowMapping {
    /// The built-in version 1 mapping.
    pub fn builtin() -> Result<Self, ShadowError> {
        Self::from_toml(BUILTIN_V1)
    }

    /// Parse and validate a mapping from TOML.
    pub fn from_toml(s: &str) -> Result<Self, ShadowError> {
        let mapping: Self =
            toml::from_str(s).map_err(|e| ShadowError::InvalidMapping(e.to_string()))?;
        mapping.validate()?;
        Ok(mapping)
    }

    pub fn from_file(path: &Path) -> Result<Self, ShadowError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShadowError::InvalidMapping(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, the built-in mapping otherwise.
    pub fn load(path: Option<&str>) -> Result<Self, ShadowError> {
        match path {
            Some(p) => Self::from_file(Path::new(p)),
            None => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), ShadowError> {
        if self.version == 0 {
            return Err(ShadowError::InvalidMapping("version must be >= 1".into()));
        }
        for (kind, m) in &self.kinds {
            if let Some(node) = &m.node {
                if node.label.trim().is_empty() {
                    return Err(ShadowError::InvalidMapping(format!(
                        "{kind}: node label must not be empty"
                    )));
                }
            }
            if let Some(sem) = &m.semantic {
                if sem.text.is_empty() {
                    return Err(ShadowError::InvalidMapping(format!(
                        "{kind}: semantic rule needs at least one text field"
                    )));
                }
            }
            for edge in &m.edges {
                if edge.edge_type.trim().is_empty()
                    || edge.from.label.trim().is_empty()
                    || edge.to.label.trim().is_empty()
                {
                    return Err(ShadowError::InvalidMapping(format!(
                        "{kind}: edge type and endpoint labels must not be empty"
                    )));
                }
                if !(edge.weight > 0.0 && edge.weight <= 1.0) {
                    return Err(ShadowError::InvalidMapping(format!(
                        "{kind}: {} weight {} outside (0, 1]",
                        edge.edge_type, edge.weight
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<&KindMapping> {
        self.kinds.get(kind)
    }
}
