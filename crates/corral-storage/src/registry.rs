//! Startup-time registry mapping a `kind` string to its record class,
//! validation rules, and backing table.
//!
//! # Examples
//!
//! ```
//! use corral_core::models::RecordClass;
//! use corral_storage::{KindRegistry, KindSpec};
//!
//! let registry = KindRegistry::builder()
//!     .with_defaults()
//!     .register(KindSpec::entity("incident").filterable(["severity"]))
//!     .build();
//!
//! assert_eq!(registry.resolve("incident").unwrap().class, RecordClass::Entity);
//! assert!(registry.resolve("ticket").is_ok());
//! assert!(registry.resolve("pizza").is_err());
//! ```

use std::collections::HashMap;

use corral_core::errors::{CorralResult, StoreError};
use corral_core::models::{Entity, Event, Payload, RecordClass, Scope};

/// Validation rules and backend binding for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSpec {
    pub kind: String,
    pub class: RecordClass,
    /// Payload fields that must be present and non-null.
    pub required: Vec<String>,
    /// Payload fields accepted as `list`/`events`/`count` filters.
    pub filterable: Vec<String>,
}

impl KindSpec {
    pub fn entity(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            class: RecordClass::Entity,
            required: Vec::new(),
            filterable: Vec::new(),
        }
    }

    pub fn event(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            class: RecordClass::Event,
            required: Vec::new(),
            filterable: Vec::new(),
        }
    }

    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Table the kind is stored in.
    pub fn table(&self) -> &'static str {
        match self.class {
            RecordClass::Entity => "entities",
            RecordClass::Event => "events",
        }
    }

    /// Record-level columns accepted as filters, in addition to payload fields.
    pub fn column_filters(&self) -> &'static [&'static str] {
        match self.class {
            RecordClass::Entity => &["id", "org", "team", "repo", "host"],
            RecordClass::Event => &["id", "entity_id", "org", "team", "repo", "host"],
        }
    }

    /// Every accepted filter field, columns first.
    pub fn allowed_filters(&self) -> Vec<String> {
        self.column_filters()
            .iter()
            .map(|c| c.to_string())
            .chain(self.filterable.iter().cloned())
            .collect()
    }

    /// Reject records with incomplete scope or missing required payload fields.
    pub fn validate_entity(&self, entity: &Entity) -> CorralResult<()> {
        self.expect_class(RecordClass::Entity)?;
        if entity.id.trim().is_empty() {
            return Err(StoreError::InvalidRecord {
                kind: self.kind.clone(),
                id: entity.id.clone(),
                reason: "id must not be empty".to_string(),
            }
            .into());
        }
        self.validate_common(&entity.id, &entity.scope, &entity.payload)
    }

    pub fn validate_event(&self, event: &Event) -> CorralResult<()> {
        self.expect_class(RecordClass::Event)?;
        if event.entity_id.trim().is_empty() {
            return Err(StoreError::InvalidRecord {
                kind: self.kind.clone(),
                id: event.id.clone(),
                reason: "entity_id must not be empty".to_string(),
            }
            .into());
        }
        self.validate_common(&event.id, &event.scope, &event.payload)
    }

    /// Fail with `ClassMismatch` unless this kind stores `class` records.
    pub fn expect_class(&self, class: RecordClass) -> CorralResult<()> {
        if self.class != class {
            return Err(StoreError::ClassMismatch {
                kind: self.kind.clone(),
                expected: class.as_str().to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn validate_common(&self, id: &str, scope: &Scope, payload: &Payload) -> CorralResult<()> {
        let missing = scope.missing_fields();
        if !missing.is_empty() {
            return Err(StoreError::ScopeMismatch {
                kind: self.kind.clone(),
                id: id.to_string(),
                missing: missing.into_iter().map(String::from).collect(),
            }
            .into());
        }
        for field in &self.required {
            if payload.get(field).map_or(true, |v| v.is_null()) {
                return Err(StoreError::MissingField {
                    kind: self.kind.clone(),
                    id: id.to_string(),
                    field: field.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Immutable kind lookup, built once before the engine opens.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, KindSpec>,
}

impl KindRegistry {
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::default()
    }

    /// Resolve a kind, failing fast with `UnknownKind`.
    pub fn resolve(&self, kind: &str) -> CorralResult<&KindSpec> {
        self.kinds
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()).into())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects kind specs; later registrations replace earlier ones.
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    kinds: HashMap<String, KindSpec>,
}

impl KindRegistryBuilder {
    /// Register the built-in coordination kinds.
    pub fn with_defaults(mut self) -> Self {
        for spec in default_kinds() {
            self.kinds.insert(spec.kind.clone(), spec);
        }
        self
    }

    pub fn register(mut self, spec: KindSpec) -> Self {
        self.kinds.insert(spec.kind.clone(), spec);
        self
    }

    pub fn build(self) -> KindRegistry {
        KindRegistry { kinds: self.kinds }
    }
}

impl KindRegistry {
    /// Registry containing only the built-in kinds.
    pub fn with_defaults() -> Self {
        Self::builder().with_defaults().build()
    }
}

fn default_kinds() -> Vec<KindSpec> {
    vec![
        KindSpec::entity("ticket").filterable(["status", "assignee", "priority", "project"]),
        KindSpec::entity("agent")
            .required(["agent"])
            .filterable(["agent", "model", "ticket_id", "state", "spawned_by"]),
        KindSpec::entity("pr").filterable(["ticket_id", "status", "branch", "creator_instance_id"]),
        KindSpec::entity("decision").filterable(["decision_maker", "status", "scope"]),
        KindSpec::entity("review")
            .required(["pr_id"])
            .filterable(["pr_id", "ticket_id", "reviewer_instance_id", "verdict"]),
        KindSpec::entity("sprint").filterable(["number", "status"]),
        KindSpec::entity("model")
            .required(["name"])
            .filterable(["name", "provider", "target_role"]),
        KindSpec::event("lifecycle")
            .required(["event_type"])
            .filterable(["event_type", "instance_id"]),
        KindSpec::event("ticket_event")
            .required(["event_type"])
            .filterable(["event_type", "instance_id", "previous_status", "new_status"]),
        KindSpec::event("pr_event")
            .required(["event_type"])
            .filterable(["event_type", "instance_id", "pr_id"]),
        KindSpec::event("review_event")
            .required(["event_type"])
            .filterable(["event_type", "instance_id", "review_id", "pr_id", "verdict"]),
        KindSpec::event("token_event")
            .required(["event_type"])
            .filterable(["event_type", "instance_id", "model"]),
    ]
}
