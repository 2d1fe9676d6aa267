//! Scoping dimensions carried by every Entity and Event.
//!
//! # Examples
//!
//! ```
//! use corral_core::models::Scope;
//!
//! let scope = Scope::new("acme", "avalon", "herd", "mac-01");
//! assert!(scope.is_complete());
//!
//! let partial = Scope::new("acme", "", "herd", "");
//! assert_eq!(partial.missing_fields(), vec!["team", "host"]);
//! ```

use serde::{Deserialize, Serialize};

/// The four dimensions every persisted record must carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Scope {
    pub org: String,
    pub team: String,
    pub repo: String,
    pub host: String,
}

impl Scope {
    /// Column names, in storage order.
    pub const FIELDS: [&'static str; 4] = ["org", "team", "repo", "host"];

    pub fn new(
        org: impl Into<String>,
        team: impl Into<String>,
        repo: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            org: org.into(),
            team: team.into(),
            repo: repo.into(),
            host: host.into(),
        }
    }

    /// Names of the dimensions that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        Self::FIELDS
            .iter()
            .zip([&self.org, &self.team, &self.repo, &self.host])
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Value of a dimension by column name.
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "org" => Some(&self.org),
            "team" => Some(&self.team),
            "repo" => Some(&self.repo),
            "host" => Some(&self.host),
            _ => None,
        }
    }
}
