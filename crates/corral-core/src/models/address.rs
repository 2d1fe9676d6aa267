//! Message addresses.
//!
//! Grammar: `agent[.instance][@scope]`, plus the reserved `@anyone[@scope]`
//! and `@everyone[@scope]`. Parsing lives in `corral-bus`; this module only
//! holds the parsed form and its canonical rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ANYONE, EVERYONE};

/// A parsed recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Address {
    /// A named agent, optionally pinned to one instance and/or narrowed to a scope.
    Direct {
        agent: String,
        instance: Option<String>,
        scope: Option<String>,
    },
    /// Exactly one eligible agent consumes the message.
    Anyone { scope: Option<String> },
    /// Every active agent receives the message.
    Everyone { scope: Option<String> },
}

impl Address {
    /// The `@scope` suffix, if any.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Address::Direct { scope, .. }
            | Address::Anyone { scope }
            | Address::Everyone { scope } => scope.as_deref(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Address::Everyone { .. })
    }

    pub fn is_anyone(&self) -> bool {
        matches!(self, Address::Anyone { .. })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Direct {
                agent,
                instance,
                scope,
            } => {
                write!(f, "{agent}")?;
                if let Some(instance) = instance {
                    write!(f, ".{instance}")?;
                }
                if let Some(scope) = scope {
                    write!(f, "@{scope}")?;
                }
                Ok(())
            }
            Address::Anyone { scope } => match scope {
                Some(scope) => write!(f, "@{ANYONE}@{scope}"),
                None => write!(f, "@{ANYONE}"),
            },
            Address::Everyone { scope } => match scope {
                Some(scope) => write!(f, "@{EVERYONE}@{scope}"),
                None => write!(f, "@{EVERYONE}"),
            },
        }
    }
}
