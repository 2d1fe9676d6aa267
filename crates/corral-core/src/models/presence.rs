//! Presence records for agent instances and their liveness classification.
//!
//! # Examples
//!
//! ```
//! use chrono::Duration;
//! use corral_core::config::PresenceConfig;
//! use corral_core::models::Liveness;
//!
//! let cfg = PresenceConfig::default();
//! assert_eq!(Liveness::from_elapsed(Duration::seconds(30), &cfg), Liveness::Active);
//! assert_eq!(Liveness::from_elapsed(Duration::seconds(700), &cfg), Liveness::Unresponsive);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PresenceConfig;

/// How an instance left the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeregisterMode {
    /// Temporary. A later checkin reactivates the instance.
    Standdown,
    /// Permanent. Later checkins are rejected.
    Decommission,
}

/// Liveness derived purely from time since the last checkin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Active,
    PossiblyBusy,
    Stale,
    Unresponsive,
}

impl Liveness {
    /// Classify an elapsed interval against the configured thresholds.
    pub fn from_elapsed(elapsed: Duration, cfg: &PresenceConfig) -> Self {
        let secs = elapsed.num_seconds().max(0) as u64;
        if secs > cfg.stale_secs {
            Liveness::Unresponsive
        } else if secs > cfg.busy_secs {
            Liveness::Stale
        } else if secs >= cfg.active_secs {
            Liveness::PossiblyBusy
        } else {
            Liveness::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Active => "active",
            Liveness::PossiblyBusy => "possibly_busy",
            Liveness::Stale => "stale",
            Liveness::Unresponsive => "unresponsive",
        }
    }

    /// Active or possibly busy: counted as a live recipient.
    pub fn is_live(&self) -> bool {
        matches!(self, Liveness::Active | Liveness::PossiblyBusy)
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence lifecycle: `Registered → Active → Stale → Unresponsive → Deregistered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PresenceState {
    /// Known to the roster but has not checked in yet.
    Registered,
    Active,
    Stale,
    Unresponsive,
    Deregistered { mode: DeregisterMode, at: DateTime<Utc> },
}

/// One running instance of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub agent_id: String,
    pub instance_id: String,
    /// Scope the instance works in (e.g. a team name). `None` = unscoped.
    pub scope: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_checkin_at: Option<DateTime<Utc>>,
    /// Free-text status from the most recent checkin.
    pub status: String,
    /// Mechanical workers never consume `@anyone` traffic.
    pub mechanical: bool,
    /// Scopes this instance leads; leaders observe all traffic addressed within them.
    pub leader_of: BTreeSet<String>,
    pub deregistered: Option<(DeregisterMode, DateTime<Utc>)>,
}

impl AgentInstance {
    pub fn new(agent_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            instance_id: instance_id.into(),
            scope: None,
            registered_at: Utc::now(),
            last_checkin_at: None,
            status: String::new(),
            mechanical: false,
            leader_of: BTreeSet::new(),
            deregistered: None,
        }
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn mechanical(mut self) -> Self {
        self.mechanical = true;
        self
    }

    pub fn leading(mut self, scope: impl Into<String>) -> Self {
        self.leader_of.insert(scope.into());
        self
    }

    pub fn leads(&self, scope: &str) -> bool {
        self.leader_of.contains(scope)
    }

    pub fn is_decommissioned(&self) -> bool {
        matches!(self.deregistered, Some((DeregisterMode::Decommission, _)))
    }

    /// Liveness as of `now`. `None` until the first checkin.
    pub fn liveness_at(&self, now: DateTime<Utc>, cfg: &PresenceConfig) -> Option<Liveness> {
        self.last_checkin_at
            .map(|at| Liveness::from_elapsed(now - at, cfg))
    }

    /// Whether the instance counts as an active recipient as of `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>, cfg: &PresenceConfig) -> bool {
        self.deregistered.is_none()
            && self.liveness_at(now, cfg).is_some_and(|l| l.is_live())
    }

    pub fn state_at(&self, now: DateTime<Utc>, cfg: &PresenceConfig) -> PresenceState {
        if let Some((mode, at)) = self.deregistered {
            return PresenceState::Deregistered { mode, at };
        }
        match self.liveness_at(now, cfg) {
            None => PresenceState::Registered,
            Some(Liveness::Active | Liveness::PossiblyBusy) => PresenceState::Active,
            Some(Liveness::Stale) => PresenceState::Stale,
            Some(Liveness::Unresponsive) => PresenceState::Unresponsive,
        }
    }

    /// Canonical address: `agent.instance[@scope]`.
    pub fn address(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}.{}@{}", self.agent_id, self.instance_id, scope),
            None => format!("{}.{}", self.agent_id, self.instance_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_on_the_lower_bound() {
        let cfg = PresenceConfig::default();
        let at = |s| Liveness::from_elapsed(Duration::seconds(s), &cfg);
        assert_eq!(at(0), Liveness::Active);
        assert_eq!(at(119), Liveness::Active);
        assert_eq!(at(120), Liveness::PossiblyBusy);
        assert_eq!(at(300), Liveness::PossiblyBusy);
        assert_eq!(at(301), Liveness::Stale);
        assert_eq!(at(600), Liveness::Stale);
        assert_eq!(at(601), Liveness::Unresponsive);
    }

    #[test]
    fn state_follows_checkin_and_deregistration() {
        let cfg = PresenceConfig::default();
        let now = Utc::now();
        let mut inst = AgentInstance::new("mason", "inst-1");
        assert_eq!(inst.state_at(now, &cfg), PresenceState::Registered);

        inst.last_checkin_at = Some(now - Duration::seconds(400));
        assert_eq!(inst.state_at(now, &cfg), PresenceState::Stale);

        inst.deregistered = Some((DeregisterMode::Standdown, now));
        assert!(matches!(
            inst.state_at(now, &cfg),
            PresenceState::Deregistered { mode: DeregisterMode::Standdown, .. }
        ));
        assert!(!inst.is_live_at(now, &cfg));
    }
}
