//! Presence registry: who is running, where, and how recently they checked in.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use corral_core::config::{BusConfig, PresenceConfig};
use corral_core::constants::MAX_STATUS_LEN;
use corral_core::errors::BusError;
use corral_core::models::{AgentInstance, DeregisterMode, Liveness, PresenceState};
use corral_observability::events;

/// One line of the peer roster returned by checkin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub agent_id: String,
    pub instance_id: String,
    pub liveness: Liveness,
    pub status: String,
    pub last_checkin_at: Option<DateTime<Utc>>,
}

/// Thread-safe presence registry keyed by instance id.
pub struct PresenceRegistry {
    instances: DashMap<String, AgentInstance>,
    thresholds: PresenceConfig,
    mechanical_agents: Vec<String>,
    leader_agents: Vec<String>,
}

fn state_name(state: &PresenceState) -> &'static str {
    match state {
        PresenceState::Registered => "registered",
        PresenceState::Active => "active",
        PresenceState::Stale => "stale",
        PresenceState::Unresponsive => "unresponsive",
        PresenceState::Deregistered { mode: DeregisterMode::Standdown, .. } => "stood_down",
        PresenceState::Deregistered { mode: DeregisterMode::Decommission, .. } => "decommissioned",
    }
}

/// Truncate to `MAX_STATUS_LEN` characters.
fn clip_status(status: &str) -> String {
    status.chars().take(MAX_STATUS_LEN).collect()
}

impl PresenceRegistry {
    pub fn new(thresholds: PresenceConfig, bus: &BusConfig) -> Self {
        Self {
            instances: DashMap::new(),
            thresholds,
            mechanical_agents: bus.mechanical_agents.clone(),
            leader_agents: bus.leader_agents.clone(),
        }
    }

    pub fn thresholds(&self) -> &PresenceConfig {
        &self.thresholds
    }

    /// Name-based defaults for instances registered without explicit flags.
    fn with_defaults(&self, mut instance: AgentInstance) -> AgentInstance {
        if self.mechanical_agents.contains(&instance.agent_id) {
            instance.mechanical = true;
        }
        if self.leader_agents.contains(&instance.agent_id) {
            if let Some(scope) = instance.scope.clone() {
                instance.leader_of.insert(scope);
            }
        }
        instance
    }

    /// Register an instance at spawn. Re-registering replaces the record,
    /// except that a decommissioned instance can never come back.
    pub fn register(&self, instance: AgentInstance) -> Result<AgentInstance, BusError> {
        if let Some(existing) = self.instances.get(&instance.instance_id) {
            if existing.is_decommissioned() {
                return Err(BusError::StaleInstance {
                    instance_id: instance.instance_id.clone(),
                });
            }
        }
        let instance = self.with_defaults(instance);
        self.instances
            .insert(instance.instance_id.clone(), instance.clone());
        events::presence_transition(&instance.instance_id, "unknown", "registered");
        Ok(instance)
    }

    /// Record a checkin at `now`.
    ///
    /// Unknown instances are auto-registered with `scope`. A stood-down
    /// instance is reactivated; a decommissioned one is rejected.
    pub fn heartbeat(
        &self,
        agent_id: &str,
        instance_id: &str,
        scope: Option<&str>,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<AgentInstance, BusError> {
        let mut entry = self
            .instances
            .entry(instance_id.to_string())
            .or_insert_with(|| {
                let mut fresh = AgentInstance::new(agent_id, instance_id);
                fresh.scope = scope.map(str::to_string);
                fresh.registered_at = now;
                self.with_defaults(fresh)
            });
        let instance = entry.value_mut();
        if instance.is_decommissioned() {
            return Err(BusError::StaleInstance {
                instance_id: instance_id.to_string(),
            });
        }

        let before = instance.state_at(now, &self.thresholds);
        instance.deregistered = None;
        instance.last_checkin_at = Some(now);
        instance.status = clip_status(status);
        if instance.scope.is_none() {
            instance.scope = scope.map(str::to_string);
        }
        let after = instance.state_at(now, &self.thresholds);
        if before != after {
            events::presence_transition(instance_id, state_name(&before), state_name(&after));
        }
        Ok(instance.clone())
    }

    /// Take an instance off the roster. Decommission is final: a later
    /// standdown does not soften it.
    pub fn deregister(&self, instance_id: &str, mode: DeregisterMode, now: DateTime<Utc>) -> Result<(), BusError> {
        let mut entry = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| BusError::UnknownInstance(instance_id.to_string()))?;
        if entry.is_decommissioned() {
            return Ok(());
        }
        let before = entry.state_at(now, &self.thresholds);
        entry.deregistered = Some((mode, now));
        let after = entry.state_at(now, &self.thresholds);
        events::presence_transition(instance_id, state_name(&before), state_name(&after));
        Ok(())
    }

    pub fn get(&self, instance_id: &str) -> Option<AgentInstance> {
        self.instances.get(instance_id).map(|r| r.clone())
    }

    pub fn liveness(&self, instance_id: &str, now: DateTime<Utc>) -> Option<Liveness> {
        self.instances
            .get(instance_id)?
            .liveness_at(now, &self.thresholds)
    }

    pub fn state(&self, instance_id: &str, now: DateTime<Utc>) -> Option<PresenceState> {
        self.instances
            .get(instance_id)
            .map(|i| i.state_at(now, &self.thresholds))
    }

    /// Instances that count as active recipients at `now`.
    pub fn live(&self, now: DateTime<Utc>) -> Vec<AgentInstance> {
        self.instances
            .iter()
            .filter(|i| i.is_live_at(now, &self.thresholds))
            .map(|i| i.value().clone())
            .collect()
    }

    /// Other checked-in, non-deregistered instances sharing `of`'s scope
    /// (every instance when `of` is unscoped), most recent first.
    pub fn peers(&self, of: &AgentInstance, now: DateTime<Utc>) -> Vec<PeerStatus> {
        let mut peers: Vec<PeerStatus> = self
            .instances
            .iter()
            .filter(|i| i.instance_id != of.instance_id && i.deregistered.is_none())
            .filter(|i| of.scope.is_none() || i.scope == of.scope)
            .filter_map(|i| {
                let liveness = i.liveness_at(now, &self.thresholds)?;
                Some(PeerStatus {
                    agent_id: i.agent_id.clone(),
                    instance_id: i.instance_id.clone(),
                    liveness,
                    status: i.status.clone(),
                    last_checkin_at: i.last_checkin_at,
                })
            })
            .collect();
        peers.sort_by(|a, b| b.last_checkin_at.cmp(&a.last_checkin_at));
        peers
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn registry() -> PresenceRegistry {
        let bus = BusConfig {
            mechanical_agents: vec!["linter".into()],
            leader_agents: vec!["steve".into()],
            ..Default::default()
        };
        PresenceRegistry::new(PresenceConfig::default(), &bus)
    }

    #[test]
    fn auto_registration_applies_name_defaults() {
        let reg = registry();
        let now = Utc::now();
        let w = reg.heartbeat("linter", "w-1", Some("avalon"), "", now).unwrap();
        assert!(w.mechanical);
        let s = reg.heartbeat("steve", "s-1", Some("avalon"), "", now).unwrap();
        assert!(s.leads("avalon"));
    }

    #[test]
    fn status_is_clipped() {
        let reg = registry();
        let long = "x".repeat(MAX_STATUS_LEN + 50);
        let inst = reg.heartbeat("mason", "i", None, &long, Utc::now()).unwrap();
        assert_eq!(inst.status.chars().count(), MAX_STATUS_LEN);
    }

    #[test]
    fn standdown_reactivates_but_decommission_rejects() {
        let reg = registry();
        let now = Utc::now();
        reg.heartbeat("mason", "i-1", None, "", now).unwrap();
        reg.deregister("i-1", DeregisterMode::Standdown, now).unwrap();
        assert!(reg.live(now).is_empty());
        reg.heartbeat("mason", "i-1", None, "back", now).unwrap();
        assert_eq!(reg.live(now).len(), 1);

        reg.deregister("i-1", DeregisterMode::Decommission, now).unwrap();
        reg.deregister("i-1", DeregisterMode::Standdown, now).unwrap();
        let err = reg.heartbeat("mason", "i-1", None, "", now).unwrap_err();
        assert!(matches!(err, BusError::StaleInstance { .. }));
    }

    #[test]
    fn unknown_instance_cannot_be_deregistered() {
        let reg = registry();
        let err = reg.deregister("ghost", DeregisterMode::Standdown, Utc::now()).unwrap_err();
        assert!(matches!(err, BusError::UnknownInstance(_)));
    }

    #[test]
    fn peers_share_scope_and_skip_self() {
        let reg = registry();
        let now = Utc::now();
        let me = reg.heartbeat("mason", "m-1", Some("avalon"), "", now).unwrap();
        reg.heartbeat("fresco", "f-1", Some("avalon"), "reviewing", now - Duration::seconds(200)).unwrap();
        reg.heartbeat("cobalt", "c-1", Some("camelot"), "", now).unwrap();
        let peers = reg.peers(&me, now);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].instance_id, "f-1");
        assert_eq!(peers[0].liveness, Liveness::PossiblyBusy);
        assert_eq!(peers[0].status, "reviewing");
    }
}
