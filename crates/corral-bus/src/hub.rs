//! The Presence & Messaging Hub: presence, pending messages, and live
//! channels behind one service object.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use corral_core::config::{BusConfig, PresenceConfig};
use corral_core::errors::BusError;
use corral_core::models::{
    Address, AgentInstance, DeregisterMode, Liveness, Message, MessageKind, Priority,
};
use corral_core::traits::ILiveChannel;
use corral_observability::{events, CoordinationMetrics};

use crate::address;
use crate::channels::LiveChannels;
use crate::presence::{PeerStatus, PresenceRegistry};
use crate::queue::{self, Disposition, MessageBus};

pub struct MessagingHub {
    presence: PresenceRegistry,
    bus: MessageBus,
    channels: LiveChannels,
    gc_interval: Duration,
    metrics: Arc<CoordinationMetrics>,
}

impl MessagingHub {
    pub fn new(bus: &BusConfig, presence: PresenceConfig, metrics: Arc<CoordinationMetrics>) -> Self {
        Self {
            presence: PresenceRegistry::new(presence, bus),
            bus: MessageBus::new(bus.message_ttl()),
            channels: LiveChannels::new(),
            gc_interval: Duration::from_secs(bus.gc_interval_secs.max(1)),
            metrics,
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn pending_count(&self) -> usize {
        self.bus.pending_count()
    }

    pub fn register(&self, instance: AgentInstance) -> Result<AgentInstance, BusError> {
        self.presence.register(instance)
    }

    /// Deregister an instance. Decommissioning also drops its live channel.
    pub fn deregister(&self, instance_id: &str, mode: DeregisterMode) -> Result<(), BusError> {
        self.presence.deregister(instance_id, mode, Utc::now())?;
        if mode == DeregisterMode::Decommission {
            self.channels.unregister(instance_id);
        }
        Ok(())
    }

    pub fn register_live_channel(&self, instance_id: &str, channel: Arc<dyn ILiveChannel>) {
        self.channels.register(instance_id, channel);
    }

    pub fn unregister_live_channel(&self, instance_id: &str) -> bool {
        self.channels.unregister(instance_id)
    }

    /// Send a message. Returns its id.
    ///
    /// Recipients with a live channel are pushed to immediately; everything
    /// else waits for the recipient's next drain.
    pub fn send(
        &self,
        from: &str,
        to: &str,
        body: &str,
        kind: MessageKind,
        priority: Priority,
    ) -> Result<String, BusError> {
        self.send_at(from, to, body, kind, priority, Utc::now())
    }

    pub fn send_at(
        &self,
        from: &str,
        to: &str,
        body: &str,
        kind: MessageKind,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<String, BusError> {
        let address = address::parse(to)?;
        let mut message = Message::new(from, to, body, kind, priority);
        message.sent_at = now;
        // Senders never receive their own traffic.
        if let Some(own) = queue::sender_instance(&message) {
            message.read_by.insert(own);
        }
        let id = message.id.clone();
        self.metrics.record_sent();
        events::message_sent(&id, from, to);

        let live = self.presence.live(now);
        let candidates: Vec<AgentInstance> = match &address {
            Address::Direct { instance: Some(target), .. } => self
                .presence
                .get(target)
                .filter(|i| i.deregistered.is_none())
                .into_iter()
                .collect(),
            _ => live.clone(),
        };
        for reader in &candidates {
            match queue::disposition(&address, &message, reader) {
                Disposition::Consume => {
                    if self.push(&message, reader) {
                        return Ok(id);
                    }
                }
                Disposition::Read if address.is_broadcast() => {
                    if self.push(&message, reader) {
                        message.read_by.insert(reader.instance_id.clone());
                    }
                }
                _ => {}
            }
        }

        if address.is_broadcast() && queue::broadcast_complete(&address, &message, &live) {
            self.metrics.record_pruned(1);
            return Ok(id);
        }
        self.bus.post(address, message);
        Ok(id)
    }

    fn push(&self, message: &Message, reader: &AgentInstance) -> bool {
        let Some(channel) = self.channels.get(&reader.instance_id) else {
            return false;
        };
        match channel.push(message) {
            Ok(()) => {
                self.metrics.record_pushed();
                events::message_pushed(&message.id, &reader.instance_id);
                true
            }
            Err(e) => {
                events::push_fell_back(&message.id, &reader.instance_id, &e.to_string());
                false
            }
        }
    }

    /// Record a checkin. See [`PresenceRegistry::heartbeat`].
    pub fn heartbeat(
        &self,
        agent_id: &str,
        instance_id: &str,
        scope: Option<&str>,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<AgentInstance, BusError> {
        self.presence
            .heartbeat(agent_id, instance_id, scope, status, now)
            .inspect_err(|e| {
                self.metrics.record_checkin_rejection();
                events::checkin_rejected(instance_id, &e.to_string());
            })
    }

    /// Drain every pending message for a registered instance.
    pub fn drain(&self, instance_id: &str, now: DateTime<Utc>) -> Result<Vec<Message>, BusError> {
        let reader = self
            .presence
            .get(instance_id)
            .ok_or_else(|| BusError::UnknownInstance(instance_id.to_string()))?;
        let live = self.presence.live(now);
        let drained = self.bus.drain(&reader, &live, now);
        self.metrics.record_delivered(drained.messages.len());
        let pruned = drained.expired + drained.completed;
        if pruned > 0 {
            self.metrics.record_pruned(pruned);
            events::messages_pruned(drained.expired, drained.completed);
        }
        Ok(drained.messages)
    }

    pub fn peers(&self, of: &AgentInstance, now: DateTime<Utc>) -> Vec<PeerStatus> {
        self.presence.peers(of, now)
    }

    pub fn liveness(&self, instance_id: &str, now: DateTime<Utc>) -> Option<Liveness> {
        self.presence.liveness(instance_id, now)
    }

    /// Drop messages older than the TTL.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = self.bus.prune_expired(now);
        if expired > 0 {
            self.metrics.record_pruned(expired);
            events::messages_pruned(expired, 0);
        }
        expired
    }

    /// Spawn the periodic GC loop. It stops once the hub is dropped.
    pub fn spawn_gc(self: &Arc<Self>) -> JoinHandle<()> {
        let hub: Weak<Self> = Arc::downgrade(self);
        let period = self.gc_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(hub) = hub.upgrade() else { break };
                hub.prune_expired(Utc::now());
            }
            tracing::debug!("messaging hub dropped, gc loop stopping");
        })
    }
}
