//! The checkin operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use corral_bus::{MessagingHub, PeerStatus};
use corral_core::config::CheckinConfig;
use corral_core::errors::CorralResult;
use corral_core::models::{AgentInstance, GraphNode, Liveness, Message};
use corral_core::traits::{Filters, IGateway};
use corral_observability::{checkin_span, events, CoordinationMetrics};

use crate::pane::{ContextPane, PaneBuilder};
use crate::tier::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub agent_id: String,
    pub instance_id: String,
    /// Free text; clipped to `MAX_STATUS_LEN` characters.
    #[serde(default)]
    pub status: String,
    /// Used only when the instance is not registered yet.
    #[serde(default)]
    pub scope: Option<String>,
}

impl CheckinRequest {
    pub fn new(agent_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            instance_id: instance_id.into(),
            status: String::new(),
            scope: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn in_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatAck {
    pub instance_id: String,
    pub acknowledged_at: DateTime<Utc>,
    pub liveness: Liveness,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub messages: Vec<Message>,
    /// `None` when the tier has no budget, nothing relevant is connected,
    /// or assembly ran past its bound.
    pub context: Option<ContextPane>,
    /// Other live instances in the caller's scope.
    pub peers: Vec<PeerStatus>,
    pub heartbeat_ack: HeartbeatAck,
}

pub struct CheckinAssembler<G: IGateway> {
    gateway: Arc<G>,
    hub: Arc<MessagingHub>,
    panes: PaneBuilder,
    config: CheckinConfig,
    metrics: Arc<CoordinationMetrics>,
}

impl<G: IGateway> CheckinAssembler<G> {
    pub fn new(
        gateway: Arc<G>,
        hub: Arc<MessagingHub>,
        panes: PaneBuilder,
        config: CheckinConfig,
        metrics: Arc<CoordinationMetrics>,
    ) -> Self {
        Self {
            gateway,
            hub,
            panes,
            config,
            metrics,
        }
    }

    pub async fn checkin(&self, request: CheckinRequest) -> CorralResult<CheckinResponse> {
        self.checkin_at(request, Utc::now()).await
    }

    /// Heartbeat, drain, then assemble the pane, all as of `now`.
    pub async fn checkin_at(&self, request: CheckinRequest, now: DateTime<Utc>) -> CorralResult<CheckinResponse> {
        let span = checkin_span!(request.agent_id, request.instance_id);
        self.run(request, now).instrument(span).await
    }

    async fn run(&self, request: CheckinRequest, now: DateTime<Utc>) -> CorralResult<CheckinResponse> {
        let instance = self.hub.heartbeat(
            &request.agent_id,
            &request.instance_id,
            request.scope.as_deref(),
            &request.status,
            now,
        )?;
        let messages = self.hub.drain(&instance.instance_id, now)?;
        let tier = Tier::for_instance(&instance, &self.config);
        let context = self.pane(&instance, tier, now).await;
        let peers = self.hub.peers(&instance, now);
        self.metrics.record_checkin();
        tracing::debug!(
            messages = messages.len(),
            has_context = context.is_some(),
            peers = peers.len(),
            "checkin complete"
        );

        Ok(CheckinResponse {
            messages,
            context,
            peers,
            heartbeat_ack: HeartbeatAck {
                instance_id: instance.instance_id,
                acknowledged_at: now,
                liveness: Liveness::Active,
                tier,
            },
        })
    }

    /// `Agent:{agent}` plus every live ticket assigned to the agent.
    async fn seeds(&self, agent_id: &str) -> Vec<String> {
        let mut seeds = vec![GraphNode::node_key("Agent", agent_id)];
        let mut filters = Filters::new();
        filters.insert("assignee".to_string(), serde_json::Value::from(agent_id));
        match self.gateway.list("ticket", &filters).await {
            Ok(tickets) => {
                seeds.extend(tickets.iter().map(|t| GraphNode::node_key("Ticket", &t.id)));
            }
            Err(e) => tracing::debug!(error = %e, "ticket assignments unavailable for pane seeds"),
        }
        seeds
    }

    async fn pane(&self, instance: &AgentInstance, tier: Tier, now: DateTime<Utc>) -> Option<ContextPane> {
        let budget = tier.budget(&self.config.tier_budgets);
        if budget == 0 {
            return None;
        }
        let build = async {
            let seeds = self.seeds(&instance.agent_id).await;
            let panes = self.panes.clone();
            tokio::task::spawn_blocking(move || panes.build(&seeds, tier, budget, now)).await
        };
        let bound = Duration::from_millis(self.config.pane_timeout_ms);
        match tokio::time::timeout(bound, build).await {
            Ok(Ok(Ok(pane))) => pane,
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, "context pane query failed");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "context pane task failed");
                None
            }
            Err(_) => {
                self.metrics.record_pane_timeout();
                events::pane_timed_out(&instance.instance_id, self.config.pane_timeout_ms);
                None
            }
        }
    }
}
