//! The Shadow Propagator.
//!
//! Subscribes to write notifications and applies each one in its own
//! detached task. A failed attempt is retried with capped exponential
//! backoff; once the attempts are spent the propagation is logged,
//! counted, dead-lettered, and dropped.
//!
//! Tasks may finish out of commit order. A save whose source has already
//! been applied at a later commit time is superseded, not applied.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::Instrument;

use corral_core::errors::ShadowError;
use corral_core::models::WriteNotification;
use corral_core::traits::{ISemanticStore, IStructuralStore};
use corral_observability::{events, propagation_span, CoordinationMetrics};

use crate::dead_letter::{DeadLetter, DeadLetterSink};
use crate::mapping::{ShadowMapping, ShadowPlan};
use crate::retry::RetryPolicy;

/// How one notification ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagationOutcome {
    Applied { attempts: u32 },
    /// A later save of the same record was applied first.
    Superseded,
    /// No mapping for the kind.
    Skipped,
    Dropped { attempts: u32 },
}

pub struct ShadowPropagator {
    mapping: Arc<ShadowMapping>,
    semantic: Arc<dyn ISemanticStore>,
    structural: Arc<dyn IStructuralStore>,
    retry: RetryPolicy,
    dead_letters: Arc<DeadLetterSink>,
    metrics: Arc<CoordinationMetrics>,
    /// Commit time of the last save applied per `kind/id`.
    applied_at: DashMap<String, DateTime<Utc>>,
    in_flight: AtomicUsize,
    /// Notifications fully handled, including skipped and lagged ones.
    completed: AtomicU64,
}

impl ShadowPropagator {
    pub fn new(
        mapping: ShadowMapping,
        semantic: Arc<dyn ISemanticStore>,
        structural: Arc<dyn IStructuralStore>,
        retry: RetryPolicy,
        dead_letters: Arc<DeadLetterSink>,
        metrics: Arc<CoordinationMetrics>,
    ) -> Self {
        Self {
            mapping: Arc::new(mapping),
            semantic,
            structural,
            retry,
            dead_letters,
            metrics,
            applied_at: DashMap::new(),
            in_flight: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn mapping(&self) -> &ShadowMapping {
        &self.mapping
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterSink> {
        &self.dead_letters
    }

    /// Propagations started but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Notifications fully handled so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Apply one plan to both stores. Safe to repeat.
    pub fn apply(&self, plan: &ShadowPlan) -> Result<(), ShadowError> {
        if let Some(record) = &plan.semantic {
            self.semantic.upsert(record.clone())?;
        }
        for node in &plan.nodes {
            self.structural.merge_node(node.clone())?;
        }
        for edge in &plan.edges {
            self.structural.merge_edge(edge.clone())?;
        }
        if plan.replaces_edges {
            let removed = self.structural.retract_stale(&plan.source, &plan.edge_keys())?;
            if removed > 0 {
                tracing::debug!(source = %plan.source, removed, "retracted stale edges");
            }
        }
        Ok(())
    }

    /// Apply a save unless a later save of the same source got there first.
    /// The source's entry stays locked for the whole apply so two saves of
    /// one record never interleave. Events are applied unconditionally.
    fn apply_latest(&self, plan: &ShadowPlan, committed_at: DateTime<Utc>) -> Result<bool, ShadowError> {
        if !plan.replaces_edges {
            return self.apply(plan).map(|()| true);
        }
        let mut mark = self
            .applied_at
            .entry(plan.source.clone())
            .or_insert(DateTime::<Utc>::MIN_UTC);
        if *mark > committed_at {
            return Ok(false);
        }
        self.apply(plan)?;
        *mark = committed_at;
        Ok(true)
    }

    /// Derive and apply with retries. Never returns an error.
    pub async fn propagate(&self, notification: WriteNotification) -> PropagationOutcome {
        let Some(plan) = self.mapping.plan(&notification) else {
            tracing::trace!(kind = %notification.kind, "no shadow mapping, skipping");
            return PropagationOutcome::Skipped;
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.apply_latest(&plan, notification.committed_at) {
                Ok(true) => {
                    self.metrics.record_propagated();
                    return PropagationOutcome::Applied { attempts: attempt };
                }
                Ok(false) => {
                    tracing::debug!(source = %plan.source, "superseded by a later save");
                    self.metrics.record_propagated();
                    return PropagationOutcome::Superseded;
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    self.metrics.record_shadow_retry();
                    events::shadow_retry(plan.key(), attempt, &e.to_string());
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
                Err(e) => {
                    let failure = ShadowError::PropagationFailed {
                        key: plan.key().to_string(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    };
                    self.metrics.record_shadow_failure();
                    events::shadow_dropped(plan.key(), attempt, &failure.to_string());
                    self.dead_letters.push(DeadLetter {
                        key: plan.key().to_string(),
                        attempts: attempt,
                        error: e.to_string(),
                        notification,
                        dropped_at: Utc::now(),
                    });
                    return PropagationOutcome::Dropped { attempts: attempt };
                }
            }
        }
    }

    /// Spawn one detached task for this notification.
    pub fn dispatch(self: &Arc<Self>, notification: WriteNotification) -> JoinHandle<PropagationOutcome> {
        let this = Arc::clone(self);
        this.in_flight.fetch_add(1, Ordering::AcqRel);
        let span = propagation_span!(notification.kind, notification.id);
        tokio::spawn(
            async move {
                let outcome = this.propagate(notification).await;
                this.completed.fetch_add(1, Ordering::AcqRel);
                this.in_flight.fetch_sub(1, Ordering::AcqRel);
                outcome
            }
            .instrument(span),
        )
    }

    /// Consume notifications until the sender closes, dispatching each.
    pub fn spawn(self: Arc<Self>, mut rx: broadcast::Receiver<WriteNotification>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => {
                        self.dispatch(notification);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        for _ in 0..skipped {
                            self.metrics.record_shadow_failure();
                        }
                        self.completed.fetch_add(skipped, Ordering::AcqRel);
                        events::notifications_lagged(skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("write notification channel closed, propagator stopping");
        })
    }

    /// Wait until at least `count` notifications have been handled and
    /// nothing is in flight. `false` on timeout.
    pub async fn wait_for(&self, count: u64, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.completed() < count || self.in_flight() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }
}
