//! CoordinationEngine: owns every component and the background tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use corral_bus::MessagingHub;
use corral_checkin::{CheckinAssembler, CheckinRequest, CheckinResponse, PaneBuilder};
use corral_core::config::CorralConfig;
use corral_core::errors::CorralResult;
use corral_core::models::{
    AgentInstance, DeregisterMode, Entity, Event, Liveness, MessageKind, Priority, SemanticRecord,
};
use corral_core::traits::{Filters, IGateway, ILiveChannel, IStructuralStore};
use corral_observability::{CoordinationMetrics, MetricsSnapshot};
use corral_shadow::{
    DeadLetter, DeadLetterSink, GraphStore, InMemorySemanticStore, RetryPolicy, ShadowMapping,
    ShadowPropagator,
};
use corral_storage::StorageEngine;
use corral_tokens::TokenCounter;

use crate::options::RuntimeOptions;

pub struct CoordinationEngine {
    storage: Arc<StorageEngine>,
    propagator: Arc<ShadowPropagator>,
    semantic: Arc<InMemorySemanticStore>,
    graph: Arc<GraphStore>,
    hub: Arc<MessagingHub>,
    assembler: CheckinAssembler<StorageEngine>,
    metrics: Arc<CoordinationMetrics>,
    config: CorralConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl CoordinationEngine {
    /// Open the primary store, then start the propagator and the message GC.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(options: RuntimeOptions) -> CorralResult<Self> {
        let RuntimeOptions {
            config,
            in_memory,
            registry,
            mapping,
            token_cache_capacity,
            init_tracing,
        } = options;
        config.validate()?;
        if init_tracing {
            corral_observability::init_from_config(&config.observability);
        }

        let metrics = Arc::new(CoordinationMetrics::new());
        let storage = Arc::new(if in_memory {
            StorageEngine::open_in_memory_with_config(&config, registry, metrics.clone())?
        } else {
            StorageEngine::open_with_config(&config, registry, metrics.clone())?
        });

        let mapping = match mapping {
            Some(mapping) => mapping,
            None => ShadowMapping::load(config.shadow.mapping_path.as_deref())?,
        };
        let semantic = Arc::new(InMemorySemanticStore::new());
        let graph = Arc::new(GraphStore::new());
        let propagator = Arc::new(ShadowPropagator::new(
            mapping,
            semantic.clone(),
            graph.clone(),
            RetryPolicy::from_config(&config.shadow),
            Arc::new(DeadLetterSink::new(config.shadow.dead_letter_capacity)),
            metrics.clone(),
        ));

        let hub = Arc::new(MessagingHub::new(
            &config.bus,
            config.presence.clone(),
            metrics.clone(),
        ));
        let panes = PaneBuilder::new(
            graph.clone(),
            Arc::new(TokenCounter::new(token_cache_capacity)),
            config.checkin.hop_radius,
            config.checkin.max_pane_items,
        );
        let assembler = CheckinAssembler::new(
            storage.clone(),
            hub.clone(),
            panes,
            config.checkin.clone(),
            metrics.clone(),
        );

        let tasks = vec![
            propagator.clone().spawn(storage.subscribe()),
            hub.spawn_gc(),
        ];
        tracing::info!(
            in_memory,
            mapping_version = propagator.mapping().version,
            kinds = storage.registry().kinds().len(),
            "coordination engine started"
        );

        Ok(Self {
            storage,
            propagator,
            semantic,
            graph,
            hub,
            assembler,
            metrics,
            config,
            tasks,
        })
    }

    /// In-memory engine with default configuration.
    pub fn in_memory() -> CorralResult<Self> {
        Self::start(RuntimeOptions::in_memory())
    }

    /// File-backed engine at `path` with default configuration.
    pub fn open(path: &Path) -> CorralResult<Self> {
        let mut config = CorralConfig::default();
        config.storage.db_path = path.display().to_string();
        Self::start(RuntimeOptions::default().with_config(config))
    }

    pub fn config(&self) -> &CorralConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn hub(&self) -> &Arc<MessagingHub> {
        &self.hub
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    // --- messaging & presence ---

    /// Send an `inform` message. Returns the message id.
    pub fn send(&self, from: &str, to: &str, body: &str, priority: Priority) -> CorralResult<String> {
        self.send_kind(from, to, body, MessageKind::Inform, priority)
    }

    pub fn send_kind(
        &self,
        from: &str,
        to: &str,
        body: &str,
        kind: MessageKind,
        priority: Priority,
    ) -> CorralResult<String> {
        Ok(self.hub.send(from, to, body, kind, priority)?)
    }

    pub async fn checkin(&self, request: CheckinRequest) -> CorralResult<CheckinResponse> {
        self.assembler.checkin(request).await
    }

    pub fn register(&self, instance: AgentInstance) -> CorralResult<AgentInstance> {
        Ok(self.hub.register(instance)?)
    }

    pub fn deregister(&self, instance_id: &str, mode: DeregisterMode) -> CorralResult<()> {
        Ok(self.hub.deregister(instance_id, mode)?)
    }

    pub fn register_live_channel(&self, instance_id: &str, channel: Arc<dyn ILiveChannel>) {
        self.hub.register_live_channel(instance_id, channel);
    }

    pub fn unregister_live_channel(&self, instance_id: &str) -> bool {
        self.hub.unregister_live_channel(instance_id)
    }

    pub fn liveness(&self, instance_id: &str) -> Option<Liveness> {
        self.hub.liveness(instance_id, Utc::now())
    }

    // --- derived views ---

    /// Wait until every committed write so far has been propagated (or
    /// dropped). `false` on timeout. Only useful in tests and tooling: the
    /// write path never waits on this.
    pub async fn settle(&self, timeout: Duration) -> bool {
        let committed = self.metrics.snapshot().writes_committed;
        self.propagator.wait_for(committed, timeout).await
    }

    /// Semantic records whose text contains `needle`, newest first.
    pub fn search(&self, needle: &str, limit: usize) -> Vec<SemanticRecord> {
        self.semantic.search(needle, limit)
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.propagator.dead_letters().snapshot()
    }

    pub fn shadow_counts(&self) -> (usize, usize) {
        (self.graph.node_count(), self.graph.edge_count())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop the background tasks. In-flight propagations are abandoned.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for CoordinationEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl IGateway for CoordinationEngine {
    async fn get(&self, kind: &str, id: &str) -> CorralResult<Option<Entity>> {
        self.storage.get(kind, id).await
    }

    async fn list(&self, kind: &str, filters: &Filters) -> CorralResult<Vec<Entity>> {
        self.storage.list(kind, filters).await
    }

    async fn save(&self, entity: Entity) -> CorralResult<String> {
        self.storage.save(entity).await
    }

    async fn delete(&self, kind: &str, id: &str) -> CorralResult<bool> {
        self.storage.delete(kind, id).await
    }

    async fn append(&self, event: Event) -> CorralResult<String> {
        self.storage.append(event).await
    }

    async fn events(&self, kind: &str, filters: &Filters) -> CorralResult<Vec<Event>> {
        self.storage.events(kind, filters).await
    }

    async fn count(&self, kind: &str, filters: &Filters) -> CorralResult<usize> {
        self.storage.count(kind, filters).await
    }
}
