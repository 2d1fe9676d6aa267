use std::path::Path;

use corral_core::config::CorralConfig;
use corral_core::errors::CorralResult;
use corral_shadow::ShadowMapping;
use corral_storage::KindRegistry;

/// Everything needed to start a [`CoordinationEngine`](crate::CoordinationEngine).
pub struct RuntimeOptions {
    pub config: CorralConfig,
    /// Keep the primary store in memory instead of at `config.storage.db_path`.
    pub in_memory: bool,
    pub registry: KindRegistry,
    /// Overrides `config.shadow.mapping_path` when set.
    pub mapping: Option<ShadowMapping>,
    /// Capacity of the token-count cache.
    pub token_cache_capacity: u64,
    /// Install the tracing subscriber from `config.observability`.
    pub init_tracing: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config: CorralConfig::default(),
            in_memory: false,
            registry: KindRegistry::with_defaults(),
            mapping: None,
            token_cache_capacity: 10_000,
            init_tracing: false,
        }
    }
}

impl RuntimeOptions {
    /// Defaults with an in-memory primary store.
    ///
    /// An in-memory store has no read pool: reads go through the writer's
    /// connection and queue behind any write in progress. Only file-backed
    /// stores keep reads off the Write Serializer.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    /// Resolve configuration from `path` (if any) and `CORRAL_*` overrides.
    pub fn from_config_file(path: Option<&Path>) -> CorralResult<Self> {
        Ok(Self {
            config: CorralConfig::load(path)?,
            init_tracing: true,
            ..Self::default()
        })
    }

    pub fn with_config(mut self, config: CorralConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_mapping(mut self, mapping: ShadowMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }
}
