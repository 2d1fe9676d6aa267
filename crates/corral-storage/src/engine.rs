//! StorageEngine: the Store Gateway.
//!
//! Owns the serialized writer, the read pool, the kind registry, and the
//! write-notification channel. Implements [`IGateway`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::Instrument;

use corral_core::config::{CorralConfig, ShadowConfig, StorageConfig};
use corral_core::errors::{CorralError, CorralResult, StoreError};
use corral_core::models::{Entity, Event, RecordClass, WriteNotification};
use corral_core::traits::{Filters, IGateway};
use corral_observability::{events, write_span, CoordinationMetrics};

use crate::filters;
use crate::pool::{ConnectionPool, IWriteSerializer, ReadPool, WriteConnection};
use crate::queries::{entity_ops, event_ops};
use crate::registry::{KindRegistry, KindSpec};

/// The Store Gateway over a serialized writer `W`.
pub struct StorageEngine<W: IWriteSerializer = WriteConnection> {
    writer: Arc<W>,
    /// `None` routes reads through the writer (in-memory databases only).
    readers: Option<Arc<ReadPool>>,
    registry: Arc<KindRegistry>,
    notifications: broadcast::Sender<WriteNotification>,
    metrics: Arc<CoordinationMetrics>,
}

impl StorageEngine<WriteConnection> {
    /// Open a file-backed engine with default settings and kinds.
    pub fn open(path: &Path) -> CorralResult<Self> {
        let mut config = CorralConfig::default();
        config.storage.db_path = path.display().to_string();
        Self::open_with_config(&config, KindRegistry::with_defaults(), Arc::default())
    }

    /// Open a file-backed engine at `config.storage.db_path`.
    pub fn open_with_config(
        config: &CorralConfig,
        registry: KindRegistry,
        metrics: Arc<CoordinationMetrics>,
    ) -> CorralResult<Self> {
        let StorageConfig {
            db_path,
            read_pool_size,
            busy_timeout_ms,
        } = &config.storage;
        let pool = ConnectionPool::open(
            Path::new(db_path),
            *read_pool_size,
            *busy_timeout_ms,
            Duration::from_millis(config.serializer.write_timeout_ms),
        )?;
        let readers = pool.readers.as_ref().map_or(0, |r| r.size());
        tracing::info!(db_path = %db_path, readers, "opened primary store");
        Ok(Self::from_parts(
            pool.writer,
            pool.readers,
            registry,
            &config.shadow,
            metrics,
        ))
    }

    /// Open an in-memory engine with default kinds (for testing).
    pub fn open_in_memory() -> CorralResult<Self> {
        Self::open_in_memory_with(
            Duration::from_millis(corral_core::config::defaults::DEFAULT_WRITE_TIMEOUT_MS),
            KindRegistry::with_defaults(),
        )
    }

    /// In-memory engine honoring `config`'s serializer and shadow settings.
    /// Reads share the writer's connection and wait behind writes.
    pub fn open_in_memory_with_config(
        config: &CorralConfig,
        registry: KindRegistry,
        metrics: Arc<CoordinationMetrics>,
    ) -> CorralResult<Self> {
        let pool = ConnectionPool::open_in_memory(Duration::from_millis(
            config.serializer.write_timeout_ms,
        ))?;
        Ok(Self::from_parts(pool.writer, None, registry, &config.shadow, metrics))
    }

    pub fn open_in_memory_with(write_timeout: Duration, registry: KindRegistry) -> CorralResult<Self> {
        let pool = ConnectionPool::open_in_memory(write_timeout)?;
        Ok(Self::from_parts(
            pool.writer,
            None,
            registry,
            &ShadowConfig::default(),
            Arc::default(),
        ))
    }
}

impl<W: IWriteSerializer> StorageEngine<W> {
    /// Assemble an engine around any serializer implementation.
    pub fn from_parts(
        writer: Arc<W>,
        readers: Option<Arc<ReadPool>>,
        registry: KindRegistry,
        shadow: &ShadowConfig,
        metrics: Arc<CoordinationMetrics>,
    ) -> Self {
        let (notifications, _) = broadcast::channel(shadow.notification_capacity.max(1));
        Self {
            writer,
            readers,
            registry: Arc::new(registry),
            notifications,
            metrics,
        }
    }

    /// Receive a [`WriteNotification`] for every committed save and append.
    pub fn subscribe(&self) -> broadcast::Receiver<WriteNotification> {
        self.notifications.subscribe()
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn writer(&self) -> &Arc<W> {
        &self.writer
    }

    pub fn metrics(&self) -> &Arc<CoordinationMetrics> {
        &self.metrics
    }

    fn spec(&self, kind: &str, class: RecordClass) -> CorralResult<KindSpec> {
        let spec = self.registry.resolve(kind)?;
        spec.expect_class(class)?;
        Ok(spec.clone())
    }

    /// Run a read on the read pool, or on the writer when there is none.
    async fn with_reader<F, T>(&self, f: F) -> CorralResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static,
    {
        match &self.readers {
            Some(readers) => {
                let readers = Arc::clone(readers);
                tokio::task::spawn_blocking(move || readers.with_conn(f))
                    .await
                    .map_err(|e| crate::to_storage_err(format!("read task failed: {e}")))?
            }
            None => self.writer.read(f).await,
        }
    }

    /// Serialize `f`, recording timeouts.
    async fn serialized<F, T>(&self, kind: &str, id: &str, f: F) -> CorralResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let result = self.writer.write(kind, id, f).await;
        if let Err(CorralError::Store(StoreError::WriteTimeout { waited_ms, .. })) = &result {
            self.metrics.record_write_timeout();
            events::write_timed_out(kind, id, *waited_ms);
        }
        result
    }

    fn committed(&self, kind: &str, id: &str, op: &str) {
        self.metrics.record_write();
        events::write_committed(kind, id, op);
    }
}

impl<W: IWriteSerializer> IGateway for StorageEngine<W> {
    async fn get(&self, kind: &str, id: &str) -> CorralResult<Option<Entity>> {
        self.spec(kind, RecordClass::Entity)?;
        let (kind, id) = (kind.to_string(), id.to_string());
        self.with_reader(move |conn| entity_ops::get_entity(conn, &kind, &id))
            .await
    }

    async fn list(&self, kind: &str, filters: &Filters) -> CorralResult<Vec<Entity>> {
        let spec = self.spec(kind, RecordClass::Entity)?;
        let compiled = filters::compile(&spec, filters)?;
        self.with_reader(move |conn| entity_ops::list_entities(conn, &compiled))
            .await
    }

    async fn save(&self, entity: Entity) -> CorralResult<String> {
        let spec = self.spec(&entity.kind, RecordClass::Entity)?;
        spec.validate_entity(&entity)?;

        let (kind, id) = (entity.kind.clone(), entity.id.clone());
        let tx = self.notifications.clone();
        let stored = self
            .serialized(&kind, &id, move |conn| {
                let stored = entity_ops::upsert_entity(conn, &entity, Utc::now())?;
                // Sent under the lock so notification order is commit order.
                let _ = tx.send(WriteNotification::saved(&stored));
                Ok(stored)
            })
            .instrument(write_span!(kind, id))
            .await?;

        self.committed(&kind, &id, "save");
        Ok(stored.id)
    }

    async fn delete(&self, kind: &str, id: &str) -> CorralResult<bool> {
        self.spec(kind, RecordClass::Entity)?;
        let (k, i) = (kind.to_string(), id.to_string());
        let deleted = self
            .serialized(kind, id, move |conn| {
                entity_ops::soft_delete(conn, &k, &i, Utc::now())
            })
            .await?;
        if deleted {
            tracing::debug!(kind = %kind, id = %id, "entity soft-deleted");
        }
        Ok(deleted)
    }

    async fn append(&self, mut event: Event) -> CorralResult<String> {
        let spec = self.spec(&event.kind, RecordClass::Event)?;
        if event.id.trim().is_empty() {
            event.id = uuid::Uuid::new_v4().to_string();
        }
        spec.validate_event(&event)?;

        let (kind, id) = (event.kind.clone(), event.id.clone());
        let tx = self.notifications.clone();
        self.serialized(&kind, &id, move |conn| {
            event_ops::insert_event(conn, &event)?;
            let _ = tx.send(WriteNotification::appended(&event));
            Ok(())
        })
        .instrument(write_span!(kind, id))
        .await?;

        self.committed(&kind, &id, "append");
        Ok(id)
    }

    async fn events(&self, kind: &str, filters: &Filters) -> CorralResult<Vec<Event>> {
        let spec = self.spec(kind, RecordClass::Event)?;
        let compiled = filters::compile(&spec, filters)?;
        self.with_reader(move |conn| event_ops::list_events(conn, &compiled))
            .await
    }

    async fn count(&self, kind: &str, filters: &Filters) -> CorralResult<usize> {
        let spec = self.registry.resolve(kind)?.clone();
        let compiled = filters::compile(&spec, filters)?;
        match spec.class {
            RecordClass::Entity => {
                self.with_reader(move |conn| entity_ops::count_entities(conn, &compiled))
                    .await
            }
            RecordClass::Event => {
                self.with_reader(move |conn| event_ops::count_events(conn, &compiled))
                    .await
            }
        }
    }
}
