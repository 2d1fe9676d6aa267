//! The Write Serializer: the single owner of the primary store's write handle.
//!
//! Every mutation acquires one `tokio::sync::Mutex`, which queues waiters in
//! arrival order. A waiter that is not served within the configured bound
//! gives up with `WriteTimeout` and leaves the queue without touching the
//! store. The closure then runs on the blocking pool while the lock is held.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tokio::sync::{Mutex, OwnedMutexGuard};

use corral_core::errors::{CorralResult, StoreError};

use super::pragmas::apply_pragmas;
use crate::migrations;
use crate::to_storage_err;

/// Strict ordering, bounded wait, no caller-visible deadlock.
///
/// `kind` and `id` identify the write for error reporting only.
pub trait IWriteSerializer: Send + Sync + 'static {
    fn write<F, T>(
        &self,
        kind: &str,
        id: &str,
        f: F,
    ) -> impl Future<Output = CorralResult<T>> + Send
    where
        F: FnOnce(&Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static;

    /// Run a read on the write handle, waiting without a bound.
    /// Only used when no read pool exists (in-memory databases).
    fn read<F, T>(&self, f: F) -> impl Future<Output = CorralResult<T>> + Send
    where
        F: FnOnce(&Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static;

    fn write_timeout(&self) -> Duration;
}

/// Mutex-guarded write connection.
pub struct WriteConnection {
    conn: Arc<Mutex<Connection>>,
    write_timeout: Duration,
}

impl WriteConnection {
    /// Open the write connection, apply pragmas, and run migrations.
    pub fn open(path: &Path, busy_timeout_ms: u32, write_timeout: Duration) -> CorralResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        migrations::run_migrations(&conn)?;
        Ok(Self::from_connection(conn, write_timeout))
    }

    /// Open an in-memory write connection (for testing).
    pub fn open_in_memory(write_timeout: Duration) -> CorralResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| to_storage_err(e.to_string()))?;
        migrations::run_migrations(&conn)?;
        Ok(Self::from_connection(conn, write_timeout))
    }

    fn from_connection(conn: Connection, write_timeout: Duration) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            write_timeout,
        }
    }

    /// Acquire the lock within the configured bound.
    async fn acquire(&self, kind: &str, id: &str) -> CorralResult<OwnedMutexGuard<Connection>> {
        let started = Instant::now();
        match tokio::time::timeout(self.write_timeout, Arc::clone(&self.conn).lock_owned()).await
        {
            Ok(guard) => Ok(guard),
            Err(_) => Err(StoreError::WriteTimeout {
                kind: kind.to_string(),
                id: id.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            }
            .into()),
        }
    }

    /// Hold the lock for `hold` without writing. Used to exercise contention.
    #[doc(hidden)]
    pub async fn hold_for(&self, hold: Duration) {
        let _guard = self.conn.lock().await;
        tokio::time::sleep(hold).await;
    }
}

async fn run_blocking<F, T>(guard: OwnedMutexGuard<Connection>, f: F) -> CorralResult<T>
where
    F: FnOnce(&Connection) -> CorralResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&guard))
        .await
        .map_err(|e| to_storage_err(format!("write task failed: {e}")))?
}

impl IWriteSerializer for WriteConnection {
    async fn write<F, T>(&self, kind: &str, id: &str, f: F) -> CorralResult<T>
    where
        F: FnOnce(&Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.acquire(kind, id).await?;
        run_blocking(guard, f).await
    }

    async fn read<F, T>(&self, f: F) -> CorralResult<T>
    where
        F: FnOnce(&Connection) -> CorralResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = Arc::clone(&self.conn).lock_owned().await;
        run_blocking(guard, f).await
    }

    fn write_timeout(&self) -> Duration {
        self.write_timeout
    }
}
