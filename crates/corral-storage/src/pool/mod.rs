//! Connection pool: one serialized writer plus a pool of readers.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use corral_core::errors::CorralResult;

pub use read_pool::ReadPool;
pub use write_connection::{IWriteSerializer, WriteConnection};

/// The single write connection plus, for file databases, its readers.
pub struct ConnectionPool {
    pub writer: Arc<WriteConnection>,
    pub readers: Option<Arc<ReadPool>>,
}

impl ConnectionPool {
    /// Open a connection pool for the given database file.
    pub fn open(
        path: &Path,
        read_pool_size: usize,
        busy_timeout_ms: u32,
        write_timeout: Duration,
    ) -> CorralResult<Self> {
        let writer = WriteConnection::open(path, busy_timeout_ms, write_timeout)?;
        let readers = ReadPool::open(path, read_pool_size, busy_timeout_ms)?;
        Ok(Self {
            writer: Arc::new(writer),
            readers: Some(Arc::new(readers)),
        })
    }

    /// In-memory pool. A `:memory:` database is private to its connection,
    /// so there are no readers and reads go through the writer.
    pub fn open_in_memory(write_timeout: Duration) -> CorralResult<Self> {
        Ok(Self {
            writer: Arc::new(WriteConnection::open_in_memory(write_timeout)?),
            readers: None,
        })
    }
}
