use serde::{Deserialize, Serialize};

use super::defaults;

/// Primary store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database. Default: "corral.db".
    pub db_path: String,
    /// Number of read connections. Default: 4.
    pub read_pool_size: usize,
    /// SQLite busy timeout in milliseconds. Default: 5000.
    pub busy_timeout_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Write Serializer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Bound on waiting for the write lock. Default: 5000.
    pub write_timeout_ms: u64,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: defaults::DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}
