use serde::{Deserialize, Serialize};

use super::defaults;

/// Shadow Propagator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Attempts per propagation, including the first. Default: 3.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per retry. Default: 50.
    pub base_backoff_ms: u64,
    /// Upper bound on a single retry delay. Default: 2000.
    pub max_backoff_ms: u64,
    /// Capacity of the write-notification channel. Default: 1024.
    pub notification_capacity: usize,
    /// Dropped propagations retained for inspection. Default: 256.
    pub dead_letter_capacity: usize,
    /// Optional TOML file overriding the built-in kind → shadow mapping.
    pub mapping_path: Option<String>,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_SHADOW_MAX_ATTEMPTS,
            base_backoff_ms: defaults::DEFAULT_SHADOW_BASE_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_SHADOW_MAX_BACKOFF_MS,
            notification_capacity: defaults::DEFAULT_NOTIFICATION_CAPACITY,
            dead_letter_capacity: defaults::DEFAULT_DEAD_LETTER_CAPACITY,
            mapping_path: None,
        }
    }
}
