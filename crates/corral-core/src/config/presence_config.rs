use serde::{Deserialize, Serialize};

use super::defaults;

/// Liveness thresholds, in seconds since the last checkin.
///
/// `< active_secs` is active, up to `busy_secs` possibly busy, up to
/// `stale_secs` stale, and anything beyond is unresponsive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub active_secs: u64,
    pub busy_secs: u64,
    pub stale_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            active_secs: defaults::DEFAULT_ACTIVE_SECS,
            busy_secs: defaults::DEFAULT_BUSY_SECS,
            stale_secs: defaults::DEFAULT_STALE_SECS,
        }
    }
}
