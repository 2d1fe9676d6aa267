// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "corral.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Serializer ---
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

// --- Shadow ---
pub const DEFAULT_SHADOW_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_SHADOW_BASE_BACKOFF_MS: u64 = 50;
pub const DEFAULT_SHADOW_MAX_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1_024;
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 256;

// --- Bus ---
pub const DEFAULT_MESSAGE_TTL_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_GC_INTERVAL_SECS: u64 = 60;

// --- Presence ---
pub const DEFAULT_ACTIVE_SECS: u64 = 120; // 2 minutes
pub const DEFAULT_BUSY_SECS: u64 = 300; // 5 minutes
pub const DEFAULT_STALE_SECS: u64 = 600; // 10 minutes

// --- Checkin ---
pub const DEFAULT_MECHANICAL_BUDGET: usize = 0;
pub const DEFAULT_EXECUTION_BUDGET: usize = 200;
pub const DEFAULT_SENIOR_BUDGET: usize = 300;
pub const DEFAULT_LEADER_BUDGET: usize = 500;
pub const DEFAULT_HOP_RADIUS: usize = 2;
pub const DEFAULT_PANE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MAX_PANE_ITEMS: usize = 24;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
