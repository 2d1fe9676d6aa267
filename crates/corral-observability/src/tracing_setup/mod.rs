//! Tracing setup: structured JSON logging filtered by `CORRAL_LOG`.

pub mod events;
pub mod spans;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use corral_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "CORRAL_LOG";

/// Initialize the tracing subscriber with structured JSON output.
///
/// Respects `CORRAL_LOG`; defaults to `info`. Idempotent.
pub fn init_tracing() {
    init_from_config(&ObservabilityConfig::default());
}

/// Initialize from configuration. `CORRAL_LOG` still wins when set.
pub fn init_from_config(config: &ObservabilityConfig) {
    let level = config.log_level.clone();
    let json = config.json;
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true);
        // A subscriber may already be installed by the embedding process.
        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}

/// Initialize tracing with a custom filter string (for testing or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let filter = EnvFilter::new(filter);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
