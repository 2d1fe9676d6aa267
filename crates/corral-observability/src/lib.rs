//! # corral-observability
//!
//! Tracing subscriber setup, one structured log event per notable
//! coordination step, and the lock-free counters behind them.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{CoordinationMetrics, MetricsSnapshot};
pub use tracing_setup::{events, init_from_config, init_tracing, init_tracing_with_filter};
