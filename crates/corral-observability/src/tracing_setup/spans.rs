//! Span definitions for the coordination paths.

/// Span around one serialized write.
#[macro_export]
macro_rules! write_span {
    ($kind:expr, $id:expr) => {
        tracing::info_span!("corral.write", kind = %$kind, id = %$id)
    };
}

/// Span around one checkin.
#[macro_export]
macro_rules! checkin_span {
    ($agent_id:expr, $instance_id:expr) => {
        tracing::info_span!("corral.checkin", agent_id = %$agent_id, instance_id = %$instance_id)
    };
}

/// Span around one shadow propagation.
#[macro_export]
macro_rules! propagation_span {
    ($kind:expr, $id:expr) => {
        tracing::debug_span!("corral.shadow", kind = %$kind, id = %$id)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const WRITE: &str = "corral.write";
    pub const CHECKIN: &str = "corral.checkin";
    pub const SHADOW: &str = "corral.shadow";
}
