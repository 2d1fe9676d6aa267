//! Error types for every Corral subsystem, folded into [`CorralError`].

mod bus_error;
mod config_error;
mod shadow_error;
mod store_error;

pub use bus_error::BusError;
pub use config_error::ConfigError;
pub use shadow_error::ShadowError;
pub use store_error::StoreError;

/// Top-level error returned by every caller-facing Corral operation.
#[derive(Debug, thiserror::Error)]
pub enum CorralError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Shadow(#[from] ShadowError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

impl CorralError {
    /// Whether the caller may retry the same call unchanged.
    ///
    /// Only a write that timed out waiting for the serializer qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CorralError::Store(StoreError::WriteTimeout { .. }))
    }
}

/// Convenience alias used throughout the workspace.
pub type CorralResult<T> = Result<T, CorralError>;
