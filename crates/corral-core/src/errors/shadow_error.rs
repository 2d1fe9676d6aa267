/// Errors raised inside the Shadow Propagator.
///
/// These never reach the caller of the write that triggered propagation;
/// they are logged, counted, and dead-lettered.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShadowError {
    #[error("semantic store write failed for {key}: {reason}")]
    SemanticWrite { key: String, reason: String },

    #[error("structural store write failed for {key}: {reason}")]
    StructuralWrite { key: String, reason: String },

    #[error("structural query failed: {0}")]
    StructuralQuery(String),

    #[error("propagation of {key} failed after {attempts} attempts: {last_error}")]
    PropagationFailed {
        key: String,
        attempts: u32,
        last_error: String,
    },

    #[error("invalid shadow mapping: {0}")]
    InvalidMapping(String),
}
