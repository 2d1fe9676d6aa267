/// Errors raised by the Store Gateway and the Write Serializer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    /// The write lock was not acquired within the configured bound.
    #[error("write to {kind}/{id} timed out after {waited_ms}ms waiting for the write lock")]
    WriteTimeout {
        kind: String,
        id: String,
        waited_ms: u64,
    },

    /// A record arrived with one or more empty scoping dimensions.
    #[error("{kind}/{id} is missing required scope fields: {}", missing.join(", "))]
    ScopeMismatch {
        kind: String,
        id: String,
        missing: Vec<String>,
    },

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("unknown filter field '{field}' for kind {kind} (allowed: {})", allowed.join(", "))]
    UnknownFilter {
        kind: String,
        field: String,
        allowed: Vec<String>,
    },

    #[error("{kind}/{id} is missing required payload field '{field}'")]
    MissingField {
        kind: String,
        id: String,
        field: String,
    },

    /// An entity operation was attempted on an event kind, or vice versa.
    #[error("kind {kind} is not an {expected} kind")]
    ClassMismatch { kind: String, expected: String },

    #[error("invalid record {kind}/{id}: {reason}")]
    InvalidRecord {
        kind: String,
        id: String,
        reason: String,
    },
}
