//! # corral-storage
//!
//! The Store Gateway and the Write Serializer.
//!
//! Entities and events live in one SQLite database. Every mutation goes
//! through [`WriteConnection`], a single FIFO lock with a bounded wait.
//! Reads go through a pool of read-only connections and never wait on it.
//! Each committed `save`/`append` is broadcast as a
//! [`WriteNotification`](corral_core::models::WriteNotification).

pub mod engine;
pub mod filters;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod registry;

pub use engine::StorageEngine;
pub use pool::{ConnectionPool, IWriteSerializer, ReadPool, WriteConnection};
pub use registry::{KindRegistry, KindRegistryBuilder, KindSpec};

use corral_core::errors::{CorralError, StoreError};

/// Helper to convert a SQLite-level failure into a [`CorralError`].
pub(crate) fn to_storage_err(msg: impl Into<String>) -> CorralError {
    StoreError::Sqlite {
        message: msg.into(),
    }
    .into()
}
