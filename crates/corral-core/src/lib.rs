//! # corral-core
//!
//! Foundation crate for the Corral coordination runtime.
//! Defines records, addresses, presence models, errors, config, and the
//! traits that the storage, shadow, and bus crates implement.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::CorralConfig;
pub use errors::{CorralError, CorralResult};
pub use models::{Entity, Event, Message, Payload, Scope};
