//! Seams between the coordination runtime and its pluggable collaborators.

pub mod channel;
pub mod gateway;
pub mod shadow_store;

pub use channel::ILiveChannel;
pub use gateway::{Filters, IGateway};
pub use shadow_store::{ISemanticStore, IStructuralStore};
