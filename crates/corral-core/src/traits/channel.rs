use crate::errors::BusError;
use crate::models::Message;

/// A live input channel into a locally spawned agent process.
///
/// Registered by execution adapters; used for active push delivery.
pub trait ILiveChannel: Send + Sync {
    /// Deliver immediately. An error means the recipient must drain passively.
    fn push(&self, message: &Message) -> Result<(), BusError>;

    fn is_open(&self) -> bool;
}
