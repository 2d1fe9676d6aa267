/// Errors raised by the Presence & Messaging Hub.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The `to` address does not match `agent[.instance][@scope]`,
    /// `@anyone[@scope]`, or `@everyone[@scope]`.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A decommissioned instance attempted to check in.
    #[error("instance {instance_id} has been decommissioned")]
    StaleInstance { instance_id: String },

    #[error("unknown instance: {0}")]
    UnknownInstance(String),

    #[error("live channel for instance {instance_id} is closed")]
    ChannelClosed { instance_id: String },
}
