//! # corral-bus
//!
//! The Presence & Messaging Hub. Everything here lives in process memory:
//! a restart clears every message and presence record, and callers are
//! expected to resend.

pub mod address;
pub mod channels;
pub mod hub;
pub mod presence;
pub mod queue;

pub use address::parse as parse_address;
pub use channels::{LiveChannels, MpscChannel};
pub use hub::MessagingHub;
pub use presence::{PeerStatus, PresenceRegistry};
pub use queue::{Drained, MessageBus};
