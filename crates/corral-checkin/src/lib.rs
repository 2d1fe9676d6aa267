//! # corral-checkin
//!
//! One call per work-phase transition: heartbeat, drain messages, report
//! status, and get back a small, ranked view of the work around you.

pub mod assembler;
pub mod pane;
pub mod ranking;
pub mod tier;

pub use assembler::{CheckinAssembler, CheckinRequest, CheckinResponse, HeartbeatAck};
pub use pane::{ContextPane, PaneBuilder, PaneItem};
pub use tier::Tier;
