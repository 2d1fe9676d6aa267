//! Records, messages, addresses, presence, and shadow models.

pub mod address;
pub mod message;
pub mod presence;
pub mod record;
pub mod scope;
pub mod shadow;

pub use address::Address;
pub use message::{Message, MessageKind, Priority};
pub use presence::{AgentInstance, DeregisterMode, Liveness, PresenceState};
pub use record::{Entity, Event, Payload, RecordClass, WriteNotification, WriteOp};
pub use scope::Scope;
pub use shadow::{GraphEdge, GraphNode, Neighbor, SemanticRecord};
