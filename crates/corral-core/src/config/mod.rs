//! Configuration for every Corral subsystem.
//! TOML-based, 3-layer resolution: env > file > defaults.

pub mod bus_config;
pub mod checkin_config;
pub mod corral_config;
pub mod defaults;
pub mod presence_config;
pub mod shadow_config;
pub mod storage_config;

pub use bus_config::BusConfig;
pub use checkin_config::{CheckinConfig, TierBudgets};
pub use corral_config::{CorralConfig, ObservabilityConfig};
pub use presence_config::PresenceConfig;
pub use shadow_config::ShadowConfig;
pub use storage_config::{SerializerConfig, StorageConfig};
