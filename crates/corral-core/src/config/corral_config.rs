//! Top-level Corral configuration with 3-layer resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    defaults, BusConfig, CheckinConfig, PresenceConfig, SerializerConfig, ShadowConfig,
    StorageConfig,
};
use crate::errors::ConfigError;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when `CORRAL_LOG` is unset. Default: "info".
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output. Default: true.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            json: true,
        }
    }
}

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`CORRAL_*`)
/// 2. Config file (`corral.toml`)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CorralConfig {
    pub storage: StorageConfig,
    pub serializer: SerializerConfig,
    pub shadow: ShadowConfig,
    pub bus: BusConfig,
    pub presence: PresenceConfig,
    pub checkin: CheckinConfig,
    pub observability: ObservabilityConfig,
}

impl CorralConfig {
    /// Load configuration: defaults, then `path` if given, then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing sections take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `CORRAL_*` overrides using the given variable lookup.
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CORRAL_DB_PATH") {
            self.storage.db_path = v;
        }
        if let Some(v) = lookup("CORRAL_READ_POOL_SIZE").and_then(|v| v.parse().ok()) {
            self.storage.read_pool_size = v;
        }
        if let Some(v) = lookup("CORRAL_WRITE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.serializer.write_timeout_ms = v;
        }
        if let Some(v) = lookup("CORRAL_MESSAGE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.bus.message_ttl_secs = v;
        }
        if let Some(v) = lookup("CORRAL_SHADOW_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.shadow.max_attempts = v;
        }
        if let Some(v) = lookup("CORRAL_LOG_LEVEL") {
            self.observability.log_level = v;
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serializer.write_timeout_ms == 0 {
            return Err(invalid("serializer.write_timeout_ms", "must be greater than 0"));
        }
        if self.shadow.max_attempts == 0 {
            return Err(invalid("shadow.max_attempts", "must be at least 1"));
        }
        if self.shadow.base_backoff_ms > self.shadow.max_backoff_ms {
            return Err(invalid(
                "shadow.base_backoff_ms",
                "must not exceed shadow.max_backoff_ms",
            ));
        }
        let p = &self.presence;
        if !(p.active_secs <= p.busy_secs && p.busy_secs <= p.stale_secs) {
            return Err(invalid(
                "presence",
                "thresholds must satisfy active_secs <= busy_secs <= stale_secs",
            ));
        }
        if self.bus.message_ttl_secs == 0 {
            return Err(invalid("bus.message_ttl_secs", "must be greater than 0"));
        }
        if self.storage.read_pool_size == 0 {
            return Err(invalid("storage.read_pool_size", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}
