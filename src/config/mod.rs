//! Configuration loading and management.
//!
//! Split into:
//! - this module: the top-level [`Config`], loading, and cross-field
//!   validation
//! - [`limits`]: capacity limits ([`LimitsConfig`])

mod limits;

pub use limits::LimitsConfig;

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity and listener.
    #[serde(default)]
    pub server: ServerConfig,
    /// Capacity limits (sessions, workers, rooms).
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field validation.
    ///
    /// Every admitted session must be placeable on some worker, so the
    /// global cap may not exceed the pool's combined capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        if l.workers == 0 {
            return Err(ConfigError::Invalid("limits.workers must be at least 1".into()));
        }
        if l.worker_capacity == 0 {
            return Err(ConfigError::Invalid(
                "limits.worker_capacity must be at least 1".into(),
            ));
        }
        if l.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_sessions must be at least 1".into(),
            ));
        }
        if l.max_rooms == 0 {
            return Err(ConfigError::Invalid("limits.max_rooms must be at least 1".into()));
        }
        if l.room_capacity == 0 {
            return Err(ConfigError::Invalid(
                "limits.room_capacity must be at least 1".into(),
            ));
        }
        let pool_capacity = l.workers.saturating_mul(l.worker_capacity);
        if l.max_sessions > pool_capacity {
            return Err(ConfigError::Invalid(format!(
                "limits.max_sessions ({}) exceeds worker pool capacity ({} workers x {})",
                l.max_sessions, l.workers, l.worker_capacity
            )));
        }
        Ok(())
    }
}

/// Server identity and listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name used in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Chat listener address.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Prometheus metrics HTTP port (default: 9090). 0 disables the
    /// endpoint (used by tests).
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            listen: default_listen(),
            metrics_port: None,
        }
    }
}

fn default_name() -> String {
    "parlord".to_string()
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 30000))
}
