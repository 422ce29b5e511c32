//! Configuration for the notification listener
//!
//! Settings come from a YAML file, then `.env`/environment overrides:
//!
//! - `NOTIFY_HOST`: socket host (`host[:port]`)
//! - `NOTIFY_TOKEN`: socket credential
//! - `NOTIFY_SECURE`: `true`/`false`, selects `wss` or `ws`

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const HOST_VAR: &str = "NOTIFY_HOST";
pub const TOKEN_VAR: &str = "NOTIFY_TOKEN";
pub const SECURE_VAR: &str = "NOTIFY_SECURE";

/// Reconnection strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectKind {
    /// `base * n`
    #[default]
    Linear,
    /// `base * 2^(n-1)`, capped at `max_delay_ms`
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub strategy: ReconnectKind,
    #[serde(default = "default_base_interval")]
    pub base_interval_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectKind::default(),
            base_interval_ms: default_base_interval(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ReconnectConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Notification listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Backend host, optionally with `:port`
    pub host: String,
    /// Use `wss` when true
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Credential; usually supplied through `NOTIFY_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_secure() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_interval() -> u64 {
    5000
}

fn default_max_delay() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

fn default_queue_capacity() -> usize {
    1000
}

impl NotifyConfig {
    /// Load configuration from a YAML file, `.env`, and the environment
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: NotifyConfig = serde_yaml::from_str(&yaml_content)?;

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate YAML without consulting the environment
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: NotifyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from variables resolved through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
            info!("Overriding host from environment variable");
            self.host = host;
        }

        if let Some(token) = lookup(TOKEN_VAR).filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }

        if let Some(secure) = lookup(SECURE_VAR) {
            match secure.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.secure = true,
                "0" | "false" | "no" => self.secure = false,
                other => tracing::warn!("Ignoring {}={}", SECURE_VAR, other),
            }
        }
    }

    /// The credential, or an error naming the variable to set
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::EnvVarMissing(TOKEN_VAR.to_string()))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("host must not be empty".to_string()));
        }

        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.base_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect.base_interval_ms must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Host: {} (secure: {})", self.host, self.secure);
        info!("  Token: {}", if self.token.is_some() { "set" } else { "missing" });
        info!(
            "  Reconnect: {:?}, base {} ms, {} attempts",
            self.reconnect.strategy, self.reconnect.base_interval_ms, self.reconnect.max_attempts
        );
        info!("  Heartbeat: {} ms", self.heartbeat_interval_ms);
        info!("  Queue capacity: {}", self.queue_capacity);
        info!("  Log level: {}", self.log_level);
    }
}
