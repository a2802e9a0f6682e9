//! Configuration module for Gatekeeper.

use serde::Deserialize;
use std::path::Path;

use crate::{GatekeeperError, Result};

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON credential file.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "config/gatekeeper/database.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Login attempt and session timer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Failed login attempts allowed before the connection is locked.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    /// Session timer value (in ticks) set on successful login.
    #[serde(default = "default_session_timer_ticks")]
    pub session_timer_ticks: i64,
    /// Host ticks per second, used for the login countdown warnings.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: i64,
}

fn default_max_login_attempts() -> u32 {
    3
}

fn default_session_timer_ticks() -> i64 {
    400
}

fn default_ticks_per_second() -> i64 {
    20
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: default_max_login_attempts(),
            session_timer_ticks: default_session_timer_ticks(),
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/gatekeeper.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Credential store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Login attempt configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatekeeperError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATEKEEPER_DATABASE_PATH`: Override the credential file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GATEKEEPER_DATABASE_PATH") {
            if !path.is_empty() {
                self.store.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `max_login_attempts` is zero
    /// - `ticks_per_second` is not positive
    pub fn validate(&self) -> Result<()> {
        if self.auth.max_login_attempts == 0 {
            return Err(GatekeeperError::Config(
                "max_login_attempts must be at least 1".to_string(),
            ));
        }
        if self.auth.ticks_per_second <= 0 {
            return Err(GatekeeperError::Config(
                "ticks_per_second must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
