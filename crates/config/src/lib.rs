//! Configuration loading, validation, and management for Shoplist.
//!
//! Loads configuration from `~/.shoplist/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.shoplist/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway (HTTP server) configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// PIN and session settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// List bootstrap settings
    #[serde(default)]
    pub lists: ListsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `sqlite::memory:` for an ephemeral database
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "./shopping.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared PIN. Authentication is disabled when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,

    /// Sliding session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

fn default_session_ttl_hours() -> u32 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pin: None,
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("pin", &redact(&self.pin))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish()
    }
}

impl AuthConfig {
    /// The configured PIN, treating an empty string as "not configured".
    pub fn effective_pin(&self) -> Option<&str> {
        self.pin.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListsConfig {
    /// Name of the list created when the database has none
    #[serde(default = "default_list_name")]
    pub default_name: String,
}

fn default_list_name() -> String {
    shoplist_core::DEFAULT_LIST_NAME.into()
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            default_name: default_list_name(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.shoplist/config.toml).
    ///
    /// Environment variables override the file:
    /// - `APP_PIN`: shared PIN (empty disables authentication)
    /// - `DB_PATH`: SQLite database path
    /// - `PORT`: listening port
    /// - `SHOPLIST_HOST`: bind address
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(pin) = lookup("APP_PIN") {
            self.auth.pin = Some(pin);
        }

        if let Some(path) = lookup("DB_PATH").filter(|p| !p.is_empty()) {
            self.database.path = path;
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT is not a valid port number: {port}"))
            })?;
        }

        if let Some(host) = lookup("SHOPLIST_HOST").filter(|h| !h.is_empty()) {
            self.gateway.host = host;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".shoplist")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        if !(1..=8760).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::ValidationError(
                "auth.session_ttl_hours must be between 1 and 8760".into(),
            ));
        }

        if self.lists.default_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "lists.default_name must not be blank".into(),
            ));
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path must not be blank".into(),
            ));
        }

        Ok(())
    }

    /// Whether a PIN is required to use the app.
    pub fn auth_enabled(&self) -> bool {
        self.auth.effective_pin().is_some()
    }

    /// Render the configuration as TOML with the PIN redacted.
    pub fn redacted_toml(&self) -> String {
        let mut shown = self.clone();
        if shown.auth.pin.is_some() {
            shown.auth.pin = Some("[REDACTED]".into());
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
