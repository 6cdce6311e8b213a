//! Server configuration.

use serde::{Deserialize, Serialize};
use tutorhub_analytics::AnalyticsConfig;

/// Environment variable naming the config file when no path is given.
pub const CONFIG_ENV: &str = "TUTORHUB_CONFIG";

/// Full application configuration, as read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub analytics: AnalyticsConfig,
    pub admin: AdminConfig,
}

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `memory` for the in-memory store, otherwise a SQLite URL.
    pub url: String,
    pub max_connections: u32,
    /// Create missing tables on startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory_store(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

/// Admin guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// When false, every request is treated as an admin.
    pub enabled: bool,
    /// Bearer tokens granting admin access.
    pub api_tokens: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_tokens: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics.max_limit == 0 {
            return Err(ConfigError::Invalid(
                "analytics.max_limit must be positive".to_string(),
            ));
        }
        if self.analytics.comparison_window_days == 0 {
            return Err(ConfigError::Invalid(
                "analytics.comparison_window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    AppConfig::from_toml(&content)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
