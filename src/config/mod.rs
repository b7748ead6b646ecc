//! Configuration management
//!
//! This module handles loading and parsing configuration for studytrack.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Seed catalog configuration
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/studytrack.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Seed catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Path of the catalog JSON file
    #[serde(default = "default_seed_path")]
    pub path: PathBuf,
    /// What to do with an entry that fails validation
    #[serde(default)]
    pub on_invalid_entry: InvalidEntryPolicy,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            path: default_seed_path(),
            on_invalid_entry: InvalidEntryPolicy::default(),
        }
    }
}

fn default_seed_path() -> PathBuf {
    PathBuf::from("data/seeds/topics.json")
}

/// Handling of a malformed seed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvalidEntryPolicy {
    /// Stop at the first malformed entry; entries already written stay
    #[default]
    Abort,
    /// Skip malformed entries and list them in the final report
    Skip,
}

impl std::str::FromStr for InvalidEntryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(ConfigError::ValidationError(format!(
                "on_invalid_entry must be 'abort' or 'skip', got '{}'",
                other
            ))),
        }
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - STUDYTRACK_SERVER_HOST
    /// - STUDYTRACK_SERVER_PORT
    /// - STUDYTRACK_SERVER_CORS_ORIGIN
    /// - STUDYTRACK_DATABASE_DRIVER
    /// - STUDYTRACK_DATABASE_URL
    /// - STUDYTRACK_SEED_PATH
    /// - STUDYTRACK_SEED_ON_INVALID_ENTRY
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Server configuration
        if let Ok(host) = std::env::var("STUDYTRACK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("STUDYTRACK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("STUDYTRACK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("STUDYTRACK_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("STUDYTRACK_DATABASE_URL") {
            self.database.url = url;
        }

        // Seed configuration
        if let Ok(path) = std::env::var("STUDYTRACK_SEED_PATH") {
            self.seed.path = PathBuf::from(path);
        }
        // unknown policy names are an error, unlike the other overrides
        if let Ok(policy) = std::env::var("STUDYTRACK_SEED_ON_INVALID_ENTRY") {
            self.seed.on_invalid_entry = policy.parse()?;
        }

        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_VARS: &[&str] = &[
    "STUDYTRACK_SERVER_HOST",
    "STUDYTRACK_SERVER_PORT",
    "STUDYTRACK_SERVER_CORS_ORIGIN",
    "STUDYTRACK_DATABASE_DRIVER",
    "STUDYTRACK_DATABASE_URL",
    "STUDYTRACK_SEED_PATH",
    "STUDYTRACK_SEED_ON_INVALID_ENTRY",
];

#[cfg(test)]
fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}
