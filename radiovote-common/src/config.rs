//! Configuration loading and resolution
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line argument / environment variable (applied by the binary via clap)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)
//!
//! A missing config file is not an error: the server starts on defaults.
//! A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Contents of `config.toml`; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    /// SQLite busy timeout: how long a writer waits for the lock
    pub busy_timeout_ms: Option<u64>,
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub max_connections: u32,
    pub log_level: String,
}

impl ServerConfig {
    /// Merge overrides, TOML values and compiled defaults (in that priority)
    pub fn resolve(overrides: &ConfigOverrides, toml: Option<&TomlConfig>) -> Self {
        let toml = toml.cloned().unwrap_or_default();

        Self {
            bind_address: overrides
                .bind_address
                .clone()
                .or(toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .clone()
                .or(toml.database_path)
                .unwrap_or_else(default_database_path),
            busy_timeout_ms: toml.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
            max_connections: toml
                .max_connections
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            log_level: overrides
                .log_level
                .clone()
                .unwrap_or(toml.logging.level),
        }
    }

    /// Address the HTTP listener binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|e| {
            Error::Config(format!("Invalid bind address '{}': {}", self.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Find and load the config file, if there is one
///
/// An explicitly named file that does not exist is reported with a warning
/// and treated as absent.
pub fn load_optional_config(explicit: Option<&Path>) -> Result<Option<TomlConfig>> {
    let path = match explicit {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            warn!("Config file not found: {} (using defaults)", path.display());
            return Ok(None);
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    let config = load_toml_config(&path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

/// `<config dir>/radiovote/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("radiovote").join("config.toml"))
}

/// Get OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("radiovote"))
        .unwrap_or_else(|| PathBuf::from("./radiovote_data"))
        .join("radiovote.db")
}
