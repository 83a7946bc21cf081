//! Server configuration loaded from environment variables.
//!
//! # Invariants
//! - Values are trimmed; an empty value counts as unset.
//! - `SERVER_PORT` must parse as `u16`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "ORGTREE_DB_PATH";
pub const HOST_ENV: &str = "SERVER_HOST";
pub const PORT_ENV: &str = "SERVER_PORT";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "ORGTREE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "orgtree.sqlite3";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPort(raw) => {
                write!(f, "{PORT_ENV} must be a port number in 0..=65535, got `{raw}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its raw value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME)),
            host: read(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_level: read(LOG_LEVEL_ENV)
                .unwrap_or_else(|| orgtree_core::default_log_level().to_string()),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        })
    }

    /// Returns the `host:port` string the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("orgtree.sqlite3"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.log_level, orgtree_core::default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn values_are_trimmed_and_blank_means_unset() {
        let config = load(&[
            ("ORGTREE_DB_PATH", "  /var/lib/org.db "),
            ("SERVER_HOST", "   "),
            ("SERVER_PORT", " 9090 "),
            ("LOG_LEVEL", "warn"),
            ("ORGTREE_LOG_DIR", "/var/log/orgtree"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/org.db"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/orgtree")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        for raw in ["http", "70000", "-1"] {
            assert_eq!(
                load(&[("SERVER_PORT", raw)]).unwrap_err(),
                ConfigError::InvalidPort(raw.to_string())
            );
        }
    }
}
