//! Runtime configuration
//!
//! Database credentials come from the process environment (optionally seeded
//! from a `.env` file by the binary); loader knobs come from the CLI.

use crate::error::{LoadError, Result};
use std::time::Duration;

/// Rows per insert batch.
pub const CHUNK_SIZE: usize = 100_000;

/// Field separator of the source extracts.
pub const DELIMITER: u8 = b';';

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;

/// Connection settings for the target PostgreSQL database
#[derive(Clone)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,

    /// Size of the pooled bulk-write handle
    pub max_connections: u32,

    /// How long to keep retrying the initial connection
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Read `POSTGRES_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    ///
    /// `POSTGRES_HOST` defaults to `localhost` and `POSTGRES_PORT` to `5432`;
    /// user and database name are required, an absent password is empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| LoadError::Config(format!("{} is not set", key)))
        };

        let user = required("POSTGRES_USER")?;
        let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();
        let database = required("POSTGRES_DB")?;

        let host = lookup("POSTGRES_HOST")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("POSTGRES_PORT").filter(|value| !value.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| LoadError::Config(format!("POSTGRES_PORT '{}' is invalid: {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            user,
            password,
            host,
            port,
            database,
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        })
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// `host:port/database`, safe to print
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Knobs of the chunked loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of rows per insert batch
    pub chunk_size: usize,

    /// Field separator of the source files
    pub delimiter: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            delimiter: DELIMITER,
        }
    }
}

impl LoaderConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_host_and_port_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "cnpj"),
        ]))
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.target(), "localhost:5432/cnpj");
    }

    #[test]
    fn test_explicit_host_and_port() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "cnpj"),
            ("POSTGRES_HOST", "db.internal"),
            ("POSTGRES_PORT", "6543"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
    }

    #[test]
    fn test_missing_user_is_config_error() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "cnpj"),
        ]))
        .unwrap_err();

        assert!(matches!(err, LoadError::Config(ref msg) if msg.contains("POSTGRES_USER")));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "cnpj"),
            ("POSTGRES_PORT", "not-a-port"),
        ]))
        .unwrap_err();

        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("POSTGRES_USER", "postgres"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "cnpj"),
        ]))
        .unwrap();

        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_chunk_size_never_zero() {
        assert_eq!(LoaderConfig::default().with_chunk_size(0).chunk_size, 1);
        assert_eq!(LoaderConfig::default().chunk_size, CHUNK_SIZE);
    }
}
