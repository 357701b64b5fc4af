//! Database connection management using sqlx
//!
//! A run holds two handles to the same database: a pool used for the bulk
//! `COPY` of chunks and a single raw connection used for DDL transactions.

use crate::config::DbConfig;
use crate::error::{LoadError, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgConnection};
use tokio::sync::Mutex;
use tracing::{error, info};

/// Dual handle to the target database
pub struct Database {
    pub(crate) pool: PgPool,
    pub(crate) conn: Mutex<PgConnection>,
}

impl Database {
    /// Open both handles using `POSTGRES_*` environment variables
    pub async fn open_from_env() -> Result<Self> {
        let config = DbConfig::from_env().map_err(|e| {
            error!("Error connecting to database: {}", e);
            LoadError::Connection(e.to_string())
        })?;
        Self::open(&config).await
    }

    /// Open the pooled and the raw handle.
    ///
    /// Failures are logged and returned as [`LoadError::Connection`]; this
    /// never panics, callers decide whether to stop.
    pub async fn open(config: &DbConfig) -> Result<Self> {
        match Self::connect(config).await {
            Ok(db) => {
                info!(target_db = %config.target(), "Connection to the database established!");
                Ok(db)
            }
            Err(e) => {
                error!(target_db = %config.target(), "Error connecting to database: {}", e);
                Err(LoadError::Connection(e.to_string()))
            }
        }
    }

    async fn connect(config: &DbConfig) -> std::result::Result<Self, sqlx::Error> {
        let options = connect_options(config);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options.clone())
            .await?;

        // Test the connection
        sqlx::query("SELECT 1").execute(&pool).await?;

        let conn = match tokio::time::timeout(config.acquire_timeout, options.connect()).await {
            Ok(conn) => conn?,
            Err(_) => {
                pool.close().await;
                return Err(sqlx::Error::PoolTimedOut);
            }
        };

        Ok(Self {
            pool,
            conn: Mutex::new(conn),
        })
    }

    /// Release both handles
    pub async fn close(self) {
        let conn = self.conn.into_inner();
        if let Err(e) = conn.close().await {
            error!("Error closing DDL connection: {}", e);
        }
        self.pool.close().await;
    }
}

pub fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_target() {
        let config = DbConfig::from_lookup(|key| match key {
            "POSTGRES_USER" => Some("postgres".to_string()),
            "POSTGRES_PASSWORD" => Some("secret".to_string()),
            "POSTGRES_DB" => Some("cnpj".to_string()),
            _ => None,
        })
        .unwrap();

        let options = connect_options(&config);
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("cnpj"));
        assert_eq!(options.get_username(), "postgres");
    }
}
