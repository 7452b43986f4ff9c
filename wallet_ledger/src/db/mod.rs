//! Database module providing PostgreSQL connection pooling and utilities.
//!
//! This module manages the database connection pool using sqlx, applies the
//! ledger schema, and seeds the initial wallet set on first boot.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod seed;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use seed::{SeedConfig, generate_address, seed_wallets};

use crate::ledger::{StoreError, StoreResult};
use timeouts::LONG_OPERATION_TIMEOUT;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Arguments
    ///
    /// * `config` - Database configuration
    ///
    /// # Returns
    ///
    /// * `Result<Database, sqlx::Error>` - Database instance or error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wallet_ledger::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::development();
    ///     let db = Database::new(&config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self {
            pool,
            statement_timeout: Duration::from_millis(config.statement_timeout_ms),
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Statement timeout applied inside units of work
    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Apply the embedded ledger migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        let migrator = sqlx::migrate!("./migrations");
        match tokio::time::timeout(LONG_OPERATION_TIMEOUT, migrator.run(&self.pool)).await {
            Ok(result) => result.map_err(|e| StoreError::Database(e.into())),
            Err(_) => Err(StoreError::Timeout(LONG_OPERATION_TIMEOUT)),
        }
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
