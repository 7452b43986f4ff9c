//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::time::Duration;
use wallet_ledger::db::{DatabaseConfig, SeedConfig};
use wallet_ledger::ledger::MAX_BALANCE;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter bind address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Ledger behaviour
    pub ledger: LedgerConfig,
    /// Keep all state in process memory instead of PostgreSQL
    pub in_memory: bool,
}

/// Ledger-related configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Deadline for a whole transfer in milliseconds
    pub transfer_timeout_ms: u64,
    /// Apply schema migrations on startup
    pub run_migrations: bool,
    /// Wallet seeding on first boot
    pub seed: SeedConfig,
}

impl LedgerConfig {
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `in_memory` - Use the in-memory ledger store (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a set variable cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080))),
        };

        let metrics_bind = parse_env_strict("METRICS_BIND")?;

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| DatabaseConfig::development().database_url);

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT", 10),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT", 600),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME", 1800),
            statement_timeout_ms: parse_env_or("DB_STATEMENT_TIMEOUT_MS", 5_000),
        };

        let seed_defaults = SeedConfig::default();
        let ledger = LedgerConfig {
            transfer_timeout_ms: parse_env_or("TRANSFER_TIMEOUT_MS", 10_000),
            run_migrations: parse_env_or("RUN_MIGRATIONS", true),
            seed: SeedConfig {
                wallet_count: parse_env_or("SEED_WALLET_COUNT", seed_defaults.wallet_count),
                initial_balance: parse_env_strict::<Decimal>("SEED_WALLET_BALANCE")?
                    .unwrap_or(seed_defaults.initial_balance),
            },
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            database,
            ledger,
            in_memory,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.in_memory && self.database.database_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Pass --db-url or run with --in-memory".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.statement_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_STATEMENT_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.ledger.transfer_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "TRANSFER_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.ledger.seed.initial_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                var: "SEED_WALLET_BALANCE".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if self.ledger.seed.initial_balance > MAX_BALANCE {
            return Err(ConfigError::Invalid {
                var: "SEED_WALLET_BALANCE".to_string(),
                reason: format!("Must not exceed {MAX_BALANCE}"),
            });
        }

        if self.ledger.seed.initial_balance.normalize().scale() > 2 {
            return Err(ConfigError::Invalid {
                var: "SEED_WALLET_BALANCE".to_string(),
                reason: "At most 2 decimal places".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable, failing loudly on garbage
fn parse_env_strict<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse '{value}'"),
        }),
        Err(_) => Ok(None),
    }
}
