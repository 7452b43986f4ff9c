//! Wallet ledger HTTP server.
//!
//! Serves transfers, balances and history over PostgreSQL, or over an
//! in-memory store for local experiments.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use wallet_ledger::{
    LedgerStore, MemoryLedgerStore, PgLedgerStore,
    db::{Database, seed_wallets},
};
use wl_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run the wallet ledger server

USAGE:
  wl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --in-memory              Keep the ledger in process memory (no database)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  DATABASE_URL             PostgreSQL connection string
  TRANSFER_TIMEOUT_MS      Deadline for a single transfer  [default: 10000]
  SEED_WALLET_COUNT        Wallets created on first boot   [default: 10]
  SEED_WALLET_BALANCE      Balance of each seeded wallet   [default: 100.00]
  RUN_MIGRATIONS           Apply schema migrations on boot [default: true]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--in-memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.in_memory)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("Prometheus metrics exposed on http://{}/metrics", metrics_bind);
    }

    if config.in_memory {
        tracing::warn!("Running with in-memory ledger, state is lost on exit");
        let store = Arc::new(MemoryLedgerStore::new());
        return run(store, &config).await;
    }

    tracing::info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    tracing::info!("Database connected successfully");

    if config.ledger.run_migrations {
        db.migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {}", e))?;
        tracing::info!("Migrations applied");
    }

    let store = Arc::new(PgLedgerStore::new(&db));
    let result = run(store, &config).await;
    db.close().await;
    result
}

/// Seed, build the router and serve until shutdown
async fn run<S: LedgerStore>(store: Arc<S>, config: &ServerConfig) -> Result<(), Error> {
    let seeded = seed_wallets(&store, &config.ledger.seed)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed wallets: {}", e))?;
    if !seeded.is_empty() {
        tracing::info!(count = seeded.len(), "Seeded wallets");
        for address in &seeded {
            tracing::info!("  - {}", address);
        }
    }

    let state = AppState::new(store, config.ledger.transfer_timeout());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
    }
}
