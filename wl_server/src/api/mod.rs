//! HTTP API for the wallet ledger.
//!
//! # Modules
//!
//! - [`transfers`]: Send funds and list recent transfers
//! - [`wallets`]: Balance lookups
//! - [`errors`]: Error body and status mapping
//! - [`request_id`]: Request correlation, request metrics and logging
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Store health (200 / 503)
//! POST /api/send                        - Transfer funds
//! GET  /api/transactions?count=N        - Latest N transfers, newest first
//! GET  /api/wallet/{address}/balance    - Wallet balance
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wallet_ledger::MemoryLedgerStore;
//! use wl_server::api::{AppState, create_router};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(Arc::new(MemoryLedgerStore::new()), Duration::from_secs(10));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod errors;
pub mod request_id;
pub mod transfers;
pub mod wallets;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use wallet_ledger::{LedgerStore, QueryService, TransferEngine};

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
pub struct AppState<S: LedgerStore> {
    pub engine: Arc<TransferEngine<S>>,
    pub queries: Arc<QueryService<S>>,
    pub store: Arc<S>,
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            queries: Arc::clone(&self.queries),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    /// Build the services over one shared store
    pub fn new(store: Arc<S>, transfer_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(TransferEngine::new(Arc::clone(&store)).with_timeout(transfer_timeout)),
            queries: Arc::new(QueryService::new(Arc::clone(&store))),
            store,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check::<S>))
        .route("/api/send", post(transfers::send::<S>))
        .route("/api/transactions", get(transfers::list_transactions::<S>))
        .route("/api/wallet/{address}/balance", get(wallets::get_balance::<S>))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check<S: LedgerStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let db_healthy = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
