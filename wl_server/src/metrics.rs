//! Prometheus metrics for monitoring the ledger server.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener.
//!
//! # Metrics
//!
//! - `http_requests_total{method,path,status}`
//! - `http_request_duration_ms{method,path}`
//! - `transfers_total{outcome}`
//! - `transfer_duration_ms{outcome}`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use wl_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/send", 201);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Ledger Metrics
// ============================================================================

/// Record a transfer attempt by outcome label.
pub fn transfers_total(outcome: &'static str) {
    metrics::counter!("transfers_total", "outcome" => outcome).increment(1);
}

/// Record transfer duration in milliseconds.
pub fn transfer_duration_ms(outcome: &'static str, duration_ms: f64) {
    metrics::histogram!("transfer_duration_ms", "outcome" => outcome).record(duration_ms);
}
