//! Structured logging configuration.
//!
//! Request correlation is handled by the request ID middleware; this module
//! installs the subscriber and holds the shared event helpers.

use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Transfers slower than this are logged at warn level.
pub const SLOW_TRANSFER_THRESHOLD: Duration = Duration::from_millis(500);

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use wl_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a completed API request
///
/// # Arguments
///
/// * `request_id` - Correlation ID of the request
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status` - Response status code
/// * `duration` - Time spent handling the request
pub fn log_api_request(
    request_id: &str,
    method: &str,
    path: &str,
    status: u16,
    duration: Duration,
) {
    let duration_ms = duration.as_millis() as u64;
    if status >= 500 {
        tracing::error!(request_id, method, path, status, duration_ms, "Request failed");
    } else if status >= 400 {
        tracing::warn!(request_id, method, path, status, duration_ms, "Request rejected");
    } else {
        tracing::info!(request_id, method, path, status, duration_ms, "Request completed");
    }
}

/// Log a transfer outcome, escalating slow transfers
pub fn log_transfer(outcome: &str, amount: &str, duration: Duration) {
    let duration_ms = duration.as_millis() as u64;
    if duration > SLOW_TRANSFER_THRESHOLD {
        tracing::warn!(outcome, amount, duration_ms, "SLOW TRANSFER");
    } else {
        tracing::debug!(outcome, amount, duration_ms, "Transfer finished");
    }
}
