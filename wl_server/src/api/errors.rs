//! Mapping of ledger errors onto HTTP responses.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use wallet_ledger::{QueryError, TransferError};

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error type
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// 400 with the given message
pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn status_for(rejection: bool, transient: bool) -> StatusCode {
    if rejection {
        StatusCode::BAD_REQUEST
    } else if transient {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Convert a transfer failure, logging storage details server-side only
pub fn transfer_error(err: &TransferError) -> ApiError {
    if !err.is_rejection() {
        tracing::error!(error = %err, outcome = err.outcome(), "Transfer failed");
    }
    (
        status_for(err.is_rejection(), err.is_transient()),
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Convert a query failure, logging storage details server-side only
pub fn query_error(err: &QueryError) -> ApiError {
    if !err.is_rejection() {
        tracing::error!(error = %err, "Query failed");
    }
    (
        status_for(err.is_rejection(), err.is_transient()),
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}
