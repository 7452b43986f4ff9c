//! Transfer and history API handlers.
//!
//! # Examples
//!
//! Send funds:
//! ```bash
//! curl -X POST http://localhost:8080/api/send \
//!   -H "Content-Type: application/json" \
//!   -d '{"sender_address": "ab12...", "receiver_address": "cd34...", "amount": "30.00"}'
//! ```
//!
//! Latest transfers:
//! ```bash
//! curl "http://localhost:8080/api/transactions?count=5"
//! ```

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use wallet_ledger::{LedgerStore, TransactionRecord, TransferReceipt, TransferRequest};

use super::{
    AppState,
    errors::{ApiError, bad_request, query_error, transfer_error},
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct SendPayload {
    pub sender_address: String,
    pub receiver_address: String,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message: String,
    pub transaction: TransferReceipt,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub count: Option<String>,
}

/// Move funds between two wallets.
///
/// Returns `201 Created` with the receipt. Rejected transfers answer `400`
/// and leave no trace in the ledger.
pub async fn send<S: LedgerStore>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SendPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<SendResponse>), ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| bad_request(format!("Invalid request body: {}", rejection.body_text())))?;

    if payload.sender_address.trim().is_empty() || payload.receiver_address.trim().is_empty() {
        return Err(bad_request("Sender and receiver addresses are required"));
    }

    let request = TransferRequest::new(
        payload.sender_address,
        payload.receiver_address,
        payload.amount,
    );

    let started = Instant::now();
    let result = state.engine.transfer(&request).await;
    let elapsed = started.elapsed();

    let outcome = match &result {
        Ok(_) => "committed",
        Err(e) => e.outcome(),
    };
    metrics::transfers_total(outcome);
    metrics::transfer_duration_ms(outcome, elapsed.as_secs_f64() * 1000.0);
    logging::log_transfer(outcome, &request.amount.to_string(), elapsed);

    match result {
        Ok(receipt) => Ok((
            StatusCode::CREATED,
            Json(SendResponse {
                message: "Transaction completed".to_string(),
                transaction: receipt,
            }),
        )),
        Err(e) => Err(transfer_error(&e)),
    }
}

/// List the most recent transfers, newest first.
///
/// `count` is required and must be a non-negative integer.
pub async fn list_transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    let raw = params
        .count
        .ok_or_else(|| bad_request("Query parameter 'count' is required"))?;
    let count: i64 = raw
        .trim()
        .parse()
        .map_err(|_| bad_request("Query parameter 'count' must be an integer"))?;

    state
        .queries
        .list_recent(count)
        .await
        .map(Json)
        .map_err(|e| query_error(&e))
}
