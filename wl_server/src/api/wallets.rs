//! Wallet API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use wallet_ledger::LedgerStore;

use super::{
    AppState,
    errors::{ApiError, query_error},
};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: Decimal,
}

/// Current balance of one wallet
pub async fn get_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .queries
        .balance(&address)
        .await
        .map_err(|e| query_error(&e))?;

    Ok(Json(BalanceResponse { address, balance }))
}
