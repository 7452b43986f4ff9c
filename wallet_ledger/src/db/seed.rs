//! Initial wallet seeding.
//!
//! On first boot the wallets table is empty; a fixed number of wallets with
//! random 32-byte hex addresses is created. Later boots leave it alone.

use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::ledger::{LedgerStore, StoreError, StoreResult};
use crate::lookup::WalletLookup;

/// Attempts at drawing an unused address before giving up
const MAX_ADDRESS_ATTEMPTS: usize = 8;

/// Seeding parameters
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Wallets created when the table is empty
    pub wallet_count: usize,
    /// Starting balance of each seeded wallet
    pub initial_balance: Decimal,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            wallet_count: 10,
            initial_balance: Decimal::new(10_000, 2),
        }
    }
}

/// Random 64-character hex wallet address
pub fn generate_address() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Seed wallets if none exist yet
///
/// # Returns
///
/// * `StoreResult<Vec<String>>` - Addresses created, empty when the store was already seeded
pub async fn seed_wallets<S: LedgerStore>(
    store: &Arc<S>,
    config: &SeedConfig,
) -> StoreResult<Vec<String>> {
    if store.wallet_count().await? > 0 {
        info!("Wallets already present, skipping seed");
        return Ok(Vec::new());
    }

    let lookup = WalletLookup::new(Arc::clone(store));
    let mut created = Vec::with_capacity(config.wallet_count);

    for _ in 0..config.wallet_count {
        let address = unused_address(&lookup).await?;
        store.create_wallet(&address, config.initial_balance).await?;
        info!("Seeded wallet {address} with balance {}", config.initial_balance);
        created.push(address);
    }

    Ok(created)
}

async fn unused_address<S: LedgerStore>(lookup: &WalletLookup<S>) -> StoreResult<String> {
    for _ in 0..MAX_ADDRESS_ATTEMPTS {
        let address = generate_address();
        if !lookup.exists(&address).await? {
            return Ok(address);
        }
    }
    Err(StoreError::Backend(
        "could not draw an unused wallet address".to_string(),
    ))
}
