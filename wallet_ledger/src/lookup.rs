//! Wallet lookup: address to identifier resolution.

use std::sync::Arc;
use thiserror::Error;

use crate::ledger::{LedgerStore, StoreError, StoreResult, UnitOfWork, WalletId};

/// Lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// No wallet has this address
    #[error("Wallet not found: {0}")]
    NotFound(String),

    /// Store failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for lookups
pub type LookupResult<T> = Result<T, LookupError>;

/// Read-only wallet resolution against a ledger store
pub struct WalletLookup<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for WalletLookup<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> WalletLookup<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check whether a wallet with this address exists
    pub async fn exists(&self, address: &str) -> StoreResult<bool> {
        self.store.wallet_exists(address).await
    }

    /// Resolve an address to its wallet identifier
    ///
    /// # Errors
    ///
    /// * `LookupError::NotFound` - No wallet has this address
    /// * `LookupError::Store` - The store could not answer
    pub async fn resolve_id(&self, address: &str) -> LookupResult<WalletId> {
        self.store
            .find_wallet(address)
            .await?
            .ok_or_else(|| LookupError::NotFound(address.to_string()))
    }
}

/// Resolve an address inside an open unit of work, so the answer stays valid
/// for the mutations that follow in the same unit.
pub async fn resolve_within<U: UnitOfWork>(unit: &mut U, address: &str) -> LookupResult<WalletId> {
    unit.find_wallet(address)
        .await?
        .ok_or_else(|| LookupError::NotFound(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Fault, FaultPoint, MemoryLedgerStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_exists_and_resolve() {
        let store = Arc::new(MemoryLedgerStore::new());
        let id = store.create_wallet("abc", dec!(5)).await.unwrap();
        let lookup = WalletLookup::new(store);

        assert!(lookup.exists("abc").await.unwrap());
        assert!(!lookup.exists("missing").await.unwrap());
        assert_eq!(lookup.resolve_id("abc").await.unwrap(), id);
        assert!(matches!(
            lookup.resolve_id("missing").await,
            Err(LookupError::NotFound(address)) if address == "missing"
        ));
    }

    #[tokio::test]
    async fn test_resolve_within_propagates_store_errors() {
        let store = MemoryLedgerStore::new().with_fault(Fault::Fail(FaultPoint::Lookup));
        store.create_wallet("abc", dec!(5)).await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let err = resolve_within(&mut unit, "abc").await.unwrap_err();
        assert!(matches!(err, LookupError::Store(StoreError::Backend(_))));
    }
}
