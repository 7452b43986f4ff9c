//! Read-only balance and history queries.

use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

use crate::ledger::{LedgerStore, StoreError, TransactionRecord};

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// No wallet has this address
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// History size must be non-negative
    #[error("Invalid count: {0}")]
    InvalidCount(i64),

    /// Store failure
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl QueryError {
    /// Request was refused on its merits
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QueryError::WalletNotFound(_) | QueryError::InvalidCount(_)
        )
    }

    /// Worth retrying later
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Storage(err) if err.is_transient())
    }

    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            QueryError::WalletNotFound(_) => "Invalid wallet address".to_string(),
            QueryError::InvalidCount(_) => "Count must be a non-negative integer".to_string(),
            QueryError::Storage(err) if err.is_transient() => {
                "Service temporarily unavailable, please retry".to_string()
            }
            QueryError::Storage(_) => "Internal server error".to_string(),
        }
    }
}

/// Result type for queries
pub type QueryResult<T> = Result<T, QueryError>;

/// Balance and history lookups
pub struct QueryService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Current balance of a wallet
    pub async fn balance(&self, address: &str) -> QueryResult<Decimal> {
        self.store
            .balance_of(address)
            .await?
            .ok_or_else(|| QueryError::WalletNotFound(address.to_string()))
    }

    /// The `count` most recent transfers, newest first
    pub async fn list_recent(&self, count: i64) -> QueryResult<Vec<TransactionRecord>> {
        if count < 0 {
            return Err(QueryError::InvalidCount(count));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.recent_transactions(count).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_balance_of_known_and_unknown_wallet() {
        let store = Arc::new(MemoryLedgerStore::new());
        store.create_wallet("abc", dec!(12.34)).await.unwrap();
        let queries = QueryService::new(store);

        assert_eq!(queries.balance("abc").await.unwrap(), dec!(12.34));
        let err = queries.balance("nope").await.unwrap_err();
        assert!(err.is_rejection());
        assert!(matches!(err, QueryError::WalletNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_recent_rejects_negative_count() {
        let queries = QueryService::new(Arc::new(MemoryLedgerStore::new()));
        assert!(matches!(
            queries.list_recent(-1).await,
            Err(QueryError::InvalidCount(-1))
        ));
        assert!(queries.list_recent(0).await.unwrap().is_empty());
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err = QueryError::Storage(StoreError::Backend("disk on fire".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.is_rejection());
    }
}
