//! Ledger store traits.
//!
//! [`LedgerStore`] owns wallet balances and transaction records. Every
//! balance mutation goes through a [`UnitOfWork`] obtained from
//! [`LedgerStore::begin`]: an isolated, atomic execution context that either
//! commits as a whole or leaves no trace. Dropping a unit of work without
//! committing rolls it back, so early returns and cancelled futures never
//! leave partial writes behind.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::StoreResult;
use super::models::{RecordStamp, TransactionRecord, WalletId};

/// Storage backend for wallets and the transaction ledger
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Unit of work type produced by [`LedgerStore::begin`]
    type Unit: UnitOfWork;

    /// Open a new unit of work
    async fn begin(&self) -> StoreResult<Self::Unit>;

    /// Resolve an address outside of any unit of work
    async fn find_wallet(&self, address: &str) -> StoreResult<Option<WalletId>>;

    /// Check whether a wallet with this address exists
    async fn wallet_exists(&self, address: &str) -> StoreResult<bool> {
        Ok(self.find_wallet(address).await?.is_some())
    }

    /// Current committed balance for an address, `None` if unknown
    async fn balance_of(&self, address: &str) -> StoreResult<Option<Decimal>>;

    /// Most recent records first, at most `limit` of them
    async fn recent_transactions(&self, limit: i64) -> StoreResult<Vec<TransactionRecord>>;

    /// Sum of all wallet balances
    async fn total_balance(&self) -> StoreResult<Decimal>;

    /// Number of wallets
    async fn wallet_count(&self) -> StoreResult<i64>;

    /// Insert a wallet. Only used for seeding.
    async fn create_wallet(&self, address: &str, balance: Decimal) -> StoreResult<WalletId>;

    /// Cheap liveness check
    async fn health_check(&self) -> StoreResult<()>;
}

/// Atomic, isolated sequence of store operations
#[async_trait]
pub trait UnitOfWork: Send {
    /// Resolve an address within this unit of work
    async fn find_wallet(&mut self, address: &str) -> StoreResult<Option<WalletId>>;

    /// Lock the given wallets for the rest of the unit of work and return
    /// their balances, ordered by id. Unknown ids are omitted.
    async fn lock_balances(&mut self, ids: &[WalletId]) -> StoreResult<Vec<(WalletId, Decimal)>>;

    /// Apply a signed delta relative to the stored balance in one atomic
    /// statement. Returns the new balance, or `None` when the wallet does not
    /// exist or the result would be negative (nothing is written then).
    async fn adjust_balance(&mut self, id: WalletId, delta: Decimal)
    -> StoreResult<Option<Decimal>>;

    /// Append a transaction record; the store assigns id and timestamp
    async fn insert_record(
        &mut self,
        sender: WalletId,
        receiver: WalletId,
        amount: Decimal,
    ) -> StoreResult<RecordStamp>;

    /// Make every change of this unit visible
    async fn commit(self) -> StoreResult<()>;

    /// Discard every change of this unit
    async fn rollback(self) -> StoreResult<()>;
}
