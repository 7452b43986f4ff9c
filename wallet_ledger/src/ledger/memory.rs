//! In-process ledger store.
//!
//! Each unit of work holds the store's async mutex for its whole lifetime,
//! which gives serializable isolation. Writes go straight to the guarded
//! state; a snapshot taken at `begin` is restored if the unit is dropped or
//! rolled back before it commits.
//!
//! A [`Fault`] can be attached to make units of work fail or hang at a given
//! [`FaultPoint`], which is how atomicity and timeout behaviour is exercised
//! without a database.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::errors::{StoreError, StoreResult};
use super::models::{MAX_BALANCE, RecordStamp, TransactionRecord, Wallet, WalletId};
use super::store::{LedgerStore, UnitOfWork};

/// Place inside a unit of work where a fault can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    Begin,
    Lookup,
    Lock,
    Debit,
    Credit,
    Record,
    Commit,
}

/// Injected misbehaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return a backend error at the point
    Fail(FaultPoint),
    /// Never complete once the point is reached
    Stall(FaultPoint),
    /// Apply the operation, then hold back its acknowledgement
    DelayAfter(FaultPoint, Duration),
}

#[derive(Debug, Clone)]
struct StoredRecord {
    id: i64,
    sender: WalletId,
    receiver: WalletId,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    wallets: Vec<Wallet>,
    by_address: HashMap<String, WalletId>,
    records: Vec<StoredRecord>,
}

impl MemoryState {
    fn wallet(&self, id: WalletId) -> Option<&Wallet> {
        usize::try_from(id.0 - 1)
            .ok()
            .and_then(|index| self.wallets.get(index))
    }

    fn wallet_mut(&mut self, id: WalletId) -> Option<&mut Wallet> {
        usize::try_from(id.0 - 1)
            .ok()
            .and_then(|index| self.wallets.get_mut(index))
    }

    fn address_of(&self, id: WalletId) -> String {
        self.wallet(id)
            .map(|wallet| wallet.address.clone())
            .unwrap_or_default()
    }

    /// Store-assigned timestamps are strictly increasing
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.records.last() {
            Some(last) if last.created_at >= now => last.created_at + TimeDelta::microseconds(1),
            _ => now,
        }
    }
}

/// Ledger store kept entirely in memory
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
    fault: Option<Fault>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fault to every unit of work opened from this handle.
    /// Clones made before this call are unaffected; the state is shared.
    /// Failing at `Begin` also fails `health_check`.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Same state, no injected fault
    pub fn without_fault(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fault: None,
        }
    }
}

async fn checkpoint(fault: Option<Fault>, point: FaultPoint) -> StoreResult<()> {
    match fault {
        Some(Fault::Fail(at)) if at == point => Err(StoreError::Backend(format!(
            "injected failure at {point:?}"
        ))),
        Some(Fault::Stall(at)) if at == point => std::future::pending().await,
        _ => Ok(()),
    }
}

async fn acknowledge(fault: Option<Fault>, point: FaultPoint) {
    if let Some(Fault::DelayAfter(at, delay)) = fault {
        if at == point {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Balances must fit the `NUMERIC(20, 2)` column
fn within_range(balance: Decimal) -> StoreResult<Decimal> {
    if balance > MAX_BALANCE {
        return Err(StoreError::Backend(format!(
            "balance {balance} exceeds {MAX_BALANCE}"
        )));
    }
    Ok(balance)
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Unit = MemoryUnitOfWork;

    async fn begin(&self) -> StoreResult<MemoryUnitOfWork> {
        checkpoint(self.fault, FaultPoint::Begin).await?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();

        Ok(MemoryUnitOfWork {
            guard,
            snapshot: Some(snapshot),
            fault: self.fault,
        })
    }

    async fn find_wallet(&self, address: &str) -> StoreResult<Option<WalletId>> {
        Ok(self.state.lock().await.by_address.get(address).copied())
    }

    async fn balance_of(&self, address: &str) -> StoreResult<Option<Decimal>> {
        let state = self.state.lock().await;
        Ok(state
            .by_address
            .get(address)
            .and_then(|id| state.wallet(*id))
            .map(|wallet| wallet.balance))
    }

    async fn recent_transactions(&self, limit: i64) -> StoreResult<Vec<TransactionRecord>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(state
            .records
            .iter()
            .rev()
            .take(limit)
            .map(|record| TransactionRecord {
                id: record.id,
                sender_id: record.sender,
                receiver_id: record.receiver,
                sender_address: state.address_of(record.sender),
                receiver_address: state.address_of(record.receiver),
                amount: record.amount,
                created_at: record.created_at,
            })
            .collect())
    }

    async fn total_balance(&self) -> StoreResult<Decimal> {
        let state = self.state.lock().await;
        state
            .wallets
            .iter()
            .try_fold(Decimal::ZERO, |total, wallet| total.checked_add(wallet.balance))
            .ok_or_else(|| StoreError::Backend("total balance overflow".to_string()))
    }

    async fn wallet_count(&self) -> StoreResult<i64> {
        Ok(self.state.lock().await.wallets.len() as i64)
    }

    async fn create_wallet(&self, address: &str, balance: Decimal) -> StoreResult<WalletId> {
        let mut state = self.state.lock().await;
        if state.by_address.contains_key(address) {
            return Err(StoreError::Backend(format!(
                "wallet address already exists: {address}"
            )));
        }
        if balance < Decimal::ZERO {
            return Err(StoreError::Backend("wallet balance must be >= 0".to_string()));
        }
        within_range(balance)?;

        let id = WalletId(state.wallets.len() as i64 + 1);
        state.wallets.push(Wallet {
            id,
            address: address.to_string(),
            balance,
            created_at: Utc::now(),
        });
        state.by_address.insert(address.to_string(), id);
        Ok(id)
    }

    async fn health_check(&self) -> StoreResult<()> {
        match self.fault {
            Some(Fault::Fail(FaultPoint::Begin)) => {
                Err(StoreError::Backend("store unavailable".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Exclusive access to the in-memory state until commit, rollback or drop
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
    fault: Option<Fault>,
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_wallet(&mut self, address: &str) -> StoreResult<Option<WalletId>> {
        checkpoint(self.fault, FaultPoint::Lookup).await?;
        Ok(self.guard.by_address.get(address).copied())
    }

    async fn lock_balances(&mut self, ids: &[WalletId]) -> StoreResult<Vec<(WalletId, Decimal)>> {
        checkpoint(self.fault, FaultPoint::Lock).await?;

        let mut locked: Vec<(WalletId, Decimal)> = ids
            .iter()
            .filter_map(|id| self.guard.wallet(*id).map(|wallet| (*id, wallet.balance)))
            .collect();
        locked.sort_by_key(|(id, _)| *id);
        locked.dedup_by_key(|(id, _)| *id);
        Ok(locked)
    }

    async fn adjust_balance(
        &mut self,
        id: WalletId,
        delta: Decimal,
    ) -> StoreResult<Option<Decimal>> {
        let point = if delta < Decimal::ZERO {
            FaultPoint::Debit
        } else {
            FaultPoint::Credit
        };
        checkpoint(self.fault, point).await?;

        let Some(wallet) = self.guard.wallet_mut(id) else {
            return Ok(None);
        };
        let updated = wallet
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend("balance overflow".to_string()))?;
        if updated < Decimal::ZERO {
            return Ok(None);
        }
        wallet.balance = within_range(updated)?;

        acknowledge(self.fault, point).await;
        Ok(Some(updated))
    }

    async fn insert_record(
        &mut self,
        sender: WalletId,
        receiver: WalletId,
        amount: Decimal,
    ) -> StoreResult<RecordStamp> {
        checkpoint(self.fault, FaultPoint::Record).await?;

        if self.guard.wallet(sender).is_none() || self.guard.wallet(receiver).is_none() {
            return Err(StoreError::Backend(
                "transaction record references an unknown wallet".to_string(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(StoreError::Backend(
                "transaction amount must be positive".to_string(),
            ));
        }

        let stamp = RecordStamp {
            id: self.guard.records.len() as i64 + 1,
            created_at: self.guard.next_timestamp(),
        };
        self.guard.records.push(StoredRecord {
            id: stamp.id,
            sender,
            receiver,
            amount,
            created_at: stamp.created_at,
        });

        acknowledge(self.fault, FaultPoint::Record).await;
        Ok(stamp)
    }

    async fn commit(mut self) -> StoreResult<()> {
        checkpoint(self.fault, FaultPoint::Commit).await?;
        self.snapshot = None;

        acknowledge(self.fault, FaultPoint::Commit).await;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        // Drop restores the snapshot
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn store_with(balances: &[(&str, Decimal)]) -> MemoryLedgerStore {
        let store = MemoryLedgerStore::new();
        for (address, balance) in balances {
            store.create_wallet(address, *balance).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_dropped_unit_restores_state() {
        let store = store_with(&[("a", dec!(10.00))]).await;

        {
            let mut unit = store.begin().await.unwrap();
            let updated = unit.adjust_balance(WalletId(1), dec!(-4.00)).await.unwrap();
            assert_eq!(updated, Some(dec!(6.00)));
        }

        assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(10.00)));
    }

    #[tokio::test]
    async fn test_committed_unit_persists() {
        let store = store_with(&[("a", dec!(10.00)), ("b", dec!(0))]).await;

        let mut unit = store.begin().await.unwrap();
        unit.adjust_balance(WalletId(1), dec!(-4.00)).await.unwrap();
        unit.adjust_balance(WalletId(2), dec!(4.00)).await.unwrap();
        unit.insert_record(WalletId(1), WalletId(2), dec!(4.00))
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(6.00)));
        assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(4.00)));
        assert_eq!(store.recent_transactions(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_refuses_negative_result() {
        let store = store_with(&[("a", dec!(1.00))]).await;

        let mut unit = store.begin().await.unwrap();
        assert_eq!(
            unit.adjust_balance(WalletId(1), dec!(-1.01)).await.unwrap(),
            None
        );
        assert_eq!(
            unit.adjust_balance(WalletId(99), dec!(1.00)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_lock_balances_sorted_and_deduplicated() {
        let store = store_with(&[("a", dec!(1)), ("b", dec!(2))]).await;

        let mut unit = store.begin().await.unwrap();
        let locked = unit
            .lock_balances(&[WalletId(2), WalletId(1), WalletId(2), WalletId(7)])
            .await
            .unwrap();
        assert_eq!(locked, vec![(WalletId(1), dec!(1)), (WalletId(2), dec!(2))]);
    }

    #[tokio::test]
    async fn test_injected_failure_surfaces_as_backend_error() {
        let store = store_with(&[("a", dec!(1))])
            .await
            .with_fault(Fault::Fail(FaultPoint::Lookup));

        let mut unit = store.begin().await.unwrap();
        let err = unit.find_wallet("a").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_balance_beyond_column_range_is_refused() {
        let store = store_with(&[("a", MAX_BALANCE), ("b", dec!(1))]).await;
        assert!(store.create_wallet("c", Decimal::MAX).await.is_err());

        let mut unit = store.begin().await.unwrap();
        let err = unit
            .adjust_balance(WalletId(1), dec!(0.01))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        drop(unit);

        assert_eq!(store.balance_of("a").await.unwrap(), Some(MAX_BALANCE));
        assert_eq!(
            store.total_balance().await.unwrap(),
            MAX_BALANCE + dec!(1)
        );
    }

    #[tokio::test]
    async fn test_total_balance_overflow_is_an_error() {
        let store = MemoryLedgerStore::new();
        {
            let mut state = store.state.lock().await;
            for (index, address) in ["a", "b"].into_iter().enumerate() {
                let id = WalletId(index as i64 + 1);
                state.wallets.push(Wallet {
                    id,
                    address: address.to_string(),
                    balance: Decimal::MAX,
                    created_at: Utc::now(),
                });
                state.by_address.insert(address.to_string(), id);
            }
        }

        assert!(matches!(
            store.total_balance().await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_delayed_commit_is_already_durable() {
        let store = store_with(&[("a", dec!(10)), ("b", dec!(0))]).await;
        let slow = store
            .without_fault()
            .with_fault(Fault::DelayAfter(FaultPoint::Commit, Duration::from_secs(5)));

        let mut unit = slow.begin().await.unwrap();
        unit.adjust_balance(WalletId(1), dec!(-4)).await.unwrap();
        unit.adjust_balance(WalletId(2), dec!(4)).await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), unit.commit()).await;
        assert!(pending.is_err());

        assert_eq!(store.balance_of("a").await.unwrap(), Some(dec!(6)));
        assert_eq!(store.balance_of("b").await.unwrap(), Some(dec!(4)));
    }

    #[tokio::test]
    async fn test_duplicate_address_rejected() {
        let store = store_with(&[("a", dec!(1))]).await;
        assert!(store.create_wallet("a", dec!(0)).await.is_err());
        assert_eq!(store.wallet_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_timestamps_strictly_increase() {
        let store = store_with(&[("a", dec!(10)), ("b", dec!(0))]).await;

        let mut unit = store.begin().await.unwrap();
        let first = unit
            .insert_record(WalletId(1), WalletId(2), dec!(1))
            .await
            .unwrap();
        let second = unit
            .insert_record(WalletId(1), WalletId(2), dec!(1))
            .await
            .unwrap();
        assert!(second.created_at > first.created_at);
        assert!(second.id > first.id);
    }
}
