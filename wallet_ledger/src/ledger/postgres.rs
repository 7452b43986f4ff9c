//! PostgreSQL ledger store.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

use super::errors::StoreResult;
use super::models::{RecordStamp, TransactionRecord, WalletId};
use super::store::{LedgerStore, UnitOfWork};
use crate::db::Database;
use crate::db::timeouts::with_default_timeout;

/// Ledger store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgLedgerStore {
    /// Create a store on top of a connected database
    pub fn new(db: &Database) -> Self {
        Self::from_pool(db.pool().clone(), db.statement_timeout())
    }

    /// Create a store from a raw pool
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `statement_timeout` - Timeout applied to each statement inside a unit of work
    pub fn from_pool(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Unit = PgUnitOfWork;

    async fn begin(&self) -> StoreResult<PgUnitOfWork> {
        let mut tx = with_default_timeout(self.pool.begin()).await?;

        // Scoped to this transaction only
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(format!("{}ms", self.statement_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;

        Ok(PgUnitOfWork { tx })
    }

    async fn find_wallet(&self, address: &str) -> StoreResult<Option<WalletId>> {
        let row = with_default_timeout(
            sqlx::query("SELECT wallet_id FROM wallets WHERE address = $1")
                .bind(address)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|row| WalletId(row.get("wallet_id"))))
    }

    async fn wallet_exists(&self, address: &str) -> StoreResult<bool> {
        let row = with_default_timeout(
            sqlx::query("SELECT EXISTS(SELECT 1 FROM wallets WHERE address = $1) AS present")
                .bind(address)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("present"))
    }

    async fn balance_of(&self, address: &str) -> StoreResult<Option<Decimal>> {
        let row = with_default_timeout(
            sqlx::query("SELECT balance FROM wallets WHERE address = $1")
                .bind(address)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|row| row.get("balance")))
    }

    async fn recent_transactions(&self, limit: i64) -> StoreResult<Vec<TransactionRecord>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT t.id, t.sender_id, t.receiver_id, t.amount, t.created_at,
                       s.address AS sender_address, r.address AS receiver_address
                FROM transactions t
                JOIN wallets s ON s.wallet_id = t.sender_id
                JOIN wallets r ON r.wallet_id = t.receiver_id
                ORDER BY t.created_at DESC, t.id DESC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool),
        )
        .await?;

        let records = rows
            .into_iter()
            .map(|row| TransactionRecord {
                id: row.get("id"),
                sender_id: WalletId(row.get("sender_id")),
                receiver_id: WalletId(row.get("receiver_id")),
                sender_address: row.get("sender_address"),
                receiver_address: row.get("receiver_address"),
                amount: row.get("amount"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(records)
    }

    async fn total_balance(&self) -> StoreResult<Decimal> {
        let row = with_default_timeout(
            sqlx::query("SELECT COALESCE(SUM(balance), 0) AS total FROM wallets")
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("total"))
    }

    async fn wallet_count(&self) -> StoreResult<i64> {
        let row = with_default_timeout(
            sqlx::query("SELECT COUNT(*) AS count FROM wallets").fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("count"))
    }

    async fn create_wallet(&self, address: &str, balance: Decimal) -> StoreResult<WalletId> {
        let row = with_default_timeout(
            sqlx::query("INSERT INTO wallets (address, balance) VALUES ($1, $2) RETURNING wallet_id")
                .bind(address)
                .bind(balance)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(WalletId(row.get("wallet_id")))
    }

    async fn health_check(&self) -> StoreResult<()> {
        with_default_timeout(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

/// One PostgreSQL transaction. Dropping it without committing rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_wallet(&mut self, address: &str) -> StoreResult<Option<WalletId>> {
        let row = sqlx::query("SELECT wallet_id FROM wallets WHERE address = $1")
            .bind(address)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(|row| WalletId(row.get("wallet_id"))))
    }

    async fn lock_balances(&mut self, ids: &[WalletId]) -> StoreResult<Vec<(WalletId, Decimal)>> {
        let raw_ids: Vec<i64> = ids.iter().map(|id| id.0).collect();

        // Ascending id order keeps opposing transfers from deadlocking
        let rows = sqlx::query(
            "SELECT wallet_id, balance FROM wallets
             WHERE wallet_id = ANY($1)
             ORDER BY wallet_id
             FOR UPDATE",
        )
        .bind(raw_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (WalletId(row.get("wallet_id")), row.get("balance")))
            .collect())
    }

    async fn adjust_balance(
        &mut self,
        id: WalletId,
        delta: Decimal,
    ) -> StoreResult<Option<Decimal>> {
        let row = sqlx::query(
            "UPDATE wallets
             SET balance = balance + $1
             WHERE wallet_id = $2 AND balance + $1 >= 0
             RETURNING balance",
        )
        .bind(delta)
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|row| row.get("balance")))
    }

    async fn insert_record(
        &mut self,
        sender: WalletId,
        receiver: WalletId,
        amount: Decimal,
    ) -> StoreResult<RecordStamp> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (sender_id, receiver_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(sender.0)
        .bind(receiver.0)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(RecordStamp {
            id: row.get("id"),
            created_at: row.get("created_at"),
        })
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
