//! # Wallet Ledger
//!
//! Transfers funds between wallets and answers balance and history queries,
//! on top of a relational store with exact decimal balances.
//!
//! ## Architecture
//!
//! - [`ledger`]: the store. [`ledger::LedgerStore`] hands out
//!   [`ledger::UnitOfWork`]s, atomic and isolated sequences of balance
//!   updates and record inserts. PostgreSQL and in-memory implementations.
//! - [`lookup`]: address to wallet id resolution.
//! - [`transfer`]: the transfer engine and its phase state machine.
//! - [`query`]: balance and recent-history reads.
//! - [`db`]: connection pool, configuration, timeouts, migrations, seeding.
//!
//! Components receive the store through their constructors as an `Arc`;
//! there is no process-wide connection handle.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_decimal::Decimal;
//! use wallet_ledger::ledger::{LedgerStore, MemoryLedgerStore, TransferRequest};
//! use wallet_ledger::transfer::TransferEngine;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryLedgerStore::new());
//! store.create_wallet("alice", Decimal::new(10_000, 2)).await.unwrap();
//! store.create_wallet("bob", Decimal::new(5_000, 2)).await.unwrap();
//!
//! let engine = TransferEngine::new(store.clone());
//! let receipt = engine
//!     .transfer(&TransferRequest::new("alice", "bob", Decimal::new(3_000, 2)))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(receipt.sender_balance, Decimal::new(7_000, 2));
//! assert_eq!(receipt.receiver_balance, Decimal::new(8_000, 2));
//! # }
//! ```

/// Database pool, configuration, migrations and seeding.
pub mod db;

/// Wallet and transaction storage.
pub mod ledger;
pub use ledger::{
    LedgerStore, MemoryLedgerStore, PgLedgerStore, StoreError, TransactionRecord,
    TransferReceipt, TransferRequest, UnitOfWork, WalletId,
};

pub mod lookup;
pub use lookup::{LookupError, WalletLookup};

pub mod query;
pub use query::{QueryError, QueryService};

/// Transfer engine.
pub mod transfer;
pub use transfer::{TransferEngine, TransferError, TransferPhase};
