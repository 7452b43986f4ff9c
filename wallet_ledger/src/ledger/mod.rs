//! Ledger store: wallet balances and the append-only transaction table.
//!
//! - [`LedgerStore`] / [`UnitOfWork`]: storage traits
//! - [`PgLedgerStore`]: PostgreSQL implementation
//! - [`MemoryLedgerStore`]: in-process implementation with fault injection

pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use memory::{Fault, FaultPoint, MemoryLedgerStore, MemoryUnitOfWork};
pub use models::{
    MAX_BALANCE, RecordStamp, TransactionRecord, TransferReceipt, TransferRequest, Wallet,
    WalletId,
};
pub use postgres::{PgLedgerStore, PgUnitOfWork};
pub use store::{LedgerStore, UnitOfWork};
