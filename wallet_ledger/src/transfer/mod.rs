//! Transfer engine.
//!
//! A transfer moves through [`TransferPhase`]s inside one unit of work:
//! addresses are resolved, both wallets are locked and the sender balance is
//! checked, the debit and credit are applied as conditional delta updates, a
//! record is appended, and the unit commits. Failures abort the transfer and
//! roll the unit back.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_decimal::Decimal;
//! use wallet_ledger::db::{Database, DatabaseConfig};
//! use wallet_ledger::ledger::{PgLedgerStore, TransferRequest};
//! use wallet_ledger::transfer::TransferEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::development()).await?;
//!     let engine = TransferEngine::new(Arc::new(PgLedgerStore::new(&db)));
//!
//!     let receipt = engine
//!         .transfer(&TransferRequest::new("a1b2", "c3d4", Decimal::new(3000, 2)))
//!         .await?;
//!     println!("Sender balance after transfer: {}", receipt.sender_balance);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod errors;
pub mod phase;

pub use engine::{MAX_AMOUNT_SCALE, TransferEngine, validate_amount};
pub use errors::{TransferError, TransferResult};
pub use phase::TransferPhase;
