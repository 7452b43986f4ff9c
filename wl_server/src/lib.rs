//! HTTP server for the wallet transfer ledger.
//!
//! The binary in `main.rs` wires configuration, storage and the router
//! together; everything it uses lives here so integration tests can drive
//! the router directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
