//! Ledger data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest value a `NUMERIC(20, 2)` balance column holds
pub const MAX_BALANCE: Decimal = Decimal::from_parts(0x630F_FFFF, 0x6BC7_5E2D, 0x5, false, 2);

/// Internal wallet identifier assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub i64);

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub address: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Append-only ledger entry, joined with both wallet addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub sender_id: WalletId,
    pub receiver_id: WalletId,
    pub sender_address: String,
    pub receiver_address: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Identity and timestamp the store assigned to a freshly inserted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStamp {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Transfer request between two wallet addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_address: String,
    pub receiver_address: String,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(
        sender_address: impl Into<String>,
        receiver_address: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            sender_address: sender_address.into(),
            receiver_address: receiver_address.into(),
            amount,
        }
    }
}

/// Confirmation of a committed transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transaction_id: i64,
    pub sender_address: String,
    pub receiver_address: String,
    pub amount: Decimal,
    pub sender_balance: Decimal,
    pub receiver_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_max_balance_matches_column_precision() {
        assert_eq!(MAX_BALANCE, dec!(999999999999999999.99));
        assert_eq!(MAX_BALANCE.scale(), 2);
    }

    #[test]
    fn test_record_wire_format() {
        let record = TransactionRecord {
            id: 7,
            sender_id: WalletId(1),
            receiver_id: WalletId(2),
            sender_address: "a".to_string(),
            receiver_address: "b".to_string(),
            amount: dec!(30.00),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sender_id"], 1);
        assert_eq!(value["amount"], "30.00");
    }
}
