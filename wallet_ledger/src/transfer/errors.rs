//! Transfer error types.

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use super::phase::TransferPhase;
use crate::ledger::StoreError;
use crate::lookup::LookupError;

/// Transfer errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// Sender or receiver address does not resolve
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Amount is not positive or has too many fractional digits
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Sender cannot cover the amount
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    /// Store failure, tagged with the phase that hit it
    #[error("Storage failure while {phase}: {source}")]
    Storage {
        phase: TransferPhase,
        #[source]
        source: StoreError,
    },

    /// Transfer did not finish within its deadline and was rolled back
    #[error("Transfer timed out while {phase} after {after:?}")]
    Timeout {
        phase: TransferPhase,
        after: Duration,
    },
}

impl TransferError {
    pub(crate) fn from_lookup(phase: TransferPhase, err: LookupError) -> Self {
        match err {
            LookupError::NotFound(address) => TransferError::WalletNotFound(address),
            LookupError::Store(source) => TransferError::Storage { phase, source },
        }
    }

    /// Request was refused on its merits; nothing to retry
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransferError::WalletNotFound(_)
                | TransferError::InvalidAmount(_)
                | TransferError::InsufficientBalance { .. }
        )
    }

    /// Failure may clear up on retry
    ///
    /// A commit that failed midway may still have been applied, so it is
    /// never reported as safe to retry.
    pub fn is_transient(&self) -> bool {
        match self {
            TransferError::Timeout { .. } => true,
            TransferError::Storage {
                phase: TransferPhase::Committing,
                ..
            } => false,
            TransferError::Storage { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Phase in which a storage failure or timeout happened
    pub fn phase(&self) -> Option<TransferPhase> {
        match self {
            TransferError::Storage { phase, .. } | TransferError::Timeout { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }

    /// Short label for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            TransferError::WalletNotFound(_) => "wallet_not_found",
            TransferError::InvalidAmount(_) => "invalid_amount",
            TransferError::InsufficientBalance { .. } => "insufficient_balance",
            TransferError::Storage { .. } => "storage_failure",
            TransferError::Timeout { .. } => "timeout",
        }
    }

    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            TransferError::WalletNotFound(_) => "Invalid wallet address".to_string(),
            TransferError::InvalidAmount(_) => {
                "Transfer amount must be positive with at most 2 decimal places".to_string()
            }
            TransferError::InsufficientBalance { .. } => {
                "Insufficient funds for transfer".to_string()
            }
            TransferError::Storage {
                phase: TransferPhase::Committing,
                ..
            } => "Transfer outcome unknown, check transaction history before retrying".to_string(),
            TransferError::Storage { .. } if self.is_transient() => {
                "Service temporarily unavailable, please retry".to_string()
            }
            TransferError::Storage { .. } => "Internal server error".to_string(),
            TransferError::Timeout { .. } => "Transfer timed out, please retry".to_string(),
        }
    }
}

/// Result type for transfers
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejections() {
        assert!(TransferError::WalletNotFound("x".to_string()).is_rejection());
        assert!(TransferError::InvalidAmount(dec!(0)).is_rejection());
        assert!(
            TransferError::InsufficientBalance {
                available: dec!(1),
                required: dec!(2)
            }
            .is_rejection()
        );
        assert!(
            !TransferError::Storage {
                phase: TransferPhase::Mutating,
                source: StoreError::Backend("x".to_string()),
            }
            .is_rejection()
        );
    }

    #[test]
    fn test_client_message_hides_storage_details() {
        let err = TransferError::Storage {
            phase: TransferPhase::Recording,
            source: StoreError::Backend("relation \"transactions\" is locked".to_string()),
        };
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("recording"));
        assert_eq!(err.phase(), Some(TransferPhase::Recording));
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = TransferError::Timeout {
            phase: TransferPhase::Authorizing,
            after: Duration::from_millis(250),
        };
        assert!(err.is_transient());
        assert_eq!(err.outcome(), "timeout");
        assert_eq!(err.to_string(), "Transfer timed out while authorizing after 250ms");
    }

    #[test]
    fn test_commit_failure_is_not_retryable() {
        let err = TransferError::Storage {
            phase: TransferPhase::Committing,
            source: StoreError::Timeout(Duration::from_secs(5)),
        };
        assert!(!err.is_transient());
        assert!(err.client_message().contains("outcome unknown"));

        let err = TransferError::Storage {
            phase: TransferPhase::Recording,
            source: StoreError::Timeout(Duration::from_secs(5)),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_insufficient_balance_display() {
        let err = TransferError::InsufficientBalance {
            available: dec!(20.00),
            required: dec!(30.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available 20.00, required 30.00"
        );
    }

    #[test]
    fn test_lookup_conversion() {
        let err = TransferError::from_lookup(
            TransferPhase::Validating,
            LookupError::NotFound("abc".to_string()),
        );
        assert!(matches!(err, TransferError::WalletNotFound(a) if a == "abc"));
    }
}
