//! Transfer phases.
//!
//! ```text
//! Validating -> Authorizing -> Mutating -> Recording -> Committing -> Done
//!      \             \             \            \             \
//!       +-------------+-------------+------------+-------------+--> Aborted
//! ```

use serde::Serialize;
use std::fmt;

/// Position of a transfer in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    /// Both addresses are being resolved
    Validating,
    /// Wallets locked, sender balance checked
    Authorizing,
    /// Debit and credit being applied
    Mutating,
    /// Transaction record being appended
    Recording,
    /// Unit of work being committed
    Committing,
    Done,
    Aborted,
}

impl TransferPhase {
    /// Following phase on the success path. Terminal phases stay put.
    pub fn next(self) -> Self {
        match self {
            TransferPhase::Validating => TransferPhase::Authorizing,
            TransferPhase::Authorizing => TransferPhase::Mutating,
            TransferPhase::Mutating => TransferPhase::Recording,
            TransferPhase::Recording => TransferPhase::Committing,
            TransferPhase::Committing => TransferPhase::Done,
            TransferPhase::Done => TransferPhase::Done,
            TransferPhase::Aborted => TransferPhase::Aborted,
        }
    }

    /// Phase after a failure. Terminal phases stay put.
    pub fn abort(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            TransferPhase::Aborted
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferPhase::Done | TransferPhase::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferPhase::Validating => "validating",
            TransferPhase::Authorizing => "authorizing",
            TransferPhase::Mutating => "mutating",
            TransferPhase::Recording => "recording",
            TransferPhase::Committing => "committing",
            TransferPhase::Done => "done",
            TransferPhase::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
