//! Ledger errors and the shared error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

/// Coarse error classes shared by every component.
///
/// - `Validation`: bad input shape, rejected before any state change
/// - `Authorization`: non-administrator on a privileged operation
/// - `State`: operation invalid for the current lifecycle state
/// - `InvariantViolation`: internal consistency check failed; fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    InvariantViolation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ── Validation ──
    #[error("Zero address not allowed for {0}")]
    ZeroAddress(&'static str),

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Transfer fee {bps} bp exceeds maximum {max} bp")]
    FeeTooHigh { bps: u16, max: u16 },

    #[error("Fee recipient cannot be the ledger itself")]
    SelfFeeRecipient,

    #[error("Batch length mismatch: {accounts} accounts, {flags} flags")]
    BatchLengthMismatch { accounts: usize, flags: usize },

    #[error("Batch input is empty")]
    EmptyBatch,

    #[error("Clock regression: now {now} is before last recorded timepoint {last}")]
    ClockRegression { last: u64, now: u64 },

    #[error("Cannot recover the component's own asset {0}")]
    OwnAssetRecovery(Address),

    #[error("Arithmetic overflow")]
    Overflow,

    // ── Authorization ──
    #[error("Unauthorized: {caller} is not the administrator")]
    Unauthorized { caller: Address },

    // ── State ──
    #[error("Ledger is paused")]
    Paused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("Insufficient balance: {account} has {have}, needs {need}")]
    InsufficientBalance {
        account: Address,
        have: u128,
        need: u128,
    },

    #[error("Supply cap exceeded: max {max}, would have {would_have}")]
    CapExceeded { max: u128, would_have: u128 },

    #[error("Insufficient foreign holding of {asset}: have {have}, need {need}")]
    InsufficientForeignHolding {
        asset: Address,
        have: u128,
        need: u128,
    },

    // ── Invariant ──
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ZeroAddress(_)
            | LedgerError::ZeroAmount
            | LedgerError::FeeTooHigh { .. }
            | LedgerError::SelfFeeRecipient
            | LedgerError::BatchLengthMismatch { .. }
            | LedgerError::EmptyBatch
            | LedgerError::ClockRegression { .. }
            | LedgerError::OwnAssetRecovery(_)
            | LedgerError::Overflow => ErrorKind::Validation,
            LedgerError::Unauthorized { .. } => ErrorKind::Authorization,
            LedgerError::Paused
            | LedgerError::NotPaused
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::CapExceeded { .. }
            | LedgerError::InsufficientForeignHolding { .. } => ErrorKind::State,
            LedgerError::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a ledger snapshot could not be restored.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Snapshot rejected: {0}")]
    Rejected(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert_eq!(LedgerError::ZeroAmount.kind(), ErrorKind::Validation);
        assert_eq!(
            LedgerError::Unauthorized {
                caller: Address::derive("mallory")
            }
            .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(LedgerError::Paused.kind(), ErrorKind::State);
        assert_eq!(
            LedgerError::CapExceeded {
                max: 10,
                would_have: 11
            }
            .kind(),
            ErrorKind::State
        );
        let fatal = LedgerError::InvariantViolation("supply drift".to_string());
        assert_eq!(fatal.kind(), ErrorKind::InvariantViolation);
        assert!(fatal.is_fatal());
        assert!(!LedgerError::Paused.is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = LedgerError::FeeTooHigh { bps: 600, max: 500 };
        assert_eq!(err.to_string(), "Transfer fee 600 bp exceeds maximum 500 bp");
    }
}
