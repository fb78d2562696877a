use tally_core::{Address, ErrorKind, LedgerError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    // ── Validation ──
    #[error("Zero address not allowed for {0}")]
    ZeroAddress(&'static str),

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Pool needs at least one beneficiary")]
    ZeroBeneficiaries,

    #[error("Pool of {pool_size} split {num_beneficiaries} ways leaves a zero share")]
    ShareRoundsToZero { pool_size: u128, num_beneficiaries: u64 },

    #[error("Lock type {id} outside 0..={max}")]
    InvalidLockType { id: u8, max: u8 },

    #[error("Invalid beneficiary {0}")]
    InvalidBeneficiary(Address),

    #[error("Distributor is bound to ledger {expected}, got {got}")]
    WrongLedger { expected: Address, got: Address },

    // ── State ──
    #[error("Deadline {end_time} has passed (now {now})")]
    PastDeadline { end_time: u64, now: u64 },

    #[error("Deadline {end_time} not reached (now {now})")]
    BeforeDeadline { end_time: u64, now: u64 },

    #[error("{0} already has an allocation")]
    AlreadyAssigned(Address),

    #[error("All {capacity} shares are assigned")]
    PoolFull { capacity: u64 },

    #[error("Escrow {escrow} below required {required}")]
    NotEnoughFunded { escrow: u128, required: u128 },

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Nothing to sweep")]
    NoSweepable,

    // ── Invariant ──
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl LockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::ZeroAddress(_)
            | LockError::ZeroAmount
            | LockError::ZeroBeneficiaries
            | LockError::ShareRoundsToZero { .. }
            | LockError::InvalidLockType { .. }
            | LockError::InvalidBeneficiary(_)
            | LockError::WrongLedger { .. } => ErrorKind::Validation,
            LockError::PastDeadline { .. }
            | LockError::BeforeDeadline { .. }
            | LockError::AlreadyAssigned(_)
            | LockError::PoolFull { .. }
            | LockError::NotEnoughFunded { .. }
            | LockError::NothingToClaim
            | LockError::NoSweepable => ErrorKind::State,
            LockError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            LockError::Ledger(e) => e.kind(),
        }
    }
}

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;
