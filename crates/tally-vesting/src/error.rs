use tally_core::{Address, ErrorKind, LedgerError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VestingError {
    // ── Validation ──
    #[error("Zero address not allowed for {0}")]
    ZeroAddress(&'static str),

    #[error("Schedule total amount must be non-zero")]
    ZeroAmount,

    #[error("Vesting duration must be non-zero")]
    ZeroDuration,

    #[error("Cliff {cliff}s exceeds vesting duration {duration}s")]
    CliffExceedsDuration { cliff: u64, duration: u64 },

    #[error("Invalid beneficiary {0}")]
    InvalidBeneficiary(Address),

    #[error("Manager is bound to ledger {expected}, got {got}")]
    WrongLedger { expected: Address, got: Address },

    // ── State ──
    #[error("{0} already has an active schedule")]
    ScheduleExists(Address),

    #[error("{0} has no schedule")]
    NoSchedule(Address),

    #[error("Schedule for {0} is already revoked")]
    AlreadyRevoked(Address),

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Escrow deposit would be charged a {fee} unit transfer fee; exempt the manager first")]
    EscrowFeeCharged { fee: u128 },

    // ── Invariant ──
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl VestingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VestingError::ZeroAddress(_)
            | VestingError::ZeroAmount
            | VestingError::ZeroDuration
            | VestingError::CliffExceedsDuration { .. }
            | VestingError::InvalidBeneficiary(_)
            | VestingError::WrongLedger { .. } => ErrorKind::Validation,
            VestingError::ScheduleExists(_)
            | VestingError::NoSchedule(_)
            | VestingError::AlreadyRevoked(_)
            | VestingError::NothingToClaim
            | VestingError::EscrowFeeCharged { .. } => ErrorKind::State,
            VestingError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            VestingError::Ledger(e) => e.kind(),
        }
    }
}

/// Result type for vesting operations
pub type VestingResult<T> = Result<T, VestingError>;
