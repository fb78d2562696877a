// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - CORE MODULE
//
// Token-accounting primitives: Address, Ledger, FeeRouter, voting checkpoints.
// The Ledger is the single owner of balances and supply; vesting and lock
// managers move value only through `Ledger::transfer`.
// All financial arithmetic uses u128 base units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod address;
pub mod admin;
pub mod amount_str;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod event;
pub mod fee_router;
pub mod ledger;
pub mod recovery;

pub use address::{Address, AddressParseError};
pub use admin::Administrator;
pub use checkpoint::{Checkpoint, CheckpointHistory};
pub use error::{ErrorKind, LedgerError, LedgerResult, SnapshotError};
pub use event::Event;
pub use fee_router::{FeeConfig, FeeSink, Route, Waiver};
pub use ledger::Ledger;
pub use recovery::ForeignHoldings;

/// Display precision: 1 token = 10^18 base units.
pub const DECIMALS: u32 = 18;

/// Base units per whole token.
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Hard supply cap: 1,000,000,000 tokens in base units.
/// Every mint path is checked against this, including mints routed through
/// `Ledger::transfer` from the zero sentinel.
pub const MAX_SUPPLY: u128 = 1_000_000_000 * UNIT;

/// Basis-point denominator (10,000 bp = 100%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Transfer-fee ceiling: 500 bp = 5%.
pub const MAX_FEE_BPS: u16 = 500;

/// Seconds per day, for schedule and deadline arithmetic.
pub const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Integer `floor(value * numerator / denominator)` without intermediate overflow.
///
/// Splits `value = q * denominator + r` so the product never exceeds
/// `max(value, r * numerator)`. Exact for all inputs with `numerator <= denominator`
/// and `denominator <= u64::MAX`; returns 0 when `denominator == 0`.
pub fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        return 0;
    }
    let q = value / denominator;
    let r = value % denominator;
    q.saturating_mul(numerator)
        .saturating_add(r.saturating_mul(numerator) / denominator)
}
