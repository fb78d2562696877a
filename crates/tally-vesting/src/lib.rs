// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - VESTING
//
// Per-beneficiary cliff + linear vesting, escrowed as the manager's own
// balance on the Ledger.
//
//   NoSchedule ──create──▶ Active ──claim──▶ Active
//                             │
//                             └──revoke──▶ Revoked (terminal; key reusable)
//
// vested(now) = 0                              now < start + cliff
//             = total                          now ≥ start + duration
//             = ⌊total × (now − start) / duration⌋   otherwise
//
// Truncation under-vests; the last unit is released at start + duration.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod error;
pub mod manager;
pub mod schedule;

pub use error::{VestingError, VestingResult};
pub use manager::{RevokeOutcome, VestingManager};
pub use schedule::VestingSchedule;
