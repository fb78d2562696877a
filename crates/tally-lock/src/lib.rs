// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - LOCK DISTRIBUTION
//
// One pool, split into `num_beneficiaries` equal integer shares:
//   share = pool_size / num_beneficiaries   (remainder is never assignable)
//
// Every lock unlocks at a single global deadline:
//   end_time = created_at + 365 days
//
// Before the deadline the administrator assigns shares (escrow must already
// cover every assigned share). After it, beneficiaries claim and anything not
// reserved for an unclaimed share can be swept to the fixed sweep recipient.
//
//   reserved = share × beneficiaries_count − total_claimed
//   escrow ≥ reserved  (violation is fatal)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod allocation;
pub mod distributor;
pub mod error;

pub use allocation::{LockAllocation, LockType};
pub use distributor::{LockDistributor, LockParams};
pub use error::{LockError, LockResult};

/// Highest valid lock category id (inclusive).
pub const MAX_LOCK_TYPE_ID: u8 = 25;

/// Offset from pool creation to the global unlock time.
pub const LOCK_DURATION_SECS: u64 = 365 * tally_core::SECS_PER_DAY;
