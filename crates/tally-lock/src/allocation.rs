use serde::{Deserialize, Serialize};
use std::fmt;
use tally_core::{amount_str, Address};

use crate::error::LockError;
use crate::MAX_LOCK_TYPE_ID;

/// Lock category tag, checked to `0..=MAX_LOCK_TYPE_ID` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LockType(u8);

impl LockType {
    pub fn new(id: u8) -> Result<Self, LockError> {
        if id > MAX_LOCK_TYPE_ID {
            return Err(LockError::InvalidLockType {
                id,
                max: MAX_LOCK_TYPE_ID,
            });
        }
        Ok(Self(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LockType {
    type Error = LockError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<LockType> for u8 {
    fn from(t: LockType) -> u8 {
        t.0
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockAllocation {
    pub beneficiary: Address,
    pub lock_id: u64,
    pub lock_type: LockType,
    /// Share still owed; zeroed on claim
    #[serde(with = "amount_str")]
    pub amount: u128,
    pub unlock_time: u64,
    pub claimed: bool,
}
