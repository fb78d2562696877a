use serde::{Deserialize, Serialize};
use tally_core::{amount_str, mul_div_floor, Address};

use crate::error::{VestingError, VestingResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub beneficiary: Address,
    #[serde(with = "amount_str")]
    pub total_amount: u128,
    #[serde(with = "amount_str")]
    pub claimed_amount: u128,
    pub start_time: u64,
    pub cliff_duration: u64,
    pub vesting_duration: u64,
    pub revoked: bool,
    /// False once revoked; the beneficiary may then get a new schedule
    pub exists: bool,
}

impl VestingSchedule {
    pub fn new(
        beneficiary: Address,
        total_amount: u128,
        start_time: u64,
        cliff_duration: u64,
        vesting_duration: u64,
    ) -> VestingResult<Self> {
        if beneficiary.is_zero() {
            return Err(VestingError::ZeroAddress("beneficiary"));
        }
        if total_amount == 0 {
            return Err(VestingError::ZeroAmount);
        }
        if vesting_duration == 0 {
            return Err(VestingError::ZeroDuration);
        }
        if cliff_duration > vesting_duration {
            return Err(VestingError::CliffExceedsDuration {
                cliff: cliff_duration,
                duration: vesting_duration,
            });
        }
        Ok(Self {
            beneficiary,
            total_amount,
            claimed_amount: 0,
            start_time,
            cliff_duration,
            vesting_duration,
            revoked: false,
            exists: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.exists && !self.revoked
    }

    pub fn cliff_end(&self) -> u64 {
        self.start_time.saturating_add(self.cliff_duration)
    }

    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.vesting_duration)
    }

    /// Vested to date. Frozen at the settled amount once revoked.
    pub fn vested_amount(&self, now: u64) -> u128 {
        if self.revoked {
            return self.claimed_amount;
        }
        if now < self.cliff_end() {
            return 0;
        }
        if now >= self.end_time() {
            return self.total_amount;
        }
        let elapsed = (now - self.start_time) as u128;
        mul_div_floor(self.total_amount, elapsed, self.vesting_duration as u128)
    }

    /// `vested − claimed`, floored at 0.
    pub fn claimable_amount(&self, now: u64) -> u128 {
        self.vested_amount(now).saturating_sub(self.claimed_amount)
    }

    /// Escrow still owed by this schedule.
    pub fn outstanding(&self) -> u128 {
        if self.revoked {
            0
        } else {
            self.total_amount - self.claimed_amount
        }
    }
}
