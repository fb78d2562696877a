//! State-change records.
//!
//! Appended to the ledger journal only when an operation succeeds, in the
//! order the changes were applied. Indexers consume them via
//! `Ledger::drain_events()`.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount_str;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum Event {
    // ── Ledger ──
    Mint {
        to: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    Burn {
        from: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    /// Fee leg of a transfer. `sink` is `Address::ZERO` when the fee was burned.
    FeeCharged {
        from: Address,
        sink: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    FeeUpdated {
        old_bps: u16,
        new_bps: u16,
    },
    FeeRecipientUpdated {
        old: Option<Address>,
        new: Option<Address>,
    },
    FeeEnabledUpdated {
        old: bool,
        new: bool,
    },
    ExemptionUpdated {
        account: Address,
        old: bool,
        new: bool,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    ForeignRecovered {
        holder: Address,
        asset: Address,
        to: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },

    // ── Vesting ──
    VestingCreated {
        beneficiary: Address,
        #[serde(with = "amount_str")]
        total_amount: u128,
        start_time: u64,
        cliff_duration: u64,
        vesting_duration: u64,
    },
    VestingClaimed {
        beneficiary: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    VestingRevoked {
        beneficiary: Address,
        #[serde(with = "amount_str")]
        paid_to_beneficiary: u128,
        #[serde(with = "amount_str")]
        returned_to_admin: u128,
    },

    // ── Lock distribution ──
    LockFunded {
        from: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    BeneficiaryAdded {
        beneficiary: Address,
        lock_id: u64,
        lock_type: u8,
        #[serde(with = "amount_str")]
        amount: u128,
        unlock_time: u64,
    },
    LockClaimed {
        beneficiary: Address,
        lock_id: u64,
        #[serde(with = "amount_str")]
        amount: u128,
    },
    UnassignedSwept {
        recipient: Address,
        #[serde(with = "amount_str")]
        amount: u128,
    },
}

impl Event {
    /// Stable tag for log lines and indexer routing.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Mint { .. } => "Mint",
            Event::Burn { .. } => "Burn",
            Event::Transfer { .. } => "Transfer",
            Event::FeeCharged { .. } => "FeeCharged",
            Event::FeeUpdated { .. } => "FeeUpdated",
            Event::FeeRecipientUpdated { .. } => "FeeRecipientUpdated",
            Event::FeeEnabledUpdated { .. } => "FeeEnabledUpdated",
            Event::ExemptionUpdated { .. } => "ExemptionUpdated",
            Event::Paused { .. } => "Paused",
            Event::Unpaused { .. } => "Unpaused",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::ForeignRecovered { .. } => "ForeignRecovered",
            Event::VestingCreated { .. } => "VestingCreated",
            Event::VestingClaimed { .. } => "VestingClaimed",
            Event::VestingRevoked { .. } => "VestingRevoked",
            Event::LockFunded { .. } => "LockFunded",
            Event::BeneficiaryAdded { .. } => "BeneficiaryAdded",
            Event::LockClaimed { .. } => "LockClaimed",
            Event::UnassignedSwept { .. } => "UnassignedSwept",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
