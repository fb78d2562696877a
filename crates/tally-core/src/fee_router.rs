// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - FEE ROUTER
//
// Pure fee policy consulted by the Ledger transfer path.
// - fee = ceil(amount × bp / 10_000), bp ≤ 500 (5%)
// - rounds UP: 99 units at 1% pays 1, never 0
// - waived when disabled, zero amount, sentinel endpoint, or exempt party
// - sink = configured recipient, else the burn sentinel (supply shrinks)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::{BPS_DENOMINATOR, MAX_FEE_BPS};

/// Fee configuration held by the Ledger. Mutated only through the Ledger's
/// validated setters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Transfer fee in basis points, 0..=500
    pub basis_points: u16,
    /// Fee destination; `None` burns the fee
    #[serde(default)]
    pub recipient: Option<Address>,
    pub enabled: bool,
}

impl FeeConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.basis_points > MAX_FEE_BPS {
            return Err(LedgerError::FeeTooHigh {
                bps: self.basis_points,
                max: MAX_FEE_BPS,
            });
        }
        if self.recipient.is_some_and(|r| r.is_zero()) {
            return Err(LedgerError::ZeroAddress("fee recipient"));
        }
        Ok(())
    }

    pub fn sink(&self) -> FeeSink {
        match self.recipient {
            Some(addr) => FeeSink::Recipient(addr),
            None => FeeSink::Burn,
        }
    }
}

/// Where the fee leg goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeSink {
    Recipient(Address),
    Burn,
}

impl FeeSink {
    /// Ledger address credited by the fee leg (`ZERO` for burns).
    pub fn address(&self) -> Address {
        match self {
            FeeSink::Recipient(addr) => *addr,
            FeeSink::Burn => Address::ZERO,
        }
    }
}

/// Why no fee was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waiver {
    Disabled,
    ZeroAmount,
    /// Mint or burn leg (`Address::ZERO` on either side)
    Sentinel,
    ExemptSender,
    ExemptReceiver,
}

/// Outcome of routing one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Credited to the receiver
    pub transfer_amount: u128,
    /// Credited to `fee_sink` (or burned)
    pub fee_amount: u128,
    pub fee_sink: FeeSink,
    /// Set when the fee was waived
    pub waiver: Option<Waiver>,
}

impl Route {
    fn waived(amount: u128, sink: FeeSink, waiver: Waiver) -> Self {
        Self {
            transfer_amount: amount,
            fee_amount: 0,
            fee_sink: sink,
            waiver: Some(waiver),
        }
    }

    /// Sender debit; always equals the requested amount.
    pub fn total(&self) -> u128 {
        self.transfer_amount + self.fee_amount
    }
}

/// `ceil(amount × bps / 10_000)` without overflow for any `u128` amount.
///
/// Splits `amount = q·10_000 + r`: the fee is `q·bps + ceil(r·bps / 10_000)`,
/// which is exact and never exceeds `amount`. Rates above 10_000 bp clamp
/// to 100%.
pub fn compute_fee(amount: u128, bps: u16) -> u128 {
    let bps = (bps as u128).min(BPS_DENOMINATOR);
    let q = amount / BPS_DENOMINATOR;
    let r = amount % BPS_DENOMINATOR;
    q * bps + (r * bps).div_ceil(BPS_DENOMINATOR)
}

/// Route a transfer through the fee policy. Pure; no state is touched.
pub fn route(
    from: &Address,
    to: &Address,
    amount: u128,
    config: &FeeConfig,
    exempt: &BTreeSet<Address>,
) -> Route {
    let sink = config.sink();
    if !config.enabled {
        return Route::waived(amount, sink, Waiver::Disabled);
    }
    if amount == 0 {
        return Route::waived(amount, sink, Waiver::ZeroAmount);
    }
    if from.is_zero() || to.is_zero() {
        return Route::waived(amount, sink, Waiver::Sentinel);
    }
    if exempt.contains(from) {
        return Route::waived(amount, sink, Waiver::ExemptSender);
    }
    if exempt.contains(to) {
        return Route::waived(amount, sink, Waiver::ExemptReceiver);
    }

    let fee_amount = compute_fee(amount, config.basis_points);
    Route {
        transfer_amount: amount - fee_amount,
        fee_amount,
        fee_sink: sink,
        waiver: None,
    }
}
