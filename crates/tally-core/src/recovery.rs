//! Foreign-asset recovery.
//!
//! Components can end up holding balances of other tokens (mistaken
//! deposits). `ForeignHoldings` tracks them per asset and releases them to
//! the administrator. The component's own asset is never recoverable through
//! this path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::event::Event;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignHoldings {
    /// asset contract → amount held
    holdings: BTreeMap<Address, u128>,
}

impl ForeignHoldings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming foreign-asset deposit.
    pub fn receive(&mut self, asset: Address, amount: u128) -> LedgerResult<()> {
        if asset.is_zero() {
            return Err(LedgerError::ZeroAddress("foreign asset"));
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let held = self.holdings.entry(asset).or_insert(0);
        *held = held.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub fn balance_of(&self, asset: &Address) -> u128 {
        self.holdings.get(asset).copied().unwrap_or(0)
    }

    pub fn assets(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.holdings.iter()
    }

    /// Release `amount` of `asset` to `to`. The authorization check is the
    /// caller's job; this enforces the input rules.
    pub fn recover(
        &mut self,
        holder: Address,
        own_asset: Address,
        asset: Address,
        amount: u128,
        to: Address,
    ) -> LedgerResult<Event> {
        if asset.is_zero() {
            return Err(LedgerError::ZeroAddress("foreign asset"));
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress("recovery destination"));
        }
        if asset == own_asset {
            return Err(LedgerError::OwnAssetRecovery(asset));
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let have = self.balance_of(&asset);
        if have < amount {
            return Err(LedgerError::InsufficientForeignHolding {
                asset,
                have,
                need: amount,
            });
        }

        let remaining = have - amount;
        if remaining == 0 {
            self.holdings.remove(&asset);
        } else {
            self.holdings.insert(asset, remaining);
        }
        log::info!(
            "recovered {} of foreign asset {} from {} to {}",
            amount,
            asset.short(),
            holder.short(),
            to.short()
        );
        Ok(Event::ForeignRecovered {
            holder,
            asset,
            to,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_and_recover() {
        let holder = Address::derive("vesting");
        let own = Address::derive("tally-token");
        let usdc = Address::derive("usdc");
        let admin = Address::derive("admin");

        let mut h = ForeignHoldings::new();
        h.receive(usdc, 500).unwrap();
        h.receive(usdc, 250).unwrap();
        assert_eq!(h.balance_of(&usdc), 750);

        let event = h.recover(holder, own, usdc, 700, admin).unwrap();
        assert_eq!(
            event,
            Event::ForeignRecovered {
                holder,
                asset: usdc,
                to: admin,
                amount: 700
            }
        );
        assert_eq!(h.balance_of(&usdc), 50);

        h.recover(holder, own, usdc, 50, admin).unwrap();
        assert_eq!(h.assets().count(), 0);
    }

    #[test]
    fn test_recover_rejections() {
        let holder = Address::derive("lock");
        let own = Address::derive("tally-token");
        let dai = Address::derive("dai");
        let admin = Address::derive("admin");
        let mut h = ForeignHoldings::new();
        h.receive(dai, 10).unwrap();

        assert_eq!(
            h.recover(holder, own, own, 1, admin),
            Err(LedgerError::OwnAssetRecovery(own))
        );
        assert_eq!(
            h.recover(holder, own, dai, 0, admin),
            Err(LedgerError::ZeroAmount)
        );
        assert_eq!(
            h.recover(holder, own, Address::ZERO, 1, admin),
            Err(LedgerError::ZeroAddress("foreign asset"))
        );
        assert_eq!(
            h.recover(holder, own, dai, 1, Address::ZERO),
            Err(LedgerError::ZeroAddress("recovery destination"))
        );
        assert!(matches!(
            h.recover(holder, own, dai, 11, admin),
            Err(LedgerError::InsufficientForeignHolding { have: 10, need: 11, .. })
        ));
        // Nothing moved on failure
        assert_eq!(h.balance_of(&dai), 10);
        assert!(h.receive(Address::ZERO, 1).is_err());
        assert!(h.receive(dai, 0).is_err());
    }
}
