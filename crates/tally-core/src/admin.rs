//! Single-owner administrator capability.
//!
//! Each component (ledger, vesting manager, lock distributor) holds its own
//! `Administrator`. Privileged entry points call `ensure(caller)` before any
//! validation that could leak state to an unauthorized caller.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{LedgerError, LedgerResult};
use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Administrator {
    owner: Address,
}

impl Administrator {
    pub fn new(owner: Address) -> LedgerResult<Self> {
        if owner.is_zero() {
            return Err(LedgerError::ZeroAddress("administrator"));
        }
        Ok(Self { owner })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Reject anyone but the current owner.
    pub fn ensure(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            log::warn!("privileged call rejected: {} is not admin", caller.short());
            Err(LedgerError::Unauthorized { caller: *caller })
        }
    }

    /// Hand the capability to `new_owner`. Returns the change record.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<Event> {
        self.ensure(caller)?;
        if new_owner.is_zero() {
            return Err(LedgerError::ZeroAddress("new administrator"));
        }
        let previous_owner = self.owner;
        self.owner = new_owner;
        log::info!(
            "administrator transferred {} -> {}",
            previous_owner.short(),
            new_owner.short()
        );
        Ok(Event::OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure() {
        let alice = Address::derive("alice");
        let admin = Administrator::new(alice).unwrap();
        assert!(admin.ensure(&alice).is_ok());
        let err = admin.ensure(&Address::derive("bob")).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn test_zero_owner_rejected() {
        assert_eq!(
            Administrator::new(Address::ZERO).unwrap_err(),
            LedgerError::ZeroAddress("administrator")
        );
    }

    #[test]
    fn test_transfer_ownership() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let mut admin = Administrator::new(alice).unwrap();

        // Non-owner cannot transfer
        assert!(admin.transfer_ownership(&bob, bob).is_err());
        // Zero target rejected
        assert!(admin.transfer_ownership(&alice, Address::ZERO).is_err());

        let event = admin.transfer_ownership(&alice, bob).unwrap();
        assert_eq!(
            event,
            Event::OwnershipTransferred {
                previous_owner: alice,
                new_owner: bob
            }
        );
        assert_eq!(admin.owner(), bob);
        assert!(admin.ensure(&alice).is_err());
    }
}
