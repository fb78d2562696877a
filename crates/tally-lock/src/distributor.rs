//! Lock distributor: equal-share allocations against one global deadline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_core::config::LockPoolConfig;
use tally_core::{amount_str, Address, Administrator, Event, ForeignHoldings, Ledger, LedgerError};

use crate::allocation::{LockAllocation, LockType};
use crate::error::{LockError, LockResult};
use crate::LOCK_DURATION_SECS;

/// Construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockParams {
    pub address: Address,
    pub token: Address,
    pub admin: Address,
    pub pool_size: u128,
    pub num_beneficiaries: u64,
    pub sweep_recipient: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockDistributor {
    address: Address,
    token: Address,
    admin: Administrator,
    #[serde(with = "amount_str")]
    pool_size: u128,
    num_beneficiaries: u64,
    #[serde(with = "amount_str")]
    share_per_beneficiary: u128,
    sweep_recipient: Address,
    created_at: u64,
    end_time: u64,
    next_lock_id: u64,
    beneficiaries_count: u64,
    #[serde(with = "amount_str")]
    total_claimed: u128,
    allocations: BTreeMap<Address, LockAllocation>,
    lock_ids: BTreeMap<u64, Address>,
    #[serde(default)]
    foreign: ForeignHoldings,
}

impl LockDistributor {
    pub fn new(params: LockParams, now: u64) -> LockResult<Self> {
        if params.address.is_zero() {
            return Err(LockError::ZeroAddress("lock distributor"));
        }
        if params.token.is_zero() {
            return Err(LockError::ZeroAddress("token"));
        }
        if params.sweep_recipient.is_zero() {
            return Err(LockError::ZeroAddress("sweep recipient"));
        }
        if params.num_beneficiaries == 0 {
            return Err(LockError::ZeroBeneficiaries);
        }
        let share_per_beneficiary = params.pool_size / params.num_beneficiaries as u128;
        if share_per_beneficiary == 0 {
            return Err(LockError::ShareRoundsToZero {
                pool_size: params.pool_size,
                num_beneficiaries: params.num_beneficiaries,
            });
        }
        let end_time = now
            .checked_add(LOCK_DURATION_SECS)
            .ok_or(LedgerError::Overflow)?;

        log::info!(
            "lock pool {} created: {} split {} ways ({} each), unlocks at {}",
            params.address.short(),
            params.pool_size,
            params.num_beneficiaries,
            share_per_beneficiary,
            end_time
        );
        Ok(Self {
            address: params.address,
            token: params.token,
            admin: Administrator::new(params.admin)?,
            pool_size: params.pool_size,
            num_beneficiaries: params.num_beneficiaries,
            share_per_beneficiary,
            sweep_recipient: params.sweep_recipient,
            created_at: now,
            end_time,
            next_lock_id: 1,
            beneficiaries_count: 0,
            total_claimed: 0,
            allocations: BTreeMap::new(),
            lock_ids: BTreeMap::new(),
            foreign: ForeignHoldings::new(),
        })
    }

    /// Build from the `[lock_pool]` section of a deployment config.
    pub fn from_config(
        config: &LockPoolConfig,
        address: Address,
        token: Address,
        admin: Address,
        now: u64,
    ) -> LockResult<Self> {
        Self::new(
            LockParams {
                address,
                token,
                admin,
                pool_size: config.pool_size,
                num_beneficiaries: config.num_beneficiaries,
                sweep_recipient: config.sweep_recipient,
            },
            now,
        )
    }

    /// Deposit `amount` from the administrator into escrow.
    /// Returns what the escrow actually received (net of any transfer fee).
    pub fn fund(&mut self, ledger: &mut Ledger, caller: &Address, amount: u128, now: u64) -> LockResult<u128> {
        self.admin.ensure(caller)?;
        self.ensure_ledger(ledger)?;
        if amount == 0 {
            return Err(LockError::ZeroAmount);
        }
        let route = ledger.transfer(*caller, self.address, amount, now)?;

        ledger.record(Event::LockFunded {
            from: *caller,
            amount: route.transfer_amount,
        });
        log::info!(
            "lock pool funded with {} by {} (escrow now {})",
            route.transfer_amount,
            caller.short(),
            ledger.balance_of(&self.address)
        );
        Ok(route.transfer_amount)
    }

    /// Assign the next share to `beneficiary`. Returns the new lock id.
    pub fn add_beneficiary(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        beneficiary: Address,
        lock_type: u8,
        now: u64,
    ) -> LockResult<u64> {
        self.admin.ensure(caller)?;
        self.ensure_ledger(ledger)?;
        if now >= self.end_time {
            return Err(LockError::PastDeadline {
                end_time: self.end_time,
                now,
            });
        }
        if beneficiary.is_zero() {
            return Err(LockError::ZeroAddress("beneficiary"));
        }
        if beneficiary == self.address {
            return Err(LockError::InvalidBeneficiary(beneficiary));
        }
        if self.allocations.contains_key(&beneficiary) {
            return Err(LockError::AlreadyAssigned(beneficiary));
        }
        let lock_type = LockType::new(lock_type)?;
        if self.beneficiaries_count >= self.num_beneficiaries {
            return Err(LockError::PoolFull {
                capacity: self.num_beneficiaries,
            });
        }
        let required = self
            .total_assigned()
            .checked_add(self.share_per_beneficiary)
            .ok_or(LedgerError::Overflow)?;
        let escrow = ledger.balance_of(&self.address);
        if escrow < required {
            return Err(LockError::NotEnoughFunded { escrow, required });
        }

        let lock_id = self.next_lock_id;
        let allocation = LockAllocation {
            beneficiary,
            lock_id,
            lock_type,
            amount: self.share_per_beneficiary,
            unlock_time: self.end_time,
            claimed: false,
        };
        self.allocations.insert(beneficiary, allocation);
        self.lock_ids.insert(lock_id, beneficiary);
        self.next_lock_id += 1;
        self.beneficiaries_count += 1;

        ledger.record(Event::BeneficiaryAdded {
            beneficiary,
            lock_id,
            lock_type: lock_type.id(),
            amount: self.share_per_beneficiary,
            unlock_time: self.end_time,
        });
        log::info!(
            "lock #{} ({}) assigned to {}: {} ({}/{} slots)",
            lock_id,
            lock_type,
            beneficiary.short(),
            self.share_per_beneficiary,
            self.beneficiaries_count,
            self.num_beneficiaries
        );
        Ok(lock_id)
    }

    /// Claim the caller's share after the deadline.
    pub fn claim(&mut self, ledger: &mut Ledger, caller: &Address, now: u64) -> LockResult<u128> {
        self.ensure_ledger(ledger)?;
        if now < self.end_time {
            return Err(LockError::BeforeDeadline {
                end_time: self.end_time,
                now,
            });
        }
        let amount = self.allocations.get(caller).map_or(0, |a| a.amount);
        if amount == 0 {
            return Err(LockError::NothingToClaim);
        }
        self.check_solvency(ledger)?;
        ledger.can_debit(&self.address, amount, now)?;

        // Bookkeeping first
        if let Some(a) = self.allocations.get_mut(caller) {
            a.amount = 0;
            a.claimed = true;
        }
        self.total_claimed += amount;

        if let Err(e) = ledger.transfer(self.address, *caller, amount, now) {
            if let Some(a) = self.allocations.get_mut(caller) {
                a.amount = amount;
                a.claimed = false;
            }
            self.total_claimed -= amount;
            return Err(Self::violation(format!(
                "claim transfer failed after preflight: {}",
                e
            )));
        }

        let lock_id = self.allocations.get(caller).map_or(0, |a| a.lock_id);
        ledger.record(Event::LockClaimed {
            beneficiary: *caller,
            lock_id,
            amount,
        });
        log::debug!("lock #{} claimed by {}: {}", lock_id, caller.short(), amount);
        Ok(amount)
    }

    /// Send everything not reserved for unclaimed shares to the sweep
    /// recipient. Administrator only, after the deadline.
    pub fn sweep_unassigned(&mut self, ledger: &mut Ledger, caller: &Address, now: u64) -> LockResult<u128> {
        self.admin.ensure(caller)?;
        self.ensure_ledger(ledger)?;
        if now < self.end_time {
            return Err(LockError::BeforeDeadline {
                end_time: self.end_time,
                now,
            });
        }
        self.check_solvency(ledger)?;
        let sweepable = self.sweepable(ledger);
        if sweepable == 0 {
            return Err(LockError::NoSweepable);
        }
        ledger.can_debit(&self.address, sweepable, now)?;
        ledger
            .transfer(self.address, self.sweep_recipient, sweepable, now)
            .map_err(|e| Self::violation(format!("sweep transfer failed after preflight: {}", e)))?;

        ledger.record(Event::UnassignedSwept {
            recipient: self.sweep_recipient,
            amount: sweepable,
        });
        log::info!(
            "swept {} unassigned from lock pool to {}",
            sweepable,
            self.sweep_recipient.short()
        );
        Ok(sweepable)
    }

    pub fn transfer_ownership(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        new_owner: Address,
    ) -> LockResult<()> {
        let event = self.admin.transfer_ownership(caller, new_owner)?;
        ledger.record(event);
        Ok(())
    }

    // ── Foreign-asset recovery ──

    pub fn receive_foreign(&mut self, asset: Address, amount: u128) -> LockResult<()> {
        if asset == self.token {
            return Err(LedgerError::OwnAssetRecovery(asset).into());
        }
        Ok(self.foreign.receive(asset, amount)?)
    }

    pub fn recover_foreign(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        asset: Address,
        amount: u128,
    ) -> LockResult<()> {
        self.admin.ensure(caller)?;
        let event = self
            .foreign
            .recover(self.address, self.token, asset, amount, self.admin.owner())?;
        ledger.record(event);
        Ok(())
    }

    // ── Queries ──

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn admin(&self) -> Address {
        self.admin.owner()
    }

    pub fn pool_size(&self) -> u128 {
        self.pool_size
    }

    pub fn num_beneficiaries(&self) -> u64 {
        self.num_beneficiaries
    }

    pub fn share_per_beneficiary(&self) -> u128 {
        self.share_per_beneficiary
    }

    pub fn sweep_recipient(&self) -> Address {
        self.sweep_recipient
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn is_past_deadline(&self, now: u64) -> bool {
        now >= self.end_time
    }

    pub fn beneficiaries_count(&self) -> u64 {
        self.beneficiaries_count
    }

    pub fn remaining_slots(&self) -> u64 {
        self.num_beneficiaries - self.beneficiaries_count
    }

    pub fn allocation(&self, beneficiary: &Address) -> Option<&LockAllocation> {
        self.allocations.get(beneficiary)
    }

    pub fn lock_by_id(&self, lock_id: u64) -> Option<&LockAllocation> {
        self.lock_ids
            .get(&lock_id)
            .and_then(|addr| self.allocations.get(addr))
    }

    pub fn total_assigned(&self) -> u128 {
        // count ≤ num_beneficiaries, so share × count ≤ pool_size
        self.share_per_beneficiary * self.beneficiaries_count as u128
    }

    pub fn total_claimed(&self) -> u128 {
        self.total_claimed
    }

    pub fn reserved_for_unclaimed(&self) -> u128 {
        self.total_assigned() - self.total_claimed
    }

    /// Escrow in excess of the reserved amount.
    pub fn sweepable(&self, ledger: &Ledger) -> u128 {
        ledger
            .balance_of(&self.address)
            .saturating_sub(self.reserved_for_unclaimed())
    }

    pub fn foreign_balance(&self, asset: &Address) -> u128 {
        self.foreign.balance_of(asset)
    }

    /// Escrow on the ledger covers every assigned, unclaimed share.
    pub fn check_solvency(&self, ledger: &Ledger) -> LockResult<()> {
        self.ensure_ledger(ledger)?;
        let escrow = ledger.balance_of(&self.address);
        let reserved = self.reserved_for_unclaimed();
        if escrow < reserved {
            return Err(Self::violation(format!(
                "escrow {} below reserved {}",
                escrow, reserved
            )));
        }
        Ok(())
    }

    fn ensure_ledger(&self, ledger: &Ledger) -> LockResult<()> {
        if ledger.address() != self.token {
            return Err(LockError::WrongLedger {
                expected: self.token,
                got: ledger.address(),
            });
        }
        Ok(())
    }

    fn violation(message: String) -> LockError {
        log::error!("lock pool invariant violated: {}", message);
        LockError::InvariantViolation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ErrorKind;

    const T0: u64 = 1_000;

    struct Fixture {
        ledger: Ledger,
        pool: LockDistributor,
        admin: Address,
        treasury: Address,
    }

    fn fixture(pool_size: u128, num_beneficiaries: u64) -> Fixture {
        let admin = Address::derive("admin");
        let treasury = Address::derive("treasury");
        let mut ledger = Ledger::new(Address::derive("tally-token"), admin).unwrap();
        ledger.mint(&admin, admin, 100_000_000, T0).unwrap();
        let pool = LockDistributor::new(
            LockParams {
                address: Address::derive("lock-pool"),
                token: ledger.address(),
                admin,
                pool_size,
                num_beneficiaries,
                sweep_recipient: treasury,
            },
            T0,
        )
        .unwrap();
        Fixture {
            ledger,
            pool,
            admin,
            treasury,
        }
    }

    fn holder(i: u64) -> Address {
        Address::derive(&format!("holder-{}", i))
    }

    #[test]
    fn test_construction() {
        let f = fixture(1_000, 3);
        assert_eq!(f.pool.share_per_beneficiary(), 333);
        assert_eq!(f.pool.end_time(), T0 + LOCK_DURATION_SECS);
        assert_eq!(f.pool.remaining_slots(), 3);

        let mut params = LockParams {
            address: Address::derive("lock-pool"),
            token: Address::derive("tally-token"),
            admin: Address::derive("admin"),
            pool_size: 79,
            num_beneficiaries: 80,
            sweep_recipient: Address::derive("treasury"),
        };
        assert!(matches!(
            LockDistributor::new(params.clone(), 0),
            Err(LockError::ShareRoundsToZero { .. })
        ));
        params.num_beneficiaries = 0;
        assert_eq!(
            LockDistributor::new(params, 0).unwrap_err(),
            LockError::ZeroBeneficiaries
        );
    }

    #[test]
    fn test_add_requires_funding() {
        let mut f = fixture(1_000, 4);
        let admin = f.admin;
        let err = f
            .pool
            .add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0)
            .unwrap_err();
        assert_eq!(err, LockError::NotEnoughFunded { escrow: 0, required: 250 });

        f.pool.fund(&mut f.ledger, &admin, 400, T0).unwrap();
        assert_eq!(f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0), Ok(1));
        assert_eq!(
            f.pool.add_beneficiary(&mut f.ledger, &admin, holder(2), 0, T0),
            Err(LockError::NotEnoughFunded { escrow: 400, required: 500 })
        );
    }

    #[test]
    fn test_add_validation() {
        let mut f = fixture(1_000, 2);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_000, T0).unwrap();

        assert_eq!(
            f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 26, T0),
            Err(LockError::InvalidLockType { id: 26, max: 25 })
        );
        assert_eq!(
            f.pool
                .add_beneficiary(&mut f.ledger, &holder(1), holder(1), 0, T0)
                .unwrap_err()
                .kind(),
            ErrorKind::Authorization
        );
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 25, T0).unwrap();
        assert_eq!(
            f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 1, T0),
            Err(LockError::AlreadyAssigned(holder(1)))
        );
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(2), 3, T0).unwrap();
        assert_eq!(
            f.pool.add_beneficiary(&mut f.ledger, &admin, holder(3), 3, T0),
            Err(LockError::PoolFull { capacity: 2 })
        );
        let end = f.pool.end_time();
        assert!(matches!(
            f.pool.add_beneficiary(&mut f.ledger, &admin, holder(3), 3, end),
            Err(LockError::PastDeadline { .. })
        ));
        assert_eq!(f.pool.lock_by_id(2).unwrap().beneficiary, holder(2));
        assert_eq!(f.pool.lock_by_id(2).unwrap().lock_type.id(), 3);
    }

    #[test]
    fn test_claim_lifecycle() {
        let mut f = fixture(1_000, 2);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_000, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0).unwrap();
        let end = f.pool.end_time();

        assert_eq!(
            f.pool.claim(&mut f.ledger, &holder(1), end - 1),
            Err(LockError::BeforeDeadline { end_time: end, now: end - 1 })
        );
        assert_eq!(f.pool.claim(&mut f.ledger, &holder(1), end), Ok(500));
        assert_eq!(f.ledger.balance_of(&holder(1)), 500);
        let a = f.pool.allocation(&holder(1)).unwrap();
        assert!(a.claimed);
        assert_eq!(a.amount, 0);

        for _ in 0..2 {
            assert_eq!(
                f.pool.claim(&mut f.ledger, &holder(1), end + 1),
                Err(LockError::NothingToClaim)
            );
        }
        assert_eq!(f.ledger.balance_of(&holder(1)), 500);
        assert_eq!(
            f.pool.claim(&mut f.ledger, &holder(9), end + 1),
            Err(LockError::NothingToClaim)
        );
    }

    #[test]
    fn test_sweep_leaves_reserved_shares() {
        let mut f = fixture(1_000, 3);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_500, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(2), 0, T0).unwrap();
        let end = f.pool.end_time();

        assert!(matches!(
            f.pool.sweep_unassigned(&mut f.ledger, &admin, end - 1),
            Err(LockError::BeforeDeadline { .. })
        ));
        // 1500 escrow − 2 × 333 reserved
        assert_eq!(f.pool.sweep_unassigned(&mut f.ledger, &admin, end), Ok(834));
        assert_eq!(f.ledger.balance_of(&f.treasury), 834);
        assert_eq!(
            f.pool.sweep_unassigned(&mut f.ledger, &admin, end),
            Err(LockError::NoSweepable)
        );

        f.pool.claim(&mut f.ledger, &holder(1), end).unwrap();
        f.pool.claim(&mut f.ledger, &holder(2), end).unwrap();
        assert_eq!(f.pool.reserved_for_unclaimed(), 0);
        assert_eq!(f.ledger.balance_of(&f.pool.address()), 0);
    }

    #[test]
    fn test_escrow_drift_is_fatal() {
        let mut f = fixture(1_000, 2);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_000, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(2), 0, T0).unwrap();

        // Simulate escrow leaking out behind the distributor's back
        let escrow = f.pool.address();
        f.ledger.burn(escrow, 1, T0).unwrap();

        let end = f.pool.end_time();
        let err = f.pool.sweep_unassigned(&mut f.ledger, &admin, end).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        let err = f.pool.claim(&mut f.ledger, &holder(1), end).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_paused_ledger_blocks_claim() {
        let mut f = fixture(1_000, 1);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_000, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 0, T0).unwrap();
        f.ledger.pause(&admin).unwrap();

        let end = f.pool.end_time();
        assert_eq!(
            f.pool.claim(&mut f.ledger, &holder(1), end),
            Err(LockError::Ledger(LedgerError::Paused))
        );
        assert_eq!(f.pool.total_claimed(), 0);
        assert_eq!(f.pool.allocation(&holder(1)).unwrap().amount, 1_000);
    }

    #[test]
    fn test_equal_share_distribution() {
        let mut f = fixture(20_000_000, 80);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 20_000_000, T0).unwrap();
        assert_eq!(f.pool.share_per_beneficiary(), 250_000);

        for i in 0..80 {
            let id = f
                .pool
                .add_beneficiary(&mut f.ledger, &admin, holder(i), (i % 26) as u8, T0 + i)
                .unwrap();
            assert_eq!(id, i + 1);
        }
        assert_eq!(f.pool.remaining_slots(), 0);

        let end = f.pool.end_time();
        for i in 0..80 {
            assert!(matches!(
                f.pool.claim(&mut f.ledger, &holder(i), end - 1),
                Err(LockError::BeforeDeadline { .. })
            ));
        }
        for i in 0..80 {
            assert_eq!(f.pool.claim(&mut f.ledger, &holder(i), end), Ok(250_000));
        }
        assert_eq!(f.pool.total_claimed(), 20_000_000);
        assert_eq!(f.pool.reserved_for_unclaimed(), 0);
        f.pool.check_solvency(&f.ledger).unwrap();
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut f = fixture(1_000, 2);
        let admin = f.admin;
        f.pool.fund(&mut f.ledger, &admin, 1_000, T0).unwrap();
        f.pool.add_beneficiary(&mut f.ledger, &admin, holder(1), 4, T0).unwrap();

        let json = serde_json::to_string(&f.pool).unwrap();
        let restored: LockDistributor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.allocation(&holder(1)), f.pool.allocation(&holder(1)));
        assert_eq!(restored.total_assigned(), 500);
        assert_eq!(restored.lock_by_id(1).unwrap().lock_type.id(), 4);
    }
}
