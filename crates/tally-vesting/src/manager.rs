//! Vesting manager: schedule bookkeeping plus escrow movement on the Ledger.
//!
//! Outbound operations (claim, revoke) run in three steps: preflight against
//! the ledger (`can_debit`), commit bookkeeping, then transfer. A transfer
//! failing after a clean preflight means the ledger and the manager disagree;
//! the bookkeeping is rolled back and the call surfaces `InvariantViolation`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_core::{amount_str, Address, Administrator, Event, ForeignHoldings, Ledger, LedgerError};

use crate::error::{VestingError, VestingResult};
use crate::schedule::VestingSchedule;

/// Settlement of a revoked schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeOutcome {
    #[serde(with = "amount_str")]
    pub paid_to_beneficiary: u128,
    #[serde(with = "amount_str")]
    pub returned_to_admin: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestingManager {
    /// Escrow account on the ledger
    address: Address,
    /// Ledger this manager is bound to
    token: Address,
    admin: Administrator,
    schedules: BTreeMap<Address, VestingSchedule>,
    /// Revoked schedules replaced by a newer one, oldest first
    history: BTreeMap<Address, Vec<VestingSchedule>>,
    #[serde(with = "amount_str")]
    total_outstanding: u128,
    #[serde(default)]
    foreign: ForeignHoldings,
}

impl VestingManager {
    pub fn new(address: Address, token: Address, admin: Address) -> VestingResult<Self> {
        if address.is_zero() {
            return Err(VestingError::ZeroAddress("vesting manager"));
        }
        if token.is_zero() {
            return Err(VestingError::ZeroAddress("token"));
        }
        Ok(Self {
            address,
            token,
            admin: Administrator::new(admin)?,
            schedules: BTreeMap::new(),
            history: BTreeMap::new(),
            total_outstanding: 0,
            foreign: ForeignHoldings::new(),
        })
    }

    /// Create a schedule and escrow `total_amount` from the administrator.
    ///
    /// The deposit must arrive in full: if the ledger would charge a fee on
    /// the administrator → manager leg, the call is rejected. Exempt the
    /// manager (or the administrator) on the ledger first.
    #[allow(clippy::too_many_arguments)]
    pub fn create_schedule(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        beneficiary: Address,
        total_amount: u128,
        start_time: u64,
        cliff_duration: u64,
        vesting_duration: u64,
        now: u64,
    ) -> VestingResult<()> {
        self.admin.ensure(caller)?;
        self.ensure_ledger(ledger)?;
        let schedule = VestingSchedule::new(
            beneficiary,
            total_amount,
            start_time,
            cliff_duration,
            vesting_duration,
        )?;
        if beneficiary == self.address {
            return Err(VestingError::InvalidBeneficiary(beneficiary));
        }
        if self.schedules.get(&beneficiary).is_some_and(|s| s.is_active()) {
            return Err(VestingError::ScheduleExists(beneficiary));
        }
        let quote = ledger.quote_transfer(caller, &self.address, total_amount);
        if quote.fee_amount > 0 {
            return Err(VestingError::EscrowFeeCharged {
                fee: quote.fee_amount,
            });
        }
        let outstanding = self
            .total_outstanding
            .checked_add(total_amount)
            .ok_or(LedgerError::Overflow)?;

        // Inbound leg: value arrives before bookkeeping is written
        ledger.transfer(*caller, self.address, total_amount, now)?;

        if let Some(previous) = self.schedules.remove(&beneficiary) {
            self.history.entry(beneficiary).or_default().push(previous);
        }
        self.schedules.insert(beneficiary, schedule);
        self.total_outstanding = outstanding;

        ledger.record(Event::VestingCreated {
            beneficiary,
            total_amount,
            start_time,
            cliff_duration,
            vesting_duration,
        });
        log::info!(
            "vesting schedule created for {}: {} over {}s (cliff {}s) from {}",
            beneficiary.short(),
            total_amount,
            vesting_duration,
            cliff_duration,
            start_time
        );
        Ok(())
    }

    /// Claim everything vested so far. The caller is the beneficiary.
    pub fn claim(&mut self, ledger: &mut Ledger, caller: &Address, now: u64) -> VestingResult<u128> {
        self.ensure_ledger(ledger)?;
        let schedule = self
            .schedules
            .get(caller)
            .ok_or(VestingError::NoSchedule(*caller))?;
        let amount = schedule.claimable_amount(now);
        if amount == 0 {
            return Err(VestingError::NothingToClaim);
        }
        ledger.can_debit(&self.address, amount, now)?;

        // Bookkeeping first
        let snapshot = (schedule.clone(), self.total_outstanding);
        if let Some(s) = self.schedules.get_mut(caller) {
            s.claimed_amount += amount;
        }
        self.total_outstanding -= amount;

        if let Err(e) = ledger.transfer(self.address, *caller, amount, now) {
            self.schedules.insert(*caller, snapshot.0);
            self.total_outstanding = snapshot.1;
            return Err(Self::transfer_failed("claim", e));
        }

        ledger.record(Event::VestingClaimed {
            beneficiary: *caller,
            amount,
        });
        log::debug!("vesting claim {} by {}", amount, caller.short());
        Ok(amount)
    }

    /// Revoke `beneficiary`'s schedule. Pays out vested-but-unclaimed tokens,
    /// returns the unvested remainder to the administrator.
    pub fn revoke(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        beneficiary: Address,
        now: u64,
    ) -> VestingResult<RevokeOutcome> {
        self.admin.ensure(caller)?;
        self.ensure_ledger(ledger)?;
        let schedule = self
            .schedules
            .get(&beneficiary)
            .ok_or(VestingError::NoSchedule(beneficiary))?;
        if schedule.revoked {
            return Err(VestingError::AlreadyRevoked(beneficiary));
        }

        let vested = schedule.vested_amount(now);
        let outcome = RevokeOutcome {
            paid_to_beneficiary: vested.saturating_sub(schedule.claimed_amount),
            returned_to_admin: schedule.total_amount - vested,
        };
        let settled = outcome.paid_to_beneficiary + outcome.returned_to_admin;
        ledger.can_debit(&self.address, settled, now)?;

        let snapshot = (schedule.clone(), self.total_outstanding);
        if let Some(s) = self.schedules.get_mut(&beneficiary) {
            s.claimed_amount = vested;
            s.revoked = true;
            s.exists = false;
        }
        self.total_outstanding -= settled;

        let admin = self.admin.owner();
        let legs: Vec<(Address, u128)> = [
            (beneficiary, outcome.paid_to_beneficiary),
            (admin, outcome.returned_to_admin),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
        .collect();
        // Both legs commit together or not at all
        if let Err(e) = ledger.transfer_batch(self.address, &legs, now) {
            self.schedules.insert(beneficiary, snapshot.0);
            self.total_outstanding = snapshot.1;
            return Err(Self::transfer_failed("revoke", e));
        }

        ledger.record(Event::VestingRevoked {
            beneficiary,
            paid_to_beneficiary: outcome.paid_to_beneficiary,
            returned_to_admin: outcome.returned_to_admin,
        });
        log::info!(
            "vesting revoked for {}: {} paid out, {} returned to {}",
            beneficiary.short(),
            outcome.paid_to_beneficiary,
            outcome.returned_to_admin,
            admin.short()
        );
        Ok(outcome)
    }

    pub fn transfer_ownership(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        new_owner: Address,
    ) -> VestingResult<()> {
        let event = self.admin.transfer_ownership(caller, new_owner)?;
        ledger.record(event);
        Ok(())
    }

    // ── Foreign-asset recovery ──

    pub fn receive_foreign(&mut self, asset: Address, amount: u128) -> VestingResult<()> {
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
    ) -> VestingResult<()> {
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

    /// Current schedule for `beneficiary` (active or revoked).
    pub fn schedule(&self, beneficiary: &Address) -> Option<&VestingSchedule> {
        self.schedules.get(beneficiary)
    }

    /// Earlier revoked schedules replaced by a newer one.
    pub fn past_schedules(&self, beneficiary: &Address) -> &[VestingSchedule] {
        self.history.get(beneficiary).map_or(&[], |v| v.as_slice())
    }

    pub fn vested_amount(&self, beneficiary: &Address, now: u64) -> u128 {
        self.schedules
            .get(beneficiary)
            .map_or(0, |s| s.vested_amount(now))
    }

    pub fn claimable_amount(&self, beneficiary: &Address, now: u64) -> u128 {
        self.schedules
            .get(beneficiary)
            .map_or(0, |s| s.claimable_amount(now))
    }

    /// Escrow owed across all active schedules.
    pub fn total_outstanding(&self) -> u128 {
        self.total_outstanding
    }

    /// Beneficiaries with an active schedule.
    pub fn beneficiaries(&self) -> impl Iterator<Item = &Address> {
        self.schedules
            .iter()
            .filter(|(_, s)| s.is_active())
            .map(|(addr, _)| addr)
    }

    pub fn foreign_balance(&self, asset: &Address) -> u128 {
        self.foreign.balance_of(asset)
    }

    /// Escrow on the ledger covers everything still owed, and the running
    /// total matches the per-schedule sum.
    pub fn check_solvency(&self, ledger: &Ledger) -> VestingResult<()> {
        self.ensure_ledger(ledger)?;
        let owed: u128 = self.schedules.values().map(|s| s.outstanding()).sum();
        if owed != self.total_outstanding {
            return Err(Self::violation(format!(
                "outstanding total {} != per-schedule sum {}",
                self.total_outstanding, owed
            )));
        }
        let escrow = ledger.balance_of(&self.address);
        if escrow < self.total_outstanding {
            return Err(Self::violation(format!(
                "escrow {} below outstanding {}",
                escrow, self.total_outstanding
            )));
        }
        Ok(())
    }

    fn ensure_ledger(&self, ledger: &Ledger) -> VestingResult<()> {
        if ledger.address() != self.token {
            return Err(VestingError::WrongLedger {
                expected: self.token,
                got: ledger.address(),
            });
        }
        Ok(())
    }

    fn transfer_failed(op: &str, err: LedgerError) -> VestingError {
        Self::violation(format!("{} transfer failed after preflight: {}", op, err))
    }

    fn violation(message: String) -> VestingError {
        log::error!("vesting invariant violated: {}", message);
        VestingError::InvariantViolation(message)
    }
}
