// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TALLY - LEDGER
//
// Single owner of balances, total supply, pause flag, fee configuration and
// voting-weight checkpoints.
//
// Every balance-mutating operation is two-phase:
//   1. plan: validate inputs and compute new balances in `PendingBalances`
//   2. commit: write balances, append checkpoints, journal events
// Phase 2 cannot fail, so a rejected call leaves the ledger untouched.
//
// Address::ZERO is the sentinel "outside the ledger": a transfer from it is a
// mint, a transfer to it is a burn. It never holds a balance.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::address::Address;
use crate::admin::Administrator;
use crate::amount_str;
use crate::checkpoint::{Checkpoint, CheckpointHistory};
use crate::config::DeploymentConfig;
use crate::error::{LedgerError, LedgerResult, SnapshotError};
use crate::event::Event;
use crate::fee_router::{self, FeeConfig, FeeSink, Route, Waiver};
use crate::recovery::ForeignHoldings;
use crate::MAX_SUPPLY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// The token's own address (fee recipient may not be this)
    address: Address,
    admin: Administrator,
    balances: BTreeMap<Address, u128>,
    #[serde(with = "amount_str")]
    total_supply: u128,
    paused: bool,
    fee_config: FeeConfig,
    exempt: BTreeSet<Address>,
    checkpoints: BTreeMap<Address, CheckpointHistory>,
    supply_checkpoints: CheckpointHistory,
    /// Latest clock value seen by a balance mutation
    last_timepoint: u64,
    #[serde(default)]
    foreign: ForeignHoldings,
    #[serde(default)]
    journal: Vec<Event>,
}

/// Planned balance writes for one operation.
///
/// Reads fall through to the ledger for accounts not yet touched, so several
/// legs on the same account (self-transfer, sender == fee recipient) compose.
struct PendingBalances<'a> {
    ledger: &'a Ledger,
    planned: BTreeMap<Address, u128>,
}

impl<'a> PendingBalances<'a> {
    fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            planned: BTreeMap::new(),
        }
    }

    fn balance(&self, account: &Address) -> u128 {
        self.planned
            .get(account)
            .copied()
            .unwrap_or_else(|| self.ledger.balance_of(account))
    }

    fn debit(&mut self, account: Address, amount: u128) -> LedgerResult<()> {
        let have = self.balance(&account);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                have,
                need: amount,
            });
        }
        self.planned.insert(account, have - amount);
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: u128) -> LedgerResult<()> {
        let next = self
            .balance(&account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.planned.insert(account, next);
        Ok(())
    }

    fn into_changes(self) -> BTreeMap<Address, u128> {
        self.planned
    }
}

impl Ledger {
    pub fn new(address: Address, admin: Address) -> LedgerResult<Self> {
        if address.is_zero() {
            return Err(LedgerError::ZeroAddress("ledger"));
        }
        Ok(Self {
            address,
            admin: Administrator::new(admin)?,
            balances: BTreeMap::new(),
            total_supply: 0,
            paused: false,
            fee_config: FeeConfig::default(),
            exempt: BTreeSet::new(),
            checkpoints: BTreeMap::new(),
            supply_checkpoints: CheckpointHistory::new(),
            last_timepoint: 0,
            foreign: ForeignHoldings::new(),
            journal: Vec::new(),
        })
    }

    /// Build a ledger from a deployment config: administrator, fee policy,
    /// exemptions and the optional initial mint to the administrator.
    pub fn from_config(config: &DeploymentConfig, now: u64) -> LedgerResult<Self> {
        let admin = config.token.admin;
        let mut ledger = Self::new(config.token_address(), admin)?;

        if let Some(recipient) = config.fees.recipient {
            ledger.set_fee_recipient(&admin, Some(recipient))?;
        }
        ledger.set_transfer_fee(&admin, config.fees.basis_points)?;
        ledger.set_fee_enabled(&admin, config.fees.enabled)?;
        for account in &config.fees.exempt {
            ledger.set_exemption(&admin, *account, true)?;
        }
        if config.token.initial_mint > 0 {
            ledger.mint(&admin, admin, config.token.initial_mint, now)?;
        }

        log::info!(
            "ledger {} ({}) initialized: admin {}, supply {}, fee {} bp (enabled: {})",
            config.token.symbol,
            ledger.address.short(),
            admin.short(),
            ledger.total_supply,
            ledger.fee_config.basis_points,
            ledger.fee_config.enabled
        );
        Ok(ledger)
    }

    // ── Balance mutations ──

    /// Mint `amount` to `to`. Administrator only.
    pub fn mint(&mut self, caller: &Address, to: Address, amount: u128, now: u64) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        self.mint_to(to, amount, now)
    }

    /// Burn `amount` from `from`. Not gated by pause and never charged a fee.
    pub fn burn(&mut self, from: Address, amount: u128, now: u64) -> LedgerResult<()> {
        if from.is_zero() {
            return Err(LedgerError::ZeroAddress("burn source"));
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.check_clock(now)?;

        let mut pending = PendingBalances::new(self);
        pending.debit(from, amount)?;
        let changes = pending.into_changes();
        // debit succeeded, so amount <= balance <= total_supply
        let new_supply = self.total_supply - amount;

        self.commit(changes, new_supply, now);
        self.journal.push(Event::Burn { from, amount });
        log::debug!("burn {} from {}", amount, from.short());
        Ok(())
    }

    /// Move `amount` from `from` to `to`, routing the fee leg through the
    /// fee policy. `from` is the authenticated caller.
    ///
    /// Returns the applied split.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128, now: u64) -> LedgerResult<Route> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        if from.is_zero() && to.is_zero() {
            return Err(LedgerError::ZeroAddress("transfer endpoints"));
        }
        if from.is_zero() {
            self.mint_to(to, amount, now)?;
            return Ok(self.sentinel_route(amount));
        }
        if to.is_zero() {
            self.burn(from, amount, now)?;
            return Ok(self.sentinel_route(amount));
        }
        self.check_clock(now)?;

        let route = fee_router::route(&from, &to, amount, &self.fee_config, &self.exempt);

        let mut pending = PendingBalances::new(self);
        let mut new_supply = self.total_supply;
        Self::plan_leg(&mut pending, &mut new_supply, from, to, amount, &route)?;
        let changes = pending.into_changes();

        self.commit(changes, new_supply, now);
        self.journal_leg(from, to, &route);
        Ok(route)
    }

    /// Several transfers out of `from`, applied all-or-nothing: every leg is
    /// planned against the same pending balances before anything commits.
    /// Receivers must be real accounts, never the sentinel.
    pub fn transfer_batch(
        &mut self,
        from: Address,
        legs: &[(Address, u128)],
        now: u64,
    ) -> LedgerResult<Vec<Route>> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        if from.is_zero() || legs.iter().any(|(to, _)| to.is_zero()) {
            return Err(LedgerError::ZeroAddress("batch transfer endpoint"));
        }
        self.check_clock(now)?;

        let mut pending = PendingBalances::new(self);
        let mut new_supply = self.total_supply;
        let mut routes = Vec::with_capacity(legs.len());
        for &(to, amount) in legs {
            let route = fee_router::route(&from, &to, amount, &self.fee_config, &self.exempt);
            Self::plan_leg(&mut pending, &mut new_supply, from, to, amount, &route)?;
            routes.push(route);
        }
        let changes = pending.into_changes();

        self.commit(changes, new_supply, now);
        for (&(to, _), route) in legs.iter().zip(&routes) {
            self.journal_leg(from, to, route);
        }
        Ok(routes)
    }

    /// Fee split `transfer(from, to, amount)` would apply right now.
    /// No state is touched.
    pub fn quote_transfer(&self, from: &Address, to: &Address, amount: u128) -> Route {
        fee_router::route(from, to, amount, &self.fee_config, &self.exempt)
    }

    /// Whether `from` could send `amount` at `now`: not paused, clock not
    /// regressed, balance covers it. Managers run this before committing
    /// their own bookkeeping.
    pub fn can_debit(&self, from: &Address, amount: u128, now: u64) -> LedgerResult<()> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.check_clock(now)?;
        let have = self.balance_of(from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                have,
                need: amount,
            });
        }
        Ok(())
    }

    fn mint_to(&mut self, to: Address, amount: u128, now: u64) -> LedgerResult<()> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress("mint recipient"));
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let new_supply = match self.total_supply.checked_add(amount) {
            Some(supply) if supply <= MAX_SUPPLY => supply,
            _ => {
                return Err(LedgerError::CapExceeded {
                    max: MAX_SUPPLY,
                    would_have: self.total_supply.saturating_add(amount),
                })
            }
        };
        self.check_clock(now)?;

        let mut pending = PendingBalances::new(self);
        pending.credit(to, amount)?;
        let changes = pending.into_changes();

        self.commit(changes, new_supply, now);
        self.journal.push(Event::Mint { to, amount });
        log::debug!("mint {} to {}", amount, to.short());
        Ok(())
    }

    fn plan_leg(
        pending: &mut PendingBalances<'_>,
        new_supply: &mut u128,
        from: Address,
        to: Address,
        amount: u128,
        route: &Route,
    ) -> LedgerResult<()> {
        pending.debit(from, amount)?;
        pending.credit(to, route.transfer_amount)?;
        if route.fee_amount > 0 {
            match route.fee_sink {
                FeeSink::Recipient(recipient) => pending.credit(recipient, route.fee_amount)?,
                FeeSink::Burn => {
                    *new_supply = new_supply
                        .checked_sub(route.fee_amount)
                        .ok_or(LedgerError::Overflow)?
                }
            }
        }
        Ok(())
    }

    fn journal_leg(&mut self, from: Address, to: Address, route: &Route) {
        self.journal.push(Event::Transfer {
            from,
            to,
            amount: route.transfer_amount,
        });
        if route.fee_amount > 0 {
            self.journal.push(Event::FeeCharged {
                from,
                sink: route.fee_sink.address(),
                amount: route.fee_amount,
            });
        }
        log::debug!(
            "transfer {} -> {}: {} (+{} fee to {}, waiver {:?})",
            from.short(),
            to.short(),
            route.transfer_amount,
            route.fee_amount,
            route.fee_sink.address().short(),
            route.waiver
        );
    }

    fn sentinel_route(&self, amount: u128) -> Route {
        Route {
            transfer_amount: amount,
            fee_amount: 0,
            fee_sink: self.fee_config.sink(),
            waiver: Some(Waiver::Sentinel),
        }
    }

    fn check_clock(&self, now: u64) -> LedgerResult<()> {
        if now < self.last_timepoint {
            return Err(LedgerError::ClockRegression {
                last: self.last_timepoint,
                now,
            });
        }
        Ok(())
    }

    /// Phase 2. Infallible: every check happened while planning.
    fn commit(&mut self, changes: BTreeMap<Address, u128>, new_supply: u128, now: u64) {
        for (account, balance) in changes {
            if self.balance_of(&account) == balance {
                continue;
            }
            if balance == 0 {
                self.balances.remove(&account);
            } else {
                self.balances.insert(account, balance);
            }
            self.checkpoints.entry(account).or_default().push(now, balance);
        }
        if new_supply != self.total_supply {
            self.total_supply = new_supply;
            self.supply_checkpoints.push(now, new_supply);
        }
        self.last_timepoint = now;
    }

    // ── Administrative setters ──

    pub fn set_transfer_fee(&mut self, caller: &Address, basis_points: u16) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        let candidate = FeeConfig {
            basis_points,
            ..self.fee_config.clone()
        };
        candidate.validate()?;

        let old_bps = self.fee_config.basis_points;
        self.fee_config = candidate;
        self.journal.push(Event::FeeUpdated {
            old_bps,
            new_bps: basis_points,
        });
        log::info!("transfer fee {} bp -> {} bp", old_bps, basis_points);
        Ok(())
    }

    /// `None` routes future fees to the burn sink.
    pub fn set_fee_recipient(&mut self, caller: &Address, recipient: Option<Address>) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        if let Some(r) = recipient {
            if r.is_zero() {
                return Err(LedgerError::ZeroAddress("fee recipient"));
            }
            if r == self.address {
                return Err(LedgerError::SelfFeeRecipient);
            }
        }

        let old = self.fee_config.recipient;
        self.fee_config.recipient = recipient;
        self.journal.push(Event::FeeRecipientUpdated { old, new: recipient });
        log::info!(
            "fee recipient {} -> {}",
            old.map_or_else(|| "burn".to_string(), |a| a.short()),
            recipient.map_or_else(|| "burn".to_string(), |a| a.short())
        );
        Ok(())
    }

    pub fn set_fee_enabled(&mut self, caller: &Address, enabled: bool) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        let old = self.fee_config.enabled;
        self.fee_config.enabled = enabled;
        self.journal.push(Event::FeeEnabledUpdated { old, new: enabled });
        log::info!("transfer fee enabled {} -> {}", old, enabled);
        Ok(())
    }

    pub fn set_exemption(&mut self, caller: &Address, account: Address, exempt: bool) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress("exempt account"));
        }
        self.write_exemption(account, exempt);
        Ok(())
    }

    /// Batch form of `set_exemption`. All entries are validated before any
    /// is applied.
    pub fn set_exemptions(&mut self, caller: &Address, accounts: &[Address], flags: &[bool]) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        if accounts.len() != flags.len() {
            return Err(LedgerError::BatchLengthMismatch {
                accounts: accounts.len(),
                flags: flags.len(),
            });
        }
        if accounts.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        if accounts.iter().any(|a| a.is_zero()) {
            return Err(LedgerError::ZeroAddress("exempt account"));
        }
        for (account, exempt) in accounts.iter().zip(flags) {
            self.write_exemption(*account, *exempt);
        }
        Ok(())
    }

    fn write_exemption(&mut self, account: Address, exempt: bool) {
        let old = self.exempt.contains(&account);
        if exempt {
            self.exempt.insert(account);
        } else {
            self.exempt.remove(&account);
        }
        self.journal.push(Event::ExemptionUpdated {
            account,
            old,
            new: exempt,
        });
        log::info!("fee exemption for {}: {} -> {}", account.short(), old, exempt);
    }

    pub fn pause(&mut self, caller: &Address) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.paused = true;
        self.journal.push(Event::Paused { by: *caller });
        log::info!("ledger paused by {}", caller.short());
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Address) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        self.journal.push(Event::Unpaused { by: *caller });
        log::info!("ledger unpaused by {}", caller.short());
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> LedgerResult<()> {
        let event = self.admin.transfer_ownership(caller, new_owner)?;
        self.journal.push(event);
        Ok(())
    }

    // ── Foreign-asset recovery ──

    /// Record a foreign token accidentally sent to the ledger's address.
    pub fn receive_foreign(&mut self, asset: Address, amount: u128) -> LedgerResult<()> {
        if asset == self.address {
            return Err(LedgerError::OwnAssetRecovery(asset));
        }
        self.foreign.receive(asset, amount)
    }

    /// Release a foreign holding to the administrator.
    pub fn recover_foreign(&mut self, caller: &Address, asset: Address, amount: u128) -> LedgerResult<()> {
        self.admin.ensure(caller)?;
        let event = self
            .foreign
            .recover(self.address, self.address, asset, amount, self.admin.owner())?;
        self.journal.push(event);
        Ok(())
    }

    pub fn foreign_balance(&self, asset: &Address) -> u128 {
        self.foreign.balance_of(asset)
    }

    // ── Journal ──

    /// Append a record from a component built on top of the ledger.
    pub fn record(&mut self, event: Event) {
        log::trace!("record {}", event.name());
        self.journal.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.journal
    }

    /// Hand the journal to an indexer and start a fresh one.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    // ── Queries ──

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.admin.owner()
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fee_config(&self) -> &FeeConfig {
        &self.fee_config
    }

    pub fn is_exempt(&self, account: &Address) -> bool {
        self.exempt.contains(account)
    }

    pub fn exempt_accounts(&self) -> impl Iterator<Item = &Address> {
        self.exempt.iter()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    pub fn last_timepoint(&self) -> u64 {
        self.last_timepoint
    }

    /// Current voting weight (= balance).
    pub fn votes(&self, account: &Address) -> u128 {
        self.checkpoints.get(account).map_or(0, |h| h.latest())
    }

    /// Voting weight at `timepoint`.
    pub fn past_votes(&self, account: &Address, timepoint: u64) -> u128 {
        self.checkpoints
            .get(account)
            .map_or(0, |h| h.upper_lookup(timepoint))
    }

    /// Total supply at `timepoint`.
    pub fn past_total_supply(&self, timepoint: u64) -> u128 {
        self.supply_checkpoints.upper_lookup(timepoint)
    }

    pub fn checkpoints(&self, account: &Address) -> &[Checkpoint] {
        self.checkpoints.get(account).map_or(&[], |h| h.as_slice())
    }

    pub fn num_checkpoints(&self, account: &Address) -> usize {
        self.checkpoints.get(account).map_or(0, |h| h.len())
    }

    // ── Audit ──

    /// Σ balances == total_supply ≤ MAX_SUPPLY, and the sentinel holds nothing.
    pub fn audit_supply(&self) -> LedgerResult<()> {
        let mut sum: u128 = 0;
        for balance in self.balances.values() {
            sum = sum.checked_add(*balance).ok_or_else(|| {
                Self::violation("balance sum overflows u128".to_string())
            })?;
        }
        if sum != self.total_supply {
            return Err(Self::violation(format!(
                "sum of balances {} != total supply {}",
                sum, self.total_supply
            )));
        }
        if self.total_supply > MAX_SUPPLY {
            return Err(Self::violation(format!(
                "total supply {} exceeds cap {}",
                self.total_supply, MAX_SUPPLY
            )));
        }
        if self.balances.contains_key(&Address::ZERO) {
            return Err(Self::violation("sentinel address holds a balance".to_string()));
        }
        Ok(())
    }

    fn violation(message: String) -> LedgerError {
        log::error!("supply audit failed: {}", message);
        LedgerError::InvariantViolation(message)
    }

    /// SHA3-256 over sorted (address, balance) pairs, then the total supply.
    pub fn state_root(&self) -> String {
        use sha3::{Digest, Sha3_256};
        let mut hasher = Sha3_256::new();
        // BTreeMap iterates in sorted key order
        for (account, balance) in &self.balances {
            hasher.update(account.as_bytes());
            hasher.update(balance.to_le_bytes());
        }
        hasher.update(self.total_supply.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a snapshot. Rejects one that decodes but breaks a ledger
    /// invariant, so a restored ledger never fails later on a mutation.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let ledger: Self = serde_json::from_str(json)?;
        ledger.check_snapshot()?;
        Ok(ledger)
    }

    fn check_snapshot(&self) -> LedgerResult<()> {
        if self.address.is_zero() {
            return Err(LedgerError::ZeroAddress("ledger"));
        }
        if self.admin.owner().is_zero() {
            return Err(LedgerError::ZeroAddress("administrator"));
        }
        self.fee_config.validate()?;
        if self.fee_config.recipient == Some(self.address) {
            return Err(LedgerError::SelfFeeRecipient);
        }
        if self.exempt.contains(&Address::ZERO) {
            return Err(LedgerError::ZeroAddress("exempt account"));
        }
        self.audit_supply()?;

        let histories = self
            .checkpoints
            .values()
            .chain(std::iter::once(&self.supply_checkpoints));
        for history in histories {
            let ordered = history.is_ordered()
                && history.last_timepoint().map_or(true, |t| t <= self.last_timepoint);
            if !ordered {
                return Err(Self::violation(
                    "checkpoint history out of order".to_string(),
                ));
            }
        }
        for (account, history) in &self.checkpoints {
            if history.latest() != self.balance_of(account) {
                return Err(Self::violation(format!(
                    "latest checkpoint of {} disagrees with its balance",
                    account.short()
                )));
            }
        }
        for account in self.balances.keys() {
            if !self.checkpoints.contains_key(account) {
                return Err(Self::violation(format!(
                    "{} holds a balance with no checkpoint",
                    account.short()
                )));
            }
        }
        if self.supply_checkpoints.latest() != self.total_supply {
            return Err(Self::violation(
                "latest supply checkpoint disagrees with total supply".to_string(),
            ));
        }
        Ok(())
    }
}
