//! Fuzz target: Ledger operation sequences
//!
//! Applies random mint/burn/transfer/admin sequences to one ledger.
//! Verifies nothing panics and supply conservation holds after every step.
//!
//! Run: cargo +nightly fuzz run fuzz_ledger_ops

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tally_core::{Address, Ledger};

#[derive(Arbitrary, Debug)]
enum Op {
    Mint { to: u8, amount: u128 },
    Burn { from: u8, amount: u128 },
    Transfer { from: u8, to: u8, amount: u128 },
    SetFee { bps: u16 },
    SetRecipient { account: Option<u8> },
    SetEnabled(bool),
    SetExemption { account: u8, exempt: bool },
    Pause,
    Unpause,
    Advance(u16),
    Rewind(u16),
}

#[derive(Arbitrary, Debug)]
struct FuzzLedgerInput {
    ops: Vec<Op>,
}

// Index 0 is the zero sentinel so mint/burn paths through transfer get hit
fn account(i: u8) -> Address {
    match i % 6 {
        0 => Address::ZERO,
        n => Address::derive(&format!("account-{}", n)),
    }
}

fuzz_target!(|input: FuzzLedgerInput| {
    let admin = account(1);
    let mut ledger = match Ledger::new(Address::derive("tally-token"), admin) {
        Ok(l) => l,
        Err(_) => return,
    };
    let mut now: u64 = 0;

    // Cap sequence length (prevent slow inputs)
    for op in input.ops.iter().take(256) {
        let _ = match *op {
            Op::Mint { to, amount } => ledger.mint(&admin, account(to), amount, now),
            Op::Burn { from, amount } => ledger.burn(account(from), amount, now),
            Op::Transfer { from, to, amount } => ledger
                .transfer(account(from), account(to), amount, now)
                .map(|_| ()),
            Op::SetFee { bps } => ledger.set_transfer_fee(&admin, bps),
            Op::SetRecipient { account: a } => ledger.set_fee_recipient(&admin, a.map(account)),
            Op::SetEnabled(on) => ledger.set_fee_enabled(&admin, on),
            Op::SetExemption { account: a, exempt } => ledger.set_exemption(&admin, account(a), exempt),
            Op::Pause => ledger.pause(&admin),
            Op::Unpause => ledger.unpause(&admin),
            Op::Advance(dt) => {
                now += dt as u64;
                Ok(())
            }
            Op::Rewind(dt) => {
                now = now.saturating_sub(dt as u64);
                Ok(())
            }
        };

        // Must hold after every step, accepted or rejected
        assert!(ledger.audit_supply().is_ok(), "supply audit failed after {:?}", op);
        assert!(ledger.fee_config().basis_points <= tally_core::MAX_FEE_BPS);
    }
});
