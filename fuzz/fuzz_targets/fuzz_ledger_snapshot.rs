//! Fuzz target: Ledger snapshot deserialization
//!
//! Feeds arbitrary bytes to `Ledger::from_json`. Decoding must never panic;
//! whatever restores must pass the supply audit and accept further mutations
//! without panicking.
//!
//! Run: cargo +nightly fuzz run fuzz_ledger_snapshot

#![no_main]
use libfuzzer_sys::fuzz_target;
use tally_core::{Address, Ledger};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut ledger) = Ledger::from_json(s) else {
        return;
    };
    assert!(ledger.audit_supply().is_ok(), "restored ledger failed its audit");
    let _ = ledger.state_root();
    let _ = ledger.past_votes(&Address::derive("alice"), u64::MAX);

    // Exercise the mutation paths on whatever accounts the snapshot holds
    let now = ledger.last_timepoint();
    let holders: Vec<(Address, u128)> = ledger.holders().map(|(a, b)| (*a, *b)).collect();
    let admin = ledger.admin();
    for (i, (account, balance)) in holders.iter().enumerate() {
        let to = holders
            .get(i + 1)
            .map_or(Address::derive("fuzz-receiver"), |(a, _)| *a);
        let _ = ledger.transfer(*account, to, *balance, now);
        let _ = ledger.transfer(*account, to, balance / 3, now);
        let _ = ledger.burn(*account, 1, now);
    }
    let _ = ledger.mint(&admin, Address::derive("fuzz-receiver"), 1, now);
    assert!(ledger.audit_supply().is_ok(), "mutation broke a restored ledger");
    let _ = ledger.to_json();
});
