//! Fuzz target: Vesting + lock managers on one ledger
//!
//! Random create/claim/revoke/fund/assign/sweep sequences. Verifies nothing
//! panics, escrow stays solvent for both managers and ledger supply is
//! conserved.
//!
//! Run: cargo +nightly fuzz run fuzz_manager_ops

#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tally_core::{Address, Ledger};
use tally_lock::{LockDistributor, LockParams};
use tally_vesting::VestingManager;

#[derive(Arbitrary, Debug)]
enum Op {
    Create { who: u8, total: u32, start: u16, cliff: u16, duration: u16 },
    Claim { who: u8 },
    Revoke { who: u8 },
    Fund { amount: u32 },
    Assign { who: u8, lock_type: u8 },
    LockClaim { who: u8 },
    Sweep,
    Advance(u32),
}

#[derive(Arbitrary, Debug)]
struct FuzzManagerInput {
    pool_size: u32,
    num_beneficiaries: u8,
    ops: Vec<Op>,
}

fn person(i: u8) -> Address {
    Address::derive(&format!("person-{}", i % 8))
}

fuzz_target!(|input: FuzzManagerInput| {
    let admin = Address::derive("admin");
    let Ok(mut ledger) = Ledger::new(Address::derive("tally-token"), admin) else {
        return;
    };
    if ledger.mint(&admin, admin, u64::MAX as u128, 0).is_err() {
        return;
    }
    let Ok(mut vesting) = VestingManager::new(Address::derive("vesting"), ledger.address(), admin) else {
        return;
    };
    let Ok(mut pool) = LockDistributor::new(
        LockParams {
            address: Address::derive("lock-pool"),
            token: ledger.address(),
            admin,
            pool_size: input.pool_size as u128,
            num_beneficiaries: input.num_beneficiaries as u64,
            sweep_recipient: Address::derive("treasury"),
        },
        0,
    ) else {
        return;
    };

    let mut now: u64 = 0;
    for op in input.ops.iter().take(256) {
        match *op {
            Op::Create { who, total, start, cliff, duration } => {
                let _ = vesting.create_schedule(
                    &mut ledger,
                    &admin,
                    person(who),
                    total as u128,
                    start as u64,
                    cliff as u64,
                    duration as u64,
                    now,
                );
            }
            Op::Claim { who } => {
                let _ = vesting.claim(&mut ledger, &person(who), now);
            }
            Op::Revoke { who } => {
                let _ = vesting.revoke(&mut ledger, &admin, person(who), now);
            }
            Op::Fund { amount } => {
                let _ = pool.fund(&mut ledger, &admin, amount as u128, now);
            }
            Op::Assign { who, lock_type } => {
                let _ = pool.add_beneficiary(&mut ledger, &admin, person(who), lock_type, now);
            }
            Op::LockClaim { who } => {
                let _ = pool.claim(&mut ledger, &person(who), now);
            }
            Op::Sweep => {
                let _ = pool.sweep_unassigned(&mut ledger, &admin, now);
            }
            Op::Advance(dt) => now += dt as u64,
        }

        assert!(vesting.check_solvency(&ledger).is_ok(), "vesting insolvent after {:?}", op);
        assert!(pool.check_solvency(&ledger).is_ok(), "lock pool insolvent after {:?}", op);
        assert!(ledger.audit_supply().is_ok(), "supply audit failed after {:?}", op);
    }
});
