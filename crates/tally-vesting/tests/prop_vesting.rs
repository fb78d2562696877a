// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS - tally-vesting
//
// Vested amount is monotone and bounded, claims never exceed the schedule,
// and revocation settles escrow exactly.
// Run: cargo test --release -p tally-vesting --test prop_vesting
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use proptest::prelude::*;
use tally_core::{Address, Ledger, MAX_SUPPLY};
use tally_vesting::{VestingManager, VestingSchedule};

fn arb_schedule() -> impl Strategy<Value = VestingSchedule> {
    (1u128..=MAX_SUPPLY, 0u64..=1_000_000, 1u64..=100_000_000)
        .prop_flat_map(|(total, start, duration)| {
            (Just(total), Just(start), 0u64..=duration, Just(duration))
        })
        .prop_map(|(total, start, cliff, duration)| {
            VestingSchedule::new(Address::derive("bob"), total, start, cliff, duration).unwrap()
        })
}

proptest! {
    /// PROPERTY: vested amount never decreases with time and never exceeds total
    #[test]
    fn prop_vested_monotone_and_bounded(
        schedule in arb_schedule(),
        t1 in 0u64..=200_000_000,
        dt in 0u64..=200_000_000,
    ) {
        let v1 = schedule.vested_amount(t1);
        let v2 = schedule.vested_amount(t1 + dt);
        prop_assert!(v1 <= v2);
        prop_assert!(v2 <= schedule.total_amount);
    }

    /// PROPERTY: nothing vests before the cliff; everything after the end
    #[test]
    fn prop_vested_boundaries(schedule in arb_schedule()) {
        if schedule.cliff_end() > 0 {
            prop_assert_eq!(schedule.vested_amount(schedule.cliff_end() - 1), 0);
        }
        prop_assert_eq!(schedule.vested_amount(schedule.end_time()), schedule.total_amount);
    }

    /// PROPERTY: any claim sequence pays out at most the total, exactly the
    /// total once the schedule has ended, and escrow stays solvent throughout
    #[test]
    fn prop_claims_sum_to_total(
        total in 1u128..=1_000_000_000,
        cliff_pct in 0u64..=100,
        duration in 1u64..=1_000_000,
        steps in proptest::collection::vec(0u64..=200_000, 1..20),
    ) {
        let admin = Address::derive("admin");
        let bob = Address::derive("bob");
        let mut ledger = Ledger::new(Address::derive("tally-token"), admin).unwrap();
        ledger.mint(&admin, admin, total, 0).unwrap();
        let mut vesting = VestingManager::new(Address::derive("vesting"), ledger.address(), admin).unwrap();
        let cliff = duration * cliff_pct / 100;
        vesting.create_schedule(&mut ledger, &admin, bob, total, 0, cliff, duration, 0).unwrap();

        let mut now = 0u64;
        for dt in steps {
            now += dt;
            let _ = vesting.claim(&mut ledger, &bob, now);
            prop_assert!(ledger.balance_of(&bob) <= total);
            prop_assert_eq!(ledger.balance_of(&bob), vesting.vested_amount(&bob, now));
            prop_assert!(vesting.check_solvency(&ledger).is_ok());
        }
        let _ = vesting.claim(&mut ledger, &bob, now.max(duration));
        prop_assert_eq!(ledger.balance_of(&bob), total);
        prop_assert_eq!(ledger.balance_of(&vesting.address()), 0);
    }

    /// PROPERTY: revoke pays vested − claimed, returns total − vested, and
    /// empties escrow for the schedule
    #[test]
    fn prop_revoke_settles_exactly(
        total in 1u128..=1_000_000_000,
        duration in 1u64..=1_000_000,
        claim_at in 0u64..=1_500_000,
        revoke_after in 0u64..=1_500_000,
    ) {
        let admin = Address::derive("admin");
        let bob = Address::derive("bob");
        let mut ledger = Ledger::new(Address::derive("tally-token"), admin).unwrap();
        ledger.mint(&admin, admin, total, 0).unwrap();
        let mut vesting = VestingManager::new(Address::derive("vesting"), ledger.address(), admin).unwrap();
        vesting.create_schedule(&mut ledger, &admin, bob, total, 0, 0, duration, 0).unwrap();

        let _ = vesting.claim(&mut ledger, &bob, claim_at);
        let claimed = ledger.balance_of(&bob);
        let revoke_at = claim_at + revoke_after;
        let vested = vesting.vested_amount(&bob, revoke_at);

        let outcome = vesting.revoke(&mut ledger, &admin, bob, revoke_at).unwrap();
        prop_assert_eq!(outcome.paid_to_beneficiary, vested - claimed);
        prop_assert_eq!(outcome.returned_to_admin, total - vested);
        prop_assert_eq!(ledger.balance_of(&bob), vested);
        prop_assert_eq!(ledger.balance_of(&admin), total - vested);
        prop_assert_eq!(ledger.balance_of(&vesting.address()), 0);
        prop_assert_eq!(vesting.schedule(&bob).unwrap().claimed_amount, vested);
        prop_assert_eq!(vesting.total_outstanding(), 0);
    }
}
