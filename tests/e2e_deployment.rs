// ========================================
// E2E: CONFIG-DRIVEN DEPLOYMENT
// ========================================
//
// Deploys from a TOML file, runs a year of activity through every
// component, then restores the ledger from a JSON snapshot.
//
// Usage:
//   cargo test --test e2e_deployment
//
// ========================================

use std::fs;
use tally_core::config::DeploymentConfig;
use tally_core::{Address, Ledger, SECS_PER_DAY, UNIT};
use tally_lock::LockDistributor;
use tally_vesting::VestingManager;
use tempfile::TempDir;

const DAY: u64 = SECS_PER_DAY;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let admin = Address::derive("admin");
    let treasury = Address::derive("treasury");
    let vesting = Address::derive("vesting");
    let pool = Address::derive("lock-pool");
    let text = format!(
        r#"
[token]
name = "Tally"
symbol = "TLY"
admin = "{admin}"
initial_mint = "100000000000000000000000000"

[fees]
basis_points = 100
recipient = "{treasury}"
enabled = true
exempt = ["{vesting}", "{pool}"]

[lock_pool]
pool_size = "20000000000000000000000000"
num_beneficiaries = 80
sweep_recipient = "{treasury}"
"#
    );
    let path = dir.path().join("deployment.toml");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_deploy_from_config_and_run_a_year() {
    let dir = TempDir::new().unwrap();
    let config = DeploymentConfig::load_from_file(&write_config(&dir)).unwrap();
    let admin = config.token.admin;
    let treasury = Address::derive("treasury");

    let mut ledger = Ledger::from_config(&config, 0).unwrap();
    assert_eq!(ledger.total_supply(), 100_000_000 * UNIT);
    assert_eq!(ledger.fee_config().recipient, Some(treasury));

    let mut vesting = VestingManager::new(Address::derive("vesting"), ledger.address(), admin).unwrap();
    let pool_config = config.lock_pool.clone().unwrap();
    let mut pool =
        LockDistributor::from_config(&pool_config, Address::derive("lock-pool"), ledger.address(), admin, 0)
            .unwrap();
    assert_eq!(pool.share_per_beneficiary(), 250_000 * UNIT);

    // Escrow deposits are fee-free thanks to the exempt list
    pool.fund(&mut ledger, &admin, pool_config.pool_size, 0).unwrap();
    let team: Vec<Address> = (0..4).map(|i| Address::derive(&format!("team-{}", i))).collect();
    for member in &team {
        vesting
            .create_schedule(&mut ledger, &admin, *member, 1_000_000 * UNIT, 0, 90 * DAY, 365 * DAY, 0)
            .unwrap();
        pool.add_beneficiary(&mut ledger, &admin, *member, 1, 0).unwrap();
    }
    assert_eq!(ledger.balance_of(&treasury), 0);

    // Mid-year: half the team claims, one member is revoked
    let mid = 182 * DAY;
    vesting.claim(&mut ledger, &team[0], mid).unwrap();
    vesting.claim(&mut ledger, &team[1], mid).unwrap();
    vesting.revoke(&mut ledger, &admin, team[3], mid).unwrap();
    vesting.check_solvency(&ledger).unwrap();

    // Escrow is exempt, so payouts so far carried no fee
    assert_eq!(ledger.balance_of(&treasury), 0);

    // Team member trades on the open market and pays the fee
    let buyer = Address::derive("buyer");
    ledger.transfer(team[0], buyer, 1_000 * UNIT, mid + 1).unwrap();
    assert_eq!(ledger.balance_of(&buyer), 990 * UNIT);
    assert_eq!(ledger.balance_of(&treasury), 10 * UNIT);

    // Year end: vesting completes, locks open, spare pool escrow is swept
    let end = pool.end_time();
    for member in &team[..3] {
        vesting.claim(&mut ledger, member, end).unwrap();
    }
    for member in &team {
        pool.claim(&mut ledger, member, end).unwrap();
    }
    let swept = pool.sweep_unassigned(&mut ledger, &admin, end).unwrap();
    assert_eq!(swept, 76 * 250_000 * UNIT);
    assert_eq!(ledger.balance_of(&pool.address()), 0);
    assert_eq!(vesting.total_outstanding(), 0);
    ledger.audit_supply().unwrap();

    // Snapshot and restore
    let snapshot = ledger.to_json().unwrap();
    let restored = Ledger::from_json(&snapshot).unwrap();
    assert_eq!(restored.state_root(), ledger.state_root());
    assert_eq!(restored.past_votes(&buyer, mid + 1), 990 * UNIT);
    assert_eq!(restored.past_total_supply(0), 100_000_000 * UNIT);
    restored.audit_supply().unwrap();
}

#[test]
fn test_config_roundtrip_through_file() {
    let dir = TempDir::new().unwrap();
    let config = DeploymentConfig::load_from_file(&write_config(&dir)).unwrap();

    let copy = dir.path().join("copy.toml");
    config.save_to_file(&copy).unwrap();
    let reloaded = DeploymentConfig::load_from_file(&copy).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.fees.exempt.len(), 2);
}
