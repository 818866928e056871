//! Integration tests for the lending pool.
//!
//! These tests drive the pool and its stablecoin together through the
//! scenarios a deployed pool goes through: initialization, activation,
//! deposits, a loan, and repayment with interest. Rejected operations are
//! checked against a serialized snapshot of the ledger taken beforehand.

use edupool_contracts::config::WAD;
use edupool_contracts::units::parse_units;
use edupool_contracts::{
    Address, Amount, AssetId, FundsAsset, InterestRate, LendingPool, PoolConfig, PoolError,
    PoolEvent, PoolStatus, StableCoin,
};

const POOL_NAME: &str = "JohnDoe Student Loan";
const INTEREST_PERIOD: u64 = 60;

fn addr(s: &str) -> Address {
    Address::from(s)
}

/// Whole tokens to base units (18 decimals).
fn units(tokens: u64) -> Amount {
    tokens as Amount * WAD
}

fn config(asset: &AssetId) -> PoolConfig {
    PoolConfig {
        name: POOL_NAME.into(),
        funds_asset: asset.clone(),
        borrower: addr("borrower"),
        interest_period: INTEREST_PERIOD,
        interest_rate: InterestRate::parse("0.05").unwrap(),
    }
}

/// Helper: an initialized, active pool plus its stablecoin.
fn active_pool() -> (LendingPool, StableCoin) {
    let coin = StableCoin::new(addr("owner"));
    let mut pool = LendingPool::new(addr("edupool"));
    pool.initialize(config(coin.id())).unwrap();
    pool.activate(&addr("borrower")).unwrap();
    (pool, coin)
}

/// Mints `amount` to `who` and approves the pool for it.
fn fund(coin: &mut StableCoin, pool: &LendingPool, who: &str, amount: Amount) {
    coin.mint(&addr("owner"), &addr(who), amount).unwrap();
    let allowance = coin.allowance(&addr(who), pool.address());
    coin.approve(&addr(who), pool.address(), allowance + amount);
}

fn snapshot(pool: &LendingPool) -> String {
    serde_json::to_string(pool).unwrap()
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[test]
fn second_initialize_rejected_without_changes() {
    let (mut pool, coin) = active_pool();
    let before = snapshot(&pool);

    let mut retry = config(coin.id());
    retry.name = "Hijacked".into();
    retry.borrower = addr("alice");

    assert_eq!(pool.initialize(retry), Err(PoolError::AlreadyInitialized));
    assert_eq!(snapshot(&pool), before);
    assert_eq!(pool.name(), Some(POOL_NAME));
    assert_eq!(pool.borrower(), Some(&addr("borrower")));
    assert_eq!(pool.status(), PoolStatus::Active);
}

#[test]
fn initialize_records_configuration() {
    let coin = StableCoin::new(addr("owner"));
    let mut pool = LendingPool::deploy();
    pool.initialize(config(coin.id())).unwrap();

    assert_eq!(pool.status(), PoolStatus::Pending);
    assert_eq!(pool.version(), Some("1.0.0"));
    assert_eq!(pool.stablecoin(), Some(coin.id()));
    let terms = pool.interest_terms().unwrap();
    assert_eq!(terms.period_secs, INTEREST_PERIOD);
    assert_eq!(terms.rate, InterestRate::from_bps(500));
    assert_eq!(pool.balance(), 0);
    assert_eq!(pool.borrowed(), 0);
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

#[test]
fn only_borrower_can_activate() {
    let coin = StableCoin::new(addr("owner"));
    let mut pool = LendingPool::new(addr("edupool"));
    pool.initialize(config(coin.id())).unwrap();
    let before = snapshot(&pool);

    let err = pool.activate(&addr("alice")).unwrap_err();
    assert_eq!(err.to_string(), "Caller is not the borrower");
    assert_eq!(snapshot(&pool), before);

    pool.activate(&addr("borrower")).unwrap();
    assert_eq!(pool.status(), PoolStatus::Active);
    assert!(matches!(
        pool.events().last().map(|r| &r.event),
        Some(PoolEvent::Active { .. })
    ));
}

#[test]
fn activate_on_active_pool_fails() {
    let (mut pool, _) = active_pool();
    let before = snapshot(&pool);
    assert!(matches!(
        pool.activate(&addr("borrower")),
        Err(PoolError::InvalidState { .. })
    ));
    assert_eq!(snapshot(&pool), before);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn provide_borrow_and_repay_with_interest() {
    let (mut pool, mut coin) = active_pool();
    let provider = addr("provider");
    let borrower = addr("borrower");

    // 1. Provider deposits 10.
    fund(&mut coin, &pool, "provider", units(10));
    pool.provide(&provider, &mut coin, units(10)).unwrap();
    assert_eq!(pool.balance(), units(10));
    assert_eq!(pool.balance_of(&provider), units(10));

    // 2. Borrower takes all of it.
    pool.borrow(&borrower, &mut coin, units(10)).unwrap();
    assert_eq!(pool.balance(), 0);
    assert_eq!(pool.borrowed(), units(10));
    assert_eq!(pool.total(), units(10));
    assert_eq!(coin.balance_of(&borrower), units(10));

    // 3. Borrower repays 10 plus interest.
    let interest = pool.interest(units(10)).unwrap();
    assert_eq!(interest, parse_units("0.5", 18).unwrap());
    coin.mint(&addr("owner"), &borrower, interest).unwrap();
    coin.approve(&borrower, pool.address(), units(10) + interest);
    pool.pay(&borrower, &mut coin, units(10)).unwrap();

    assert_eq!(pool.borrowed(), 0);
    assert_eq!(pool.balance(), units(10));
    assert_eq!(pool.interest_collected(), interest);
    assert_eq!(coin.balance_of(&borrower), 0);
    assert_eq!(coin.balance_of(pool.address()), units(10) + interest);

    let last = pool.events().last().unwrap();
    assert_eq!(
        last.event,
        PoolEvent::Paid {
            pool_name: POOL_NAME.into(),
            borrower: borrower.clone(),
            amount: units(10),
            interest,
        }
    );
    pool.reconcile(&coin).unwrap();
}

#[test]
fn million_token_loan_repaid_in_one_call() {
    let (mut pool, mut coin) = active_pool();
    let borrower = addr("borrower");
    let principal = units(1_000_000);

    fund(&mut coin, &pool, "provider", principal);
    pool.provide(&addr("provider"), &mut coin, principal).unwrap();
    pool.borrow(&borrower, &mut coin, principal).unwrap();

    let interest = pool.interest(principal).unwrap();
    assert_eq!(interest, units(50_000));

    coin.mint(&addr("owner"), &borrower, interest).unwrap();
    coin.approve(&borrower, pool.address(), 2 * principal);
    pool.pay(&borrower, &mut coin, principal).unwrap();

    assert_eq!(pool.borrowed(), 0);
    assert_eq!(pool.balance(), principal);
    assert_eq!(pool.interest_collected(), units(50_000));
    assert_eq!(coin.balance_of(&borrower), 0);
    pool.reconcile(&coin).unwrap();
}

#[test]
fn non_borrower_cannot_activate_borrow_or_pay() {
    let coin = StableCoin::new(addr("owner"));
    let mut pending = LendingPool::new(addr("edupool"));
    pending.initialize(config(coin.id())).unwrap();
    let before = snapshot(&pending);
    assert!(matches!(
        pending.activate(&addr("mallory")),
        Err(PoolError::Unauthorized { .. })
    ));
    assert_eq!(snapshot(&pending), before);

    let (mut pool, mut coin) = active_pool();
    fund(&mut coin, &pool, "provider", units(10));
    pool.provide(&addr("provider"), &mut coin, units(10)).unwrap();
    pool.borrow(&addr("borrower"), &mut coin, units(5)).unwrap();

    let mallory = addr("mallory");
    fund(&mut coin, &pool, "mallory", units(10));
    let before = snapshot(&pool);
    let coin_before = coin.clone();

    assert!(matches!(
        pool.borrow(&mallory, &mut coin, units(1)),
        Err(PoolError::Unauthorized { .. })
    ));
    assert!(matches!(
        pool.pay(&mallory, &mut coin, units(1)),
        Err(PoolError::Unauthorized { .. })
    ));
    assert_eq!(snapshot(&pool), before);
    assert_eq!(coin, coin_before);
}

#[test]
fn withdraw_limited_to_own_claim() {
    let (mut pool, mut coin) = active_pool();
    fund(&mut coin, &pool, "alice", units(10));
    fund(&mut coin, &pool, "bob", units(50));
    pool.provide(&addr("alice"), &mut coin, units(10)).unwrap();
    pool.provide(&addr("bob"), &mut coin, units(50)).unwrap();
    let before = snapshot(&pool);

    // The pool holds 60, but alice only owns 10.
    let err = pool
        .withdraw(&addr("alice"), &mut coin, units(11))
        .unwrap_err();
    assert_eq!(
        err,
        PoolError::InsufficientProviderBalance {
            requested: units(11),
            available: units(10),
        }
    );
    assert_eq!(err.to_string(), "Not enough issuer balance");
    assert_eq!(snapshot(&pool), before);

    pool.withdraw(&addr("alice"), &mut coin, units(10)).unwrap();
    assert_eq!(pool.balance_of(&addr("alice")), 0);
    assert_eq!(pool.balance(), units(50));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn provider_balance_tracks_provides_minus_withdrawals() {
    let (mut pool, mut coin) = active_pool();
    let alice = addr("alice");
    fund(&mut coin, &pool, "alice", units(100));

    let steps: [(bool, u64); 7] = [
        (true, 30),
        (true, 20),
        (false, 10),
        (false, 45), // exceeds the 40 left, rejected
        (true, 5),
        (false, 45),
        (false, 1), // nothing left, rejected
    ];

    let mut expected: Amount = 0;
    for (is_provide, tokens) in steps {
        let amount = units(tokens);
        if is_provide {
            pool.provide(&alice, &mut coin, amount).unwrap();
            expected += amount;
        } else if amount <= expected {
            pool.withdraw(&alice, &mut coin, amount).unwrap();
            expected -= amount;
        } else {
            let before = snapshot(&pool);
            assert!(matches!(
                pool.withdraw(&alice, &mut coin, amount),
                Err(PoolError::InsufficientProviderBalance { .. })
            ));
            assert_eq!(snapshot(&pool), before);
        }
        assert_eq!(pool.balance_of(&alice), expected);
        pool.reconcile(&coin).unwrap();
    }
    assert_eq!(expected, 0);
}

#[test]
fn borrow_beyond_balance_rejected() {
    let (mut pool, mut coin) = active_pool();
    fund(&mut coin, &pool, "alice", units(10));
    pool.provide(&addr("alice"), &mut coin, units(10)).unwrap();
    let before = snapshot(&pool);

    let err = pool
        .borrow(&addr("borrower"), &mut coin, units(10) + 1)
        .unwrap_err();
    assert_eq!(err.to_string(), "Not enough balance");
    assert_eq!(snapshot(&pool), before);

    pool.borrow(&addr("borrower"), &mut coin, units(4)).unwrap();
    pool.borrow(&addr("borrower"), &mut coin, units(6)).unwrap();
    assert_eq!(pool.borrowed(), units(10));
    assert_eq!(pool.balance(), 0);
}

#[test]
fn repayment_requires_principal_plus_interest_approval() {
    let (mut pool, mut coin) = active_pool();
    let borrower = addr("borrower");
    fund(&mut coin, &pool, "alice", units(20));
    pool.provide(&addr("alice"), &mut coin, units(20)).unwrap();
    pool.borrow(&borrower, &mut coin, units(20)).unwrap();

    // Approve only the principal.
    coin.mint(&addr("owner"), &borrower, units(5)).unwrap();
    coin.approve(&borrower, pool.address(), units(20));
    let before = snapshot(&pool);
    let coin_before = coin.clone();

    let err = pool.pay(&borrower, &mut coin, units(20)).unwrap_err();
    assert_eq!(
        err,
        PoolError::InsufficientRepayment {
            required: units(21),
            authorized: units(20),
        }
    );
    assert_eq!(snapshot(&pool), before);
    assert_eq!(coin, coin_before);

    // Partial repayment of 8 costs 8.4.
    let due = units(8) + pool.interest(units(8)).unwrap();
    assert_eq!(due, parse_units("8.4", 18).unwrap());
    coin.approve(&borrower, pool.address(), due);
    pool.pay(&borrower, &mut coin, units(8)).unwrap();
    assert_eq!(pool.borrowed(), units(12));
    assert_eq!(pool.balance(), units(8));
    pool.reconcile(&coin).unwrap();
}

#[test]
fn approved_but_unfunded_repayment_reports_transfer_failure() {
    let (mut pool, mut coin) = active_pool();
    let borrower = addr("borrower");
    fund(&mut coin, &pool, "alice", units(10));
    pool.provide(&addr("alice"), &mut coin, units(10)).unwrap();
    pool.borrow(&borrower, &mut coin, units(10)).unwrap();

    // Enough allowance, but the borrower only holds the principal.
    coin.approve(&borrower, pool.address(), units(11));
    let before = snapshot(&pool);
    assert!(matches!(
        pool.pay(&borrower, &mut coin, units(10)),
        Err(PoolError::TransferFailed(_))
    ));
    assert_eq!(snapshot(&pool), before);
}

#[test]
fn interest_is_deterministic() {
    let (pool, _) = active_pool();
    let first = pool.interest(units(123)).unwrap();
    for _ in 0..10 {
        assert_eq!(pool.interest(units(123)).unwrap(), first);
    }
    assert_eq!(first, parse_units("6.15", 18).unwrap());
}

#[test]
fn provide_allowed_while_pending() {
    let mut coin = StableCoin::new(addr("owner"));
    let mut pool = LendingPool::new(addr("edupool"));
    pool.initialize(config(coin.id())).unwrap();

    fund(&mut coin, &pool, "alice", units(3));
    pool.provide(&addr("alice"), &mut coin, units(3)).unwrap();
    assert_eq!(pool.balance(), units(3));
    assert_eq!(pool.status(), PoolStatus::Pending);
}

#[test]
fn every_committed_operation_emits_one_event() {
    let (mut pool, mut coin) = active_pool();
    let borrower = addr("borrower");
    fund(&mut coin, &pool, "alice", units(10));
    pool.provide(&addr("alice"), &mut coin, units(10)).unwrap();
    pool.withdraw(&addr("alice"), &mut coin, units(2)).unwrap();
    pool.borrow(&borrower, &mut coin, units(4)).unwrap();
    let _ = pool.borrow(&borrower, &mut coin, units(100)); // rejected
    coin.mint(&addr("owner"), &borrower, units(1)).unwrap();
    coin.approve(&borrower, pool.address(), units(5));
    pool.pay(&borrower, &mut coin, units(4)).unwrap();

    let kinds: Vec<&str> = pool.events().iter().map(|r| r.event.kind()).collect();
    assert_eq!(
        kinds,
        vec!["initialized", "active", "provided", "withdrawn", "borrowed", "paid"]
    );
    assert_eq!(pool.events_since(4).len(), 2);
}

#[test]
fn pool_survives_json_roundtrip() {
    let (mut pool, mut coin) = active_pool();
    fund(&mut coin, &pool, "alice", units(250));
    pool.provide(&addr("alice"), &mut coin, units(250)).unwrap();

    let json = serde_json::to_string(&pool).unwrap();
    let restored: LendingPool = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, pool);
    assert_eq!(restored.balance_of(&addr("alice")), units(250));
}
