//! # Lending Pool Contract
//!
//! A single-borrower, multi-lender liquidity pool. Providers deposit the
//! funds asset and hold a withdrawable claim; one borrower draws from the
//! pooled liquidity and repays principal plus a flat interest charge.
//!
//! The lifecycle is:
//!
//! 1. **Deploy**: the pool gets an address on the funds asset but no
//!    configuration ([`PoolStatus::Uninitialized`]).
//! 2. **Initialize**: one-shot configuration of name, funds asset,
//!    borrower and interest terms. The pool becomes `Pending`.
//! 3. **Activate**: the borrower opens the pool. `Pending -> Active` is the
//!    only forward edge and there is no way back.
//! 4. **Operate**: providers `provide` / `withdraw`; the borrower `borrow`s
//!    and `pay`s, any number of times.
//!
//! ## Accounting
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `total_balance` | liquid funds available to lend or withdraw |
//! | `total_borrowed` | principal currently out with the borrower |
//! | `interest_collected` | interest received, retained as pool revenue |
//! | `provider_balances` | each provider's claim |
//!
//! After every operation `sum(provider_balances) == total_balance +
//! total_borrowed`, and the pool's holding of the funds asset covers
//! `total_balance + interest_collected`. [`LendingPool::reconcile`] checks
//! both.
//!
//! ## Atomicity
//!
//! Each operation validates everything and computes every new total with
//! checked arithmetic first, then performs the single collaborator transfer,
//! and only then writes the ledger and appends one event. A failure at any
//! step returns before the first ledger write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{POOL_ADDRESS_PREFIX, POOL_VERSION};
use crate::events::{EventLog, EventRecord, PoolEvent};
use crate::funds_asset::{FundsAsset, TransferError};
use crate::interest::{InterestRate, InterestTerms};
use crate::types::{Address, Amount, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during pool operations.
///
/// Every variant is returned before any ledger mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// `initialize` was called on a pool that already has a configuration.
    #[error("pool is already initialized")]
    AlreadyInitialized,

    /// The pool has not been initialized yet.
    #[error("pool is not initialized")]
    NotInitialized,

    /// A borrower-only operation was called by someone else.
    #[error("Caller is not the borrower")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// The pool is not in a state that allows this operation.
    #[error("invalid state transition: pool is {current}, expected {expected}")]
    InvalidState {
        /// The pool's current status.
        current: PoolStatus,
        /// The status required for this operation.
        expected: PoolStatus,
    },

    /// Amounts must be strictly positive.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// A provider tried to withdraw more than their own claim.
    #[error("Not enough issuer balance")]
    InsufficientProviderBalance {
        /// Amount requested.
        requested: Amount,
        /// The caller's claim.
        available: Amount,
    },

    /// Not enough liquid funds in the pool.
    #[error("Not enough balance")]
    InsufficientPoolBalance {
        /// Amount requested.
        requested: Amount,
        /// Liquid balance of the pool.
        available: Amount,
    },

    /// The borrower has not authorized the pool to pull principal plus interest.
    #[error("insufficient repayment: {required} due with interest, {authorized} authorized")]
    InsufficientRepayment {
        /// Principal plus interest.
        required: Amount,
        /// Allowance the borrower granted to the pool.
        authorized: Amount,
    },

    /// Tried to repay more principal than is outstanding.
    #[error("overpayment: attempted to repay {attempted} but only {outstanding} outstanding")]
    RepaymentExceedsDebt {
        /// Principal the caller tried to repay.
        attempted: Amount,
        /// Principal currently outstanding.
        outstanding: Amount,
    },

    /// The asset passed in is not the pool's funds asset.
    #[error("asset mismatch: pool uses {expected}, got {got}")]
    AssetMismatch {
        /// The configured funds asset.
        expected: AssetId,
        /// The asset supplied with the call.
        got: AssetId,
    },

    /// The funds asset refused the transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// An arithmetic overflow would occur.
    #[error("amount overflow: operation would exceed allowed limits")]
    AmountOverflow,

    /// The ledger totals disagree with each other or with the asset.
    #[error("ledger mismatch: {0}")]
    LedgerMismatch(String),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle gate of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Deployed but never configured.
    Uninitialized,
    /// Configured, waiting for the borrower to activate.
    Pending,
    /// Open for borrowing and repayment.
    Active,
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolStatus::Uninitialized => write!(f, "Uninitialized"),
            PoolStatus::Pending => write!(f, "Pending"),
            PoolStatus::Active => write!(f, "Active"),
        }
    }
}

/// The one-shot configuration accepted by [`LendingPool::initialize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Human-readable pool name.
    pub name: String,
    /// Asset used for every transfer.
    pub funds_asset: AssetId,
    /// The only account allowed to activate, borrow and repay.
    pub borrower: Address,
    /// Period the rate is quoted over, in seconds.
    pub interest_period: u64,
    /// Rate charged on each repayment.
    pub interest_rate: InterestRate,
}

/// Fields fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PoolSettings {
    name: String,
    version: String,
    funds_asset: AssetId,
    borrower: Address,
    terms: InterestTerms,
    initialized_at: DateTime<Utc>,
}

/// A lending pool ledger.
///
/// All fields are private: the ledger changes only through the operations
/// below, one call at a time (`&mut self`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingPool {
    address: Address,
    settings: Option<PoolSettings>,
    status: PoolStatus,
    total_balance: Amount,
    total_borrowed: Amount,
    interest_collected: Amount,
    provider_balances: BTreeMap<Address, Amount>,
    events: EventLog,
}

impl LendingPool {
    /// Creates an uninitialized pool holding funds under `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            settings: None,
            status: PoolStatus::Uninitialized,
            total_balance: 0,
            total_borrowed: 0,
            interest_collected: 0,
            provider_balances: BTreeMap::new(),
            events: EventLog::new(),
        }
    }

    /// Creates an uninitialized pool under a freshly generated address.
    pub fn deploy() -> Self {
        Self::new(Address::generate(POOL_ADDRESS_PREFIX))
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Configures the pool. Allowed exactly once.
    ///
    /// Resets all totals and provider balances and moves the pool to
    /// `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyInitialized`] on every call after the first.
    pub fn initialize(&mut self, config: PoolConfig) -> Result<(), PoolError> {
        if self.settings.is_some() {
            warn!(pool = %self.address, "rejected second initialization");
            return Err(PoolError::AlreadyInitialized);
        }

        let PoolConfig {
            name,
            funds_asset,
            borrower,
            interest_period,
            interest_rate,
        } = config;

        self.settings = Some(PoolSettings {
            name: name.clone(),
            version: POOL_VERSION.to_string(),
            funds_asset,
            borrower: borrower.clone(),
            terms: InterestTerms::new(interest_period, interest_rate),
            initialized_at: Utc::now(),
        });
        self.status = PoolStatus::Pending;
        self.total_balance = 0;
        self.total_borrowed = 0;
        self.interest_collected = 0;
        self.provider_balances.clear();

        info!(pool = %self.address, name = %name, borrower = %borrower, "pool initialized");
        self.events.emit(PoolEvent::Initialized {
            pool: self.address.clone(),
            pool_name: name,
            borrower,
        });
        Ok(())
    }

    /// Opens the pool for borrowing.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Unauthorized`] if `caller` is not the borrower.
    /// Returns [`PoolError::InvalidState`] if the pool is not `Pending`.
    pub fn activate(&mut self, caller: &Address) -> Result<(), PoolError> {
        self.require_borrower(caller)?;
        self.require_status(PoolStatus::Pending)?;

        self.status = PoolStatus::Active;

        info!(pool = %self.address, "pool activated");
        self.events.emit(PoolEvent::Active {
            pool: self.address.clone(),
        });
        Ok(())
    }

    // -- Liquidity ----------------------------------------------------------

    /// Deposits `amount` from `caller` into the pool.
    ///
    /// Allowed while `Pending` or `Active`. The caller must have approved
    /// the pool's address for at least `amount` on the funds asset.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ZeroAmount`] for a zero deposit.
    /// Returns [`PoolError::TransferFailed`] if the asset refuses the pull.
    pub fn provide<A: FundsAsset>(
        &mut self,
        caller: &Address,
        asset: &mut A,
        amount: Amount,
    ) -> Result<(), PoolError> {
        self.require_asset(asset)?;
        require_positive(amount)?;

        let new_total = self
            .total_balance
            .checked_add(amount)
            .ok_or(PoolError::AmountOverflow)?;
        let new_claim = self
            .balance_of(caller)
            .checked_add(amount)
            .ok_or(PoolError::AmountOverflow)?;

        self.pull(asset, caller, amount)?;

        self.total_balance = new_total;
        self.provider_balances.insert(caller.clone(), new_claim);

        let pool_name = self.pool_name();
        info!(pool = %pool_name, provider = %caller, amount, "liquidity provided");
        self.events.emit(PoolEvent::Provided {
            pool_name,
            provider: caller.clone(),
            amount,
        });
        Ok(())
    }

    /// Returns `amount` of `caller`'s claim to them.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InsufficientProviderBalance`] if `amount` exceeds
    /// the caller's own claim, regardless of what other providers deposited.
    /// Returns [`PoolError::InsufficientPoolBalance`] if the claim is valid but
    /// the liquidity is currently lent out.
    pub fn withdraw<A: FundsAsset>(
        &mut self,
        caller: &Address,
        asset: &mut A,
        amount: Amount,
    ) -> Result<(), PoolError> {
        self.require_asset(asset)?;
        require_positive(amount)?;

        let claim = self.balance_of(caller);
        let new_claim = claim
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientProviderBalance {
                requested: amount,
                available: claim,
            })?;
        let new_total = self.take_liquidity(amount)?;

        self.push(asset, caller, amount)?;

        self.total_balance = new_total;
        if new_claim == 0 {
            self.provider_balances.remove(caller);
        } else {
            self.provider_balances.insert(caller.clone(), new_claim);
        }

        let pool_name = self.pool_name();
        info!(pool = %pool_name, provider = %caller, amount, "liquidity withdrawn");
        self.events.emit(PoolEvent::Withdrawn {
            pool_name,
            provider: caller.clone(),
            amount,
        });
        Ok(())
    }

    // -- Loan ---------------------------------------------------------------

    /// Lends `amount` of the pool's liquid balance to the borrower.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Unauthorized`] if `caller` is not the borrower.
    /// Returns [`PoolError::InvalidState`] unless the pool is `Active`.
    /// Returns [`PoolError::InsufficientPoolBalance`] if `amount` exceeds the
    /// liquid balance.
    pub fn borrow<A: FundsAsset>(
        &mut self,
        caller: &Address,
        asset: &mut A,
        amount: Amount,
    ) -> Result<(), PoolError> {
        self.require_borrower(caller)?;
        self.require_status(PoolStatus::Active)?;
        self.require_asset(asset)?;
        require_positive(amount)?;

        let new_total = self.take_liquidity(amount)?;
        let new_borrowed = self
            .total_borrowed
            .checked_add(amount)
            .ok_or(PoolError::AmountOverflow)?;

        self.push(asset, caller, amount)?;

        self.total_balance = new_total;
        self.total_borrowed = new_borrowed;

        let pool_name = self.pool_name();
        info!(pool = %pool_name, borrower = %caller, amount, "funds borrowed");
        self.events.emit(PoolEvent::Borrowed {
            pool_name,
            borrower: caller.clone(),
            amount,
        });
        Ok(())
    }

    /// Interest owed for repaying `principal` under the pool's terms.
    ///
    /// Pure: `floor(principal * rate / 1e18)`. An uninitialized pool has a
    /// zero rate.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AmountOverflow`] if the product overflows.
    pub fn interest(&self, principal: Amount) -> Result<Amount, PoolError> {
        match &self.settings {
            Some(settings) => settings
                .terms
                .interest(principal)
                .ok_or(PoolError::AmountOverflow),
            None => Ok(0),
        }
    }

    /// Repays `amount` of principal plus `interest(amount)`.
    ///
    /// The principal goes back to the liquid balance; the interest is kept
    /// as pool revenue in `interest_collected`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Unauthorized`] if `caller` is not the borrower.
    /// Returns [`PoolError::InvalidState`] unless the pool is `Active`.
    /// Returns [`PoolError::RepaymentExceedsDebt`] if `amount` exceeds the
    /// outstanding principal.
    /// Returns [`PoolError::InsufficientRepayment`] if the borrower approved
    /// less than principal plus interest.
    pub fn pay<A: FundsAsset>(
        &mut self,
        caller: &Address,
        asset: &mut A,
        amount: Amount,
    ) -> Result<(), PoolError> {
        self.require_borrower(caller)?;
        self.require_status(PoolStatus::Active)?;
        self.require_asset(asset)?;
        require_positive(amount)?;

        let new_borrowed = self
            .total_borrowed
            .checked_sub(amount)
            .ok_or(PoolError::RepaymentExceedsDebt {
                attempted: amount,
                outstanding: self.total_borrowed,
            })?;

        let interest = self.interest(amount)?;
        let required = amount
            .checked_add(interest)
            .ok_or(PoolError::AmountOverflow)?;
        let authorized = asset.allowance(caller, &self.address);
        if authorized < required {
            warn!(pool = %self.address, required, authorized, "repayment not authorized");
            return Err(PoolError::InsufficientRepayment {
                required,
                authorized,
            });
        }

        let new_total = self
            .total_balance
            .checked_add(amount)
            .ok_or(PoolError::AmountOverflow)?;
        let new_collected = self
            .interest_collected
            .checked_add(interest)
            .ok_or(PoolError::AmountOverflow)?;

        self.pull(asset, caller, required)?;

        self.total_borrowed = new_borrowed;
        self.total_balance = new_total;
        self.interest_collected = new_collected;

        let pool_name = self.pool_name();
        info!(pool = %pool_name, borrower = %caller, amount, interest, "loan repaid");
        self.events.emit(PoolEvent::Paid {
            pool_name,
            borrower: caller.clone(),
            amount,
            interest,
        });
        Ok(())
    }

    // -- Queries ------------------------------------------------------------

    /// Liquid balance available to borrow or withdraw.
    pub fn balance(&self) -> Amount {
        self.total_balance
    }

    /// `addr`'s claim on the pool, or 0.
    pub fn balance_of(&self, addr: &Address) -> Amount {
        self.provider_balances.get(addr).copied().unwrap_or(0)
    }

    /// Principal currently outstanding.
    pub fn borrowed(&self) -> Amount {
        self.total_borrowed
    }

    /// Outstanding debt. Interest is charged at repayment time, so this is
    /// the outstanding principal.
    pub fn total(&self) -> Amount {
        self.total_borrowed
    }

    /// Interest received so far.
    pub fn interest_collected(&self) -> Amount {
        self.interest_collected
    }

    /// Current lifecycle status.
    pub fn status(&self) -> PoolStatus {
        self.status
    }

    /// The pool's own account on the funds asset.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Pool name, once initialized.
    pub fn name(&self) -> Option<&str> {
        self.settings.as_ref().map(|s| s.name.as_str())
    }

    /// Ledger schema version, once initialized.
    pub fn version(&self) -> Option<&str> {
        self.settings.as_ref().map(|s| s.version.as_str())
    }

    /// The funds asset, once initialized.
    pub fn stablecoin(&self) -> Option<&AssetId> {
        self.settings.as_ref().map(|s| &s.funds_asset)
    }

    /// The borrower, once initialized.
    pub fn borrower(&self) -> Option<&Address> {
        self.settings.as_ref().map(|s| &s.borrower)
    }

    /// Interest terms, once initialized.
    pub fn interest_terms(&self) -> Option<&InterestTerms> {
        self.settings.as_ref().map(|s| &s.terms)
    }

    /// When `initialize` ran.
    pub fn initialized_at(&self) -> Option<DateTime<Utc>> {
        self.settings.as_ref().map(|s| s.initialized_at)
    }

    /// Every provider with a non-zero claim, ordered by address.
    pub fn providers(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.provider_balances.iter().map(|(a, b)| (a, *b))
    }

    /// The notification log.
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Notifications with `seq >= from`.
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.events.since(from)
    }

    /// Verifies the ledger against itself and against the funds asset.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::LedgerMismatch`] if provider claims do not add
    /// up to liquid plus lent funds, or if the asset holds less than the
    /// pool's liquid balance plus collected interest.
    pub fn reconcile<A: FundsAsset>(&self, asset: &A) -> Result<(), PoolError> {
        self.require_asset(asset)?;

        let claims = self
            .provider_balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
            .ok_or(PoolError::AmountOverflow)?;
        let backing = self
            .total_balance
            .checked_add(self.total_borrowed)
            .ok_or(PoolError::AmountOverflow)?;
        if claims != backing {
            return Err(PoolError::LedgerMismatch(format!(
                "provider claims {} != balance {} + borrowed {}",
                claims, self.total_balance, self.total_borrowed
            )));
        }

        let expected_holding = self
            .total_balance
            .checked_add(self.interest_collected)
            .ok_or(PoolError::AmountOverflow)?;
        let holding = asset.balance_of(&self.address);
        // Anyone may send funds straight to the pool, so only a shortfall is drift.
        if holding < expected_holding {
            return Err(PoolError::LedgerMismatch(format!(
                "asset holds {} for the pool, ledger expects {}",
                holding, expected_holding
            )));
        }
        Ok(())
    }

    // -- Guards -------------------------------------------------------------

    fn settings(&self) -> Result<&PoolSettings, PoolError> {
        self.settings.as_ref().ok_or(PoolError::NotInitialized)
    }

    fn require_borrower(&self, caller: &Address) -> Result<(), PoolError> {
        if &self.settings()?.borrower != caller {
            warn!(pool = %self.address, caller = %caller, "caller is not the borrower");
            return Err(PoolError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn require_status(&self, expected: PoolStatus) -> Result<(), PoolError> {
        if self.status != expected {
            return Err(PoolError::InvalidState {
                current: self.status,
                expected,
            });
        }
        Ok(())
    }

    fn require_asset<A: FundsAsset>(&self, asset: &A) -> Result<(), PoolError> {
        let expected = &self.settings()?.funds_asset;
        if asset.id() != expected {
            return Err(PoolError::AssetMismatch {
                expected: expected.clone(),
                got: asset.id().clone(),
            });
        }
        Ok(())
    }

    /// Liquid balance after removing `amount`.
    fn take_liquidity(&self, amount: Amount) -> Result<Amount, PoolError> {
        self.total_balance
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientPoolBalance {
                requested: amount,
                available: self.total_balance,
            })
    }

    fn pull<A: FundsAsset>(
        &self,
        asset: &mut A,
        from: &Address,
        amount: Amount,
    ) -> Result<(), PoolError> {
        asset
            .transfer_from(&self.address, from, &self.address, amount)
            .map_err(|e| {
                warn!(pool = %self.address, from = %from, amount, error = %e, "pull failed");
                PoolError::from(e)
            })
    }

    fn push<A: FundsAsset>(
        &self,
        asset: &mut A,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PoolError> {
        asset.transfer(&self.address, to, amount).map_err(|e| {
            warn!(pool = %self.address, to = %to, amount, error = %e, "push failed");
            PoolError::from(e)
        })
    }

    fn pool_name(&self) -> String {
        self.name().unwrap_or_default().to_string()
    }
}

fn require_positive(amount: Amount) -> Result<(), PoolError> {
    if amount == 0 {
        return Err(PoolError::ZeroAmount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stablecoin::StableCoin;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn setup() -> (LendingPool, StableCoin) {
        let coin = StableCoin::new(addr("owner"));
        let mut pool = LendingPool::new(addr("pool"));
        pool.initialize(PoolConfig {
            name: "Test Pool".into(),
            funds_asset: coin.id().clone(),
            borrower: addr("borrower"),
            interest_period: 60,
            interest_rate: InterestRate::from_bps(500),
        })
        .unwrap();
        (pool, coin)
    }

    fn fund(coin: &mut StableCoin, who: &str, amount: Amount) {
        coin.mint(&addr("owner"), &addr(who), amount).unwrap();
        coin.approve(&addr(who), &addr("pool"), amount);
    }

    #[test]
    fn new_pool_is_uninitialized() {
        let pool = LendingPool::new(addr("pool"));
        assert_eq!(pool.status(), PoolStatus::Uninitialized);
        assert!(pool.name().is_none());
        assert!(pool.events().is_empty());
    }

    #[test]
    fn initialize_sets_pending() {
        let (pool, coin) = setup();
        assert_eq!(pool.status(), PoolStatus::Pending);
        assert_eq!(pool.name(), Some("Test Pool"));
        assert_eq!(pool.version(), Some(POOL_VERSION));
        assert_eq!(pool.stablecoin(), Some(coin.id()));
        assert_eq!(pool.events().len(), 1);
    }

    #[test]
    fn operations_before_initialize_rejected() {
        let mut pool = LendingPool::new(addr("pool"));
        let mut coin = StableCoin::new(addr("owner"));
        assert_eq!(pool.activate(&addr("b")), Err(PoolError::NotInitialized));
        assert_eq!(
            pool.provide(&addr("alice"), &mut coin, 1),
            Err(PoolError::NotInitialized)
        );
        assert_eq!(pool.interest(1_000), Ok(0));
    }

    #[test]
    fn activate_twice_rejected() {
        let (mut pool, _) = setup();
        pool.activate(&addr("borrower")).unwrap();
        assert_eq!(
            pool.activate(&addr("borrower")),
            Err(PoolError::InvalidState {
                current: PoolStatus::Active,
                expected: PoolStatus::Pending,
            })
        );
    }

    #[test]
    fn borrow_requires_active() {
        let (mut pool, mut coin) = setup();
        fund(&mut coin, "alice", 100);
        pool.provide(&addr("alice"), &mut coin, 100).unwrap();
        let result = pool.borrow(&addr("borrower"), &mut coin, 10);
        assert!(matches!(result, Err(PoolError::InvalidState { .. })));
    }

    #[test]
    fn zero_amounts_rejected() {
        let (mut pool, mut coin) = setup();
        assert_eq!(
            pool.provide(&addr("alice"), &mut coin, 0),
            Err(PoolError::ZeroAmount)
        );
        assert_eq!(
            pool.withdraw(&addr("alice"), &mut coin, 0),
            Err(PoolError::ZeroAmount)
        );
    }

    #[test]
    fn wrong_asset_rejected() {
        let (mut pool, _) = setup();
        let mut other = StableCoin::new(addr("owner"));
        let result = pool.provide(&addr("alice"), &mut other, 1);
        assert!(matches!(result, Err(PoolError::AssetMismatch { .. })));
    }

    #[test]
    fn provide_without_approval_fails_atomically() {
        let (mut pool, mut coin) = setup();
        coin.mint(&addr("owner"), &addr("alice"), 100).unwrap();
        let before = pool.clone();
        let result = pool.provide(&addr("alice"), &mut coin, 100);
        assert!(matches!(result, Err(PoolError::TransferFailed(_))));
        assert_eq!(pool, before);
    }

    #[test]
    fn withdraw_blocked_while_funds_are_lent() {
        let (mut pool, mut coin) = setup();
        pool.activate(&addr("borrower")).unwrap();
        fund(&mut coin, "alice", 100);
        pool.provide(&addr("alice"), &mut coin, 100).unwrap();
        pool.borrow(&addr("borrower"), &mut coin, 80).unwrap();

        assert_eq!(
            pool.withdraw(&addr("alice"), &mut coin, 50),
            Err(PoolError::InsufficientPoolBalance {
                requested: 50,
                available: 20,
            })
        );
        pool.withdraw(&addr("alice"), &mut coin, 20).unwrap();
        assert_eq!(pool.balance_of(&addr("alice")), 80);
        pool.reconcile(&coin).unwrap();
    }

    #[test]
    fn overpayment_rejected() {
        let (mut pool, mut coin) = setup();
        pool.activate(&addr("borrower")).unwrap();
        fund(&mut coin, "alice", 100);
        pool.provide(&addr("alice"), &mut coin, 100).unwrap();
        pool.borrow(&addr("borrower"), &mut coin, 40).unwrap();
        assert_eq!(
            pool.pay(&addr("borrower"), &mut coin, 41),
            Err(PoolError::RepaymentExceedsDebt {
                attempted: 41,
                outstanding: 40,
            })
        );
    }

    #[test]
    fn fully_withdrawn_provider_is_dropped() {
        let (mut pool, mut coin) = setup();
        fund(&mut coin, "alice", 100);
        pool.provide(&addr("alice"), &mut coin, 100).unwrap();
        pool.withdraw(&addr("alice"), &mut coin, 100).unwrap();
        assert_eq!(pool.providers().count(), 0);
        assert_eq!(coin.balance_of(&addr("alice")), 100);
    }

    #[test]
    fn reconcile_detects_missing_funds() {
        let (mut pool, mut coin) = setup();
        fund(&mut coin, "alice", 100);
        pool.provide(&addr("alice"), &mut coin, 100).unwrap();
        // Funds leave the pool's account behind the ledger's back.
        coin.transfer(&addr("pool"), &addr("mallory"), 1).unwrap();
        assert!(matches!(
            pool.reconcile(&coin),
            Err(PoolError::LedgerMismatch(_))
        ));
    }
}
