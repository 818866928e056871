//! # Local Ledger
//!
//! A deployed pool together with the stablecoin it moves value through.
//! This is the unit the node persists and replays scenarios against.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edupool_contracts::config::STABLECOIN_DECIMALS;
use edupool_contracts::units::{format_units, parse_units};
use edupool_contracts::{
    Address, Amount, FundsAsset, InterestRate, LendingPool, PoolConfig, StableCoin,
};

/// Pool setup read from the `init` configuration file.
///
/// ```json
/// {
///   "name": "JohnDoe Student Loan",
///   "borrower": "0xb0b",
///   "interest_period": 60,
///   "interest_rate": "0.05",
///   "stablecoin_owner": "0x0wner"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSetup {
    /// Human-readable pool name.
    pub name: String,
    /// The pool's borrower.
    pub borrower: Address,
    /// Interest quoting period in seconds.
    pub interest_period: u64,
    /// Interest rate as a decimal ratio, e.g. `"0.05"` for 5%.
    pub interest_rate: String,
    /// Account allowed to mint the stablecoin.
    pub stablecoin_owner: Address,
}

impl PoolSetup {
    /// Reads and parses a setup file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pool config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid pool config {}", path.display()))
    }
}

/// The pool and its funds asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub pool: LendingPool,
    pub asset: StableCoin,
}

impl Ledger {
    /// Deploys a stablecoin and a pool, then initializes the pool.
    pub fn genesis(setup: &PoolSetup) -> Result<Self> {
        let interest_rate = InterestRate::parse(&setup.interest_rate)
            .with_context(|| format!("invalid interest rate {:?}", setup.interest_rate))?;

        let asset = StableCoin::new(setup.stablecoin_owner.clone());
        let mut pool = LendingPool::deploy();
        pool.initialize(PoolConfig {
            name: setup.name.clone(),
            funds_asset: asset.id().clone(),
            borrower: setup.borrower.clone(),
            interest_period: setup.interest_period,
            interest_rate,
        })
        .context("failed to initialize pool")?;

        tracing::info!(
            pool = %pool.address(),
            asset = %asset.id(),
            "ledger created"
        );
        Ok(Self { pool, asset })
    }

    /// Human-readable summary of the pool.
    pub fn summary(&self) -> LedgerSummary {
        let pool = &self.pool;
        LedgerSummary {
            address: pool.address().clone(),
            name: pool.name().unwrap_or_default().to_string(),
            version: pool.version().unwrap_or_default().to_string(),
            status: pool.status().to_string(),
            stablecoin: pool
                .stablecoin()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            borrower: pool.borrower().cloned(),
            interest_rate: pool
                .interest_terms()
                .map(|t| t.rate.to_string())
                .unwrap_or_default(),
            interest_period: pool.interest_terms().map(|t| t.period_secs).unwrap_or(0),
            initialized_at: pool.initialized_at(),
            balance: display_amount(pool.balance()),
            borrowed: display_amount(pool.borrowed()),
            interest_collected: display_amount(pool.interest_collected()),
            pool_holdings: display_amount(self.asset.balance_of(pool.address())),
            providers: pool.providers().count(),
            events: pool.events().len(),
        }
    }
}

/// Parses a decimal token amount (`"10"`, `"0.5"`) into base units.
pub fn parse_amount(value: &str) -> Result<Amount> {
    parse_units(value, STABLECOIN_DECIMALS)
        .with_context(|| format!("invalid amount {:?}", value))
}

/// Formats base units as a decimal token amount.
pub fn display_amount(amount: Amount) -> String {
    format_units(amount, STABLECOIN_DECIMALS)
}

/// Pool state as printed by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub address: Address,
    pub name: String,
    pub version: String,
    pub status: String,
    pub stablecoin: String,
    pub borrower: Option<Address>,
    pub interest_rate: String,
    pub interest_period: u64,
    pub initialized_at: Option<DateTime<Utc>>,
    pub balance: String,
    pub borrowed: String,
    pub interest_collected: String,
    pub pool_holdings: String,
    pub providers: usize,
    pub events: usize,
}

impl std::fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "pool:               {} ({})", self.name, self.address)?;
        writeln!(f, "version:            {}", self.version)?;
        writeln!(f, "status:             {}", self.status)?;
        writeln!(f, "stablecoin:         {}", self.stablecoin)?;
        match &self.borrower {
            Some(b) => writeln!(f, "borrower:           {}", b)?,
            None => writeln!(f, "borrower:           -")?,
        }
        writeln!(
            f,
            "interest:           {} per {}s",
            self.interest_rate, self.interest_period
        )?;
        match &self.initialized_at {
            Some(at) => writeln!(f, "initialized:        {}", at.to_rfc3339())?,
            None => writeln!(f, "initialized:        -")?,
        }
        writeln!(f, "balance:            {}", self.balance)?;
        writeln!(f, "borrowed:           {}", self.borrowed)?;
        writeln!(f, "interest collected: {}", self.interest_collected)?;
        writeln!(f, "pool holdings:      {}", self.pool_holdings)?;
        writeln!(f, "providers:          {}", self.providers)?;
        write!(f, "events:             {}", self.events)
    }
}
