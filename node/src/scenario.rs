//! # Scenario Execution
//!
//! A scenario is a JSON list of steps applied to a [`Ledger`] in order:
//!
//! ```json
//! { "steps": [
//!   { "op": "mint",     "caller": "owner",    "to": "alice", "amount": "100" },
//!   { "op": "approve",  "caller": "alice",    "amount": "10" },
//!   { "op": "activate", "caller": "borrower" },
//!   { "op": "provide",  "caller": "alice",    "amount": "10" },
//!   { "op": "borrow",   "caller": "borrower", "amount": "10" },
//!   { "op": "pay",      "caller": "borrower", "amount": "10" }
//! ] }
//! ```
//!
//! Amounts are decimal token strings. `approve` always targets the pool.
//! A rejected step leaves the ledger untouched; the runner either records
//! the rejection and moves on, or stops (`fail_fast`).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edupool_contracts::config::STABLECOIN_DECIMALS;
use edupool_contracts::units::{parse_units, UnitsError};
use edupool_contracts::{Address, Amount, PoolError, TokenError};

use crate::ledger::{display_amount, Ledger};

/// One operation in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Stablecoin owner mints to an account.
    Mint {
        caller: Address,
        to: Address,
        amount: String,
    },
    /// `caller` approves the pool to pull `amount`.
    Approve { caller: Address, amount: String },
    /// Borrower activates the pool.
    Activate { caller: Address },
    /// Provider deposits.
    Provide { caller: Address, amount: String },
    /// Provider withdraws.
    Withdraw { caller: Address, amount: String },
    /// Borrower draws a loan.
    Borrow { caller: Address, amount: String },
    /// Borrower repays principal; interest is added by the pool.
    Pay { caller: Address, amount: String },
}

impl Step {
    /// Operation name as written in the scenario file.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Approve { .. } => "approve",
            Step::Activate { .. } => "activate",
            Step::Provide { .. } => "provide",
            Step::Withdraw { .. } => "withdraw",
            Step::Borrow { .. } => "borrow",
            Step::Pay { .. } => "pay",
        }
    }
}

/// Why a step was rejected.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("invalid amount: {0}")]
    Amount(#[from] UnitsError),
}

/// A list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid scenario {}", path.display()))
    }
}

/// Result of one step.
#[derive(Debug)]
pub struct StepOutcome {
    /// Position in the scenario.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// `Ok` if committed.
    pub result: Result<(), StepError>,
}

/// Totals of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub committed: usize,
    pub rejected: usize,
}

impl Ledger {
    /// Applies a single step. On error nothing changed.
    pub fn apply(&mut self, step: &Step) -> Result<(), StepError> {
        let pool_address = self.pool.address().clone();
        match step {
            Step::Mint { caller, to, amount } => {
                let amount = parse(amount)?;
                self.asset.mint(caller, to, amount)?;
            }
            Step::Approve { caller, amount } => {
                let amount = parse(amount)?;
                self.asset.approve(caller, &pool_address, amount);
            }
            Step::Activate { caller } => self.pool.activate(caller)?,
            Step::Provide { caller, amount } => {
                let amount = parse(amount)?;
                self.pool.provide(caller, &mut self.asset, amount)?;
            }
            Step::Withdraw { caller, amount } => {
                let amount = parse(amount)?;
                self.pool.withdraw(caller, &mut self.asset, amount)?;
            }
            Step::Borrow { caller, amount } => {
                let amount = parse(amount)?;
                self.pool.borrow(caller, &mut self.asset, amount)?;
            }
            Step::Pay { caller, amount } => {
                let amount = parse(amount)?;
                self.pool.pay(caller, &mut self.asset, amount)?;
            }
        }
        Ok(())
    }
}

fn parse(amount: &str) -> Result<Amount, UnitsError> {
    parse_units(amount, STABLECOIN_DECIMALS)
}

/// Runs `scenario` against `ledger`, calling `on_commit` after every
/// committed step so the caller can persist it.
///
/// Returns the per-step outcomes. With `fail_fast`, stops at the first
/// rejected step (its outcome is the last one returned).
pub fn run<F>(
    ledger: &mut Ledger,
    scenario: &Scenario,
    fail_fast: bool,
    mut on_commit: F,
) -> Result<Vec<StepOutcome>>
where
    F: FnMut(&Ledger) -> Result<()>,
{
    let mut outcomes = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let result = ledger.apply(step);
        match &result {
            Ok(()) => {
                tracing::info!(
                    step = index,
                    op = step.name(),
                    balance = %display_amount(ledger.pool.balance()),
                    borrowed = %display_amount(ledger.pool.borrowed()),
                    "step committed"
                );
                on_commit(ledger).with_context(|| {
                    format!("failed to persist step {} ({})", index, step.name())
                })?;
            }
            Err(e) => {
                tracing::warn!(step = index, op = step.name(), error = %e, "step rejected");
            }
        }

        let stop = fail_fast && result.is_err();
        outcomes.push(StepOutcome {
            index,
            op: step.name(),
            result,
        });
        if stop {
            break;
        }
    }

    Ok(outcomes)
}

/// Counts committed and rejected outcomes.
pub fn report(outcomes: &[StepOutcome]) -> RunReport {
    outcomes
        .iter()
        .fold(RunReport::default(), |mut acc, outcome| {
            if outcome.result.is_ok() {
                acc.committed += 1;
            } else {
                acc.rejected += 1;
            }
            acc
        })
}
