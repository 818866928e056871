//! # StableCoin
//!
//! A minimal fungible asset used as the pool's funds-transfer collaborator.
//! It follows the usual ERC-20 shape: an owner mints supply, holders
//! transfer and burn their own balance, and third parties move funds only
//! up to an allowance the holder granted with `approve`.
//!
//! ## Security Model
//!
//! - **Mint gating**: only the owner fixed at construction can mint.
//! - **Allowances**: `transfer_from` consumes the spender's allowance and
//!   fails without touching any balance if the allowance is short.
//! - **Supply tracking**: total supply and per-holder balances move
//!   together. Overflow is checked on every operation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{STABLECOIN_DECIMALS, STABLECOIN_NAME, STABLECOIN_SYMBOL};
use crate::funds_asset::{FundsAsset, TransferError};
use crate::types::{Address, Amount, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from stablecoin administration (mint / burn / approve).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The caller is not the owner of this token.
    #[error("unauthorized: only the owner can mint {0}")]
    UnauthorizedMint(String),

    /// Minting would overflow the total supply.
    #[error("supply overflow: minting {amount} would exceed u128::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: Amount,
    },

    /// The underlying balance movement failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

// ---------------------------------------------------------------------------
// StableCoin
// ---------------------------------------------------------------------------

/// In-memory ledger of a single fungible asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableCoin {
    id: AssetId,
    name: String,
    symbol: String,
    decimals: u8,
    owner: Address,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    /// `owner -> (spender -> remaining allowance)`.
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    created_at: DateTime<Utc>,
}

impl StableCoin {
    /// Deploys a new `STB` token with zero supply, minted only by `owner`.
    pub fn new(owner: Address) -> Self {
        Self::with_id(AssetId::generate(), owner)
    }

    /// Deploys a token under a known identifier.
    pub fn with_id(id: AssetId, owner: Address) -> Self {
        Self {
            id,
            name: STABLECOIN_NAME.to_string(),
            symbol: STABLECOIN_SYMBOL.to_string(),
            decimals: STABLECOIN_DECIMALS,
            owner,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Mints `amount` to `to`. Only the owner may mint.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnauthorizedMint`] if `caller` is not the owner.
    /// Returns [`TokenError::SupplyOverflow`] if supply or the recipient's
    /// balance would overflow.
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if caller != &self.owner {
            return Err(TokenError::UnauthorizedMint(self.symbol.clone()));
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow { amount })?;

        self.total_supply = new_supply;
        self.balances.insert(to.clone(), new_balance);
        Ok(())
    }

    /// Burns `amount` from `holder`'s own balance.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InsufficientBalance`] (wrapped) if the holder
    /// does not have enough.
    pub fn burn(&mut self, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.balance_of(holder);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| TransferError::InsufficientBalance {
                holder: holder.clone(),
                balance,
                amount,
            })?;

        self.balances.insert(holder.clone(), remaining);
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }

    /// Sets the amount `spender` may move out of `owner`'s balance.
    ///
    /// Replaces any previous allowance; approving zero revokes it.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let approvals = self.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            approvals.remove(spender);
        } else {
            approvals.insert(spender.clone(), amount);
        }
        if approvals.is_empty() {
            self.allowances.remove(owner);
        }
    }

    /// Asset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Account allowed to mint.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Current total supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Timestamp of deployment.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Debits `from` and credits `to`, committing only if both succeed.
    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let from_balance = self.balance_of(from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or_else(|| TransferError::InsufficientBalance {
                holder: from.clone(),
                balance: from_balance,
                amount,
            })?;

        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;

        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl FundsAsset for StableCoin {
    fn id(&self) -> &AssetId {
        &self.id
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|approvals| approvals.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let allowance = self.allowance(from, spender);
        let remaining = allowance
            .checked_sub(amount)
            .ok_or_else(|| TransferError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                allowance,
                amount,
            })?;

        self.move_balance(from, to, amount)?;
        self.approve(from, spender, remaining);
        Ok(())
    }
}
