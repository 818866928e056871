//! # Funds Asset Interface
//!
//! The pool never holds value itself. Every deposit, withdrawal, loan and
//! repayment is a call into an external fungible asset that exposes
//! ERC-20-style semantics: balances, a prior `approve` step, and
//! `transfer` / `transfer_from`.
//!
//! The asset is passed into each pool operation by mutable reference. The
//! pool borrows it for the duration of one call and never owns it.

use thiserror::Error;

use crate::types::{Address, Amount, AssetId};

/// Failures reported by a funds asset while moving value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// The sender does not hold enough of the asset.
    #[error("insufficient balance: {holder} has {balance}, needs {amount}")]
    InsufficientBalance {
        /// Account being debited.
        holder: Address,
        /// Its current balance.
        balance: Amount,
        /// Amount requested.
        amount: Amount,
    },

    /// The spender has not been approved for enough of the owner's funds.
    #[error("insufficient allowance: {owner} approved {spender} for {allowance}, needs {amount}")]
    InsufficientAllowance {
        /// Account whose funds are being moved.
        owner: Address,
        /// Account moving them.
        spender: Address,
        /// Currently approved amount.
        allowance: Amount,
        /// Amount requested.
        amount: Amount,
    },

    /// Crediting the recipient would overflow its balance.
    #[error("balance overflow crediting {0}")]
    Overflow(Address),
}

/// The operations the pool needs from the asset it lends out.
///
/// Implementations must be atomic: a call that returns `Err` leaves every
/// balance and allowance exactly as it was.
pub trait FundsAsset {
    /// Identifier the pool was initialized with.
    fn id(&self) -> &AssetId;

    /// Current balance of `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Moves `amount` from `from` to `to`, authorized by `from` itself.
    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// `spender`'s allowance over `from`.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;
}
