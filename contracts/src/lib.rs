//! # EduPool Contracts
//!
//! Ledger logic for EduPool, a peer-to-pool lending contract. Providers
//! deposit a stablecoin into a pool, a single borrower draws from it and
//! repays principal plus interest.
//!
//! - **Lending Pool**: the ledger itself, covering lifecycle, provider claims, outstanding
//!   loan, interest revenue, and an append-only event log.
//! - **Funds Asset**: the interface the pool moves value through. The pool
//!   borrows an asset per call and never owns it.
//! - **StableCoin**: an in-memory `STB` asset implementing that interface.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow: `checked_add` and
//!    `checked_sub` everywhere, never wrapping arithmetic.
//! 2. State transitions are explicit enum variants.
//! 3. A failed operation leaves the ledger exactly as it found it.
//! 4. Every public type is serializable (serde) for persistence.

pub mod config;
pub mod events;
pub mod funds_asset;
pub mod interest;
pub mod lending_pool;
pub mod stablecoin;
pub mod types;
pub mod units;

pub use events::{EventLog, EventRecord, PoolEvent};
pub use funds_asset::{FundsAsset, TransferError};
pub use interest::{InterestRate, InterestTerms};
pub use lending_pool::{LendingPool, PoolConfig, PoolError, PoolStatus};
pub use stablecoin::{StableCoin, TokenError};
pub use types::{Address, Amount, AssetId};
