//! # Pool Constants
//!
//! Fixed parameters shared by the pool, the stablecoin and the node. If a
//! number shows up in more than one module, it belongs here.

// ---------------------------------------------------------------------------
// Fixed-Point Math
// ---------------------------------------------------------------------------

/// Number of decimals in a WAD value.
pub const WAD_DECIMALS: u8 = 18;

/// 1.0 in WAD fixed point. Interest rates are stored as `rate * WAD`, so a
/// 5% rate is `50_000_000_000_000_000`.
pub const WAD: u128 = 1_000_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Ledger schema tag reported by `version()`. Written once at
/// initialization and never changed afterwards.
pub const POOL_VERSION: &str = "1.0.0";

/// Prefix for generated pool addresses.
pub const POOL_ADDRESS_PREFIX: &str = "pool";

// ---------------------------------------------------------------------------
// Stablecoin
// ---------------------------------------------------------------------------

/// Display name of the funds asset.
pub const STABLECOIN_NAME: &str = "StableCoin";

/// Ticker of the funds asset.
pub const STABLECOIN_SYMBOL: &str = "STB";

/// Decimal places of the funds asset. Matches the 18-decimal convention of
/// the tokens the pool was modelled after, so `1 STB == 10^18` base units.
pub const STABLECOIN_DECIMALS: u8 = 18;
