//! # Interest Terms
//!
//! Rates are WAD fixed-point ratios (`1e18 == 100%`). The pool charges a flat
//! amount of interest on every repayment:
//!
//! ```text
//! interest(principal) = floor(principal * rate / WAD)
//! ```
//!
//! The charge does not depend on elapsed time. `period_secs` records the
//! period the rate is quoted over and is reported alongside the rate, but it
//! never scales the charge, so the same principal always costs the same.

use serde::{Deserialize, Serialize};

use crate::config::{WAD, WAD_DECIMALS};
use crate::types::Amount;
use crate::units::{format_units, parse_units, UnitsError};

/// Multiplies two values where `b` is WAD-scaled: `floor(a * b / WAD)`.
///
/// Both operands are split on `WAD` (`a = q*WAD + r`, `b = s*WAD + t`) so the
/// full 256-bit product is never formed:
///
/// ```text
/// floor(a * b / WAD) = q*b + r*s + floor(r*t / WAD)
/// ```
///
/// `r*t < WAD^2` always fits. Returns `None` only if the result itself does
/// not fit in `u128`.
pub fn wad_mul(a: u128, b: u128) -> Option<u128> {
    let (q, r) = (a / WAD, a % WAD);
    let (s, t) = (b / WAD, b % WAD);
    q.checked_mul(b)?
        .checked_add(r.checked_mul(s)?)?
        .checked_add(r * t / WAD)
}

/// A per-period interest rate in WAD fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestRate(u128);

impl InterestRate {
    /// A zero rate.
    pub const ZERO: InterestRate = InterestRate(0);

    /// Wraps a raw WAD value (`50_000_000_000_000_000` is 5%).
    pub const fn from_wad(wad: u128) -> Self {
        Self(wad)
    }

    /// Builds a rate from whole basis points (500 bps == 5%).
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps as u128 * (WAD / 10_000))
    }

    /// Parses a decimal ratio such as `"0.05"`.
    pub fn parse(value: &str) -> Result<Self, UnitsError> {
        parse_units(value, WAD_DECIMALS).map(Self)
    }

    /// The raw WAD value.
    pub const fn as_wad(&self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for InterestRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Shown as a percentage: 0.05 WAD -> "5%".
        let percent = format_units(self.0.saturating_mul(100), WAD_DECIMALS);
        write!(f, "{}%", percent)
    }
}

/// The rate and quoting period fixed at pool initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestTerms {
    /// Length of the period the rate is quoted over, in seconds.
    pub period_secs: u64,
    /// Rate charged on each repaid principal.
    pub rate: InterestRate,
}

impl InterestTerms {
    /// Creates a new set of terms.
    pub fn new(period_secs: u64, rate: InterestRate) -> Self {
        Self { period_secs, rate }
    }

    /// Interest owed for repaying `principal`.
    ///
    /// Pure and deterministic. Returns `None` only if the interest itself
    /// overflows 128 bits.
    pub fn interest(&self, principal: Amount) -> Option<Amount> {
        wad_mul(principal, self.rate.as_wad())
    }

    /// Principal plus interest, or `None` on overflow.
    pub fn amount_due(&self, principal: Amount) -> Option<Amount> {
        self.interest(principal)
            .and_then(|interest| principal.checked_add(interest))
    }
}
