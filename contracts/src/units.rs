//! # Decimal Unit Conversion
//!
//! Human-facing amounts ("10", "0.05", "2.5") are converted to integer base
//! units by scaling with `10^decimals`. The pool never sees decimals: every
//! ledger value is an integer [`Amount`].

use thiserror::Error;

use crate::types::Amount;

/// Errors produced while parsing a decimal amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    /// The input was empty or contained something other than digits and one dot.
    #[error("invalid decimal amount: {0:?}")]
    Invalid(String),

    /// More fractional digits than the asset supports.
    #[error("too many decimal places in {value:?}: at most {decimals} allowed")]
    TooPrecise {
        /// The offending input.
        value: String,
        /// Decimal places supported by the target unit.
        decimals: u8,
    },

    /// The scaled value does not fit in an [`Amount`].
    #[error("amount overflow: {0:?} does not fit in 128 bits")]
    Overflow(String),
}

/// Parses a decimal string into base units with `decimals` places.
///
/// ```
/// use edupool_contracts::units::parse_units;
/// assert_eq!(parse_units("1.5", 2).unwrap(), 150);
/// ```
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let trimmed = value.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(UnitsError::Invalid(value.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooPrecise {
            value: value.to_string(),
            decimals,
        });
    }

    let overflow = || UnitsError::Overflow(value.to_string());
    let scale = 10u128.checked_pow(decimals as u32).ok_or_else(overflow)?;

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };

    // Right-pad the fraction to exactly `decimals` digits.
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Formats base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(decimals as u32);
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0>width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
