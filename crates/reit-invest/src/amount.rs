//! Currency amount conversion between display units and on-chain minor units.
//!
//! The accepted currency has 6 decimals. Conversion is exact: inputs carrying
//! more precision than the mint supports are rejected, never truncated.

use rust_decimal::prelude::*;

use crate::constants::{USDC_DECIMALS, USDC_MINOR_PER_UNIT};
use crate::errors::AmountError;

/// Parse a user-entered decimal string into minor units.
pub fn to_minor_units(input: &str) -> Result<u64, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::NotANumber(input.to_string()));
    }
    // Decimal rounds past 28 fractional digits, so check the literal first
    if let Some(scale) = significant_fraction_digits(trimmed) {
        if scale > USDC_DECIMALS {
            return Err(AmountError::TooPrecise {
                scale,
                max: USDC_DECIMALS,
            });
        }
    }
    let value = Decimal::from_str(trimmed)
        .map_err(|_| AmountError::NotANumber(input.to_string()))?;
    to_minor_units_decimal(value)
}

/// Fractional digits up to the last non-zero one; `None` if the literal has no
/// plain fractional part
fn significant_fraction_digits(literal: &str) -> Option<u32> {
    let (_, fraction) = literal.split_once('.')?;
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = fraction.trim_end_matches('0').len();
    Some(u32::try_from(significant).unwrap_or(u32::MAX))
}

pub fn to_minor_units_decimal(value: Decimal) -> Result<u64, AmountError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative);
    }

    // Trailing zeros carry no precision: 1.0000000 is fine, 0.0000001 is not
    let value = value.normalize();
    let scale = value.scale();
    if scale > USDC_DECIMALS {
        return Err(AmountError::TooPrecise {
            scale,
            max: USDC_DECIMALS,
        });
    }

    let factor = 10i128.pow(USDC_DECIMALS - scale);
    let minor = value
        .mantissa()
        .checked_mul(factor)
        .ok_or(AmountError::Overflow)?;
    u64::try_from(minor).map_err(|_| AmountError::Overflow)
}

/// Same as [`to_minor_units`] but also rejects zero
pub fn to_positive_minor_units(input: &str) -> Result<u64, AmountError> {
    match to_minor_units(input)? {
        0 => Err(AmountError::Zero),
        minor => Ok(minor),
    }
}

/// Inverse conversion for display
pub fn from_minor_units(minor: u64) -> Decimal {
    Decimal::from_i128_with_scale(minor as i128, USDC_DECIMALS)
}

/// Human-readable amount with at least two decimals, e.g. `100.00`, `0.000001`
pub fn format_minor_units(minor: u64) -> String {
    let whole = minor / USDC_MINOR_PER_UNIT;
    let frac = minor % USDC_MINOR_PER_UNIT;
    let mut frac_digits = format!("{:06}", frac);
    while frac_digits.len() > 2 && frac_digits.ends_with('0') {
        frac_digits.pop();
    }
    format!("{whole}.{frac_digits}")
}
