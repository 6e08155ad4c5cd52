//! Conversions between display amounts (what a user types) and base amounts
//! (the integers a chain denomination is tracked in).
//!
//! Amounts arrive as `rust_decimal` values and are scaled on integers, so
//! `10.1 * 10^6` is exactly `10100000` and never `10099999` from a binary
//! float.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    NegativeAmount(Decimal),
    ZeroDivisor,
    Overflow(String),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NegativeAmount(amount) => {
                write!(f, "amount must not be negative: {}", amount)
            }
            ConversionError::ZeroDivisor => write!(f, "divisor must be positive"),
            ConversionError::Overflow(value) => {
                write!(f, "amount out of range for conversion: {}", value)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// `floor(display * divisor)`.
///
/// The product is taken on the decimal's integer mantissa, so no digit is
/// rounded away before the division by `10^scale` truncates.
pub fn to_base_units(display: Decimal, divisor: u64) -> Result<BigUint, ConversionError> {
    if divisor == 0 {
        return Err(ConversionError::ZeroDivisor);
    }
    if display.is_sign_negative() && !display.is_zero() {
        return Err(ConversionError::NegativeAmount(display));
    }

    let mantissa = BigUint::from(display.mantissa().unsigned_abs());
    let scale = BigUint::from(10u32).pow(display.scale());
    Ok(mantissa * BigUint::from(divisor) / scale)
}

/// `base / divisor`, normalized so `10000000 / 10^6` renders as `10`.
pub fn to_display_units(base: &BigUint, divisor: u64) -> Result<Decimal, ConversionError> {
    if divisor == 0 {
        return Err(ConversionError::ZeroDivisor);
    }
    let raw = base.to_str_radix(10);
    let amount = Decimal::from_str(&raw).map_err(|_| ConversionError::Overflow(raw.clone()))?;
    amount
        .checked_div(Decimal::from(divisor))
        .map(|value| value.normalize())
        .ok_or(ConversionError::Overflow(raw))
}

pub fn format_display(amount: Decimal, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, amount.round_dp(decimals))
}
