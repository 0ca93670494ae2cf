//! Fixed-point helpers over 256-bit integers.
//!
//! Ratios (fees, prices, fee-pool weights) use an 18-decimal scale. Token
//! amounts are plain base units; [`to_base_units`] and [`from_base_units`]
//! convert them to and from human-facing [`Decimal`]s.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::DomainError;

/// One unit in the 18-decimal ratio scale.
pub const ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Scale of the fee-pool weight accumulator.
pub const PRECISION: U256 = ONE;

/// Denominator of basis-point shares.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Largest precision accepted for decimal conversion.
pub const MAX_DECIMALS: u8 = 18;

/// `a * b / d`, truncating.
pub fn mul_div(a: U256, b: U256, d: U256) -> Result<U256, DomainError> {
    if d.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    Ok(a.checked_mul(b).ok_or(DomainError::Overflow)? / d)
}

/// `a * b / d`, rounding up.
pub fn mul_div_ceil(a: U256, b: U256, d: U256) -> Result<U256, DomainError> {
    let product = a.checked_mul(b).ok_or(DomainError::Overflow)?;
    ceil_div(product, d)
}

/// `a / d`, rounding up.
pub fn ceil_div(a: U256, d: U256) -> Result<U256, DomainError> {
    if d.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let quotient = a / d;
    if (a % d).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::from(1u8))
    }
}

pub fn checked_add(a: U256, b: U256) -> Result<U256, DomainError> {
    a.checked_add(b).ok_or(DomainError::Overflow)
}

pub fn checked_sub(a: U256, b: U256) -> Result<U256, DomainError> {
    a.checked_sub(b).ok_or(DomainError::Overflow)
}

/// `amount * bps / 10_000`, truncating.
pub fn bps_of(amount: U256, bps: u16) -> Result<U256, DomainError> {
    mul_div(amount, U256::from(bps), U256::from(BPS_DENOMINATOR))
}

fn scale(decimals: u8) -> Result<u64, DomainError> {
    if decimals > MAX_DECIMALS {
        return Err(DomainError::AmountOutOfRange {
            amount: String::new(),
            decimals,
        });
    }
    Ok(10u64.pow(u32::from(decimals)))
}

/// Convert a human-facing amount to base units, truncating extra precision.
///
/// # Errors
///
/// Returns [`DomainError::AmountOutOfRange`] for negative amounts or
/// amounts that do not fit.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, DomainError> {
    let out_of_range = || DomainError::AmountOutOfRange {
        amount: amount.to_string(),
        decimals,
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(out_of_range());
    }
    let scaled = amount
        .checked_mul(Decimal::from(scale(decimals)?))
        .ok_or_else(out_of_range)?
        .trunc();
    let units = scaled.to_u128().ok_or_else(out_of_range)?;
    Ok(U256::from(units))
}

/// Convert base units to a human-facing amount.
///
/// # Errors
///
/// Returns [`DomainError::AmountOutOfRange`] when the value exceeds what a
/// [`Decimal`] can hold.
pub fn from_base_units(units: U256, decimals: u8) -> Result<Decimal, DomainError> {
    let out_of_range = || DomainError::AmountOutOfRange {
        amount: units.to_string(),
        decimals,
    };
    scale(decimals)?;
    let raw = i128::try_from(units).map_err(|_| out_of_range())?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals)).map_err(|_| out_of_range())
}

/// Convert a fee ratio such as `0.003` to the 18-decimal scale.
///
/// # Errors
///
/// Returns [`DomainError::InvalidFee`] unless `0 <= fee < 1`.
pub fn fee_factor(fee: Decimal) -> Result<U256, DomainError> {
    if (fee.is_sign_negative() && !fee.is_zero()) || fee >= Decimal::ONE {
        return Err(DomainError::InvalidFee {
            fee: fee.to_string(),
        });
    }
    to_base_units(fee, MAX_DECIMALS)
}
