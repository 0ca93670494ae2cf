//! Reward-per-share accounting for liquidity-provider fees.
//!
//! Each trade adds `lp_fee * PRECISION / total_shares` to a global weight. A
//! holder is entitled to `shares * weight / PRECISION` (rounded down) minus a
//! marker snapshotted (rounded up) whenever their share balance changes or
//! they withdraw. Floor entitlements against ceiling markers keep the sum of
//! all withdrawals at or below the fees collected.

use alloy_primitives::U256;
use serde::Serialize;

use super::error::DomainError;
use super::fixed::{checked_add, mul_div, mul_div_ceil, PRECISION};

/// Fee-pool weight accumulator and lifetime totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeePool {
    weight: U256,
    collected: U256,
    withdrawn: U256,
}

impl FeePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `lp_fee` to every outstanding share.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DivisionByZero`] when no shares exist.
    pub fn accrue(&mut self, lp_fee: U256, total_shares: U256) -> Result<(), DomainError> {
        if lp_fee.is_zero() {
            return Ok(());
        }
        let increment = mul_div(lp_fee, PRECISION, total_shares)?;
        self.weight = checked_add(self.weight, increment)?;
        self.collected = checked_add(self.collected, lp_fee)?;
        Ok(())
    }

    /// Gross entitlement of `shares` at the current weight.
    pub fn entitlement(&self, shares: U256) -> Result<U256, DomainError> {
        mul_div(shares, self.weight, PRECISION)
    }

    /// Amount withdrawable by a holder of `shares` with `marker` already
    /// accounted for.
    pub fn withdrawable(&self, shares: U256, marker: U256) -> Result<U256, DomainError> {
        Ok(self.entitlement(shares)?.saturating_sub(marker))
    }

    /// Marker for a holder whose balance is now `shares`.
    pub fn snapshot(&self, shares: U256) -> Result<U256, DomainError> {
        mul_div_ceil(shares, self.weight, PRECISION)
    }

    /// Record a payout to a holder.
    pub fn record_withdrawal(&mut self, amount: U256) -> Result<(), DomainError> {
        self.withdrawn = checked_add(self.withdrawn, amount)?;
        Ok(())
    }

    /// Cumulative fee per share, scaled by `PRECISION`.
    #[must_use]
    pub fn weight(&self) -> U256 {
        self.weight
    }

    /// Lifetime LP fees credited.
    #[must_use]
    pub fn collected(&self) -> U256 {
        self.collected
    }

    /// Lifetime LP fees paid out.
    #[must_use]
    pub fn withdrawn(&self) -> U256 {
        self.withdrawn
    }
}
