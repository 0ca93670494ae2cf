//! Defaults for new market makers and the simulated collateral.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::fixed::{fee_factor, to_base_units, BPS_DENOMINATOR, MAX_DECIMALS};
use crate::domain::{ConditionId, MarketMakerParams, RemovalPolicy};
use crate::error::{ConfigError, Result};

/// Parameters applied to markets that do not set their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDefaults {
    /// Trading fee as a fraction (0.003 = 0.3%).
    #[serde(default = "default_fee")]
    pub fee: Decimal,
    /// Share of each fee paid to the treasury, in basis points.
    #[serde(default)]
    pub treasury_bps: u16,
    /// Treasury account; required when `treasury_bps > 0`.
    #[serde(default)]
    pub treasury: Option<Address>,
    /// Liquidity required before trading opens, in collateral units.
    #[serde(default)]
    pub funding_threshold: Decimal,
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

fn default_fee() -> Decimal {
    Decimal::new(3, 3)
}

impl Default for MarketDefaults {
    fn default() -> Self {
        Self {
            fee: default_fee(),
            treasury_bps: 0,
            treasury: None,
            funding_threshold: Decimal::ZERO,
            removal_policy: RemovalPolicy::default(),
        }
    }
}

impl MarketDefaults {
    /// Build creation parameters for `condition_ids` from these defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the fee or threshold cannot be represented.
    pub fn params(
        &self,
        collateral: Address,
        decimals: u8,
        condition_ids: Vec<ConditionId>,
    ) -> Result<MarketMakerParams> {
        Ok(MarketMakerParams::new(collateral, condition_ids)
            .with_fee(fee_factor(self.fee)?)
            .with_treasury(self.treasury.unwrap_or_default(), self.treasury_bps)
            .with_funding_threshold(to_base_units(self.funding_threshold, decimals)?)
            .with_removal_policy(self.removal_policy))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if fee_factor(self.fee).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "market.fee",
                reason: "must be at least 0 and below 1".to_string(),
            }
            .into());
        }
        if self.treasury_bps > BPS_DENOMINATOR {
            return Err(ConfigError::InvalidValue {
                field: "market.treasury_bps",
                reason: format!("must be at most {BPS_DENOMINATOR}"),
            }
            .into());
        }
        if self.treasury_bps > 0 && self.treasury.unwrap_or_default() == Address::ZERO {
            return Err(ConfigError::MissingField {
                field: "market.treasury",
            }
            .into());
        }
        if self.funding_threshold.is_sign_negative() && !self.funding_threshold.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "market.funding_threshold",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// The simulated collateral token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_symbol() -> String {
    "USDC".to_string()
}

const fn default_decimals() -> u8 {
    6
}

impl Default for CollateralConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimals: default_decimals(),
        }
    }
}

impl CollateralConfig {
    /// Convert a human amount to base units.
    pub fn units(&self, amount: Decimal) -> Result<U256> {
        Ok(to_base_units(amount, self.decimals)?)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue {
                field: "collateral.decimals",
                reason: format!("must be at most {MAX_DECIMALS}"),
            }
            .into());
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "collateral.symbol",
            }
            .into());
        }
        Ok(())
    }
}
