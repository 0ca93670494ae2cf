//! Market-maker creation parameters.

use std::fmt;

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::id::ConditionId;

/// When liquidity providers may withdraw their shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Only after every pool condition is resolved.
    #[default]
    AfterResolution,
    /// At any time.
    Anytime,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterResolution => write!(f, "after_resolution"),
            Self::Anytime => write!(f, "anytime"),
        }
    }
}

/// Everything needed to create a market maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMakerParams {
    /// Collateral token the pool trades against.
    pub collateral: Address,
    /// Conditions whose combined outcome space the pool covers.
    pub condition_ids: Vec<ConditionId>,
    /// Fee factor in the 18-decimal scale.
    pub fee: U256,
    /// Share of each fee paid to the treasury, in basis points.
    pub treasury_bps: u16,
    /// Treasury account; required when `treasury_bps > 0`.
    pub treasury: Address,
    /// Liquidity required before trading opens.
    pub funding_threshold: U256,
    /// Trading closes at this logical time, if set.
    pub end_time: Option<u64>,
    pub removal_policy: RemovalPolicy,
}

impl MarketMakerParams {
    /// Fee-free parameters over `condition_ids`.
    #[must_use]
    pub fn new(collateral: Address, condition_ids: Vec<ConditionId>) -> Self {
        Self {
            collateral,
            condition_ids,
            fee: U256::ZERO,
            treasury_bps: 0,
            treasury: Address::ZERO,
            funding_threshold: U256::ZERO,
            end_time: None,
            removal_policy: RemovalPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_fee(mut self, fee: U256) -> Self {
        self.fee = fee;
        self
    }

    #[must_use]
    pub fn with_treasury(mut self, treasury: Address, bps: u16) -> Self {
        self.treasury = treasury;
        self.treasury_bps = bps;
        self
    }

    #[must_use]
    pub fn with_funding_threshold(mut self, threshold: U256) -> Self {
        self.funding_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_end_time(mut self, end_time: u64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    #[must_use]
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    /// Salt binding a creator to these parameters.
    #[must_use]
    pub fn salt(&self, creator: Address) -> B256 {
        let mut packed = Vec::with_capacity(20 * 3 + 32 * (self.condition_ids.len() + 4) + 2);
        packed.extend_from_slice(creator.as_slice());
        packed.extend_from_slice(self.collateral.as_slice());
        for id in &self.condition_ids {
            packed.extend_from_slice(id.as_bytes());
        }
        packed.extend_from_slice(&self.fee.to_be_bytes::<32>());
        packed.extend_from_slice(&self.treasury_bps.to_be_bytes());
        packed.extend_from_slice(self.treasury.as_slice());
        packed.extend_from_slice(&self.funding_threshold.to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(self.end_time.unwrap_or_default()).to_be_bytes::<32>());
        packed.push(match self.removal_policy {
            RemovalPolicy::AfterResolution => 0,
            RemovalPolicy::Anytime => 1,
        });
        keccak256(&packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identifier::named_address;

    #[test]
    fn salt_depends_on_creator_and_params() {
        let params = MarketMakerParams::new(named_address("usdc"), vec![]);
        let alice = named_address("alice");
        let bob = named_address("bob");

        assert_ne!(params.salt(alice), params.salt(bob));
        assert_ne!(
            params.salt(alice),
            params.clone().with_fee(U256::from(1u8)).salt(alice)
        );
        assert_eq!(params.salt(alice), params.salt(alice));
    }

    #[test]
    fn default_policy_waits_for_resolution() {
        assert_eq!(RemovalPolicy::default(), RemovalPolicy::AfterResolution);
    }
}
