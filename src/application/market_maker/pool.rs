//! Pool state and the split/merge plumbing shared by the operations.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;

use crate::adapter::memory::ShareLedger;
use crate::application::ledger::ConditionalLedger;
use crate::domain::curve::marginal_prices;
use crate::domain::error::DomainError;
use crate::domain::fixed::{from_base_units, MAX_DECIMALS};
use crate::domain::id::{ConditionId, PositionId};
use crate::domain::identifier::OutcomeLayout;
use crate::domain::index_set::IndexSet;
use crate::domain::{FeePool, MarketMakerParams};
use crate::error::{CollateralError, Result};
use crate::port::{CollateralVault, FungibleShareToken, MultiBalanceLedger};

/// A liquidity pool over the full outcome space of its conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketMaker<S = ShareLedger> {
    pub(super) address: Address,
    creator: Address,
    pub(super) params: MarketMakerParams,
    outcome_slot_counts: Vec<usize>,
    pub(super) layout: OutcomeLayout,
    pub(super) shares: S,
    pub(super) fee_pool: FeePool,
    pub(super) markers: BTreeMap<Address, U256>,
    pub(super) current_liquidity: U256,
}

impl<S: FungibleShareToken + Default> MarketMaker<S> {
    /// Pool at `address` for already validated parameters.
    ///
    /// `outcome_slot_counts` lines up with `params.condition_ids`.
    pub(crate) fn new(
        address: Address,
        creator: Address,
        params: MarketMakerParams,
        outcome_slot_counts: Vec<usize>,
    ) -> Self {
        let conditions: Vec<(ConditionId, usize)> = params
            .condition_ids
            .iter()
            .copied()
            .zip(outcome_slot_counts.iter().copied())
            .collect();
        let layout = OutcomeLayout::build(params.collateral, &conditions);
        Self {
            address,
            creator,
            params,
            outcome_slot_counts,
            layout,
            shares: S::default(),
            fee_pool: FeePool::new(),
            markers: BTreeMap::new(),
            current_liquidity: U256::ZERO,
        }
    }
}

impl<S: FungibleShareToken> MarketMaker<S> {
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn creator(&self) -> Address {
        self.creator
    }

    #[must_use]
    pub fn params(&self) -> &MarketMakerParams {
        &self.params
    }

    #[must_use]
    pub fn collateral(&self) -> Address {
        self.params.collateral
    }

    #[must_use]
    pub fn condition_ids(&self) -> &[ConditionId] {
        &self.params.condition_ids
    }

    #[must_use]
    pub fn outcome_slot_counts(&self) -> &[usize] {
        &self.outcome_slot_counts
    }

    /// Fee factor in the 18-decimal scale.
    #[must_use]
    pub fn fee(&self) -> U256 {
        self.params.fee
    }

    /// Position held by the pool for each combined outcome.
    #[must_use]
    pub fn position_ids(&self) -> &[PositionId] {
        &self.layout.position_ids
    }

    #[must_use]
    pub fn outcome_count(&self) -> usize {
        self.layout.outcome_count()
    }

    #[must_use]
    pub fn total_shares(&self) -> U256 {
        self.shares.total_supply()
    }

    #[must_use]
    pub fn shares_of(&self, account: Address) -> U256 {
        self.shares.balance_of(account)
    }

    #[must_use]
    pub fn shares(&self) -> &S {
        &self.shares
    }

    /// Net collateral committed to the curve.
    #[must_use]
    pub fn current_liquidity(&self) -> U256 {
        self.current_liquidity
    }

    /// The pool's balance of every outcome position, in outcome order.
    pub fn pool_balances<B: MultiBalanceLedger>(&self, ledger: &ConditionalLedger<B>) -> Vec<U256> {
        self.layout
            .position_ids
            .iter()
            .map(|position| ledger.balance_of(self.address, *position))
            .collect()
    }

    /// Largest outcome balance, the scale new funding is measured against.
    pub fn pool_weight<B: MultiBalanceLedger>(&self, ledger: &ConditionalLedger<B>) -> U256 {
        self.pool_balances(ledger)
            .into_iter()
            .max()
            .unwrap_or_default()
    }

    /// Marginal outcome prices, summing to roughly one.
    ///
    /// # Errors
    ///
    /// [`DomainError::InsufficientLiquidity`] while the pool is unfunded.
    pub fn outcome_prices<B: MultiBalanceLedger>(
        &self,
        ledger: &ConditionalLedger<B>,
    ) -> Result<Vec<Decimal>> {
        let prices = marginal_prices(&self.pool_balances(ledger))?;
        Ok(prices
            .into_iter()
            .map(|p| from_base_units(p, MAX_DECIMALS))
            .collect::<std::result::Result<Vec<Decimal>, _>>()?)
    }

    /// Whether every pool condition has been resolved.
    pub fn all_conditions_resolved<B: MultiBalanceLedger>(&self, ledger: &ConditionalLedger<B>) -> bool {
        self.params
            .condition_ids
            .iter()
            .all(|id| ledger.is_resolved(*id))
    }

    /// Trading is open while the pool is funded above its threshold, no
    /// condition has resolved and the end time has not passed.
    pub fn can_trade<B: MultiBalanceLedger>(&self, ledger: &ConditionalLedger<B>, now: u64) -> bool {
        !self.shares.total_supply().is_zero()
            && self.current_liquidity >= self.params.funding_threshold
            && self
                .params
                .condition_ids
                .iter()
                .all(|id| !ledger.is_resolved(*id))
            && self.params.end_time.map_or(true, |end| now < end)
    }

    pub(super) fn check_collateral(&self, collateral: &dyn CollateralVault) -> Result<()> {
        if collateral.token() != self.params.collateral {
            return Err(CollateralError::Mismatch {
                expected: self.params.collateral,
                actual: collateral.token(),
            }
            .into());
        }
        Ok(())
    }

    pub(super) fn check_outcome(&self, index: usize) -> Result<()> {
        if index >= self.outcome_count() {
            return Err(DomainError::InvalidOutcomeIndex {
                index,
                outcomes: self.outcome_count(),
            }
            .into());
        }
        Ok(())
    }

    /// Turn `amount` collateral held by the pool into `amount` of every
    /// outcome position. The last condition is split from the root first.
    pub(super) fn split_through_all<B: MultiBalanceLedger>(
        &self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        amount: U256,
    ) -> Result<()> {
        collateral.approve(self.address, ledger.address(), amount);
        for level in (0..self.params.condition_ids.len()).rev() {
            let condition = self.params.condition_ids[level];
            let partition = singletons(self.outcome_slot_counts[level]);
            for parent in &self.layout.collection_ids[level] {
                ledger.split_position(self.address, collateral, *parent, condition, &partition, amount)?;
            }
        }
        Ok(())
    }

    /// Inverse of [`Self::split_through_all`].
    pub(super) fn merge_through_all<B: MultiBalanceLedger>(
        &self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        amount: U256,
    ) -> Result<()> {
        for level in 0..self.params.condition_ids.len() {
            let condition = self.params.condition_ids[level];
            let partition = singletons(self.outcome_slot_counts[level]);
            for parent in &self.layout.collection_ids[level] {
                ledger.merge_positions(self.address, collateral, *parent, condition, &partition, amount)?;
            }
        }
        Ok(())
    }

    /// Send non-zero `amounts` of the pool's positions to `to`.
    pub(super) fn send_positions<B: MultiBalanceLedger>(
        &self,
        ledger: &mut ConditionalLedger<B>,
        to: Address,
        amounts: &[U256],
    ) -> Result<()> {
        let (positions, amounts): (Vec<_>, Vec<_>) = self
            .layout
            .position_ids
            .iter()
            .zip(amounts)
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(position, amount)| (*position, *amount))
            .unzip();
        if positions.is_empty() {
            return Ok(());
        }
        ledger.safe_batch_transfer_from(self.address, self.address, to, &positions, &amounts)
    }
}

fn singletons(outcome_slot_count: usize) -> Vec<IndexSet> {
    (0..outcome_slot_count).map(IndexSet::singleton).collect()
}
