//! Liquidity-provider fee settlement.

use alloy_primitives::{Address, U256};
use tracing::debug;

use super::pool::MarketMaker;
use crate::application::ledger::ConditionalLedger;
use crate::error::Result;
use crate::port::{CollateralVault, Event, FungibleShareToken, MultiBalanceLedger};

impl<S: FungibleShareToken> MarketMaker<S> {
    /// Fees `account` could withdraw right now.
    pub fn fees_withdrawable_by(&self, account: Address) -> Result<U256> {
        Ok(self
            .fee_pool
            .withdrawable(self.shares.balance_of(account), self.marker(account))?)
    }

    /// Pay `account` its pending fees in collateral. Returns the amount paid;
    /// a second call without an intervening trade pays zero.
    pub fn withdraw_fees<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        account: Address,
    ) -> Result<U256> {
        self.check_collateral(collateral)?;
        let paid = self.settle(collateral, account)?;
        self.snapshot(account)?;

        ledger.record(Event::FeesWithdrawn {
            market_maker: self.address,
            account,
            amount: paid,
        });
        Ok(paid)
    }

    /// Cumulative fee per share, scaled by `PRECISION`.
    #[must_use]
    pub fn fee_pool_weight(&self) -> U256 {
        self.fee_pool.weight()
    }

    #[must_use]
    pub fn collected_fees(&self) -> U256 {
        self.fee_pool.collected()
    }

    #[must_use]
    pub fn withdrawn_fees(&self) -> U256 {
        self.fee_pool.withdrawn()
    }

    pub(super) fn marker(&self, account: Address) -> U256 {
        self.markers.get(&account).copied().unwrap_or_default()
    }

    /// Pay out everything `account` has accrued at its current share
    /// balance. Must be followed by [`Self::snapshot`] once the balance is
    /// final.
    pub(super) fn settle(
        &mut self,
        collateral: &mut dyn CollateralVault,
        account: Address,
    ) -> Result<U256> {
        let pending = self.fees_withdrawable_by(account)?;
        if pending.is_zero() {
            return Ok(U256::ZERO);
        }
        self.fee_pool.record_withdrawal(pending)?;
        collateral.transfer(self.address, account, pending)?;
        debug!(market_maker = %self.address, account = %account, amount = %pending, "settled fees");
        Ok(pending)
    }

    /// Re-base `account`'s marker on its current share balance.
    pub(super) fn snapshot(&mut self, account: Address) -> Result<()> {
        let marker = self.fee_pool.snapshot(self.shares.balance_of(account))?;
        if marker.is_zero() {
            self.markers.remove(&account);
        } else {
            self.markers.insert(account, marker);
        }
        Ok(())
    }
}
