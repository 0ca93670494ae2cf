//! Quotes and trades along the constant-product curve.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::pool::MarketMaker;
use crate::application::ledger::ConditionalLedger;
use crate::domain::fixed::{bps_of, checked_add, checked_sub};
use crate::domain::{curve, solver};
use crate::error::{MarketError, Result};
use crate::port::{CollateralVault, Event, FungibleShareToken, MultiBalanceLedger};

impl<S: FungibleShareToken> MarketMaker<S> {
    /// Outcome tokens `investment` collateral buys right now.
    pub fn calc_buy_amount<B: MultiBalanceLedger>(
        &self,
        ledger: &ConditionalLedger<B>,
        investment: U256,
        outcome_index: usize,
    ) -> Result<U256> {
        self.check_outcome(outcome_index)?;
        let balances = self.pool_balances(ledger);
        Ok(curve::calc_buy_amount(&balances, outcome_index, investment, self.params.fee)?)
    }

    /// Outcome tokens a seller must hand in to receive `return_amount`.
    pub fn calc_sell_amount<B: MultiBalanceLedger>(
        &self,
        ledger: &ConditionalLedger<B>,
        return_amount: U256,
        outcome_index: usize,
    ) -> Result<U256> {
        self.check_outcome(outcome_index)?;
        let balances = self.pool_balances(ledger);
        Ok(curve::calc_sell_amount(&balances, outcome_index, return_amount, self.params.fee)?)
    }

    /// Smallest investment that buys at least `tokens_out`.
    pub fn calc_buy_investment<B: MultiBalanceLedger>(
        &self,
        ledger: &ConditionalLedger<B>,
        tokens_out: U256,
        outcome_index: usize,
    ) -> Result<U256> {
        self.check_outcome(outcome_index)?;
        let balances = self.pool_balances(ledger);
        Ok(solver::buy_investment_for_tokens(
            &balances,
            outcome_index,
            tokens_out,
            self.params.fee,
        )?)
    }

    /// Largest return that selling `tokens_in` covers.
    pub fn calc_sell_return<B: MultiBalanceLedger>(
        &self,
        ledger: &ConditionalLedger<B>,
        tokens_in: U256,
        outcome_index: usize,
    ) -> Result<U256> {
        self.check_outcome(outcome_index)?;
        let balances = self.pool_balances(ledger);
        Ok(solver::sell_return_for_tokens(
            &balances,
            outcome_index,
            tokens_in,
            self.params.fee,
        )?)
    }

    /// Buy outcome tokens with `investment` collateral. Returns the tokens
    /// bought.
    ///
    /// The fee stays in the pool as collateral: the treasury cut is paid at
    /// once and the rest is credited to the fee pool. The net investment is
    /// split into every outcome before the bought tokens leave the pool.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ZeroAmount`]
    /// - [`crate::domain::DomainError::InvalidOutcomeIndex`]
    /// - [`MarketError::TradingClosed`]
    /// - [`MarketError::InsufficientOutput`] when fewer than
    ///   `min_tokens_out` tokens would be bought
    #[allow(clippy::too_many_arguments)]
    pub fn buy<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        buyer: Address,
        investment: U256,
        outcome_index: usize,
        min_tokens_out: U256,
        now: u64,
    ) -> Result<U256> {
        self.check_collateral(collateral)?;
        if investment.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }
        self.check_outcome(outcome_index)?;
        if !self.can_trade(ledger, now) {
            return Err(MarketError::TradingClosed.into());
        }

        let tokens_out = self.calc_buy_amount(ledger, investment, outcome_index)?;
        if tokens_out < min_tokens_out {
            return Err(MarketError::InsufficientOutput {
                tokens_out,
                min_tokens_out,
            }
            .into());
        }

        collateral.transfer_from(self.address, buyer, self.address, investment)?;
        let fee = curve::buy_fee(investment, self.params.fee)?;
        self.collect_fee(collateral, fee)?;

        let net = checked_sub(investment, fee)?;
        self.split_through_all(ledger, collateral, net)?;
        let position = self.layout.position_ids[outcome_index];
        ledger.safe_transfer_from(self.address, self.address, buyer, position, tokens_out)?;
        self.current_liquidity = checked_add(self.current_liquidity, net)?;

        info!(
            market_maker = %self.address,
            buyer = %buyer,
            outcome = outcome_index,
            investment = %investment,
            tokens = %tokens_out,
            "buy"
        );
        ledger.record(Event::Buy {
            market_maker: self.address,
            buyer,
            investment_amount: investment,
            fee_amount: fee,
            outcome_index,
            outcome_tokens_bought: tokens_out,
        });
        Ok(tokens_out)
    }

    /// Sell outcome tokens for exactly `return_amount` collateral. Returns
    /// the tokens taken from `seller`.
    ///
    /// The seller must have approved the pool on the position ledger.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ZeroAmount`]
    /// - [`crate::domain::DomainError::InvalidOutcomeIndex`]
    /// - [`MarketError::TradingClosed`]
    /// - [`MarketError::InsufficientInput`] when more than `max_tokens_in`
    ///   tokens would be needed
    /// - [`crate::error::LedgerError::NotApproved`] or
    ///   [`crate::error::LedgerError::InsufficientBalance`] from the ledger
    #[allow(clippy::too_many_arguments)]
    pub fn sell<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        seller: Address,
        return_amount: U256,
        outcome_index: usize,
        max_tokens_in: U256,
        now: u64,
    ) -> Result<U256> {
        self.check_collateral(collateral)?;
        if return_amount.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }
        self.check_outcome(outcome_index)?;
        if !self.can_trade(ledger, now) {
            return Err(MarketError::TradingClosed.into());
        }

        let tokens_in = self.calc_sell_amount(ledger, return_amount, outcome_index)?;
        if tokens_in > max_tokens_in {
            return Err(MarketError::InsufficientInput {
                tokens_in,
                max_tokens_in,
            }
            .into());
        }

        let position = self.layout.position_ids[outcome_index];
        ledger.safe_transfer_from(self.address, seller, self.address, position, tokens_in)?;
        let fee = curve::sell_fee(return_amount, self.params.fee)?;
        self.merge_through_all(ledger, collateral, checked_add(return_amount, fee)?)?;
        self.collect_fee(collateral, fee)?;
        collateral.transfer(self.address, seller, return_amount)?;
        // Sellers may bring positions split outside the pool, so returns can
        // exceed the liquidity ever committed. The counter stops at zero.
        self.current_liquidity = self.current_liquidity.saturating_sub(return_amount);

        info!(
            market_maker = %self.address,
            seller = %seller,
            outcome = outcome_index,
            returned = %return_amount,
            tokens = %tokens_in,
            "sell"
        );
        ledger.record(Event::Sell {
            market_maker: self.address,
            seller,
            return_amount,
            fee_amount: fee,
            outcome_index,
            outcome_tokens_sold: tokens_in,
        });
        Ok(tokens_in)
    }

    /// Pay the treasury its cut of `fee` and credit the rest to the shares.
    fn collect_fee(&mut self, collateral: &mut dyn CollateralVault, fee: U256) -> Result<()> {
        let treasury_cut = bps_of(fee, self.params.treasury_bps)?;
        let lp_fee = checked_sub(fee, treasury_cut)?;
        self.fee_pool.accrue(lp_fee, self.shares.total_supply())?;
        if !treasury_cut.is_zero() {
            collateral.transfer(self.address, self.params.treasury, treasury_cut)?;
        }
        Ok(())
    }
}
