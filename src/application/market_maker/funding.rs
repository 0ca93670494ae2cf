//! Liquidity funding and share movement.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::pool::MarketMaker;
use crate::application::ledger::ConditionalLedger;
use crate::domain::fixed::{checked_add, checked_sub, mul_div};
use crate::domain::RemovalPolicy;
use crate::error::{MarketError, Result};
use crate::port::{CollateralVault, Event, FungibleShareToken, MultiBalanceLedger};

impl<S: FungibleShareToken> MarketMaker<S> {
    /// Deposit `amount` collateral and mint pool shares to `funder`.
    ///
    /// The first deposit may carry a distribution hint setting the initial
    /// odds; every outcome keeps `amount * hint[i] / max(hint)` and the rest
    /// goes back to the funder as positions. Later deposits follow the
    /// current pool ratio and mint `amount * total_shares / pool_weight`.
    ///
    /// Returns the shares minted.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ZeroAmount`] for a zero deposit or one too small to
    ///   mint a share
    /// - [`MarketError::HintLengthMismatch`] or [`MarketError::InvalidHint`]
    ///   for a malformed first-funding hint
    /// - [`MarketError::HintAfterInitialFunding`] for a hint on a funded pool
    /// - collateral errors when `funder` has not approved the pool
    pub fn add_funding<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        funder: Address,
        amount: U256,
        distribution_hint: &[U256],
    ) -> Result<U256> {
        self.check_collateral(collateral)?;
        if amount.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }

        let outcomes = self.outcome_count();
        let supply = self.shares.total_supply();
        let (kept, minted) = if supply.is_zero() {
            (initial_distribution(amount, distribution_hint, outcomes)?, amount)
        } else {
            if !distribution_hint.is_empty() {
                return Err(MarketError::HintAfterInitialFunding.into());
            }
            let balances = self.pool_balances(ledger);
            let weight = balances.iter().copied().max().unwrap_or_default();
            let kept = balances
                .iter()
                .map(|balance| mul_div(amount, *balance, weight))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            (kept, mul_div(amount, supply, weight)?)
        };
        if minted.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }

        let fees = self.settle(collateral, funder)?;
        collateral.transfer_from(self.address, funder, self.address, amount)?;
        self.split_through_all(ledger, collateral, amount)?;

        let returned = kept
            .iter()
            .map(|k| checked_sub(amount, *k))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.send_positions(ledger, funder, &returned)?;

        self.shares.mint(funder, minted)?;
        self.snapshot(funder)?;
        self.current_liquidity = checked_add(self.current_liquidity, amount)?;

        info!(
            market_maker = %self.address,
            funder = %funder,
            amount = %amount,
            shares = %minted,
            "funding added"
        );
        if !fees.is_zero() {
            ledger.record(Event::FeesWithdrawn {
                market_maker: self.address,
                account: funder,
                amount: fees,
            });
        }
        ledger.record(Event::FundingAdded {
            market_maker: self.address,
            funder,
            amounts_added: kept,
            shares_minted: minted,
        });
        Ok(minted)
    }

    /// Burn `shares` and hand `holder` the proportional slice of every pool
    /// position. Pending fees are paid out in the same step.
    ///
    /// Returns the position amounts sent.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ZeroAmount`]
    /// - [`MarketError::InsufficientShares`]
    /// - [`MarketError::RemovalBeforeResolution`] under
    ///   [`RemovalPolicy::AfterResolution`] while a condition is open
    pub fn remove_funding<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        holder: Address,
        shares: U256,
    ) -> Result<Vec<U256>> {
        self.check_collateral(collateral)?;
        if shares.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }
        let held = self.shares.balance_of(holder);
        if held < shares {
            return Err(MarketError::InsufficientShares {
                available: held,
                required: shares,
            }
            .into());
        }
        if self.params.removal_policy == RemovalPolicy::AfterResolution
            && !self.all_conditions_resolved(ledger)
        {
            return Err(MarketError::RemovalBeforeResolution.into());
        }

        let supply = self.shares.total_supply();
        let amounts = self
            .pool_balances(ledger)
            .iter()
            .map(|balance| mul_div(*balance, shares, supply))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let liquidity_removed = mul_div(self.current_liquidity, shares, supply)?;

        let fees = self.settle(collateral, holder)?;
        self.shares.burn(holder, shares)?;
        self.snapshot(holder)?;
        self.current_liquidity = checked_sub(self.current_liquidity, liquidity_removed)?;
        self.send_positions(ledger, holder, &amounts)?;

        info!(
            market_maker = %self.address,
            funder = %holder,
            shares = %shares,
            fees = %fees,
            "funding removed"
        );
        ledger.record(Event::FundingRemoved {
            market_maker: self.address,
            funder: holder,
            amounts_removed: amounts.clone(),
            collateral_removed_from_fee_pool: fees,
            shares_burnt: shares,
        });
        Ok(amounts)
    }

    /// Move pool shares between holders, settling both sides' fees first.
    ///
    /// # Errors
    ///
    /// [`MarketError::ZeroAmount`] or [`MarketError::InsufficientShares`].
    pub fn transfer_shares<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        collateral: &mut dyn CollateralVault,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.check_collateral(collateral)?;
        if amount.is_zero() {
            return Err(MarketError::ZeroAmount.into());
        }

        let mut settled = Vec::with_capacity(2);
        for account in [from, to] {
            if settled.iter().any(|(a, _)| *a == account) {
                continue;
            }
            let paid = self.settle(collateral, account)?;
            settled.push((account, paid));
        }
        self.shares.transfer(from, to, amount)?;
        self.snapshot(from)?;
        self.snapshot(to)?;

        for (account, paid) in settled {
            if !paid.is_zero() {
                ledger.record(Event::FeesWithdrawn {
                    market_maker: self.address,
                    account,
                    amount: paid,
                });
            }
        }
        ledger.record(Event::SharesTransfer {
            market_maker: self.address,
            from,
            to,
            amount,
        });
        Ok(())
    }
}

/// Amount each outcome keeps from a first deposit.
fn initial_distribution(amount: U256, hint: &[U256], outcomes: usize) -> Result<Vec<U256>> {
    if hint.is_empty() {
        return Ok(vec![amount; outcomes]);
    }
    if hint.len() != outcomes {
        return Err(MarketError::HintLengthMismatch {
            expected: outcomes,
            actual: hint.len(),
        }
        .into());
    }
    let max = hint.iter().copied().max().unwrap_or_default();
    if max.is_zero() {
        return Err(MarketError::InvalidHint.into());
    }

    let mut kept = Vec::with_capacity(outcomes);
    for weight in hint {
        let share = mul_div(amount, *weight, max)?;
        if share.is_zero() {
            return Err(MarketError::InvalidHint.into());
        }
        kept.push(share);
    }
    Ok(kept)
}
