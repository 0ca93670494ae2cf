//! In-memory pool share token.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::domain::fixed::checked_add;
use crate::error::{MarketError, Result};
use crate::port::FungibleShareToken;

/// Share balances of one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareLedger {
    total_supply: U256,
    balances: BTreeMap<Address, U256>,
}

impl ShareLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holders with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.balances.iter().map(|(holder, amount)| (*holder, *amount))
    }
}

impl FungibleShareToken for ShareLedger {
    fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.total_supply = checked_add(self.total_supply, amount)?;
        let updated = checked_add(self.balance_of(to), amount)?;
        self.balances.insert(to, updated);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(MarketError::InsufficientShares {
                available,
                required: amount,
            }
            .into());
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        self.total_supply -= amount;
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.burn(from, amount)?;
        self.mint(to, amount)
    }
}
