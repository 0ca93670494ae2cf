//! In-memory collateral token.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::domain::fixed::checked_add;
use crate::error::{CollateralError, Result};
use crate::port::CollateralVault;

/// ERC20-like token held entirely in memory.
///
/// An allowance of `U256::MAX` is treated as unlimited and never decremented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCollateral {
    token: Address,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
}

impl MemoryCollateral {
    /// Create an empty token.
    pub fn new(token: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            token,
            symbol: symbol.into(),
            decimals,
            total_supply: U256::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(CollateralError::InsufficientBalance {
                account,
                available,
                required: amount,
            }
            .into());
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let updated = checked_add(self.balance_of(account), amount)?;
        self.balances.insert(account, updated);
        Ok(())
    }
}

impl CollateralVault for MemoryCollateral {
    fn token(&self) -> Address {
        self.token
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(CollateralError::InsufficientAllowance {
                spender,
                available: allowance,
                required: amount,
            }
            .into());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        if allowance != U256::MAX {
            self.approve(from, spender, allowance - amount);
        }
        Ok(())
    }

    fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        self.total_supply = checked_add(self.total_supply, amount)?;
        self.credit(to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::named_address;
    use crate::error::Error;

    fn token() -> MemoryCollateral {
        MemoryCollateral::new(named_address("usdc"), "USDC", 6)
    }

    #[test]
    fn mint_and_transfer() {
        let mut t = token();
        let alice = named_address("alice");
        let bob = named_address("bob");
        t.mint(alice, U256::from(100u8)).unwrap();
        t.transfer(alice, bob, U256::from(30u8)).unwrap();

        assert_eq!(t.balance_of(alice), U256::from(70u8));
        assert_eq!(t.balance_of(bob), U256::from(30u8));
        assert_eq!(t.total_supply(), U256::from(100u8));
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut t = token();
        let alice = named_address("alice");
        let pool = named_address("pool");
        t.mint(alice, U256::from(100u8)).unwrap();
        t.approve(alice, pool, U256::from(50u8));

        t.transfer_from(pool, alice, pool, U256::from(20u8)).unwrap();

        assert_eq!(t.allowance(alice, pool), U256::from(30u8));
        assert_eq!(t.balance_of(pool), U256::from(20u8));
    }

    #[test]
    fn transfer_from_without_allowance_fails() {
        let mut t = token();
        let alice = named_address("alice");
        let pool = named_address("pool");
        t.mint(alice, U256::from(100u8)).unwrap();

        let err = t.transfer_from(pool, alice, pool, U256::from(1u8)).unwrap_err();
        assert!(matches!(
            err,
            Error::Collateral(CollateralError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let mut t = token();
        let alice = named_address("alice");
        let pool = named_address("pool");
        t.mint(alice, U256::from(100u8)).unwrap();
        t.approve(alice, pool, U256::MAX);

        t.transfer_from(pool, alice, pool, U256::from(10u8)).unwrap();
        assert_eq!(t.allowance(alice, pool), U256::MAX);
    }

    #[test]
    fn overdraft_leaves_balances_untouched() {
        let mut t = token();
        let alice = named_address("alice");
        let before = t.clone();
        assert!(t.transfer(alice, named_address("bob"), U256::from(1u8)).is_err());
        assert_eq!(t, before);
    }
}
