//! Pool share token port.

use alloy_primitives::{Address, U256};

use crate::error::Result;

/// ERC20-like fungible token recording pool ownership.
pub trait FungibleShareToken: Send + Sync {
    fn total_supply(&self) -> U256;

    fn balance_of(&self, holder: Address) -> U256;

    fn mint(&mut self, to: Address, amount: U256) -> Result<()>;

    fn burn(&mut self, from: Address, amount: U256) -> Result<()>;

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()>;
}
