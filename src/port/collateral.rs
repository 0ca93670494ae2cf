//! Collateral token port.

use alloy_primitives::{Address, U256};

use crate::error::Result;

/// An ERC20-like collateral token.
///
/// Every mutating call names the account it acts for explicitly; there is
/// no ambient sender.
pub trait CollateralVault: Send + Sync {
    /// Address identifying the token in position ids.
    fn token(&self) -> Address;

    /// Display precision of the token.
    fn decimals(&self) -> u8;

    fn total_supply(&self) -> U256;

    fn balance_of(&self, account: Address) -> U256;

    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Set the amount `spender` may pull from `owner`.
    fn approve(&mut self, owner: Address, spender: Address, amount: U256);

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()>;

    /// Create `amount` new tokens for `to`.
    fn mint(&mut self, to: Address, amount: U256) -> Result<()>;
}
