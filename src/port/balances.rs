//! Multi-balance position ledger port.

use alloy_primitives::{Address, U256};

use crate::domain::id::PositionId;
use crate::error::Result;

/// ERC1155-like table of balances keyed by `(account, position)`.
///
/// Implementations check sufficiency and apply the delta in one step; a
/// failed call leaves every balance unchanged.
pub trait MultiBalanceLedger: Send + Sync {
    fn balance_of(&self, owner: Address, position: PositionId) -> U256;

    /// Credit `amount` of `position` to `to`.
    fn mint(&mut self, to: Address, position: PositionId, amount: U256) -> Result<()>;

    /// Debit `amount` of `position` from `from`.
    fn burn(&mut self, from: Address, position: PositionId, amount: U256) -> Result<()>;

    /// Move `amount` of `position` between accounts.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        position: PositionId,
        amount: U256,
    ) -> Result<()>;

    /// Grant or revoke `operator`'s right to move every position of `owner`.
    fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool);

    fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool;
}
