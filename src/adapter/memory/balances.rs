//! In-memory multi-balance ledger.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};

use crate::domain::fixed::checked_add;
use crate::domain::id::PositionId;
use crate::error::{LedgerError, Result};
use crate::port::MultiBalanceLedger;

/// Position balances keyed by `(owner, position)`.
///
/// Zero balances are not stored, so two ledgers with the same holdings
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBalances {
    balances: BTreeMap<(Address, PositionId), U256>,
    approvals: BTreeSet<(Address, Address)>,
}

impl MemoryBalances {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-zero balance of `owner`.
    pub fn holdings(&self, owner: Address) -> impl Iterator<Item = (PositionId, U256)> + '_ {
        self.balances
            .range((owner, PositionId::default())..)
            .take_while(move |((holder, _), _)| *holder == owner)
            .map(|((_, position), amount)| (*position, *amount))
    }
}

impl MultiBalanceLedger for MemoryBalances {
    fn balance_of(&self, owner: Address, position: PositionId) -> U256 {
        self.balances
            .get(&(owner, position))
            .copied()
            .unwrap_or_default()
    }

    fn mint(&mut self, to: Address, position: PositionId, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let updated = checked_add(self.balance_of(to, position), amount)?;
        self.balances.insert((to, position), updated);
        Ok(())
    }

    fn burn(&mut self, from: Address, position: PositionId, amount: U256) -> Result<()> {
        let available = self.balance_of(from, position);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                position,
                available,
                required: amount,
            }
            .into());
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.balances.remove(&(from, position));
        } else {
            self.balances.insert((from, position), remaining);
        }
        Ok(())
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        position: PositionId,
        amount: U256,
    ) -> Result<()> {
        self.burn(from, position, amount)?;
        self.mint(to, position, amount)
    }

    fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.approvals.insert((owner, operator));
        } else {
            self.approvals.remove(&(owner, operator));
        }
    }

    fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.approvals.contains(&(owner, operator))
    }
}
