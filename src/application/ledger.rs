//! Conditional token ledger.
//!
//! Owns the condition lifecycle (prepare, then resolve) and the position
//! balances created by splitting collateral over a condition's outcomes.
//! Splitting from the root collection pulls collateral into the ledger's own
//! account; merging or redeeming back to the root pays it out again.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::adapter::memory::MemoryBalances;
use crate::domain::condition::{payout_sum, Condition};
use crate::domain::error::DomainError;
use crate::domain::fixed::{checked_add, mul_div};
use crate::domain::id::{CollectionId, ConditionId, PositionId, QuestionId};
use crate::domain::identifier::{collection_id, condition_id, position_id};
use crate::domain::index_set::{IndexSet, Partition};
use crate::error::{LedgerError, Result};
use crate::port::{CollateralVault, Event, MultiBalanceLedger};

/// Condition registry plus the shared multi-balance position table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalLedger<B = MemoryBalances> {
    address: Address,
    conditions: BTreeMap<ConditionId, Condition>,
    questions: BTreeMap<QuestionId, Vec<ConditionId>>,
    balances: B,
    journal: Vec<Event>,
}

impl<B: MultiBalanceLedger + Default> ConditionalLedger<B> {
    /// Create an empty ledger whose custody account is `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self::with_balances(address, B::default())
    }
}

impl<B: MultiBalanceLedger> ConditionalLedger<B> {
    /// Create a ledger over an existing balance table.
    pub fn with_balances(address: Address, balances: B) -> Self {
        Self {
            address,
            conditions: BTreeMap::new(),
            questions: BTreeMap::new(),
            balances,
            journal: Vec::new(),
        }
    }

    /// Custody account holding collateral backing root-level positions.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The underlying balance table.
    #[must_use]
    pub fn balances(&self) -> &B {
        &self.balances
    }

    /// Prepare a condition for `oracle` to resolve later.
    ///
    /// # Errors
    ///
    /// - [`DomainError::InvalidOutcomeCount`] outside `2..=256` outcomes
    /// - [`LedgerError::AlreadyPrepared`] if the condition exists
    pub fn prepare_condition(
        &mut self,
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
    ) -> Result<ConditionId> {
        let condition = Condition::prepare(oracle, question_id, outcome_slot_count)?;
        let id = condition.id();
        if self.conditions.contains_key(&id) {
            return Err(LedgerError::AlreadyPrepared(id).into());
        }

        self.conditions.insert(id, condition);
        self.questions.entry(question_id).or_default().push(id);
        debug!(condition_id = %id, oracle = %oracle, outcomes = outcome_slot_count, "prepared condition");

        self.record(Event::ConditionPreparation {
            condition_id: id,
            oracle,
            question_id,
            outcome_slot_count,
        });
        Ok(id)
    }

    /// Resolve the condition `caller` prepared for `question_id`.
    ///
    /// The condition is located by `(caller, question_id, payouts.len())`.
    ///
    /// # Errors
    ///
    /// Checked in order: [`LedgerError::NotPrepared`],
    /// [`LedgerError::NotOracle`], [`LedgerError::WrongPayoutLength`],
    /// [`LedgerError::AlreadyResolved`], [`LedgerError::ZeroPayoutSum`].
    pub fn report_payouts(
        &mut self,
        caller: Address,
        question_id: QuestionId,
        payouts: &[U256],
    ) -> Result<ConditionId> {
        let candidates = self
            .questions
            .get(&question_id)
            .ok_or(LedgerError::NotPrepared)?;
        let is_oracle = candidates.iter().any(|id| {
            self.conditions
                .get(id)
                .is_some_and(|condition| condition.oracle() == caller)
        });
        if !is_oracle {
            return Err(LedgerError::NotOracle {
                caller,
                question_id,
            }
            .into());
        }

        let id = condition_id(caller, question_id, payouts.len());
        let condition = self
            .conditions
            .get_mut(&id)
            .ok_or(LedgerError::WrongPayoutLength {
                question_id,
                actual: payouts.len(),
            })?;
        if condition.is_resolved() {
            return Err(LedgerError::AlreadyResolved(id).into());
        }
        let denominator = payout_sum(payouts)?;
        if denominator.is_zero() {
            return Err(LedgerError::ZeroPayoutSum.into());
        }

        condition.record_payouts(payouts.to_vec(), denominator);
        debug!(condition_id = %id, denominator = %denominator, "resolved condition");

        self.record(Event::ConditionResolution {
            condition_id: id,
            oracle: caller,
            question_id,
            outcome_slot_count: payouts.len(),
            payout_numerators: payouts.to_vec(),
        });
        Ok(id)
    }

    /// Split `amount` of the parent into one position per index set.
    ///
    /// A full partition consumes collateral (root parent) or the parent
    /// position; a partial one consumes the position of the partition's union.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ZeroAmount`], partition errors from [`Partition::new`],
    /// [`LedgerError::NotPrepared`], or the collateral or balance failure of
    /// the debit.
    pub fn split_position(
        &mut self,
        caller: Address,
        collateral: &mut dyn CollateralVault,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        let partition = self.validated_partition(condition_id, partition, amount)?;
        let token = collateral.token();

        if partition.is_full() {
            if parent.is_root() {
                collateral.transfer_from(self.address, caller, self.address, amount)?;
            } else {
                self.balances
                    .burn(caller, position_id(token, parent), amount)?;
            }
        } else {
            let union = collection_id(parent, condition_id, partition.union());
            self.balances.burn(caller, position_id(token, union), amount)?;
        }

        for set in partition.sets() {
            let child = position_id(token, collection_id(parent, condition_id, *set));
            self.balances.mint(caller, child, amount)?;
        }

        self.record(Event::PositionSplit {
            stakeholder: caller,
            collateral: token,
            parent_collection_id: parent,
            condition_id,
            partition: partition.sets().to_vec(),
            amount,
        });
        Ok(())
    }

    /// Merge `amount` of every partition position back into the parent.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Self::split_position`], plus
    /// [`LedgerError::InsufficientBalance`] when a child position is short.
    pub fn merge_positions(
        &mut self,
        caller: Address,
        collateral: &mut dyn CollateralVault,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        let partition = self.validated_partition(condition_id, partition, amount)?;
        let token = collateral.token();

        for set in partition.sets() {
            let child = position_id(token, collection_id(parent, condition_id, *set));
            self.balances.burn(caller, child, amount)?;
        }

        if partition.is_full() {
            if parent.is_root() {
                collateral.transfer(self.address, caller, amount)?;
            } else {
                self.balances
                    .mint(caller, position_id(token, parent), amount)?;
            }
        } else {
            let union = collection_id(parent, condition_id, partition.union());
            self.balances.mint(caller, position_id(token, union), amount)?;
        }

        self.record(Event::PositionsMerge {
            stakeholder: caller,
            collateral: token,
            parent_collection_id: parent,
            condition_id,
            partition: partition.sets().to_vec(),
            amount,
        });
        Ok(())
    }

    /// Burn the caller's positions for `index_sets` and pay out their share
    /// of the resolved condition. Returns the total paid.
    ///
    /// Each set pays `balance * numerator(set) / denominator`, truncating.
    /// Zero balances are skipped.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotPrepared`], [`LedgerError::NotResolved`], or
    /// [`DomainError::InvalidIndexSet`].
    pub fn redeem_positions(
        &mut self,
        caller: Address,
        collateral: &mut dyn CollateralVault,
        parent: CollectionId,
        condition_id: ConditionId,
        index_sets: &[IndexSet],
    ) -> Result<U256> {
        let condition = self
            .conditions
            .get(&condition_id)
            .ok_or(LedgerError::NotPrepared)?;
        if !condition.is_resolved() {
            return Err(LedgerError::NotResolved(condition_id).into());
        }
        for set in index_sets {
            set.validate(condition.outcome_slot_count())?;
        }

        let token = collateral.token();
        let denominator = condition.payout_denominator();
        let mut total = U256::ZERO;
        for set in index_sets {
            let position = position_id(token, collection_id(parent, condition_id, *set));
            let stake = self.balances.balance_of(caller, position);
            if stake.is_zero() {
                continue;
            }
            let numerator = condition.payout_numerator_for(*set)?;
            total = checked_add(total, mul_div(stake, numerator, denominator)?)?;
            self.balances.burn(caller, position, stake)?;
        }

        if !total.is_zero() {
            if parent.is_root() {
                collateral.transfer(self.address, caller, total)?;
            } else {
                self.balances
                    .mint(caller, position_id(token, parent), total)?;
            }
        }
        debug!(redeemer = %caller, condition_id = %condition_id, payout = %total, "redeemed positions");

        self.record(Event::PayoutRedemption {
            redeemer: caller,
            collateral: token,
            parent_collection_id: parent,
            condition_id,
            index_sets: index_sets.to_vec(),
            payout: total,
        });
        Ok(total)
    }

    /// Move positions from `from` to `to` on behalf of `operator`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotApproved`] unless `operator` is `from` or approved;
    /// [`LedgerError::InsufficientBalance`] if `from` is short.
    pub fn safe_transfer_from(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        position: PositionId,
        amount: U256,
    ) -> Result<()> {
        self.safe_batch_transfer_from(operator, from, to, &[position], &[amount])
    }

    /// Batched [`Self::safe_transfer_from`].
    ///
    /// # Errors
    ///
    /// [`LedgerError::BatchLengthMismatch`] when the slices differ in length,
    /// otherwise as [`Self::safe_transfer_from`].
    pub fn safe_batch_transfer_from(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        positions: &[PositionId],
        amounts: &[U256],
    ) -> Result<()> {
        if positions.len() != amounts.len() {
            return Err(LedgerError::BatchLengthMismatch {
                left: positions.len(),
                right: amounts.len(),
            }
            .into());
        }
        if operator != from && !self.balances.is_approved_for_all(from, operator) {
            return Err(LedgerError::NotApproved {
                operator,
                owner: from,
            }
            .into());
        }

        for (position, amount) in positions.iter().zip(amounts) {
            self.balances.transfer(from, to, *position, *amount)?;
        }

        self.record(Event::PositionTransfer {
            operator,
            from,
            to,
            positions: positions.to_vec(),
            amounts: amounts.to_vec(),
        });
        Ok(())
    }

    /// Grant or revoke `operator`'s right to move `owner`'s positions.
    pub fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        self.balances.set_approval_for_all(owner, operator, approved);
        self.record(Event::ApprovalForAll {
            owner,
            operator,
            approved,
        });
    }

    #[must_use]
    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.balances.is_approved_for_all(owner, operator)
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, position: PositionId) -> U256 {
        self.balances.balance_of(owner, position)
    }

    /// Balances for pairs of `(owners[i], positions[i])`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::BatchLengthMismatch`] when the slices differ in length.
    pub fn balance_of_batch(
        &self,
        owners: &[Address],
        positions: &[PositionId],
    ) -> Result<Vec<U256>> {
        if owners.len() != positions.len() {
            return Err(LedgerError::BatchLengthMismatch {
                left: owners.len(),
                right: positions.len(),
            }
            .into());
        }
        Ok(owners
            .iter()
            .zip(positions)
            .map(|(owner, position)| self.balances.balance_of(*owner, *position))
            .collect())
    }

    #[must_use]
    pub fn condition(&self, condition_id: ConditionId) -> Option<&Condition> {
        self.conditions.get(&condition_id)
    }

    /// Every prepared condition, ordered by id.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    /// Zero for unknown conditions.
    #[must_use]
    pub fn outcome_slot_count(&self, condition_id: ConditionId) -> usize {
        self.condition(condition_id)
            .map_or(0, Condition::outcome_slot_count)
    }

    /// Zero until resolved or for unknown conditions.
    #[must_use]
    pub fn payout_denominator(&self, condition_id: ConditionId) -> U256 {
        self.condition(condition_id)
            .map_or(U256::ZERO, Condition::payout_denominator)
    }

    /// Empty for unknown conditions.
    #[must_use]
    pub fn payout_numerators(&self, condition_id: ConditionId) -> Vec<U256> {
        self.condition(condition_id)
            .map(|c| c.payout_numerators().to_vec())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_resolved(&self, condition_id: ConditionId) -> bool {
        self.condition(condition_id).is_some_and(Condition::is_resolved)
    }

    /// Collateral currently held in the ledger's custody account.
    #[must_use]
    pub fn collateral_custody(&self, collateral: &dyn CollateralVault) -> U256 {
        collateral.balance_of(self.address)
    }

    /// Append an event to the pending journal.
    pub(crate) fn record(&mut self, event: Event) {
        self.journal.push(event);
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    fn validated_partition(
        &self,
        condition_id: ConditionId,
        sets: &[IndexSet],
        amount: U256,
    ) -> Result<Partition> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount.into());
        }
        if sets.len() < 2 {
            return Err(DomainError::EmptyOrSingletonPartition.into());
        }
        let slots = self.outcome_slot_count(condition_id);
        if slots == 0 {
            return Err(LedgerError::NotPrepared.into());
        }
        Ok(Partition::new(sets.to_vec(), slots)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::memory::MemoryCollateral;
    use crate::domain::named_address;
    use crate::error::{CollateralError, Error};

    struct Fixture {
        ledger: ConditionalLedger,
        usdc: MemoryCollateral,
        oracle: Address,
        alice: Address,
        question: QuestionId,
    }

    fn fixture() -> Fixture {
        let ledger = ConditionalLedger::new(named_address("ledger"));
        let mut usdc = MemoryCollateral::new(named_address("usdc"), "USDC", 6);
        let alice = named_address("alice");
        usdc.mint(alice, U256::from(1_000u64)).unwrap();
        usdc.approve(alice, ledger.address(), U256::MAX);
        Fixture {
            ledger,
            usdc,
            oracle: named_address("oracle"),
            alice,
            question: QuestionId::from_label("q"),
        }
    }

    fn sets(bits: &[u64]) -> Vec<IndexSet> {
        bits.iter().map(|b| IndexSet::from(*b)).collect()
    }

    #[test]
    fn prepare_twice_fails() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        let err = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::AlreadyPrepared(c)) if c == id));
    }

    #[test]
    fn prepare_rejects_one_outcome() {
        let mut f = fixture();
        let err = f.ledger.prepare_condition(f.oracle, f.question, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::InvalidOutcomeCount { count: 1 })
        ));
    }

    #[test]
    fn report_checks_run_in_order() {
        let mut f = fixture();
        let one = U256::from(1u8);

        let err = f.ledger.report_payouts(f.oracle, f.question, &[one, one]).unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotPrepared)));

        f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        let err = f
            .ledger
            .report_payouts(f.alice, f.question, &[one, one])
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotOracle { .. })));

        let err = f
            .ledger
            .report_payouts(f.oracle, f.question, &[one, one, one])
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::WrongPayoutLength { actual: 3, .. })));

        let err = f
            .ledger
            .report_payouts(f.oracle, f.question, &[U256::ZERO, U256::ZERO])
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::ZeroPayoutSum)));

        f.ledger.report_payouts(f.oracle, f.question, &[one, U256::ZERO]).unwrap();
        let err = f
            .ledger
            .report_payouts(f.oracle, f.question, &[one, U256::ZERO])
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::AlreadyResolved(_))));
    }

    #[test]
    fn split_and_merge_round_trip() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 3).unwrap();
        let amount = U256::from(100u8);

        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 6]), amount)
            .unwrap();
        assert_eq!(f.usdc.balance_of(f.alice), U256::from(900u64));
        assert_eq!(f.ledger.collateral_custody(&f.usdc), amount);

        f.ledger
            .merge_positions(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 6]), amount)
            .unwrap();
        assert_eq!(f.usdc.balance_of(f.alice), U256::from(1_000u64));
        assert_eq!(f.ledger.balances(), &MemoryBalances::new());
    }

    #[test]
    fn partial_split_consumes_union_position() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 3).unwrap();
        let token = f.usdc.token();
        let amount = U256::from(10u8);

        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[3, 4]), amount)
            .unwrap();
        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2]), amount)
            .unwrap();

        let union = position_id(token, collection_id(CollectionId::ROOT, id, IndexSet::from(3)));
        assert_eq!(f.ledger.balance_of(f.alice, union), U256::ZERO);
        for bit in [1u64, 2, 4] {
            let p = position_id(token, collection_id(CollectionId::ROOT, id, IndexSet::from(bit)));
            assert_eq!(f.ledger.balance_of(f.alice, p), amount);
        }
    }

    #[test]
    fn split_requires_allowance() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        f.usdc.approve(f.alice, f.ledger.address(), U256::ZERO);

        let err = f
            .ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2]), U256::from(1u8))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Collateral(CollateralError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn split_rejects_bad_input() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 3).unwrap();
        let root = CollectionId::ROOT;

        let err = f
            .ledger
            .split_position(f.alice, &mut f.usdc, root, id, &sets(&[1, 2]), U256::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::ZeroAmount)));

        let err = f
            .ledger
            .split_position(f.alice, &mut f.usdc, root, id, &sets(&[7]), U256::from(1u8))
            .unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::EmptyOrSingletonPartition)));

        let err = f
            .ledger
            .split_position(f.alice, &mut f.usdc, root, id, &sets(&[3, 6]), U256::from(1u8))
            .unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::PartitionNotDisjoint)));

        let unknown = condition_id(f.oracle, f.question, 5);
        let err = f
            .ledger
            .split_position(f.alice, &mut f.usdc, root, unknown, &sets(&[1, 2]), U256::from(1u8))
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotPrepared)));
    }

    #[test]
    fn redeem_before_resolution_fails() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        let err = f
            .ledger
            .redeem_positions(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1]))
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotResolved(_))));
    }

    #[test]
    fn redeem_pays_weighted_numerators() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 3).unwrap();
        let amount = U256::from(300u64);
        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2, 4]), amount)
            .unwrap();
        let payouts = [U256::from(1u8), U256::ZERO, U256::from(2u8)];
        f.ledger.report_payouts(f.oracle, f.question, &payouts).unwrap();

        let paid = f
            .ledger
            .redeem_positions(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2, 4]))
            .unwrap();

        assert_eq!(paid, amount);
        assert_eq!(f.usdc.balance_of(f.alice), U256::from(1_000u64));

        let again = f
            .ledger
            .redeem_positions(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2, 4]))
            .unwrap();
        assert_eq!(again, U256::ZERO);
    }

    #[test]
    fn transfer_needs_approval() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2]), U256::from(5u8))
            .unwrap();
        let position = position_id(
            f.usdc.token(),
            collection_id(CollectionId::ROOT, id, IndexSet::from(1)),
        );
        let bob = named_address("bob");

        let err = f
            .ledger
            .safe_transfer_from(bob, f.alice, bob, position, U256::from(1u8))
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotApproved { .. })));

        f.ledger.set_approval_for_all(f.alice, bob, true);
        f.ledger
            .safe_transfer_from(bob, f.alice, bob, position, U256::from(1u8))
            .unwrap();
        assert_eq!(f.ledger.balance_of(bob, position), U256::from(1u8));
    }

    #[test]
    fn batch_balance_checks_lengths() {
        let f = fixture();
        let err = f
            .ledger
            .balance_of_batch(&[f.alice], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::BatchLengthMismatch { left: 1, right: 0 })
        ));
    }

    #[test]
    fn events_are_journaled_in_order() {
        let mut f = fixture();
        let id = f.ledger.prepare_condition(f.oracle, f.question, 2).unwrap();
        f.ledger
            .split_position(f.alice, &mut f.usdc, CollectionId::ROOT, id, &sets(&[1, 2]), U256::from(5u8))
            .unwrap();

        let names: Vec<_> = f.ledger.drain_events().iter().map(Event::name).collect();
        assert_eq!(names, vec!["condition_preparation", "position_split"]);
        assert!(f.ledger.drain_events().is_empty());
    }
}
