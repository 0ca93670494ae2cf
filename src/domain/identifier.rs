//! Identifier algebra for conditions, collections and positions.
//!
//! All derivations are Keccak-256 over tightly packed inputs: addresses are
//! 20 bytes, digests 32 bytes and integers 32-byte big-endian words. The
//! functions are pure and total.

use alloy_primitives::{keccak256, Address, B256, U256};

use super::id::{CollectionId, ConditionId, PositionId, QuestionId};
use super::index_set::IndexSet;

/// Derive the identifier of a condition.
#[must_use]
pub fn condition_id(
    oracle: Address,
    question_id: QuestionId,
    outcome_slot_count: usize,
) -> ConditionId {
    let mut packed = Vec::with_capacity(20 + 32 + 32);
    packed.extend_from_slice(oracle.as_slice());
    packed.extend_from_slice(question_id.as_bytes());
    packed.extend_from_slice(&U256::from(outcome_slot_count).to_be_bytes::<32>());
    ConditionId::from_digest(keccak256(&packed))
}

/// Derive the collection reached by conditioning `parent` on `index_set`.
///
/// Each index set contributes only its own bit pattern, so enumeration order
/// within a partition never affects the result.
#[must_use]
pub fn collection_id(
    parent: CollectionId,
    condition_id: ConditionId,
    index_set: IndexSet,
) -> CollectionId {
    let mut packed = Vec::with_capacity(64);
    packed.extend_from_slice(condition_id.as_bytes());
    packed.extend_from_slice(&index_set.value().to_be_bytes::<32>());
    let child = keccak256(&packed);

    if parent.is_root() {
        return CollectionId::from_digest(child);
    }

    let mut nested = Vec::with_capacity(64);
    nested.extend_from_slice(parent.as_bytes());
    nested.extend_from_slice(child.as_slice());
    CollectionId::from_digest(keccak256(&nested))
}

/// Derive the ledger slot for `collateral` under `collection_id`.
#[must_use]
pub fn position_id(collateral: Address, collection_id: CollectionId) -> PositionId {
    let mut packed = Vec::with_capacity(52);
    packed.extend_from_slice(collateral.as_slice());
    packed.extend_from_slice(collection_id.as_bytes());
    PositionId::from_digest(keccak256(&packed))
}

/// Deterministic address for a human-readable label.
///
/// Used for service accounts (ledger custody, factory) and for named accounts
/// in scenario files.
#[must_use]
pub fn named_address(label: &str) -> Address {
    let digest: B256 = keccak256(label.as_bytes());
    Address::from_slice(&digest[12..])
}

/// Collections and positions spanned by a pool over one or more conditions.
///
/// `collection_ids[k]` lists the parent collections that get split over
/// condition `k`; the last condition is split from the root. Positions are
/// enumerated depth-first with the last condition outermost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeLayout {
    /// Parent collections per condition level.
    pub collection_ids: Vec<Vec<CollectionId>>,
    /// One position per combined outcome.
    pub position_ids: Vec<PositionId>,
}

impl OutcomeLayout {
    /// Build the layout for `conditions`, given as `(id, outcome slot count)`.
    #[must_use]
    pub fn build(collateral: Address, conditions: &[(ConditionId, usize)]) -> Self {
        let mut layout = Self {
            collection_ids: vec![Vec::new(); conditions.len()],
            position_ids: Vec::new(),
        };
        layout.record(collateral, conditions, conditions.len(), CollectionId::ROOT);
        layout
    }

    fn record(
        &mut self,
        collateral: Address,
        conditions: &[(ConditionId, usize)],
        conditions_left: usize,
        parent: CollectionId,
    ) {
        if conditions_left == 0 {
            self.position_ids.push(position_id(collateral, parent));
            return;
        }

        let level = conditions_left - 1;
        let (condition, slots) = conditions[level];
        self.collection_ids[level].push(parent);
        for outcome in 0..slots {
            let child = collection_id(parent, condition, IndexSet::singleton(outcome));
            self.record(collateral, conditions, level, child);
        }
    }

    /// Number of combined outcomes.
    #[must_use]
    pub fn outcome_count(&self) -> usize {
        self.position_ids.len()
    }
}
