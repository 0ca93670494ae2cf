//! Condition records and payout attribution.

use alloy_primitives::{Address, U256};
use serde::Serialize;

use super::error::DomainError;
use super::id::{ConditionId, QuestionId};
use super::identifier::condition_id;
use super::index_set::{IndexSet, MAX_OUTCOME_SLOTS};

/// Lifecycle stage of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStatus {
    /// Prepared, awaiting the oracle's payout report.
    Prepared,
    /// Payouts reported; terminal.
    Resolved,
}

/// A prepared condition and, once resolved, its payout vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    id: ConditionId,
    oracle: Address,
    question_id: QuestionId,
    outcome_slot_count: usize,
    payout_numerators: Vec<U256>,
    payout_denominator: U256,
}

impl Condition {
    /// Create an unresolved condition.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidOutcomeCount`] outside `2..=256` slots.
    pub fn prepare(
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
    ) -> Result<Self, DomainError> {
        if !(2..=MAX_OUTCOME_SLOTS).contains(&outcome_slot_count) {
            return Err(DomainError::InvalidOutcomeCount {
                count: outcome_slot_count,
            });
        }

        Ok(Self {
            id: condition_id(oracle, question_id, outcome_slot_count),
            oracle,
            question_id,
            outcome_slot_count,
            payout_numerators: vec![U256::ZERO; outcome_slot_count],
            payout_denominator: U256::ZERO,
        })
    }

    #[must_use]
    pub fn id(&self) -> ConditionId {
        self.id
    }

    #[must_use]
    pub fn oracle(&self) -> Address {
        self.oracle
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn outcome_slot_count(&self) -> usize {
        self.outcome_slot_count
    }

    #[must_use]
    pub fn payout_numerators(&self) -> &[U256] {
        &self.payout_numerators
    }

    /// Zero until resolved.
    #[must_use]
    pub fn payout_denominator(&self) -> U256 {
        self.payout_denominator
    }

    #[must_use]
    pub fn status(&self) -> ConditionStatus {
        if self.payout_denominator.is_zero() {
            ConditionStatus::Prepared
        } else {
            ConditionStatus::Resolved
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status() == ConditionStatus::Resolved
    }

    /// Store the payout vector. Callers check length, zero sum and prior
    /// resolution before calling.
    pub(crate) fn record_payouts(&mut self, numerators: Vec<U256>, denominator: U256) {
        self.payout_numerators = numerators;
        self.payout_denominator = denominator;
    }

    /// Sum of the numerators of every outcome in `index_set`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Overflow`] if the sum does not fit.
    pub fn payout_numerator_for(&self, index_set: IndexSet) -> Result<U256, DomainError> {
        index_set
            .outcomes()
            .take_while(|&i| i < self.outcome_slot_count)
            .try_fold(U256::ZERO, |acc, i| {
                acc.checked_add(self.payout_numerators[i])
                    .ok_or(DomainError::Overflow)
            })
    }
}

/// Sum a payout vector.
///
/// # Errors
///
/// Returns [`DomainError::Overflow`] if the sum does not fit.
pub fn payout_sum(payouts: &[U256]) -> Result<U256, DomainError> {
    payouts.iter().try_fold(U256::ZERO, |acc, p| {
        acc.checked_add(*p).ok_or(DomainError::Overflow)
    })
}
