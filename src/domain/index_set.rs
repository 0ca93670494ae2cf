//! Outcome index sets and partitions.
//!
//! An [`IndexSet`] is a bitmask over a condition's outcome slots (bit `i` set
//! means outcome `i` is included). A [`Partition`] is a list of pairwise
//! disjoint, non-empty index sets that do not cover every outcome on their own.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Largest supported outcome slot count.
pub const MAX_OUTCOME_SLOTS: usize = 256;

/// Bitmask over the outcome slots of one condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IndexSet(U256);

impl IndexSet {
    /// Wrap a raw bitmask.
    #[must_use]
    pub const fn new(bits: U256) -> Self {
        Self(bits)
    }

    /// The set containing only `outcome`.
    #[must_use]
    pub fn singleton(outcome: usize) -> Self {
        Self(U256::from(1u8) << outcome)
    }

    /// The set of every outcome of a condition with `outcome_slot_count` slots.
    #[must_use]
    pub fn full(outcome_slot_count: usize) -> Self {
        if outcome_slot_count >= MAX_OUTCOME_SLOTS {
            return Self(U256::MAX);
        }
        Self((U256::from(1u8) << outcome_slot_count) - U256::from(1u8))
    }

    /// Raw bitmask.
    #[must_use]
    pub const fn value(&self) -> U256 {
        self.0
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether `outcome` is a member.
    #[must_use]
    pub fn contains(&self, outcome: usize) -> bool {
        outcome < MAX_OUTCOME_SLOTS && self.0.bit(outcome)
    }

    /// Number of outcomes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.count_ones()
    }

    /// Outcome indices in ascending order.
    pub fn outcomes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_OUTCOME_SLOTS).filter(|&i| self.0.bit(i))
    }

    /// Whether the two sets share no outcome.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        (self.0 & other.0).is_zero()
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check that this set is a proper, non-empty subset of the full set.
    pub fn validate(&self, outcome_slot_count: usize) -> Result<(), DomainError> {
        let full = Self::full(outcome_slot_count);
        if self.is_empty() || self.0 >= full.0 {
            return Err(DomainError::InvalidIndexSet {
                index_set: self.0.to_string(),
                outcome_slot_count,
            });
        }
        Ok(())
    }
}

impl fmt::Display for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for IndexSet {
    fn from(bits: u64) -> Self {
        Self(U256::from(bits))
    }
}

/// A validated list of disjoint index sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    sets: Vec<IndexSet>,
    union: IndexSet,
    outcome_slot_count: usize,
}

impl Partition {
    /// Validate `sets` against a condition with `outcome_slot_count` slots.
    ///
    /// # Errors
    ///
    /// - [`DomainError::EmptyOrSingletonPartition`] for fewer than two sets
    /// - [`DomainError::InvalidIndexSet`] for an empty or full set
    /// - [`DomainError::PartitionNotDisjoint`] when two sets overlap
    pub fn new(sets: Vec<IndexSet>, outcome_slot_count: usize) -> Result<Self, DomainError> {
        if sets.len() < 2 {
            return Err(DomainError::EmptyOrSingletonPartition);
        }

        let mut union = IndexSet::default();
        for set in &sets {
            set.validate(outcome_slot_count)?;
            if !union.is_disjoint(set) {
                return Err(DomainError::PartitionNotDisjoint);
            }
            union = union.union(set);
        }

        Ok(Self {
            sets,
            union,
            outcome_slot_count,
        })
    }

    /// The partition of every outcome into singletons.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidOutcomeCount`] outside `2..=256` slots.
    pub fn basic(outcome_slot_count: usize) -> Result<Self, DomainError> {
        if !(2..=MAX_OUTCOME_SLOTS).contains(&outcome_slot_count) {
            return Err(DomainError::InvalidOutcomeCount {
                count: outcome_slot_count,
            });
        }
        Self::new(
            (0..outcome_slot_count).map(IndexSet::singleton).collect(),
            outcome_slot_count,
        )
    }

    /// The index sets in caller order.
    #[must_use]
    pub fn sets(&self) -> &[IndexSet] {
        &self.sets
    }

    /// Bitwise union of all sets.
    #[must_use]
    pub fn union(&self) -> IndexSet {
        self.union
    }

    /// Whether the partition covers every outcome.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.union == IndexSet::full(self.outcome_slot_count)
    }
}
