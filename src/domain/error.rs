//! Domain validation errors for identifiers, partitions and curve arithmetic.
//!
//! These errors are returned by pure functions in [`crate::domain`] when an
//! input violates an invariant or an arithmetic step cannot be represented.
//!
//! # Examples
//!
//! ```
//! use condmarket::domain::error::DomainError;
//! use condmarket::domain::index_set::{IndexSet, Partition};
//!
//! // A partition needs at least two index sets.
//! let result = Partition::new(vec![IndexSet::singleton(0)], 2);
//! assert!(matches!(result, Err(DomainError::EmptyOrSingletonPartition)));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A checked 256-bit operation overflowed or underflowed.
    #[error("arithmetic overflow")]
    Overflow,

    /// A division had a zero denominator.
    #[error("division by zero")]
    DivisionByZero,

    /// Conditions carry between 2 and 256 outcome slots.
    #[error("invalid outcome slot count {count}: must be between 2 and 256")]
    InvalidOutcomeCount {
        /// The rejected slot count.
        count: usize,
    },

    /// Partitions need at least two index sets.
    #[error("got empty or singleton partition")]
    EmptyOrSingletonPartition,

    /// An index set is zero or covers every outcome of its condition.
    #[error("invalid index set {index_set} for {outcome_slot_count} outcomes")]
    InvalidIndexSet {
        /// The rejected index set, rendered as a decimal bitmask.
        index_set: String,
        /// Outcome slot count of the condition it was checked against.
        outcome_slot_count: usize,
    },

    /// Two index sets of a partition share an outcome.
    #[error("partition not disjoint")]
    PartitionNotDisjoint,

    /// An outcome index is outside the pool's outcome space.
    #[error("invalid outcome index {index}: pool has {outcomes} outcomes")]
    InvalidOutcomeIndex {
        /// The requested outcome index.
        index: usize,
        /// Number of outcomes in the pool.
        outcomes: usize,
    },

    /// The curve cannot serve the request with the current balances.
    #[error("insufficient pool liquidity for this trade")]
    InsufficientLiquidity,

    /// The inverse-quote search did not bracket a solution.
    #[error("solver did not converge within {iterations} iterations")]
    SolverDidNotConverge {
        /// Iterations spent before giving up.
        iterations: u32,
    },

    /// Fee factor must be strictly below one.
    #[error("fee {fee} must be below 1")]
    InvalidFee {
        /// The fee as written by the caller.
        fee: String,
    },

    /// A human-facing amount could not be converted to base units.
    #[error("amount {amount} cannot be represented with {decimals} decimals")]
    AmountOutOfRange {
        /// The offending amount.
        amount: String,
        /// The token precision it was converted with.
        decimals: u8,
    },
}
