use alloy_primitives::{Address, U256};
use thiserror::Error;

pub use crate::domain::error::DomainError;
use crate::domain::id::{ConditionId, PositionId, QuestionId};

/// Broad class of a failure, for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Operation preconditions not met. Fix the request.
    Precondition,
    /// Caller lacks the identity or approval required.
    Authorization,
    /// Caller-declared bound violated. Retry with adjusted limits.
    Slippage,
    /// Not enough balance to burn or transfer.
    Conservation,
    /// Value outside the representable range.
    Arithmetic,
    /// Bad configuration or scenario input.
    Configuration,
}

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Collateral token failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollateralError {
    #[error("unknown collateral token {0}")]
    UnknownToken(Address),

    #[error("collateral token {0} already exists")]
    TokenExists(Address),

    #[error("collateral mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: Address, actual: Address },

    #[error("insufficient collateral balance for {account}: {available} < {required}")]
    InsufficientBalance {
        account: Address,
        available: U256,
        required: U256,
    },

    #[error("insufficient allowance for {spender}: {available} < {required}")]
    InsufficientAllowance {
        spender: Address,
        available: U256,
        required: U256,
    },
}

/// Conditional ledger failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("condition {0} already prepared")]
    AlreadyPrepared(ConditionId),

    #[error("condition not prepared")]
    NotPrepared,

    #[error("{caller} is not the oracle for question {question_id}")]
    NotOracle {
        caller: Address,
        question_id: QuestionId,
    },

    #[error("wrong payout length {actual} for question {question_id}")]
    WrongPayoutLength {
        question_id: QuestionId,
        actual: usize,
    },

    #[error("condition {0} already resolved")]
    AlreadyResolved(ConditionId),

    #[error("payout is all zeroes")]
    ZeroPayoutSum,

    #[error("condition {0} not resolved")]
    NotResolved(ConditionId),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient balance of {position}: {available} < {required}")]
    InsufficientBalance {
        position: PositionId,
        available: U256,
        required: U256,
    },

    #[error("{operator} is not approved to move positions of {owner}")]
    NotApproved { operator: Address, owner: Address },

    #[error("batch length mismatch: {left} vs {right}")]
    BatchLengthMismatch { left: usize, right: usize },
}

/// Market maker and factory failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("unknown market maker {0}")]
    UnknownMarket(Address),

    #[error("hint length {actual} does not match {expected} outcomes")]
    HintLengthMismatch { expected: usize, actual: usize },

    #[error("distribution hint leaves an outcome empty")]
    InvalidHint,

    #[error("cannot use a distribution hint after initial funding")]
    HintAfterInitialFunding,

    #[error("insufficient shares: {available} < {required}")]
    InsufficientShares { available: U256, required: U256 },

    #[error("cannot remove funding before every condition is resolved")]
    RemovalBeforeResolution,

    #[error("trading is closed")]
    TradingClosed,

    #[error("minimum buy amount not reached: {tokens_out} < {min_tokens_out}")]
    InsufficientOutput {
        tokens_out: U256,
        min_tokens_out: U256,
    },

    #[error("maximum sell amount exceeded: {tokens_in} > {max_tokens_in}")]
    InsufficientInput {
        tokens_in: U256,
        max_tokens_in: U256,
    },

    #[error("invalid fee {0}: must be below 1e18")]
    InvalidFee(U256),

    #[error("invalid treasury share of {0} bps")]
    InvalidTreasuryShare(u16),

    #[error("market maker needs at least one condition")]
    NoConditions,

    #[error("condition {0} listed twice")]
    DuplicateCondition(ConditionId),

    #[error("{0} combined outcomes exceed the limit")]
    TooManyOutcomes(usize),

    #[error("market maker address {0} already taken")]
    AddressTaken(Address),
}

/// Scenario file failures.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("unknown {kind} '{name}'")]
    UnknownName { kind: &'static str, name: String },

    #[error("{kind} '{name}' defined twice")]
    DuplicateName { kind: &'static str, name: String },

    #[error("step {step} ({action}) succeeded but was expected to fail with '{expected}'")]
    UnexpectedSuccess {
        step: usize,
        action: String,
        expected: String,
    },

    #[error("step {step} ({action}) failed: {source}")]
    StepFailed {
        step: usize,
        action: String,
        #[source]
        source: Box<Error>,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Collateral(#[from] CollateralError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify the failure.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) | Self::Scenario(_) | Self::Json(_) | Self::Io(_) => {
                ErrorClass::Configuration
            }
            Self::Domain(e) => match e {
                DomainError::Overflow
                | DomainError::DivisionByZero
                | DomainError::AmountOutOfRange { .. }
                | DomainError::SolverDidNotConverge { .. } => ErrorClass::Arithmetic,
                DomainError::InsufficientLiquidity => ErrorClass::Conservation,
                _ => ErrorClass::Precondition,
            },
            Self::Collateral(e) => match e {
                CollateralError::InsufficientBalance { .. } => ErrorClass::Conservation,
                CollateralError::InsufficientAllowance { .. } => ErrorClass::Authorization,
                _ => ErrorClass::Precondition,
            },
            Self::Ledger(e) => match e {
                LedgerError::NotOracle { .. } | LedgerError::NotApproved { .. } => {
                    ErrorClass::Authorization
                }
                LedgerError::InsufficientBalance { .. } => ErrorClass::Conservation,
                _ => ErrorClass::Precondition,
            },
            Self::Market(e) => match e {
                MarketError::InsufficientOutput { .. } | MarketError::InsufficientInput { .. } => {
                    ErrorClass::Slippage
                }
                MarketError::InsufficientShares { .. } => ErrorClass::Conservation,
                _ => ErrorClass::Precondition,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_errors_are_classified() {
        let err: Error = MarketError::InsufficientOutput {
            tokens_out: U256::from(1u8),
            min_tokens_out: U256::from(2u8),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Slippage);
    }

    #[test]
    fn oracle_mismatch_is_authorization() {
        let err: Error = LedgerError::NotOracle {
            caller: Address::ZERO,
            question_id: QuestionId::default(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Authorization);
    }

    #[test]
    fn short_balance_is_conservation() {
        let err: Error = LedgerError::InsufficientBalance {
            position: PositionId::default(),
            available: U256::ZERO,
            required: U256::from(1u8),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Conservation);
    }

    #[test]
    fn partition_errors_are_preconditions() {
        let err: Error = DomainError::PartitionNotDisjoint.into();
        assert_eq!(err.class(), ErrorClass::Precondition);
    }
}
