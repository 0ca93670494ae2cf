//! Inverse quotes by integer bisection.
//!
//! The curve gives tokens for collateral in closed form. Going the other way
//! (collateral for a token amount) has no closed form beyond two outcomes, so
//! these routines search the monotone curve with a fixed iteration cap. Both
//! round in the pool's favour.

use alloy_primitives::U256;

use super::curve::{calc_buy_amount, calc_sell_amount};
use super::error::DomainError;

/// Iteration cap for every search. A 256-bit range needs at most 256 halvings.
pub const MAX_ITERATIONS: u32 = 256;

/// Smallest investment whose buy quote yields at least `tokens_out`.
///
/// # Errors
///
/// - [`DomainError::InvalidOutcomeIndex`] for an out-of-range outcome
/// - [`DomainError::SolverDidNotConverge`] when no investment within range
///   reaches the target
pub fn buy_investment_for_tokens(
    balances: &[U256],
    index: usize,
    tokens_out: U256,
    fee: U256,
) -> Result<U256, DomainError> {
    if tokens_out.is_zero() {
        return Ok(U256::ZERO);
    }
    let reaches = |investment: U256| -> Result<bool, DomainError> {
        match calc_buy_amount(balances, index, investment, fee) {
            Ok(out) => Ok(out >= tokens_out),
            Err(DomainError::Overflow) => Ok(false),
            Err(e) => Err(e),
        }
    };

    // Bracket by doubling.
    let mut iterations = 0;
    let mut low = U256::ZERO;
    let mut high = tokens_out;
    while !reaches(high)? {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(DomainError::SolverDidNotConverge { iterations });
        }
        low = high;
        high = high
            .checked_mul(U256::from(2u8))
            .ok_or(DomainError::SolverDidNotConverge { iterations })?;
    }

    let mut iterations = 0;
    while low < high {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(DomainError::SolverDidNotConverge { iterations });
        }
        let mid = low + (high - low) / U256::from(2u8);
        if reaches(mid)? {
            high = mid;
        } else {
            low = mid + U256::from(1u8);
        }
    }
    Ok(high)
}

/// Largest collateral return that selling `tokens_in` outcome tokens covers.
///
/// # Errors
///
/// - [`DomainError::InvalidOutcomeIndex`] for an out-of-range outcome
/// - [`DomainError::SolverDidNotConverge`] if the search exceeds its cap
pub fn sell_return_for_tokens(
    balances: &[U256],
    index: usize,
    tokens_in: U256,
    fee: U256,
) -> Result<U256, DomainError> {
    if index >= balances.len() {
        return Err(DomainError::InvalidOutcomeIndex {
            index,
            outcomes: balances.len(),
        });
    }
    let affordable = |return_amount: U256| -> Result<bool, DomainError> {
        match calc_sell_amount(balances, index, return_amount, fee) {
            Ok(tokens) => Ok(tokens <= tokens_in),
            Err(DomainError::InsufficientLiquidity | DomainError::Overflow) => Ok(false),
            Err(e) => Err(e),
        }
    };

    // The gross return must stay below every other balance, so the smallest
    // of them bounds the search.
    let mut high = balances
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .map(|(_, b)| *b)
        .min()
        .unwrap_or_default();
    let mut low = U256::ZERO;

    let mut iterations = 0;
    while low < high {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(DomainError::SolverDidNotConverge { iterations });
        }
        let mid = low + (high - low + U256::from(1u8)) / U256::from(2u8);
        if affordable(mid)? {
            low = mid;
        } else {
            high = mid - U256::from(1u8);
        }
    }
    Ok(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixed::ONE;

    fn units(n: u64) -> U256 {
        U256::from(n) * ONE
    }

    fn fee() -> U256 {
        ONE * U256::from(3u8) / U256::from(1000u64)
    }

    #[test]
    fn buy_investment_is_minimal() {
        let balances = [units(100), units(70), units(130)];
        let target = units(12);
        let investment = buy_investment_for_tokens(&balances, 0, target, fee()).unwrap();

        assert!(calc_buy_amount(&balances, 0, investment, fee()).unwrap() >= target);
        let less = investment - U256::from(1u8);
        assert!(calc_buy_amount(&balances, 0, less, fee()).unwrap() < target);
    }

    #[test]
    fn sell_return_is_maximal() {
        let balances = [units(100), units(70), units(130)];
        let tokens = units(9);
        let returned = sell_return_for_tokens(&balances, 1, tokens, fee()).unwrap();

        assert!(calc_sell_amount(&balances, 1, returned, fee()).unwrap() <= tokens);
        let more = returned + U256::from(1u8);
        match calc_sell_amount(&balances, 1, more, fee()) {
            Ok(needed) => assert!(needed > tokens),
            Err(e) => assert_eq!(e, DomainError::InsufficientLiquidity),
        }
    }

    #[test]
    fn zero_tokens_need_zero_investment() {
        let balances = [units(10), units(10)];
        assert_eq!(
            buy_investment_for_tokens(&balances, 0, U256::ZERO, fee()).unwrap(),
            U256::ZERO
        );
    }

    #[test]
    fn zero_tokens_sell_for_nothing() {
        let balances = [units(10), units(10)];
        assert_eq!(
            sell_return_for_tokens(&balances, 0, U256::ZERO, fee()).unwrap(),
            U256::ZERO
        );
    }

    #[test]
    fn invalid_index_propagates() {
        let balances = [units(10), units(10)];
        assert!(matches!(
            buy_investment_for_tokens(&balances, 5, units(1), fee()),
            Err(DomainError::InvalidOutcomeIndex { .. })
        ));
        assert!(matches!(
            sell_return_for_tokens(&balances, 5, units(1), fee()),
            Err(DomainError::InvalidOutcomeIndex { .. })
        ));
    }
}
