//! Deterministic market-maker deployment.
//!
//! Pool addresses follow the CREATE2 scheme: the last 20 bytes of
//! `keccak256(0xff ‖ factory ‖ salt ‖ code_hash)`. A caller can therefore
//! learn a pool's address before creating it.

use std::collections::{BTreeSet, HashSet};

use alloy_primitives::{keccak256, Address, B256};
use tracing::info;

use super::ledger::ConditionalLedger;
use super::market_maker::MarketMaker;
use crate::domain::fixed::{BPS_DENOMINATOR, ONE};
use crate::domain::MarketMakerParams;
use crate::error::{LedgerError, MarketError, Result};
use crate::port::{Event, MultiBalanceLedger};

/// Upper bound on the combined outcome space of one pool.
pub const MAX_OUTCOMES: usize = 4096;

/// Code hash mixed into every predicted pool address.
#[must_use]
pub fn market_maker_code_hash() -> B256 {
    keccak256(b"condmarket.FixedProductMarketMaker")
}

/// Creates market makers at predictable addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolFactory {
    address: Address,
    deployed: BTreeSet<Address>,
}

impl PoolFactory {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            deployed: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Address a pool created with `salt` will have.
    #[must_use]
    pub fn predict_address(&self, salt: B256) -> Address {
        self.address.create2(salt, market_maker_code_hash())
    }

    #[must_use]
    pub fn is_deployed(&self, address: Address) -> bool {
        self.deployed.contains(&address)
    }

    /// Validate `params` and create an unfunded pool at the address
    /// predicted for `salt`.
    ///
    /// # Errors
    ///
    /// - [`MarketError::InvalidFee`] when the fee is not below one
    /// - [`MarketError::InvalidTreasuryShare`] for more than 10 000 bps or a
    ///   cut without a treasury
    /// - [`MarketError::NoConditions`] or [`MarketError::DuplicateCondition`]
    /// - [`LedgerError::NotPrepared`] for an unknown condition
    /// - [`MarketError::TooManyOutcomes`] beyond [`MAX_OUTCOMES`]
    /// - [`MarketError::AddressTaken`] when the salt was used before
    pub fn create_market_maker<B: MultiBalanceLedger>(
        &mut self,
        ledger: &mut ConditionalLedger<B>,
        creator: Address,
        params: MarketMakerParams,
        salt: B256,
    ) -> Result<MarketMaker> {
        validate(&params)?;

        let mut slot_counts = Vec::with_capacity(params.condition_ids.len());
        for id in &params.condition_ids {
            match ledger.outcome_slot_count(*id) {
                0 => return Err(LedgerError::NotPrepared.into()),
                slots => slot_counts.push(slots),
            }
        }
        let outcomes = slot_counts
            .iter()
            .fold(1usize, |acc, slots| acc.saturating_mul(*slots));
        if outcomes > MAX_OUTCOMES {
            return Err(MarketError::TooManyOutcomes(outcomes).into());
        }

        let address = self.predict_address(salt);
        if !self.deployed.insert(address) {
            return Err(MarketError::AddressTaken(address).into());
        }

        info!(
            creator = %creator,
            market_maker = %address,
            outcomes,
            fee = %params.fee,
            "market maker created"
        );
        ledger.record(Event::MarketMakerCreation {
            creator,
            market_maker: address,
            collateral: params.collateral,
            condition_ids: params.condition_ids.clone(),
            fee: params.fee,
        });
        Ok(MarketMaker::new(address, creator, params, slot_counts))
    }
}

fn validate(params: &MarketMakerParams) -> Result<()> {
    if params.fee >= ONE {
        return Err(MarketError::InvalidFee(params.fee).into());
    }
    if params.treasury_bps > BPS_DENOMINATOR
        || (params.treasury_bps > 0 && params.treasury == Address::ZERO)
    {
        return Err(MarketError::InvalidTreasuryShare(params.treasury_bps).into());
    }
    if params.condition_ids.is_empty() {
        return Err(MarketError::NoConditions.into());
    }
    let mut seen = HashSet::with_capacity(params.condition_ids.len());
    for id in &params.condition_ids {
        if !seen.insert(*id) {
            return Err(MarketError::DuplicateCondition(*id).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{named_address, QuestionId};
    use crate::error::Error;

    fn setup() -> (PoolFactory, ConditionalLedger, MarketMakerParams) {
        let mut ledger = ConditionalLedger::new(named_address("ledger"));
        let condition = ledger
            .prepare_condition(named_address("oracle"), QuestionId::from_label("q"), 2)
            .unwrap();
        let params = MarketMakerParams::new(named_address("usdc"), vec![condition]);
        (PoolFactory::new(named_address("factory")), ledger, params)
    }

    #[test]
    fn created_pool_lands_on_predicted_address() {
        let (mut factory, mut ledger, params) = setup();
        let creator = named_address("alice");
        let salt = params.salt(creator);
        let predicted = factory.predict_address(salt);

        let pool = factory
            .create_market_maker(&mut ledger, creator, params, salt)
            .unwrap();

        assert_eq!(pool.address(), predicted);
        assert_eq!(pool.outcome_count(), 2);
        assert!(factory.is_deployed(predicted));
    }

    #[test]
    fn predicted_address_is_create2() {
        let factory = PoolFactory::new(named_address("factory"));
        let salt = B256::repeat_byte(0x42);

        let mut packed = Vec::with_capacity(85);
        packed.push(0xff);
        packed.extend_from_slice(factory.address().as_slice());
        packed.extend_from_slice(salt.as_slice());
        packed.extend_from_slice(market_maker_code_hash().as_slice());
        let expected = Address::from_slice(&keccak256(&packed)[12..]);

        assert_eq!(factory.predict_address(salt), expected);
    }

    #[test]
    fn salt_cannot_be_reused() {
        let (mut factory, mut ledger, params) = setup();
        let salt = B256::repeat_byte(7);
        factory
            .create_market_maker(&mut ledger, named_address("alice"), params.clone(), salt)
            .unwrap();
        let err = factory
            .create_market_maker(&mut ledger, named_address("alice"), params, salt)
            .unwrap_err();
        assert!(matches!(err, Error::Market(MarketError::AddressTaken(_))));
    }

    #[test]
    fn parameters_are_validated() {
        let (mut factory, mut ledger, params) = setup();
        let alice = named_address("alice");
        let salt = B256::ZERO;

        let err = factory
            .create_market_maker(&mut ledger, alice, params.clone().with_fee(ONE), salt)
            .unwrap_err();
        assert!(matches!(err, Error::Market(MarketError::InvalidFee(_))));

        let err = factory
            .create_market_maker(&mut ledger, alice, params.clone().with_treasury(Address::ZERO, 10), salt)
            .unwrap_err();
        assert!(matches!(err, Error::Market(MarketError::InvalidTreasuryShare(10))));

        let twice = MarketMakerParams::new(params.collateral, vec![params.condition_ids[0]; 2]);
        let err = factory
            .create_market_maker(&mut ledger, alice, twice, salt)
            .unwrap_err();
        assert!(matches!(err, Error::Market(MarketError::DuplicateCondition(_))));

        let unknown = MarketMakerParams::new(
            params.collateral,
            vec![crate::domain::condition_id(alice, QuestionId::from_label("nope"), 2)],
        );
        let err = factory
            .create_market_maker(&mut ledger, alice, unknown, salt)
            .unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::NotPrepared)));
        assert!(!factory.is_deployed(factory.predict_address(salt)));
    }

    #[test]
    fn outcome_space_is_capped() {
        let (mut factory, mut ledger, _) = setup();
        let oracle = named_address("oracle");
        let ids: Vec<_> = ["a", "b"]
            .iter()
            .map(|q| ledger.prepare_condition(oracle, QuestionId::from_label(q), 256).unwrap())
            .collect();
        let params = MarketMakerParams::new(named_address("usdc"), ids);

        let err = factory
            .create_market_maker(&mut ledger, oracle, params, B256::ZERO)
            .unwrap_err();
        assert!(matches!(err, Error::Market(MarketError::TooManyOutcomes(65_536))));
    }
}
