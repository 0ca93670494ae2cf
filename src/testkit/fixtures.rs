//! Named accounts, amounts and pre-built venues.
//!
//! Amounts in tests are whole collateral units with [`DECIMALS`] places, so
//! `units(100)` is 100 USDC-like tokens.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;

use super::notifier::RecordingNotifier;
use crate::application::venue::Venue;
use crate::domain::fixed::fee_factor;
use crate::domain::{named_address, ConditionId, MarketMakerParams, QuestionId};

/// Decimals of the test collateral.
pub const DECIMALS: u8 = 6;

/// Address for a named account.
pub fn account(name: &str) -> Address {
    named_address(name)
}

/// `n` whole collateral tokens in base units.
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64.pow(u32::from(DECIMALS)))
}

/// The test collateral token.
pub fn token() -> Address {
    named_address("collateral:USDC")
}

/// Fee factor for a fraction such as `dec!(0.003)`.
pub fn fee(fraction: Decimal) -> U256 {
    fee_factor(fraction).expect("fee below one")
}

/// Empty venue with the test collateral registered.
pub fn venue() -> Venue {
    let venue = Venue::new(named_address("ledger"), named_address("factory"));
    venue
        .create_collateral(token(), "USDC", DECIMALS)
        .expect("collateral registered");
    venue
}

/// Venue with the test collateral and a notifier that records events.
pub fn recorded_venue() -> (Venue, RecordingNotifier) {
    let recorder = RecordingNotifier::new();
    let mut venue = venue();
    venue.register_notifier(Box::new(recorder.clone()));
    (venue, recorder)
}

/// Mint `amount` collateral to the named account.
pub fn fund(venue: &Venue, name: &str, amount: U256) -> Address {
    let to = account(name);
    venue
        .mint_collateral(token(), to, amount)
        .expect("mint succeeds");
    to
}

/// Prepare a condition asked by `oracle` and return its id.
pub fn condition(venue: &Venue, oracle: &str, question: &str, outcomes: usize) -> ConditionId {
    venue
        .prepare_condition(account(oracle), QuestionId::from_label(question), outcomes)
        .expect("condition prepared")
}

/// A funded market over one binary condition.
pub struct BinaryMarket {
    pub venue: Venue,
    pub recorder: RecordingNotifier,
    pub market: Address,
    pub condition: ConditionId,
    pub question: QuestionId,
    pub oracle: Address,
    pub funder: Address,
}

impl BinaryMarket {
    /// Approve and buy in one transaction.
    pub fn buy(&self, buyer: Address, investment: U256, outcome: usize) -> crate::error::Result<U256> {
        let market = self.market;
        self.venue.transact(|s| {
            s.approve_collateral(token(), buyer, market, investment)?;
            s.buy(market, buyer, investment, outcome, U256::ZERO)
        })
    }

    /// Approve positions and sell in one transaction.
    pub fn sell(&self, seller: Address, return_amount: U256, outcome: usize) -> crate::error::Result<U256> {
        let market = self.market;
        self.venue.transact(|s| {
            s.set_approval_for_all(seller, market, true);
            s.sell(market, seller, return_amount, outcome, U256::MAX)
        })
    }

    /// Approve and add funding in one transaction.
    pub fn add_funding(&self, funder: Address, amount: U256) -> crate::error::Result<U256> {
        let market = self.market;
        self.venue.transact(|s| {
            s.approve_collateral(token(), funder, market, amount)?;
            s.add_funding(market, funder, amount, &[])
        })
    }

    /// Report `payouts` as the oracle.
    pub fn resolve(&self, payouts: &[u64]) {
        let payouts: Vec<U256> = payouts.iter().map(|p| U256::from(*p)).collect();
        self.venue
            .report_payouts(self.oracle, self.question, &payouts)
            .expect("payouts reported");
    }

    pub fn balances(&self) -> Vec<U256> {
        self.venue.pool_balances(self.market).expect("market exists")
    }
}

/// Binary market with fee `fee_fraction`, funded by `lp` with `funding`
/// whole tokens. Every named account in `traders` gets 1000 tokens.
pub fn binary_market(fee_fraction: Decimal, funding: u64, traders: &[&str]) -> BinaryMarket {
    let (venue, recorder) = recorded_venue();
    let question = QuestionId::from_label("binary");
    let oracle = account("oracle");
    let condition = venue
        .prepare_condition(oracle, question, 2)
        .expect("condition prepared");

    let funder = fund(&venue, "lp", units(funding));
    for trader in traders {
        fund(&venue, trader, units(1000));
    }

    let params = MarketMakerParams::new(token(), vec![condition]).with_fee(fee(fee_fraction));
    let market = venue
        .create_market_maker(funder, params)
        .expect("market created");

    let fixture = BinaryMarket {
        venue,
        recorder,
        market,
        condition,
        question,
        oracle,
        funder,
    };
    if funding > 0 {
        fixture
            .add_funding(funder, units(funding))
            .expect("initial funding");
    }
    fixture
}
