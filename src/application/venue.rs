//! Serialized, all-or-nothing access to the whole market state.
//!
//! Every operation runs against a draft copy of [`VenueState`] while the
//! lock is held and replaces the live state only if it succeeds. A failed
//! operation therefore leaves every balance, condition and pool exactly as
//! it was. Events recorded during the operation are handed to the
//! registered notifiers after the lock is released.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use tracing::debug;

use super::factory::PoolFactory;
use super::ledger::ConditionalLedger;
use super::market_maker::MarketMaker;
use crate::adapter::memory::MemoryCollateral;
use crate::domain::fixed::MAX_DECIMALS;
use crate::domain::{
    CollectionId, Condition, ConditionId, DomainError, IndexSet, MarketMakerParams, PositionId,
    QuestionId,
};
use crate::error::{CollateralError, MarketError, Result};
use crate::port::{CollateralVault, Event, Notifier, NotifierRegistry};

/// Everything the venue owns. Cloned per transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueState {
    bank: BTreeMap<Address, MemoryCollateral>,
    ledger: ConditionalLedger,
    factory: PoolFactory,
    markets: BTreeMap<Address, MarketMaker>,
    now: u64,
}

impl VenueState {
    #[must_use]
    pub fn new(ledger: Address, factory: Address) -> Self {
        Self {
            bank: BTreeMap::new(),
            ledger: ConditionalLedger::new(ledger),
            factory: PoolFactory::new(factory),
            markets: BTreeMap::new(),
            now: 0,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &ConditionalLedger {
        &self.ledger
    }

    #[must_use]
    pub fn factory(&self) -> &PoolFactory {
        &self.factory
    }

    /// Logical clock used for market end times.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn collateral(&self, token: Address) -> Result<&MemoryCollateral> {
        self.bank
            .get(&token)
            .ok_or_else(|| CollateralError::UnknownToken(token).into())
    }

    pub fn market(&self, market: Address) -> Result<&MarketMaker> {
        self.markets
            .get(&market)
            .ok_or_else(|| MarketError::UnknownMarket(market).into())
    }

    pub fn markets(&self) -> impl Iterator<Item = &MarketMaker> {
        self.markets.values()
    }

    /// Zero for unknown tokens.
    #[must_use]
    pub fn collateral_balance(&self, token: Address, account: Address) -> U256 {
        self.bank
            .get(&token)
            .map_or(U256::ZERO, |c| c.balance_of(account))
    }

    pub fn set_time(&mut self, now: u64) {
        self.now = now;
    }

    pub fn create_collateral(&mut self, token: Address, symbol: &str, decimals: u8) -> Result<()> {
        if decimals > MAX_DECIMALS {
            return Err(DomainError::AmountOutOfRange {
                amount: symbol.to_string(),
                decimals,
            }
            .into());
        }
        if self.bank.contains_key(&token) {
            return Err(CollateralError::TokenExists(token).into());
        }
        self.bank
            .insert(token, MemoryCollateral::new(token, symbol, decimals));
        Ok(())
    }

    pub fn mint_collateral(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
        self.collateral_mut(token)?.mint(to, amount)
    }

    pub fn approve_collateral(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        self.collateral_mut(token)?.approve(owner, spender, amount);
        Ok(())
    }

    pub fn prepare_condition(
        &mut self,
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
    ) -> Result<ConditionId> {
        self.ledger
            .prepare_condition(oracle, question_id, outcome_slot_count)
    }

    pub fn report_payouts(
        &mut self,
        oracle: Address,
        question_id: QuestionId,
        payouts: &[U256],
    ) -> Result<ConditionId> {
        self.ledger.report_payouts(oracle, question_id, payouts)
    }

    pub fn split_position(
        &mut self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        let collateral = self
            .bank
            .get_mut(&token)
            .ok_or(CollateralError::UnknownToken(token))?;
        self.ledger
            .split_position(caller, collateral, parent, condition_id, partition, amount)
    }

    pub fn merge_positions(
        &mut self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        let collateral = self
            .bank
            .get_mut(&token)
            .ok_or(CollateralError::UnknownToken(token))?;
        self.ledger
            .merge_positions(caller, collateral, parent, condition_id, partition, amount)
    }

    pub fn redeem_positions(
        &mut self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        index_sets: &[IndexSet],
    ) -> Result<U256> {
        let collateral = self
            .bank
            .get_mut(&token)
            .ok_or(CollateralError::UnknownToken(token))?;
        self.ledger
            .redeem_positions(caller, collateral, parent, condition_id, index_sets)
    }

    pub fn safe_transfer_from(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        position: PositionId,
        amount: U256,
    ) -> Result<()> {
        self.ledger
            .safe_transfer_from(operator, from, to, position, amount)
    }

    pub fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        self.ledger.set_approval_for_all(owner, operator, approved);
    }

    /// Create a pool with the salt derived from `creator` and `params`.
    pub fn create_market_maker(
        &mut self,
        creator: Address,
        params: MarketMakerParams,
    ) -> Result<Address> {
        let salt = params.salt(creator);
        self.create_market_maker_with_salt(creator, params, salt)
    }

    pub fn create_market_maker_with_salt(
        &mut self,
        creator: Address,
        params: MarketMakerParams,
        salt: B256,
    ) -> Result<Address> {
        self.collateral(params.collateral)?;
        let pool = self
            .factory
            .create_market_maker(&mut self.ledger, creator, params, salt)?;
        let address = pool.address();
        self.markets.insert(address, pool);
        Ok(address)
    }

    pub fn add_funding(
        &mut self,
        market: Address,
        funder: Address,
        amount: U256,
        distribution_hint: &[U256],
    ) -> Result<U256> {
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.add_funding(ledger, collateral, funder, amount, distribution_hint)
    }

    pub fn remove_funding(
        &mut self,
        market: Address,
        holder: Address,
        shares: U256,
    ) -> Result<Vec<U256>> {
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.remove_funding(ledger, collateral, holder, shares)
    }

    pub fn buy(
        &mut self,
        market: Address,
        buyer: Address,
        investment: U256,
        outcome_index: usize,
        min_tokens_out: U256,
    ) -> Result<U256> {
        let now = self.now;
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.buy(ledger, collateral, buyer, investment, outcome_index, min_tokens_out, now)
    }

    pub fn sell(
        &mut self,
        market: Address,
        seller: Address,
        return_amount: U256,
        outcome_index: usize,
        max_tokens_in: U256,
    ) -> Result<U256> {
        let now = self.now;
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.sell(ledger, collateral, seller, return_amount, outcome_index, max_tokens_in, now)
    }

    pub fn withdraw_fees(&mut self, market: Address, account: Address) -> Result<U256> {
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.withdraw_fees(ledger, collateral, account)
    }

    pub fn transfer_shares(
        &mut self,
        market: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        let (pool, ledger, collateral) = self.market_parts(market)?;
        pool.transfer_shares(ledger, collateral, from, to, amount)
    }

    fn collateral_mut(&mut self, token: Address) -> Result<&mut MemoryCollateral> {
        self.bank
            .get_mut(&token)
            .ok_or_else(|| CollateralError::UnknownToken(token).into())
    }

    fn market_parts(
        &mut self,
        market: Address,
    ) -> Result<(&mut MarketMaker, &mut ConditionalLedger, &mut MemoryCollateral)> {
        let pool = self
            .markets
            .get_mut(&market)
            .ok_or(MarketError::UnknownMarket(market))?;
        let token = pool.collateral();
        let collateral = self
            .bank
            .get_mut(&token)
            .ok_or(CollateralError::UnknownToken(token))?;
        Ok((pool, &mut self.ledger, collateral))
    }

    fn drain_events(&mut self) -> Vec<Event> {
        self.ledger.drain_events()
    }
}

/// Thread-safe handle serializing every operation on a [`VenueState`].
pub struct Venue {
    state: Mutex<VenueState>,
    notifiers: NotifierRegistry,
}

impl Venue {
    /// Empty venue whose ledger and factory live at the given addresses.
    #[must_use]
    pub fn new(ledger: Address, factory: Address) -> Self {
        Self::from_state(VenueState::new(ledger, factory))
    }

    #[must_use]
    pub fn from_state(state: VenueState) -> Self {
        Self {
            state: Mutex::new(state),
            notifiers: NotifierRegistry::new(),
        }
    }

    pub fn register_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.register(notifier);
    }

    /// Run `op` atomically. On error nothing changes and no events are
    /// delivered.
    pub fn transact<T>(&self, op: impl FnOnce(&mut VenueState) -> Result<T>) -> Result<T> {
        let (value, events) = {
            let mut live = self.state.lock();
            let mut draft = live.clone();
            let value = match op(&mut draft) {
                Ok(value) => value,
                Err(e) => {
                    debug!(error = %e, "transaction rolled back");
                    return Err(e);
                }
            };
            let events = draft.drain_events();
            *live = draft;
            (value, events)
        };

        for event in events {
            self.notifiers.notify_all(event);
        }
        Ok(value)
    }

    /// Read from the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&VenueState) -> T) -> T {
        f(&self.state.lock())
    }

    /// Copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> VenueState {
        self.state.lock().clone()
    }

    #[must_use]
    pub fn now(&self) -> u64 {
        self.read(VenueState::now)
    }

    pub fn set_time(&self, now: u64) {
        self.state.lock().set_time(now);
    }

    /// Move the clock forward by `seconds`.
    pub fn advance_time(&self, seconds: u64) {
        let mut state = self.state.lock();
        let now = state.now.saturating_add(seconds);
        state.set_time(now);
    }

    pub fn create_collateral(&self, token: Address, symbol: &str, decimals: u8) -> Result<()> {
        self.transact(|s| s.create_collateral(token, symbol, decimals))
    }

    pub fn mint_collateral(&self, token: Address, to: Address, amount: U256) -> Result<()> {
        self.transact(|s| s.mint_collateral(token, to, amount))
    }

    pub fn approve_collateral(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        self.transact(|s| s.approve_collateral(token, owner, spender, amount))
    }

    pub fn prepare_condition(
        &self,
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
    ) -> Result<ConditionId> {
        self.transact(|s| s.prepare_condition(oracle, question_id, outcome_slot_count))
    }

    pub fn report_payouts(
        &self,
        oracle: Address,
        question_id: QuestionId,
        payouts: &[U256],
    ) -> Result<ConditionId> {
        self.transact(|s| s.report_payouts(oracle, question_id, payouts))
    }

    pub fn split_position(
        &self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        self.transact(|s| s.split_position(caller, token, parent, condition_id, partition, amount))
    }

    pub fn merge_positions(
        &self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        partition: &[IndexSet],
        amount: U256,
    ) -> Result<()> {
        self.transact(|s| s.merge_positions(caller, token, parent, condition_id, partition, amount))
    }

    pub fn redeem_positions(
        &self,
        caller: Address,
        token: Address,
        parent: CollectionId,
        condition_id: ConditionId,
        index_sets: &[IndexSet],
    ) -> Result<U256> {
        self.transact(|s| s.redeem_positions(caller, token, parent, condition_id, index_sets))
    }

    pub fn safe_transfer_from(
        &self,
        operator: Address,
        from: Address,
        to: Address,
        position: PositionId,
        amount: U256,
    ) -> Result<()> {
        self.transact(|s| s.safe_transfer_from(operator, from, to, position, amount))
    }

    pub fn set_approval_for_all(&self, owner: Address, operator: Address, approved: bool) -> Result<()> {
        self.transact(|s| {
            s.set_approval_for_all(owner, operator, approved);
            Ok(())
        })
    }

    pub fn create_market_maker(&self, creator: Address, params: MarketMakerParams) -> Result<Address> {
        self.transact(|s| s.create_market_maker(creator, params))
    }

    pub fn add_funding(
        &self,
        market: Address,
        funder: Address,
        amount: U256,
        distribution_hint: &[U256],
    ) -> Result<U256> {
        self.transact(|s| s.add_funding(market, funder, amount, distribution_hint))
    }

    pub fn remove_funding(&self, market: Address, holder: Address, shares: U256) -> Result<Vec<U256>> {
        self.transact(|s| s.remove_funding(market, holder, shares))
    }

    pub fn buy(
        &self,
        market: Address,
        buyer: Address,
        investment: U256,
        outcome_index: usize,
        min_tokens_out: U256,
    ) -> Result<U256> {
        self.transact(|s| s.buy(market, buyer, investment, outcome_index, min_tokens_out))
    }

    pub fn sell(
        &self,
        market: Address,
        seller: Address,
        return_amount: U256,
        outcome_index: usize,
        max_tokens_in: U256,
    ) -> Result<U256> {
        self.transact(|s| s.sell(market, seller, return_amount, outcome_index, max_tokens_in))
    }

    pub fn withdraw_fees(&self, market: Address, account: Address) -> Result<U256> {
        self.transact(|s| s.withdraw_fees(market, account))
    }

    pub fn transfer_shares(
        &self,
        market: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.transact(|s| s.transfer_shares(market, from, to, amount))
    }

    #[must_use]
    pub fn collateral_balance(&self, token: Address, account: Address) -> U256 {
        self.read(|s| s.collateral_balance(token, account))
    }

    #[must_use]
    pub fn position_balance(&self, account: Address, position: PositionId) -> U256 {
        self.read(|s| s.ledger.balance_of(account, position))
    }

    #[must_use]
    pub fn condition(&self, condition_id: ConditionId) -> Option<Condition> {
        self.read(|s| s.ledger.condition(condition_id).cloned())
    }

    /// Copy of a pool.
    pub fn market(&self, market: Address) -> Result<MarketMaker> {
        self.read(|s| s.market(market).cloned())
    }

    pub fn pool_balances(&self, market: Address) -> Result<Vec<U256>> {
        self.read(|s| Ok(s.market(market)?.pool_balances(&s.ledger)))
    }

    pub fn fees_withdrawable_by(&self, market: Address, account: Address) -> Result<U256> {
        self.read(|s| s.market(market)?.fees_withdrawable_by(account))
    }

    pub fn calc_buy_amount(&self, market: Address, investment: U256, outcome_index: usize) -> Result<U256> {
        self.read(|s| s.market(market)?.calc_buy_amount(&s.ledger, investment, outcome_index))
    }

    pub fn calc_sell_amount(
        &self,
        market: Address,
        return_amount: U256,
        outcome_index: usize,
    ) -> Result<U256> {
        self.read(|s| s.market(market)?.calc_sell_amount(&s.ledger, return_amount, outcome_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::named_address;
    use crate::error::{Error, LedgerError};
    use std::sync::{Arc, Mutex as StdMutex};

    struct Recording(Arc<StdMutex<Vec<&'static str>>>);

    impl Notifier for Recording {
        fn notify(&self, event: Event) {
            self.0.lock().unwrap().push(event.name());
        }
    }

    fn venue() -> (Venue, Arc<StdMutex<Vec<&'static str>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let mut venue = Venue::new(named_address("ledger"), named_address("factory"));
        venue.register_notifier(Box::new(Recording(Arc::clone(&seen))));
        (venue, seen)
    }

    #[test]
    fn failed_transaction_changes_nothing() {
        let (venue, seen) = venue();
        let oracle = named_address("oracle");
        venue
            .prepare_condition(oracle, QuestionId::from_label("q"), 2)
            .unwrap();
        let before = venue.snapshot();

        let result = venue.transact(|s| {
            s.prepare_condition(oracle, QuestionId::from_label("other"), 3)?;
            s.prepare_condition(oracle, QuestionId::from_label("q"), 2)
        });

        assert!(matches!(result, Err(Error::Ledger(LedgerError::AlreadyPrepared(_)))));
        assert_eq!(venue.snapshot(), before);
        assert_eq!(*seen.lock().unwrap(), vec!["condition_preparation"]);
    }

    #[test]
    fn events_follow_commit() {
        let (venue, seen) = venue();
        venue
            .transact(|s| {
                s.prepare_condition(named_address("oracle"), QuestionId::from_label("a"), 2)?;
                s.prepare_condition(named_address("oracle"), QuestionId::from_label("b"), 2)
            })
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(venue.snapshot().ledger().clone().drain_events().is_empty());
    }

    #[test]
    fn clock_advances() {
        let (venue, _) = venue();
        venue.set_time(10);
        venue.advance_time(5);
        assert_eq!(venue.now(), 15);
    }

    #[test]
    fn unknown_market_is_reported() {
        let (venue, _) = venue();
        let missing = named_address("nowhere");
        assert!(matches!(
            venue.withdraw_fees(missing, named_address("alice")),
            Err(Error::Market(MarketError::UnknownMarket(a))) if a == missing
        ));
    }
}
