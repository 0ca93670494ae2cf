//! Liquidity-provider fee accounting.

use alloy_primitives::U256;
use condmarket::domain::fixed::PRECISION;
use condmarket::domain::{MarketMakerParams, RemovalPolicy};
use condmarket::port::Event;
use condmarket::testkit::fixtures::{
    account, binary_market, condition, fee, fund, recorded_venue, token, units,
};
use rust_decimal_macros::dec;

#[test]
fn a_single_provider_collects_every_fee() {
    let fixture = binary_market(dec!(0.01), 100, &["trader"]);
    fixture.buy(account("trader"), units(10), 0).unwrap();

    let lp = fixture.funder;
    let market = fixture.market;
    assert_eq!(fixture.venue.fees_withdrawable_by(market, lp).unwrap(), U256::from(100_000u64));
    assert_eq!(fixture.venue.collateral_balance(token(), market), U256::from(100_000u64));

    let paid = fixture.venue.withdraw_fees(market, lp).unwrap();
    assert_eq!(paid, U256::from(100_000u64));
    assert_eq!(fixture.venue.collateral_balance(token(), lp), U256::from(100_000u64));
    assert_eq!(fixture.venue.collateral_balance(token(), market), U256::ZERO);
}

#[test]
fn a_withdrawal_cannot_be_repeated() {
    let fixture = binary_market(dec!(0.01), 100, &["trader"]);
    fixture.buy(account("trader"), units(10), 0).unwrap();
    let lp = fixture.funder;

    fixture.venue.withdraw_fees(fixture.market, lp).unwrap();
    fixture.recorder.clear();
    let again = fixture.venue.withdraw_fees(fixture.market, lp).unwrap();
    assert_eq!(again, U256::ZERO);
    assert_eq!(fixture.recorder.names(), vec!["fees_withdrawn"]);

    let pool = fixture.venue.market(fixture.market).unwrap();
    assert_eq!(pool.collected_fees(), U256::from(100_000u64));
    assert_eq!(pool.withdrawn_fees(), U256::from(100_000u64));
}

#[test]
fn fees_split_by_share_of_the_pool() {
    let fixture = binary_market(dec!(0.01), 100, &["trader", "bob"]);
    let bob = account("bob");
    fixture.add_funding(bob, units(100)).unwrap();
    fixture.buy(account("trader"), units(10), 1).unwrap();

    let market = fixture.market;
    assert_eq!(
        fixture.venue.fees_withdrawable_by(market, fixture.funder).unwrap(),
        U256::from(50_000u64)
    );
    assert_eq!(
        fixture.venue.fees_withdrawable_by(market, bob).unwrap(),
        U256::from(50_000u64)
    );
}

#[test]
fn a_late_provider_does_not_share_earlier_fees() {
    let fixture = binary_market(dec!(0.01), 100, &["trader", "bob"]);
    fixture.buy(account("trader"), units(10), 0).unwrap();

    let bob = account("bob");
    fixture.add_funding(bob, units(100)).unwrap();
    let market = fixture.market;
    assert_eq!(fixture.venue.fees_withdrawable_by(market, bob).unwrap(), U256::ZERO);
    assert_eq!(
        fixture.venue.fees_withdrawable_by(market, fixture.funder).unwrap(),
        U256::from(100_000u64)
    );

    // Withdrawals never exceed what has been collected.
    let lp_paid = fixture.venue.withdraw_fees(market, fixture.funder).unwrap();
    let bob_paid = fixture.venue.withdraw_fees(market, bob).unwrap();
    let pool = fixture.venue.market(market).unwrap();
    assert!(lp_paid + bob_paid <= pool.collected_fees());
}

#[test]
fn transferring_shares_settles_the_sender() {
    let fixture = binary_market(dec!(0.01), 100, &["trader"]);
    let trader = account("trader");
    fixture.buy(trader, units(10), 0).unwrap();

    let lp = fixture.funder;
    let carol = account("carol");
    let market = fixture.market;
    fixture.recorder.clear();
    fixture.venue.transfer_shares(market, lp, carol, units(50)).unwrap();

    assert_eq!(fixture.venue.collateral_balance(token(), lp), U256::from(100_000u64));
    assert_eq!(fixture.venue.fees_withdrawable_by(market, lp).unwrap(), U256::ZERO);
    assert_eq!(fixture.venue.fees_withdrawable_by(market, carol).unwrap(), U256::ZERO);
    assert_eq!(fixture.recorder.names(), vec!["fees_withdrawn", "shares_transfer"]);

    // New fees accrue to both holders equally.
    fixture.buy(trader, units(10), 1).unwrap();
    let lp_fees = fixture.venue.fees_withdrawable_by(market, lp).unwrap();
    let carol_fees = fixture.venue.fees_withdrawable_by(market, carol).unwrap();
    assert_eq!(lp_fees, carol_fees);
    assert_eq!(lp_fees, U256::from(50_000u64));
}

#[test]
fn the_treasury_takes_its_cut_at_trade_time() {
    let (venue, _) = recorded_venue();
    let cid = condition(&venue, "oracle", "treasury", 2);
    let lp = fund(&venue, "lp", units(100));
    let trader = fund(&venue, "trader", units(10));
    let treasury = account("treasury");

    let params = MarketMakerParams::new(token(), vec![cid])
        .with_fee(fee(dec!(0.01)))
        .with_treasury(treasury, 5_000);
    let market = venue.create_market_maker(lp, params).unwrap();
    venue.approve_collateral(token(), lp, market, units(100)).unwrap();
    venue.add_funding(market, lp, units(100), &[]).unwrap();

    venue.approve_collateral(token(), trader, market, units(10)).unwrap();
    venue.buy(market, trader, units(10), 0, U256::ZERO).unwrap();

    assert_eq!(venue.collateral_balance(token(), treasury), U256::from(50_000u64));
    assert_eq!(venue.fees_withdrawable_by(market, lp).unwrap(), U256::from(50_000u64));
    assert_eq!(venue.collateral_balance(token(), market), U256::from(50_000u64));
}

#[test]
fn fees_are_paid_when_funding_is_removed() {
    let fixture = binary_market(dec!(0.01), 100, &["trader"]);
    fixture.buy(account("trader"), units(10), 0).unwrap();
    fixture.resolve(&[1, 0]);

    let lp = fixture.funder;
    let shares = fixture.venue.market(fixture.market).unwrap().shares_of(lp);
    fixture.venue.remove_funding(fixture.market, lp, shares).unwrap();
    assert_eq!(fixture.venue.collateral_balance(token(), lp), U256::from(100_000u64));
    assert_eq!(fixture.venue.fees_withdrawable_by(fixture.market, lp).unwrap(), U256::ZERO);
}

fn last_trade_fee(recorder: &condmarket::testkit::notifier::RecordingNotifier) -> U256 {
    recorder
        .events()
        .into_iter()
        .rev()
        .find_map(|event| match event {
            Event::Buy { fee_amount, .. } | Event::Sell { fee_amount, .. } => Some(fee_amount),
            _ => None,
        })
        .expect("a trade was recorded")
}

#[test]
fn the_fee_weight_only_moves_on_trades() {
    let (venue, recorder) = recorded_venue();
    let cid = condition(&venue, "oracle", "weight", 2);
    let lp = fund(&venue, "lp", units(100));
    let trader = fund(&venue, "trader", units(20));
    let carol = account("carol");

    let params = MarketMakerParams::new(token(), vec![cid])
        .with_fee(fee(dec!(0.01)))
        .with_treasury(account("treasury"), 2_500)
        .with_removal_policy(RemovalPolicy::Anytime);
    let market = venue.create_market_maker(lp, params).unwrap();
    venue.approve_collateral(token(), lp, market, units(100)).unwrap();
    venue.add_funding(market, lp, units(100), &[]).unwrap();

    let weight = || venue.market(market).unwrap().fee_pool_weight();
    let supply = || venue.market(market).unwrap().total_shares();
    let lp_part = |fee: U256| fee - fee * U256::from(2_500u64) / U256::from(10_000u64);
    assert_eq!(weight(), U256::ZERO);

    venue.approve_collateral(token(), trader, market, units(20)).unwrap();
    venue.buy(market, trader, units(10), 0, U256::ZERO).unwrap();
    let buy_fee = last_trade_fee(&recorder);
    assert_eq!(buy_fee, U256::from(100_000u64));
    let after_buy = weight();
    assert_eq!(after_buy, lp_part(buy_fee) * PRECISION / supply());

    venue.set_approval_for_all(trader, market, true).unwrap();
    venue.sell(market, trader, units(2), 0, U256::MAX).unwrap();
    let after_sell = weight();
    assert_eq!(
        after_sell - after_buy,
        lp_part(last_trade_fee(&recorder)) * PRECISION / supply()
    );

    venue.transfer_shares(market, lp, carol, units(30)).unwrap();
    assert_eq!(weight(), after_sell);
    venue.withdraw_fees(market, lp).unwrap();
    assert_eq!(weight(), after_sell);
    venue.remove_funding(market, carol, units(30)).unwrap();
    assert_eq!(weight(), after_sell);

    // Later fees are spread over the smaller supply.
    assert_eq!(supply(), units(70));
    venue.buy(market, trader, units(1), 1, U256::ZERO).unwrap();
    assert_eq!(
        weight() - after_sell,
        lp_part(last_trade_fee(&recorder)) * PRECISION / units(70)
    );
}
