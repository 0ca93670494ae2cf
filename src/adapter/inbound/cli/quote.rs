//! Handlers for `condmarket quote`.
//!
//! Quotes run the pool curve directly on balances given on the command line,
//! so no venue or scenario is needed.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tabled::{Table, Tabled};

use super::command::{PoolArgs, TradeQuoteArgs};
use super::output;
use crate::domain::curve::{buy_fee, calc_buy_amount, calc_sell_amount, marginal_prices, sell_fee};
use crate::domain::fixed::{checked_add, checked_sub, fee_factor, from_base_units, to_base_units};
use crate::domain::solver::{buy_investment_for_tokens, sell_return_for_tokens};
use crate::error::Result;
use crate::infrastructure::config::Config;

const PRICE_DECIMALS: u8 = 18;

/// A priced trade in collateral units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeQuote {
    pub side: &'static str,
    pub outcome: usize,
    /// Collateral paid in (buy) or out (sell).
    pub collateral: Decimal,
    /// Outcome tokens out (buy) or in (sell).
    pub tokens: Decimal,
    pub fee: Decimal,
    pub average_price: Option<Decimal>,
    pub prices_before: Vec<Decimal>,
    pub prices_after: Vec<Decimal>,
}

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "Outcome")]
    outcome: usize,
    #[tabled(rename = "Balance")]
    balance: Decimal,
    #[tabled(rename = "Price")]
    price: Decimal,
}

#[derive(Tabled)]
struct MoveRow {
    #[tabled(rename = "Outcome")]
    outcome: usize,
    #[tabled(rename = "Before")]
    before: Decimal,
    #[tabled(rename = "After")]
    after: Decimal,
}

struct Pool {
    balances: Vec<U256>,
    decimals: u8,
}

impl Pool {
    fn new(args: &PoolArgs, config: &Config) -> Result<Self> {
        let decimals = config.collateral.decimals;
        let balances = args
            .balances
            .iter()
            .map(|b| to_base_units(*b, decimals))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { balances, decimals })
    }

    fn units(&self, amount: Decimal) -> Result<U256> {
        Ok(to_base_units(amount, self.decimals)?)
    }

    fn human(&self, units: U256) -> Result<Decimal> {
        Ok(from_base_units(units, self.decimals)?)
    }
}

fn prices(balances: &[U256]) -> Result<Vec<Decimal>> {
    Ok(marginal_prices(balances)?
        .into_iter()
        .map(|p| from_base_units(p, PRICE_DECIMALS))
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

fn average(collateral: Decimal, tokens: Decimal) -> Option<Decimal> {
    collateral.checked_div(tokens).map(|p| p.round_dp(6))
}

/// Quote a buy: either tokens for `--amount`, or the investment for `--tokens`.
pub fn quote_buy(args: &TradeQuoteArgs, config: &Config) -> Result<TradeQuote> {
    let pool = Pool::new(&args.pool, config)?;
    let fee = fee_factor(args.fee.unwrap_or(config.market.fee))?;

    let (investment, tokens) = match (args.amount, args.tokens) {
        (Some(amount), _) => {
            let investment = pool.units(amount)?;
            let tokens = calc_buy_amount(&pool.balances, args.outcome, investment, fee)?;
            (investment, tokens)
        }
        (None, Some(tokens)) => {
            let target = pool.units(tokens)?;
            let investment = buy_investment_for_tokens(&pool.balances, args.outcome, target, fee)?;
            let tokens = calc_buy_amount(&pool.balances, args.outcome, investment, fee)?;
            (investment, tokens)
        }
        (None, None) => (U256::ZERO, U256::ZERO),
    };
    let fee_amount = buy_fee(investment, fee)?;
    let net = checked_sub(investment, fee_amount)?;

    let mut after = pool.balances.clone();
    for balance in &mut after {
        *balance = checked_add(*balance, net)?;
    }
    after[args.outcome] = checked_sub(after[args.outcome], tokens)?;

    let collateral = pool.human(investment)?;
    let tokens = pool.human(tokens)?;
    Ok(TradeQuote {
        side: "buy",
        outcome: args.outcome,
        collateral,
        tokens,
        fee: pool.human(fee_amount)?,
        average_price: average(collateral, tokens),
        prices_before: prices(&pool.balances)?,
        prices_after: prices(&after)?,
    })
}

/// Quote a sell: either tokens needed for `--amount`, or the return for `--tokens`.
pub fn quote_sell(args: &TradeQuoteArgs, config: &Config) -> Result<TradeQuote> {
    let pool = Pool::new(&args.pool, config)?;
    let fee = fee_factor(args.fee.unwrap_or(config.market.fee))?;

    let (return_amount, tokens) = match (args.amount, args.tokens) {
        (Some(amount), _) => {
            let return_amount = pool.units(amount)?;
            let tokens = calc_sell_amount(&pool.balances, args.outcome, return_amount, fee)?;
            (return_amount, tokens)
        }
        (None, Some(tokens)) => {
            let tokens_in = pool.units(tokens)?;
            let return_amount = sell_return_for_tokens(&pool.balances, args.outcome, tokens_in, fee)?;
            let tokens = calc_sell_amount(&pool.balances, args.outcome, return_amount, fee)?;
            (return_amount, tokens)
        }
        (None, None) => (U256::ZERO, U256::ZERO),
    };
    let fee_amount = sell_fee(return_amount, fee)?;
    let gross = checked_add(return_amount, fee_amount)?;

    let mut after = pool.balances.clone();
    after[args.outcome] = checked_add(after[args.outcome], tokens)?;
    for balance in &mut after {
        *balance = checked_sub(*balance, gross)?;
    }

    let collateral = pool.human(return_amount)?;
    let tokens = pool.human(tokens)?;
    Ok(TradeQuote {
        side: "sell",
        outcome: args.outcome,
        collateral,
        tokens,
        fee: pool.human(fee_amount)?,
        average_price: average(collateral, tokens),
        prices_before: prices(&pool.balances)?,
        prices_after: prices(&after)?,
    })
}

/// Execute `quote buy` or `quote sell`.
pub fn execute_trade(args: &TradeQuoteArgs, config: &Config, buy: bool) -> Result<()> {
    let quote = if buy {
        quote_buy(args, config)?
    } else {
        quote_sell(args, config)?
    };
    let symbol = &config.collateral.symbol;

    if output::is_json() {
        output::json_output(json!({
            "command": format!("quote.{}", quote.side),
            "symbol": symbol,
            "quote": quote,
        }));
        return Ok(());
    }

    output::section(if buy { "Buy Quote" } else { "Sell Quote" });
    output::field("Outcome", quote.outcome);
    if buy {
        output::field("Pay", format!("{} {symbol}", quote.collateral));
        output::field("Receive", output::positive(format!("{} tokens", quote.tokens)));
    } else {
        output::field("Give", format!("{} tokens", quote.tokens));
        output::field("Receive", output::positive(format!("{} {symbol}", quote.collateral)));
    }
    output::field("Fee", format!("{} {symbol}", quote.fee));
    match quote.average_price {
        Some(price) => output::field("Avg price", price),
        None => output::field("Avg price", output::muted("n/a")),
    }

    if !output::is_quiet() {
        output::section("Prices");
        let rows: Vec<MoveRow> = quote
            .prices_before
            .iter()
            .zip(&quote.prices_after)
            .enumerate()
            .map(|(outcome, (before, after))| MoveRow {
                outcome,
                before: before.round_dp(6),
                after: after.round_dp(6),
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }
    Ok(())
}

/// Execute `quote prices`.
pub fn execute_prices(args: &PoolArgs, config: &Config) -> Result<()> {
    let pool = Pool::new(args, config)?;
    let prices = prices(&pool.balances)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "quote.prices",
            "balances": args.balances,
            "prices": prices,
        }));
        return Ok(());
    }

    output::section("Marginal Prices");
    let rows: Vec<PriceRow> = args
        .balances
        .iter()
        .zip(&prices)
        .enumerate()
        .map(|(outcome, (balance, price))| PriceRow {
            outcome,
            balance: *balance,
            price: price.round_dp(6),
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(balances: Vec<Decimal>, amount: Option<Decimal>, tokens: Option<Decimal>) -> TradeQuoteArgs {
        TradeQuoteArgs {
            pool: PoolArgs { balances },
            outcome: 0,
            amount,
            tokens,
            fee: Some(Decimal::ZERO),
        }
    }

    #[test]
    fn fee_free_buy_on_even_pool() {
        // 100 * 100 = (110 - x) * 110, so x = 110 - 90.909091 rounded up.
        let args = trade(vec![dec!(100), dec!(100)], Some(dec!(10)), None);
        let quote = quote_buy(&args, &Config::default()).unwrap();
        assert_eq!(quote.tokens, dec!(19.090909));
        assert_eq!(quote.fee, Decimal::ZERO);
        assert_eq!(quote.prices_before, vec![dec!(0.5), dec!(0.5)]);
        assert!(quote.prices_after[0] > dec!(0.5));
    }

    #[test]
    fn buy_by_tokens_reaches_the_target() {
        let args = trade(vec![dec!(100), dec!(100)], None, Some(dec!(19)));
        let quote = quote_buy(&args, &Config::default()).unwrap();
        assert!(quote.tokens >= dec!(19));
        assert!(quote.collateral < dec!(10));
    }

    #[test]
    fn sell_by_tokens_stays_within_budget() {
        let args = trade(vec![dec!(100), dec!(100)], None, Some(dec!(5)));
        let quote = quote_sell(&args, &Config::default()).unwrap();
        assert!(quote.tokens <= dec!(5));
        assert!(quote.collateral > Decimal::ZERO);
    }

    #[test]
    fn out_of_range_outcome_is_rejected() {
        let mut args = trade(vec![dec!(100), dec!(100)], Some(dec!(1)), None);
        args.outcome = 2;
        assert!(quote_buy(&args, &Config::default()).is_err());
    }
}
