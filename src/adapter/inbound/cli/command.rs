//! Command-line interface definitions.
//!
//! Defines the CLI structure for the condmarket binary using `clap`:
//! identifier derivation, curve quotes against explicit pool balances,
//! scenario simulation and configuration inspection.

use std::path::PathBuf;

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::{named_address, CollectionId, ConditionId};

/// Conditional tokens and fixed-product market maker simulator
#[derive(Parser, Debug)]
#[command(name = "condmarket")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "CONDMARKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive condition, collection and position identifiers
    #[command(subcommand)]
    Ids(IdsCommand),

    /// Quote trades against explicit pool balances
    #[command(subcommand)]
    Quote(QuoteCommand),

    /// Run a scenario file against a fresh venue
    Simulate(SimulateArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `condmarket ids`.
#[derive(Subcommand, Debug)]
pub enum IdsCommand {
    /// Condition id from oracle, question and slot count.
    Condition(ConditionIdArgs),
    /// Collection id from a parent collection, condition and index set.
    Collection(CollectionIdArgs),
    /// Position id from a collateral token and collection.
    Position(PositionIdArgs),
}

#[derive(Args, Debug)]
pub struct ConditionIdArgs {
    /// Oracle address, or a name hashed to one.
    #[arg(long, value_parser = parse_account)]
    pub oracle: Address,

    /// Question id (0x-prefixed) or text hashed to one.
    #[arg(long)]
    pub question: String,

    /// Number of outcome slots.
    #[arg(long)]
    pub outcomes: usize,
}

#[derive(Args, Debug)]
pub struct CollectionIdArgs {
    #[arg(long)]
    pub condition: ConditionId,

    /// Index set as an integer bitmask (outcome 0 is bit 1).
    #[arg(long)]
    pub index_set: u64,

    /// Parent collection; the root collection when omitted.
    #[arg(long, default_value_t = CollectionId::ROOT)]
    pub parent: CollectionId,
}

#[derive(Args, Debug)]
pub struct PositionIdArgs {
    /// Collateral token address, or a name hashed to one.
    #[arg(long, value_parser = parse_account)]
    pub collateral: Address,

    #[arg(long)]
    pub collection: CollectionId,
}

/// Subcommands for `condmarket quote`.
#[derive(Subcommand, Debug)]
pub enum QuoteCommand {
    /// Quote buying one outcome.
    Buy(TradeQuoteArgs),
    /// Quote selling one outcome.
    Sell(TradeQuoteArgs),
    /// Marginal prices implied by the balances.
    Prices(PoolArgs),
}

#[derive(Args, Debug)]
pub struct PoolArgs {
    /// Pool balance of every outcome, comma separated, in collateral units.
    #[arg(long, value_delimiter = ',', required = true)]
    pub balances: Vec<Decimal>,
}

#[derive(Args, Debug)]
pub struct TradeQuoteArgs {
    #[command(flatten)]
    pub pool: PoolArgs,

    /// Outcome index to trade.
    #[arg(long)]
    pub outcome: usize,

    /// Collateral invested (buy) or returned (sell).
    #[arg(long, conflicts_with = "tokens", required_unless_present = "tokens")]
    pub amount: Option<Decimal>,

    /// Outcome tokens received (buy) or given (sell).
    #[arg(long)]
    pub tokens: Option<Decimal>,

    /// Fee as a fraction; defaults to the configured market fee.
    #[arg(long)]
    pub fee: Option<Decimal>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (TOML).
    pub scenario: PathBuf,
}

/// Subcommands for `condmarket config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file.
    Validate,
}

/// Parse a `0x` address, or hash any other text into one.
fn parse_account(value: &str) -> Result<Address, String> {
    if value.starts_with("0x") {
        value.parse().map_err(|e| format!("invalid address: {e}"))
    } else if value.trim().is_empty() {
        Err("empty account name".to_string())
    } else {
        Ok(named_address(value))
    }
}
