//! Command dispatch.

use std::path::Path;

use super::command::{Commands, ConfigCommand, IdsCommand, QuoteCommand};
use super::{config, ids, quote, simulate};
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Run a parsed command with the effective configuration.
pub fn execute(command: &Commands, config: &Config, source: Option<&Path>) -> Result<()> {
    match command {
        Commands::Ids(IdsCommand::Condition(args)) => ids::execute_condition(args),
        Commands::Ids(IdsCommand::Collection(args)) => ids::execute_collection(args),
        Commands::Ids(IdsCommand::Position(args)) => ids::execute_position(args),
        Commands::Quote(QuoteCommand::Buy(args)) => quote::execute_trade(args, config, true),
        Commands::Quote(QuoteCommand::Sell(args)) => quote::execute_trade(args, config, false),
        Commands::Quote(QuoteCommand::Prices(args)) => quote::execute_prices(args, config),
        Commands::Simulate(args) => simulate::execute(&args.scenario, config),
        Commands::Config(ConfigCommand::Show) => config::execute_show(config, source),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(source),
    }
}
