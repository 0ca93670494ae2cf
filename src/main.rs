use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use condmarket::adapter::inbound::cli::command::{Cli, Commands, ConfigCommand};
use condmarket::adapter::inbound::cli::{config, dispatch, output};

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Config(ConfigCommand::Validate) = &cli.command {
        return Ok(config::execute_validate(cli.config.as_deref())?);
    }

    let (mut settings, source) =
        config::resolve(cli.config.as_deref()).context("failed to load configuration")?;
    match cli.verbose {
        0 => {}
        1 => settings.logging.level = "debug".into(),
        _ => settings.logging.level = "trace".into(),
    }
    settings.init_logging();
    debug!(source = ?source, "configuration loaded");

    dispatch::execute(&cli.command, &settings, source.as_deref())?;
    Ok(())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
