//! Handler for the `config` command group.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde_json::json;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Resolve the configuration in effect.
///
/// An explicit path must exist. Without one, `config.toml` in the working
/// directory is used when present, otherwise built-in defaults.
#[allow(clippy::result_large_err)]
pub fn resolve(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    match path {
        Some(path) => Ok((Config::load(path)?, Some(path.to_path_buf()))),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                Ok((Config::load(&fallback)?, Some(fallback)))
            } else {
                Ok((Config::default(), None))
            }
        }
    }
}

fn source_label(source: Option<&Path>) -> String {
    source.map_or_else(|| "(built-in defaults)".to_string(), |p| p.display().to_string())
}

/// Execute `config show`.
pub fn execute_show(config: &Config, source: Option<&Path>) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "source": source.map(|p| p.display().to_string()),
            "config": config,
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Source", source_label(source));

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);

    output::section("Collateral");
    output::field("Symbol", &config.collateral.symbol);
    output::field("Decimals", config.collateral.decimals);

    output::section("Market Defaults");
    output::field(
        "Fee",
        format!("{}%", (config.market.fee * Decimal::ONE_HUNDRED).normalize()),
    );
    output::field("Treasury cut", format!("{} bps", config.market.treasury_bps));
    match config.market.treasury {
        Some(treasury) => output::field("Treasury", treasury),
        None => output::field("Treasury", output::muted("(none)")),
    }
    output::field(
        "Threshold",
        format!("{} {}", config.market.funding_threshold, config.collateral.symbol),
    );
    output::field("Removal", config.market.removal_policy);

    Ok(())
}

/// Execute `config validate`.
#[allow(clippy::result_large_err)]
pub fn execute_validate(path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
    Config::load(&path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config.validate",
            "path": path.display().to_string(),
            "valid": true,
        }));
        return Ok(());
    }

    output::section("Config Validation");
    output::field("Path", path.display());
    output::success("Config file is valid");
    output::hint(&format!("condmarket config show -c {}", path.display()));
    Ok(())
}
