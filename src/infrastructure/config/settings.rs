//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section has defaults, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use condmarket::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::market::{CollateralConfig, MarketDefaults};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults for markets created without explicit parameters.
    #[serde(default)]
    pub market: MarketDefaults,

    /// Collateral used by scenarios and quotes.
    #[serde(default)]
    pub collateral: CollateralConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.market.validate()?;
        self.collateral.validate()
    }

    /// Initialize tracing from the logging section.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RemovalPolicy;
    use crate::error::Error;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.market.fee, dec!(0.003));
        assert_eq!(config.collateral.decimals, 6);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [market]
            fee = "0.01"
            treasury_bps = 2500
            treasury = "0x00000000000000000000000000000000000000aa"
            removal_policy = "anytime"

            [collateral]
            symbol = "DAI"
            decimals = 18
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.market.fee, dec!(0.01));
        assert_eq!(config.market.treasury_bps, 2500);
        assert_eq!(config.market.removal_policy, RemovalPolicy::Anytime);
        assert_eq!(config.collateral.symbol, "DAI");
    }

    #[test]
    fn fee_of_one_is_rejected() {
        let err = Config::parse_toml("[market]\nfee = \"1\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "market.fee", .. })
        ));
    }

    #[test]
    fn treasury_cut_needs_treasury() {
        let err = Config::parse_toml("[market]\ntreasury_bps = 100").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "market.treasury" })
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = Config::parse_toml("[logging]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "logging.format", .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::parse_toml("[market"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }
}
