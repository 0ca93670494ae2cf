//! Infrastructure configuration modules.

pub mod logging;
pub mod market;
pub mod settings;

pub use logging::LoggingConfig;
pub use market::{CollateralConfig, MarketDefaults};
pub use settings::Config;
