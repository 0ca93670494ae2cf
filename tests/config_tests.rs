use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use condmarket::domain::RemovalPolicy;
use condmarket::error::{ConfigError, Error};
use condmarket::infrastructure::config::settings::Config;
use rust_decimal_macros::dec;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_temp_config(contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let suffix = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!("condmarket-config-test-{nanos}-{suffix}.toml"));
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn config_loads_every_section() {
    let toml = r#"
[logging]
level = "warn"
format = "json"

[market]
fee = "0.02"
treasury_bps = 1000
treasury = "0x00000000000000000000000000000000000000bb"
funding_threshold = "50"
removal_policy = "after_resolution"

[collateral]
symbol = "WETH"
decimals = 18
"#;

    let path = write_temp_config(toml);
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);

    let config = result.expect("config loads");
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.market.fee, dec!(0.02));
    assert_eq!(config.market.funding_threshold, dec!(50));
    assert_eq!(config.market.removal_policy, RemovalPolicy::AfterResolution);
    assert_eq!(config.collateral.decimals, 18);
}

#[test]
fn config_defaults_build_market_params() {
    let config = Config::default();
    let token = condmarket::domain::named_address("collateral:USDC");
    let params = config
        .market
        .params(token, config.collateral.decimals, Vec::new())
        .unwrap();
    assert_eq!(params.fee, condmarket::domain::fixed::fee_factor(dec!(0.003)).unwrap());
    assert_eq!(params.treasury_bps, 0);
    assert_eq!(params.removal_policy, RemovalPolicy::AfterResolution);
}

#[test]
fn config_rejects_excess_treasury_share() {
    let toml = r#"
[market]
treasury_bps = 20000
treasury = "0x00000000000000000000000000000000000000bb"
"#;

    let path = write_temp_config(toml);
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);

    match result {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "market.treasury_bps",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid treasury share error, got {err}"),
        Ok(config) => panic!(
            "Expected treasury share to be rejected, got {}",
            config.market.treasury_bps
        ),
    }
}

#[test]
fn config_rejects_too_many_decimals() {
    let path = write_temp_config("[collateral]\ndecimals = 30\n");
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "collateral.decimals",
            ..
        }))
    ));
}

#[test]
fn config_rejects_bad_log_level() {
    let path = write_temp_config("[logging]\nlevel = \"condmarket=loud\"\n");
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "logging.level",
            ..
        }))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let mut path = std::env::temp_dir();
    path.push("condmarket-config-test-does-not-exist.toml");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}
