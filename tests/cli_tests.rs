//! CLI integration tests.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use condmarket::domain::{collection_id, condition_id, named_address, IndexSet, QuestionId};
use predicates::prelude::*;

fn condmarket() -> Command {
    let mut cmd = cargo_bin_cmd!("condmarket");
    cmd.env_remove("CONDMARKET_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

#[test]
fn test_help() {
    condmarket()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("condmarket"))
        .stdout(predicate::str::contains("ids"))
        .stdout(predicate::str::contains("quote"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn test_version() {
    condmarket()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_ids_condition_json() {
    let expected = condition_id(named_address("oracle"), QuestionId::from_label("rain"), 2);
    condmarket()
        .args([
            "ids", "condition", "--oracle", "oracle", "--question", "rain", "--outcomes", "2",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"ids.condition\""))
        .stdout(predicate::str::contains(expected.to_string()));
}

#[test]
fn test_ids_collection_chain() {
    let condition = condition_id(named_address("oracle"), QuestionId::from_label("rain"), 2);
    let expected = collection_id(Default::default(), condition, IndexSet::from(1u64));
    condmarket()
        .args(["ids", "collection", "--condition"])
        .arg(condition.to_string())
        .args(["--index-set", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string()));
}

#[test]
fn test_ids_rejects_bad_condition() {
    condmarket()
        .args(["ids", "collection", "--condition", "0x1234", "--index-set", "1"])
        .assert()
        .failure();
}

#[test]
fn test_quote_buy_json() {
    condmarket()
        .args([
            "quote", "buy", "--balances", "100,100", "--outcome", "0", "--amount", "10", "--fee",
            "0", "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"quote.buy\""))
        .stdout(predicate::str::contains("19.090909"));
}

#[test]
fn test_quote_prices_text() {
    condmarket()
        .args(["quote", "prices", "--balances", "100,300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.75"))
        .stdout(predicate::str::contains("0.25"));
}

#[test]
fn test_quote_rejects_bad_outcome() {
    condmarket()
        .args([
            "quote", "sell", "--balances", "100,100", "--outcome", "5", "--amount", "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outcome"));
}

#[test]
fn test_simulate_json() {
    condmarket()
        .arg("simulate")
        .arg(demo("binary.toml"))
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"simulate\""))
        .stdout(predicate::str::contains("90.963892"))
        .stdout(predicate::str::contains("1009.036108"));
}

#[test]
fn test_simulate_text() {
    condmarket()
        .arg("simulate")
        .arg(demo("binary.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("rain-market"))
        .stdout(predicate::str::contains("Scenario completed"));
}

#[test]
fn test_simulate_missing_file() {
    condmarket()
        .args(["simulate", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scenario"));
}

#[test]
fn test_config_show_defaults() {
    let dir = tempfile::tempdir().unwrap();
    condmarket()
        .current_dir(dir.path())
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"config.show\""))
        .stdout(predicate::str::contains("\"source\":null"));
}

#[test]
fn test_config_validate_reports_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[market]\nfee = \"1.5\"\n").unwrap();

    condmarket()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("market.fee"));
}

#[test]
fn test_config_validate_example() {
    condmarket()
        .args(["config", "validate", "--config"])
        .arg(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.toml.example"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is valid"));
}
