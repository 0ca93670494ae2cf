//! Handler for `condmarket simulate`.

use std::path::Path;

use serde_json::json;
use tabled::{Table, Tabled};
use tracing::info;

use super::output;
use crate::adapter::notifier::LogNotifier;
use crate::application::scenario::{Scenario, ScenarioReport, ScenarioRunner};
use crate::application::venue::Venue;
use crate::domain::named_address;
use crate::error::Result;
use crate::infrastructure::config::Config;

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Result")]
    result: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    name: String,
    #[tabled(rename = "Collateral")]
    collateral: String,
    #[tabled(rename = "Positions")]
    positions: usize,
}

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Market")]
    name: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Balances")]
    balances: String,
    #[tabled(rename = "Prices")]
    prices: String,
    #[tabled(rename = "Fees")]
    fees: String,
    #[tabled(rename = "Open")]
    open: &'static str,
}

/// Run `scenario` against a fresh venue and return its report.
pub fn run_scenario(scenario: &Scenario, config: &Config) -> Result<ScenarioReport> {
    let mut venue = Venue::new(named_address("ledger"), named_address("factory"));
    venue.register_notifier(Box::new(LogNotifier));

    let runner = ScenarioRunner::new(&venue, scenario, &config.market, &config.collateral)?;
    let report = runner.run(scenario)?;
    info!(steps = report.steps.len(), "scenario finished");
    Ok(report)
}

fn join<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Execute `simulate <file>`.
pub fn execute(path: &Path, config: &Config) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let report = run_scenario(&scenario, config)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "simulate",
            "scenario": path.display().to_string(),
            "report": report,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Scenario", report.name.as_deref().unwrap_or("unnamed"));
    output::field("Steps", report.steps.len());
    output::field("Clock", report.time);
    if output::verbosity() > 0 {
        output::field("Collateral", &report.symbol);
        output::field("Ledger", named_address("ledger"));
    }

    if !output::is_quiet() {
        output::section("Steps");
        let rows: Vec<StepRow> = report
            .steps
            .iter()
            .map(|s| StepRow {
                step: s.step,
                action: s.action.clone(),
                result: if s.succeeded { "ok" } else { "failed as expected" },
                detail: s.detail.clone(),
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }

    if !report.accounts.is_empty() {
        output::section("Accounts");
        let rows: Vec<AccountRow> = report
            .accounts
            .iter()
            .map(|a| AccountRow {
                name: a.name.clone(),
                collateral: format!("{} {}", a.collateral, report.symbol),
                positions: a.positions,
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }

    if !report.markets.is_empty() {
        output::section("Markets");
        let rows: Vec<MarketRow> = report
            .markets
            .iter()
            .map(|m| MarketRow {
                name: m.name.clone(),
                shares: m.total_shares.to_string(),
                balances: join(&m.balances),
                prices: join(
                    &m.prices
                        .iter()
                        .map(|p| p.round_dp(4))
                        .collect::<Vec<_>>(),
                ),
                fees: format!("{} / {}", m.collected_fees, m.withdrawn_fees),
                open: if m.can_trade { "yes" } else { "no" },
            })
            .collect();
        output::lines(&Table::new(rows).to_string());
    }

    output::success("Scenario completed");
    Ok(())
}
