//! Scripted market sessions.
//!
//! A scenario file names its accounts, then lists steps that run one by one
//! against a [`Venue`]. Each step is one transaction. A step may declare
//! `expect_error`; it then passes only if it fails with a message containing
//! that text.
//!
//! ```toml
//! accounts = ["alice", "bob", "oracle"]
//!
//! [[steps]]
//! action = "mint"
//! account = "alice"
//! amount = "100"
//!
//! [[steps]]
//! action = "prepare_condition"
//! name = "rain"
//! oracle = "oracle"
//! outcomes = 2
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::venue::Venue;
use crate::domain::fixed::{fee_factor, from_base_units, to_base_units};
use crate::domain::{
    named_address, CollectionId, ConditionId, IndexSet, QuestionId, RemovalPolicy,
};
use crate::error::{Error, Result, ScenarioError};
use crate::infrastructure::config::{CollateralConfig, MarketDefaults};

/// Name of the ledger's custody account when used as a spender.
pub const LEDGER_ACCOUNT: &str = "ledger";

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Initial value of the logical clock.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Overrides the configured collateral.
    #[serde(default)]
    pub collateral: Option<CollateralConfig>,
    /// Approve the ledger or pool for exactly the amount each step moves.
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

const fn default_auto_approve() -> bool {
    true
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Text the failure message must contain.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Operations a step can perform. Amounts are in collateral units.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Mint {
        account: String,
        amount: Decimal,
    },
    Approve {
        account: String,
        /// An account, a market, or `ledger`.
        spender: String,
        amount: Decimal,
    },
    ApprovePositions {
        account: String,
        /// An account or a market.
        operator: String,
        #[serde(default = "default_approved")]
        approved: bool,
    },
    PrepareCondition {
        name: String,
        oracle: String,
        /// Question text or a 0x-prefixed id; defaults to `name`.
        #[serde(default)]
        question: Option<String>,
        outcomes: usize,
    },
    ReportPayouts {
        condition: String,
        payouts: Vec<u64>,
    },
    Split {
        account: String,
        condition: String,
        /// Index sets as integers; defaults to one set per outcome.
        #[serde(default)]
        partition: Vec<u64>,
        amount: Decimal,
    },
    Merge {
        account: String,
        condition: String,
        #[serde(default)]
        partition: Vec<u64>,
        amount: Decimal,
    },
    Redeem {
        account: String,
        condition: String,
        #[serde(default)]
        index_sets: Vec<u64>,
    },
    CreateMarket {
        name: String,
        creator: String,
        conditions: Vec<String>,
        #[serde(default)]
        fee: Option<Decimal>,
        #[serde(default)]
        treasury: Option<String>,
        #[serde(default)]
        treasury_bps: Option<u16>,
        #[serde(default)]
        funding_threshold: Option<Decimal>,
        #[serde(default)]
        end_time: Option<DateTime<Utc>>,
        #[serde(default)]
        removal_policy: Option<RemovalPolicy>,
    },
    AddFunding {
        market: String,
        account: String,
        amount: Decimal,
        #[serde(default)]
        hint: Vec<u64>,
    },
    RemoveFunding {
        market: String,
        account: String,
        /// Defaults to every share the account holds.
        #[serde(default)]
        shares: Option<Decimal>,
    },
    Buy {
        market: String,
        account: String,
        amount: Decimal,
        outcome: usize,
        #[serde(default)]
        min_tokens: Decimal,
    },
    Sell {
        market: String,
        account: String,
        /// Collateral to receive.
        amount: Decimal,
        outcome: usize,
        #[serde(default)]
        max_tokens: Option<Decimal>,
    },
    WithdrawFees {
        market: String,
        account: String,
    },
    TransferShares {
        market: String,
        from: String,
        to: String,
        amount: Decimal,
    },
    AdvanceTime {
        seconds: u64,
    },
}

const fn default_approved() -> bool {
    true
}

impl Action {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::ApprovePositions { .. } => "approve_positions",
            Self::PrepareCondition { .. } => "prepare_condition",
            Self::ReportPayouts { .. } => "report_payouts",
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
            Self::Redeem { .. } => "redeem",
            Self::CreateMarket { .. } => "create_market",
            Self::AddFunding { .. } => "add_funding",
            Self::RemoveFunding { .. } => "remove_funding",
            Self::Buy { .. } => "buy",
            Self::Sell { .. } => "sell",
            Self::WithdrawFees { .. } => "withdraw_fees",
            Self::TransferShares { .. } => "transfer_shares",
            Self::AdvanceTime { .. } => "advance_time",
        }
    }
}

impl Scenario {
    /// Parse a scenario from TOML content.
    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ScenarioError::Parse)?)
    }

    /// Load a scenario from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ScenarioError::ReadFile)?;
        Self::parse_toml(&content)
    }
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// One-based position in the file.
    pub step: usize,
    pub action: String,
    /// False for a step that failed as expected.
    pub succeeded: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    pub name: String,
    pub address: Address,
    pub collateral: Decimal,
    /// Number of distinct non-zero positions held.
    pub positions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketReport {
    pub name: String,
    pub address: Address,
    pub total_shares: Decimal,
    pub liquidity: Decimal,
    pub balances: Vec<Decimal>,
    /// Empty while the pool is unfunded.
    pub prices: Vec<Decimal>,
    pub collected_fees: Decimal,
    pub withdrawn_fees: Decimal,
    pub can_trade: bool,
}

/// Final state after a scenario ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub name: Option<String>,
    pub symbol: String,
    pub time: u64,
    pub steps: Vec<StepOutcome>,
    pub accounts: Vec<AccountReport>,
    pub markets: Vec<MarketReport>,
}

#[derive(Debug, Clone, Copy)]
struct PreparedCondition {
    id: ConditionId,
    question: QuestionId,
    oracle: Address,
    outcomes: usize,
}

/// Runs a [`Scenario`] against a venue, resolving names to addresses.
pub struct ScenarioRunner<'a> {
    venue: &'a Venue,
    defaults: MarketDefaults,
    collateral: CollateralConfig,
    token: Address,
    auto_approve: bool,
    accounts: BTreeMap<String, Address>,
    conditions: BTreeMap<String, PreparedCondition>,
    markets: BTreeMap<String, Address>,
}

impl<'a> ScenarioRunner<'a> {
    /// Prepare a run on `venue`. The scenario's collateral section, if any,
    /// replaces `collateral`.
    pub fn new(
        venue: &'a Venue,
        scenario: &Scenario,
        defaults: &MarketDefaults,
        collateral: &CollateralConfig,
    ) -> Result<Self> {
        let collateral = scenario.collateral.clone().unwrap_or_else(|| collateral.clone());
        let token = named_address(&format!("collateral:{}", collateral.symbol));

        let mut accounts = BTreeMap::new();
        for name in &scenario.accounts {
            if name == LEDGER_ACCOUNT || accounts.insert(name.clone(), named_address(name)).is_some() {
                return Err(ScenarioError::DuplicateName {
                    kind: "account",
                    name: name.clone(),
                }
                .into());
            }
        }

        Ok(Self {
            venue,
            defaults: defaults.clone(),
            collateral,
            token,
            auto_approve: scenario.auto_approve,
            accounts,
            conditions: BTreeMap::new(),
            markets: BTreeMap::new(),
        })
    }

    /// Address of the collateral token used by the run.
    #[must_use]
    pub fn token(&self) -> Address {
        self.token
    }

    /// Run every step and report the final state.
    ///
    /// # Errors
    ///
    /// - [`ScenarioError::StepFailed`] for an unexpected failure
    /// - [`ScenarioError::UnexpectedSuccess`] when an expected failure did
    ///   not happen
    /// - [`ScenarioError::UnknownName`] or [`ScenarioError::DuplicateName`]
    ///   for unresolvable names
    pub fn run(mut self, scenario: &Scenario) -> Result<ScenarioReport> {
        if self.venue.read(|s| s.collateral(self.token).is_err()) {
            self.venue
                .create_collateral(self.token, &self.collateral.symbol, self.collateral.decimals)?;
        }
        if let Some(start) = scenario.start_time {
            self.venue.set_time(u64::try_from(start.timestamp()).unwrap_or(0));
        }
        info!(
            scenario = scenario.name.as_deref().unwrap_or("unnamed"),
            steps = scenario.steps.len(),
            "running scenario"
        );

        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (i, step) in scenario.steps.iter().enumerate() {
            let number = i + 1;
            let action = step.action.name();
            debug!(step = number, action, "executing step");

            let outcome = match (self.execute(&step.action), &step.expect_error) {
                (Err(Error::Scenario(e)), _) => return Err(e.into()),
                (Ok(detail), None) => StepOutcome {
                    step: number,
                    action: action.to_string(),
                    succeeded: true,
                    detail,
                },
                (Ok(_), Some(expected)) => {
                    return Err(ScenarioError::UnexpectedSuccess {
                        step: number,
                        action: action.to_string(),
                        expected: expected.clone(),
                    }
                    .into())
                }
                (Err(e), Some(expected))
                    if e.to_string().to_lowercase().contains(&expected.to_lowercase()) =>
                {
                    StepOutcome {
                        step: number,
                        action: action.to_string(),
                        succeeded: false,
                        detail: e.to_string(),
                    }
                }
                (Err(e), _) => {
                    return Err(ScenarioError::StepFailed {
                        step: number,
                        action: action.to_string(),
                        source: Box::new(e),
                    }
                    .into())
                }
            };
            outcomes.push(outcome);
        }

        self.report(scenario, outcomes)
    }

    fn execute(&mut self, action: &Action) -> Result<String> {
        let venue = self.venue;
        let token = self.token;
        match action {
            Action::Mint { account, amount } => {
                let to = self.account(account)?;
                venue.mint_collateral(token, to, self.units(*amount)?)?;
                Ok(format!("minted {amount} to {account}"))
            }
            Action::Approve {
                account,
                spender,
                amount,
            } => {
                let owner = self.account(account)?;
                let spender_address = self.spender(spender)?;
                venue.approve_collateral(token, owner, spender_address, self.units(*amount)?)?;
                Ok(format!("{account} approved {spender} for {amount}"))
            }
            Action::ApprovePositions {
                account,
                operator,
                approved,
            } => {
                let owner = self.account(account)?;
                let operator_address = self.operator(operator)?;
                venue.set_approval_for_all(owner, operator_address, *approved)?;
                Ok(format!("{account} set position approval of {operator} to {approved}"))
            }
            Action::PrepareCondition {
                name,
                oracle,
                question,
                outcomes,
            } => {
                if self.conditions.contains_key(name) {
                    return Err(ScenarioError::DuplicateName {
                        kind: "condition",
                        name: name.clone(),
                    }
                    .into());
                }
                let oracle_address = self.account(oracle)?;
                let question_id = QuestionId::from_label(question.as_deref().unwrap_or(name));
                let id = venue.prepare_condition(oracle_address, question_id, *outcomes)?;
                self.conditions.insert(
                    name.clone(),
                    PreparedCondition {
                        id,
                        question: question_id,
                        oracle: oracle_address,
                        outcomes: *outcomes,
                    },
                );
                Ok(format!("prepared {name} with {outcomes} outcomes as {id}"))
            }
            Action::ReportPayouts { condition, payouts } => {
                let prepared = self.condition(condition)?;
                let payouts: Vec<U256> = payouts.iter().map(|p| U256::from(*p)).collect();
                venue.report_payouts(prepared.oracle, prepared.question, &payouts)?;
                Ok(format!("resolved {condition} with {payouts:?}"))
            }
            Action::Split {
                account,
                condition,
                partition,
                amount,
            } => {
                let caller = self.account(account)?;
                let prepared = self.condition(condition)?;
                let sets = index_sets(partition, prepared.outcomes);
                let amount_units = self.units(*amount)?;
                let (ledger, auto) = (venue.read(|s| s.ledger().address()), self.auto_approve);
                venue.transact(|s| {
                    if auto {
                        s.approve_collateral(token, caller, ledger, amount_units)?;
                    }
                    s.split_position(caller, token, CollectionId::ROOT, prepared.id, &sets, amount_units)
                })?;
                Ok(format!("{account} split {amount} over {condition}"))
            }
            Action::Merge {
                account,
                condition,
                partition,
                amount,
            } => {
                let caller = self.account(account)?;
                let prepared = self.condition(condition)?;
                let sets = index_sets(partition, prepared.outcomes);
                venue.merge_positions(
                    caller,
                    token,
                    CollectionId::ROOT,
                    prepared.id,
                    &sets,
                    self.units(*amount)?,
                )?;
                Ok(format!("{account} merged {amount} over {condition}"))
            }
            Action::Redeem {
                account,
                condition,
                index_sets: sets,
            } => {
                let caller = self.account(account)?;
                let prepared = self.condition(condition)?;
                let sets = index_sets(sets, prepared.outcomes);
                let paid =
                    venue.redeem_positions(caller, token, CollectionId::ROOT, prepared.id, &sets)?;
                Ok(format!("{account} redeemed {}", self.display(paid)?))
            }
            Action::CreateMarket {
                name,
                creator,
                conditions,
                fee,
                treasury,
                treasury_bps,
                funding_threshold,
                end_time,
                removal_policy,
            } => {
                if self.markets.contains_key(name) {
                    return Err(ScenarioError::DuplicateName {
                        kind: "market",
                        name: name.clone(),
                    }
                    .into());
                }
                let creator_address = self.account(creator)?;
                let ids = conditions
                    .iter()
                    .map(|c| self.condition(c).map(|p| p.id))
                    .collect::<Result<Vec<_>>>()?;

                let mut params =
                    self.defaults
                        .params(token, self.collateral.decimals, ids)?;
                if let Some(fee) = fee {
                    params.fee = fee_factor(*fee)?;
                }
                if let Some(treasury) = treasury {
                    params.treasury = self.account(treasury)?;
                }
                if let Some(bps) = treasury_bps {
                    params.treasury_bps = *bps;
                }
                if let Some(threshold) = funding_threshold {
                    params.funding_threshold = self.units(*threshold)?;
                }
                if let Some(end) = end_time {
                    params.end_time = Some(u64::try_from(end.timestamp()).unwrap_or(0));
                }
                if let Some(policy) = removal_policy {
                    params.removal_policy = *policy;
                }

                let address = venue.create_market_maker(creator_address, params)?;
                self.markets.insert(name.clone(), address);
                Ok(format!("created {name} at {address}"))
            }
            Action::AddFunding {
                market,
                account,
                amount,
                hint,
            } => {
                let pool = self.market(market)?;
                let funder = self.account(account)?;
                let amount_units = self.units(*amount)?;
                let hint: Vec<U256> = hint.iter().map(|h| U256::from(*h)).collect();
                let auto = self.auto_approve;
                let minted = venue.transact(|s| {
                    if auto {
                        s.approve_collateral(token, funder, pool, amount_units)?;
                    }
                    s.add_funding(pool, funder, amount_units, &hint)
                })?;
                Ok(format!("{account} added {amount} for {} shares", self.display(minted)?))
            }
            Action::RemoveFunding {
                market,
                account,
                shares,
            } => {
                let pool = self.market(market)?;
                let holder = self.account(account)?;
                let shares = match shares {
                    Some(shares) => Some(self.units(*shares)?),
                    None => None,
                };
                let removed = venue.transact(|s| {
                    let burn = match shares {
                        Some(shares) => shares,
                        None => s.market(pool)?.shares_of(holder),
                    };
                    s.remove_funding(pool, holder, burn)
                })?;
                let removed = removed
                    .into_iter()
                    .map(|a| self.display(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{account} received positions {removed:?}"))
            }
            Action::Buy {
                market,
                account,
                amount,
                outcome,
                min_tokens,
            } => {
                let pool = self.market(market)?;
                let buyer = self.account(account)?;
                let investment = self.units(*amount)?;
                let min_out = self.units(*min_tokens)?;
                let auto = self.auto_approve;
                let bought = venue.transact(|s| {
                    if auto {
                        s.approve_collateral(token, buyer, pool, investment)?;
                    }
                    s.buy(pool, buyer, investment, *outcome, min_out)
                })?;
                Ok(format!(
                    "{account} bought {} of outcome {outcome} for {amount}",
                    self.display(bought)?
                ))
            }
            Action::Sell {
                market,
                account,
                amount,
                outcome,
                max_tokens,
            } => {
                let pool = self.market(market)?;
                let seller = self.account(account)?;
                let return_amount = self.units(*amount)?;
                let max_in = match max_tokens {
                    Some(max) => self.units(*max)?,
                    None => U256::MAX,
                };
                let auto = self.auto_approve;
                let sold = venue.transact(|s| {
                    if auto {
                        s.set_approval_for_all(seller, pool, true);
                    }
                    s.sell(pool, seller, return_amount, *outcome, max_in)
                })?;
                Ok(format!(
                    "{account} sold {} of outcome {outcome} for {amount}",
                    self.display(sold)?
                ))
            }
            Action::WithdrawFees { market, account } => {
                let pool = self.market(market)?;
                let holder = self.account(account)?;
                let paid = venue.withdraw_fees(pool, holder)?;
                Ok(format!("{account} withdrew {} in fees", self.display(paid)?))
            }
            Action::TransferShares {
                market,
                from,
                to,
                amount,
            } => {
                let pool = self.market(market)?;
                let sender = self.account(from)?;
                let receiver = self.account(to)?;
                venue.transfer_shares(pool, sender, receiver, self.units(*amount)?)?;
                Ok(format!("{from} sent {amount} shares to {to}"))
            }
            Action::AdvanceTime { seconds } => {
                venue.advance_time(*seconds);
                Ok(format!("clock at {}", venue.now()))
            }
        }
    }

    fn report(&self, scenario: &Scenario, steps: Vec<StepOutcome>) -> Result<ScenarioReport> {
        let state = self.venue.snapshot();

        let accounts = self
            .accounts
            .iter()
            .map(|(name, address)| {
                Ok(AccountReport {
                    name: name.clone(),
                    address: *address,
                    collateral: self.display(state.collateral_balance(self.token, *address))?,
                    positions: state.ledger().balances().holdings(*address).count(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut markets = Vec::with_capacity(self.markets.len());
        for (name, address) in &self.markets {
            let pool = state.market(*address)?;
            let balances = pool.pool_balances(state.ledger());
            markets.push(MarketReport {
                name: name.clone(),
                address: *address,
                total_shares: self.display(pool.total_shares())?,
                liquidity: self.display(pool.current_liquidity())?,
                balances: balances
                    .iter()
                    .map(|b| self.display(*b))
                    .collect::<Result<Vec<_>>>()?,
                prices: pool.outcome_prices(state.ledger()).unwrap_or_default(),
                collected_fees: self.display(pool.collected_fees())?,
                withdrawn_fees: self.display(pool.withdrawn_fees())?,
                can_trade: pool.can_trade(state.ledger(), state.now()),
            });
        }

        Ok(ScenarioReport {
            name: scenario.name.clone(),
            symbol: self.collateral.symbol.clone(),
            time: state.now(),
            steps,
            accounts,
            markets,
        })
    }

    fn units(&self, amount: Decimal) -> Result<U256> {
        Ok(to_base_units(amount, self.collateral.decimals)?)
    }

    fn display(&self, units: U256) -> Result<Decimal> {
        Ok(from_base_units(units, self.collateral.decimals)?)
    }

    fn account(&self, name: &str) -> Result<Address> {
        self.accounts.get(name).copied().ok_or_else(|| {
            ScenarioError::UnknownName {
                kind: "account",
                name: name.to_string(),
            }
            .into()
        })
    }

    fn condition(&self, name: &str) -> Result<PreparedCondition> {
        self.conditions.get(name).copied().ok_or_else(|| {
            ScenarioError::UnknownName {
                kind: "condition",
                name: name.to_string(),
            }
            .into()
        })
    }

    fn market(&self, name: &str) -> Result<Address> {
        self.markets.get(name).copied().ok_or_else(|| {
            ScenarioError::UnknownName {
                kind: "market",
                name: name.to_string(),
            }
            .into()
        })
    }

    fn operator(&self, name: &str) -> Result<Address> {
        self.market(name).or_else(|_| self.account(name))
    }

    fn spender(&self, name: &str) -> Result<Address> {
        if name == LEDGER_ACCOUNT {
            return Ok(self.venue.read(|s| s.ledger().address()));
        }
        self.operator(name)
    }
}

/// Integers to index sets; empty means one set per outcome.
fn index_sets(raw: &[u64], outcomes: usize) -> Vec<IndexSet> {
    if raw.is_empty() {
        (0..outcomes).map(IndexSet::singleton).collect()
    } else {
        raw.iter().map(|bits| IndexSet::from(*bits)).collect()
    }
}
