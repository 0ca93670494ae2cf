//! Logging notifier.

use tracing::{debug, info};

use crate::port::{Event, Notifier};

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::ConditionPreparation {
                condition_id,
                oracle,
                question_id,
                outcome_slot_count,
            } => {
                info!(
                    condition_id = %condition_id,
                    oracle = %oracle,
                    question_id = %question_id,
                    outcomes = outcome_slot_count,
                    "Condition prepared"
                );
            }
            Event::ConditionResolution {
                condition_id,
                payout_numerators,
                ..
            } => {
                info!(
                    condition_id = %condition_id,
                    payouts = ?payout_numerators,
                    "Condition resolved"
                );
            }
            Event::PositionSplit {
                stakeholder,
                condition_id,
                partition,
                amount,
                ..
            } => {
                debug!(
                    stakeholder = %stakeholder,
                    condition_id = %condition_id,
                    sets = partition.len(),
                    amount = %amount,
                    "Position split"
                );
            }
            Event::PositionsMerge {
                stakeholder,
                condition_id,
                partition,
                amount,
                ..
            } => {
                debug!(
                    stakeholder = %stakeholder,
                    condition_id = %condition_id,
                    sets = partition.len(),
                    amount = %amount,
                    "Positions merged"
                );
            }
            Event::PayoutRedemption {
                redeemer,
                condition_id,
                payout,
                ..
            } => {
                info!(
                    redeemer = %redeemer,
                    condition_id = %condition_id,
                    payout = %payout,
                    "Payout redeemed"
                );
            }
            Event::PositionTransfer {
                from, to, positions, ..
            } => {
                debug!(from = %from, to = %to, positions = positions.len(), "Positions transferred");
            }
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            } => {
                debug!(owner = %owner, operator = %operator, approved, "Position approval set");
            }
            Event::MarketMakerCreation {
                creator,
                market_maker,
                condition_ids,
                fee,
                ..
            } => {
                info!(
                    creator = %creator,
                    market_maker = %market_maker,
                    conditions = condition_ids.len(),
                    fee = %fee,
                    "Market maker created"
                );
            }
            Event::FundingAdded {
                market_maker,
                funder,
                shares_minted,
                ..
            } => {
                info!(
                    market_maker = %market_maker,
                    funder = %funder,
                    shares = %shares_minted,
                    "Funding added"
                );
            }
            Event::FundingRemoved {
                market_maker,
                funder,
                shares_burnt,
                collateral_removed_from_fee_pool,
                ..
            } => {
                info!(
                    market_maker = %market_maker,
                    funder = %funder,
                    shares = %shares_burnt,
                    fees = %collateral_removed_from_fee_pool,
                    "Funding removed"
                );
            }
            Event::Buy {
                market_maker,
                buyer,
                investment_amount,
                fee_amount,
                outcome_index,
                outcome_tokens_bought,
            } => {
                info!(
                    market_maker = %market_maker,
                    buyer = %buyer,
                    investment = %investment_amount,
                    fee = %fee_amount,
                    outcome = outcome_index,
                    tokens = %outcome_tokens_bought,
                    "Buy"
                );
            }
            Event::Sell {
                market_maker,
                seller,
                return_amount,
                fee_amount,
                outcome_index,
                outcome_tokens_sold,
            } => {
                info!(
                    market_maker = %market_maker,
                    seller = %seller,
                    returned = %return_amount,
                    fee = %fee_amount,
                    outcome = outcome_index,
                    tokens = %outcome_tokens_sold,
                    "Sell"
                );
            }
            Event::SharesTransfer {
                market_maker,
                from,
                to,
                amount,
            } => {
                debug!(
                    market_maker = %market_maker,
                    from = %from,
                    to = %to,
                    amount = %amount,
                    "Shares transferred"
                );
            }
            Event::FeesWithdrawn {
                market_maker,
                account,
                amount,
            } => {
                info!(
                    market_maker = %market_maker,
                    account = %account,
                    amount = %amount,
                    "Fees withdrawn"
                );
            }
        }
    }
}
