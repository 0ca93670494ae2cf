//! Notifier port for ledger and market events.
//!
//! Services record an [`Event`] for every state transition. The venue hands
//! them to registered notifiers once the transition has committed, so a
//! failed operation never produces events.

use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::domain::id::{CollectionId, ConditionId, PositionId, QuestionId};
use crate::domain::index_set::IndexSet;

/// Events emitted by the ledger, factory and market makers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A condition was prepared.
    ConditionPreparation {
        condition_id: ConditionId,
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
    },
    /// An oracle reported payouts.
    ConditionResolution {
        condition_id: ConditionId,
        oracle: Address,
        question_id: QuestionId,
        outcome_slot_count: usize,
        payout_numerators: Vec<U256>,
    },
    /// Collateral or a parent position was split.
    PositionSplit {
        stakeholder: Address,
        collateral: Address,
        parent_collection_id: CollectionId,
        condition_id: ConditionId,
        partition: Vec<IndexSet>,
        amount: U256,
    },
    /// Positions were merged back.
    PositionsMerge {
        stakeholder: Address,
        collateral: Address,
        parent_collection_id: CollectionId,
        condition_id: ConditionId,
        partition: Vec<IndexSet>,
        amount: U256,
    },
    /// Resolved positions were redeemed.
    PayoutRedemption {
        redeemer: Address,
        collateral: Address,
        parent_collection_id: CollectionId,
        condition_id: ConditionId,
        index_sets: Vec<IndexSet>,
        payout: U256,
    },
    /// Positions moved between accounts.
    PositionTransfer {
        operator: Address,
        from: Address,
        to: Address,
        positions: Vec<PositionId>,
        amounts: Vec<U256>,
    },
    /// An operator was granted or denied access to an owner's positions.
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    /// A market maker was created.
    MarketMakerCreation {
        creator: Address,
        market_maker: Address,
        collateral: Address,
        condition_ids: Vec<ConditionId>,
        fee: U256,
    },
    /// Liquidity was added.
    FundingAdded {
        market_maker: Address,
        funder: Address,
        amounts_added: Vec<U256>,
        shares_minted: U256,
    },
    /// Liquidity was removed.
    FundingRemoved {
        market_maker: Address,
        funder: Address,
        amounts_removed: Vec<U256>,
        collateral_removed_from_fee_pool: U256,
        shares_burnt: U256,
    },
    /// Outcome tokens bought.
    Buy {
        market_maker: Address,
        buyer: Address,
        investment_amount: U256,
        fee_amount: U256,
        outcome_index: usize,
        outcome_tokens_bought: U256,
    },
    /// Outcome tokens sold.
    Sell {
        market_maker: Address,
        seller: Address,
        return_amount: U256,
        fee_amount: U256,
        outcome_index: usize,
        outcome_tokens_sold: U256,
    },
    /// Pool shares changed hands.
    SharesTransfer {
        market_maker: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    /// Accrued fees paid to a liquidity provider.
    FeesWithdrawn {
        market_maker: Address,
        account: Address,
        amount: U256,
    },
}

impl Event {
    /// Short snake_case name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConditionPreparation { .. } => "condition_preparation",
            Self::ConditionResolution { .. } => "condition_resolution",
            Self::PositionSplit { .. } => "position_split",
            Self::PositionsMerge { .. } => "positions_merge",
            Self::PayoutRedemption { .. } => "payout_redemption",
            Self::PositionTransfer { .. } => "position_transfer",
            Self::ApprovalForAll { .. } => "approval_for_all",
            Self::MarketMakerCreation { .. } => "market_maker_creation",
            Self::FundingAdded { .. } => "funding_added",
            Self::FundingRemoved { .. } => "funding_removed",
            Self::Buy { .. } => "buy",
            Self::Sell { .. } => "sell",
            Self::SharesTransfer { .. } => "shares_transfer",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
        }
    }
}

/// Trait for notification handlers.
///
/// Implementations must be thread-safe and should return quickly; the
/// venue calls them after releasing its state lock.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for tests or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}
