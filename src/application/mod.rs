//! Application services.
//!
//! These services compose domain logic with the ledger ports: the
//! conditional ledger, market makers and their factory, the venue that
//! serializes every operation, and the scenario runner.

pub mod factory;
pub mod ledger;
pub mod market_maker;
pub mod scenario;
pub mod venue;

pub use factory::PoolFactory;
pub use ledger::ConditionalLedger;
pub use market_maker::MarketMaker;
pub use scenario::{Scenario, ScenarioReport, ScenarioRunner};
pub use venue::{Venue, VenueState};
