//! Pure domain logic: identifiers, partitions, conditions and AMM math.
//!
//! Nothing here holds state beyond values or performs I/O. Services in
//! the application layer compose these pieces with the ledger ports.

pub mod condition;
pub mod curve;
pub mod error;
pub mod fee_pool;
pub mod fixed;
pub mod id;
pub mod identifier;
pub mod index_set;
pub mod market;
pub mod solver;

pub use condition::{Condition, ConditionStatus};
pub use error::DomainError;
pub use fee_pool::FeePool;
pub use id::{CollectionId, ConditionId, PositionId, QuestionId};
pub use identifier::{collection_id, condition_id, named_address, position_id, OutcomeLayout};
pub use index_set::{IndexSet, Partition};
pub use market::{MarketMakerParams, RemovalPolicy};
