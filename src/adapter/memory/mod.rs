//! In-memory implementations of the ledger ports.

mod balances;
mod collateral;
mod shares;

pub use balances::MemoryBalances;
pub use collateral::MemoryCollateral;
pub use shares::ShareLedger;
