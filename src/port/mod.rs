//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  Ledger, MarketMaker,   │
//!     ┌──────────────┤  Factory, Venue         ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌──────────┐          ┌──────────────┐              ┌───────────┐
//! │Collateral│          │ Multi-balance│              │ Notifier  │
//! │  Vault   │          │ ledger/shares│              │  Adapter  │
//! └──────────┘          └──────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`CollateralVault`] - ERC20-like collateral token
//! - [`MultiBalanceLedger`] - ERC1155-like position balances
//! - [`FungibleShareToken`] - Pool ownership shares
//! - [`Notifier`] - Event notifications

mod balances;
mod collateral;
mod notifier;
mod shares;

pub use balances::MultiBalanceLedger;
pub use collateral::CollateralVault;
pub use notifier::{Event, Notifier, NotifierRegistry, NullNotifier};
pub use shares::FungibleShareToken;
