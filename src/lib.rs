//! Condmarket - conditional tokens and fixed-product market makers.
//!
//! The crate models a combinatorial prediction market in memory: a ledger of
//! outcome-contingent positions backed by collateral, and automated market
//! makers that keep the product of their outcome balances constant.
//!
//! # Architecture
//!
//! - **`domain`** - Identifiers, index sets and partitions, conditions, and
//!   the fixed-point curve and fee-pool arithmetic. No state, no I/O.
//! - **`port`** - Traits for collateral, position balances, pool shares and
//!   event notification.
//! - **`adapter`** - In-memory implementations of the ports, a tracing
//!   notifier and the command-line interface.
//! - **`application`** - The conditional ledger, market makers, the pool
//!   factory, the serialized [`application::venue::Venue`] and the scenario
//!   runner.
//! - **`infrastructure`** - Configuration loading and logging setup.
//!
//! # Example
//!
//! ```no_run
//! use condmarket::application::venue::Venue;
//! use condmarket::domain::{named_address, QuestionId};
//!
//! let venue = Venue::new(named_address("ledger"), named_address("factory"));
//! let condition = venue
//!     .prepare_condition(named_address("oracle"), QuestionId::from_label("rain"), 2)
//!     .unwrap();
//! println!("prepared {condition}");
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
