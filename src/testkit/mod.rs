//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fixtures`] - Named accounts, unit helpers and pre-built venues.
//! - [`notifier`] - A notifier that records every event it receives.

pub mod fixtures;
pub mod notifier;
