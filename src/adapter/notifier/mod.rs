//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for logging.

mod logging;

pub use logging::LogNotifier;
