//! Implementations of ports (hexagonal adapters).

pub mod inbound;
pub mod memory;
pub mod notifier;
