//! CLI module graph.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod ids;
pub mod output;
pub mod quote;
pub mod simulate;
