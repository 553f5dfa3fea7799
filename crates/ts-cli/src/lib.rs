//! Trip expense splitter CLI library.
//!
//! This crate provides the CLI interface over the ledger engine and the
//! trip store.

mod cli;
pub mod commands;
mod config;
pub mod writer;

pub use cli::{Cli, Commands, CurrencyAction, DebtAction, GroupAction, PersonAction, SplitArgs, SplitKind};
pub use config::Config;
