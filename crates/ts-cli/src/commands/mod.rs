//! CLI subcommand implementations.

pub mod activity;
pub mod balances;
pub mod currency;
pub mod debt;
pub mod group;
pub mod history;
pub mod person;
pub mod report;
pub mod trip;
pub mod util;
pub mod watch;
pub mod writer;
