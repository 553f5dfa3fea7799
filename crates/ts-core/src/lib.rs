//! Core domain logic for trip expense splitting.
//!
//! This crate contains the fundamental types and logic for:
//! - Ledger model: participants, currencies, expense groups, existing debts
//! - Balance computation: paid/owed/net per participant in base currency
//! - Settlement: greedy two-pointer matching of debtors to creditors
//! - Editing: validated snapshot mutations, undo history, sync echo guard
//!
//! The engine is pure: same snapshot in, same balances out, no I/O.

mod advisory;
mod balance;
pub mod currency;
mod editor;
mod error;
mod history;
pub mod model;
mod sample;
mod settlement;
pub mod split;
pub mod sync;
pub mod types;

pub use advisory::{SHARE_MISMATCH_WARNING_THRESHOLD, ShareMismatch, grand_total, share_mismatches};
pub use balance::{BalanceMap, Balances, compute_balances};
pub use currency::{Currency, CurrencySet, to_base};
pub use editor::MIN_PARTICIPANTS;
pub use error::LedgerError;
pub use history::{DEFAULT_HISTORY_LIMIT, History};
pub use model::{ExistingDebt, ExpenseGroup, LedgerSnapshot, Participant};
pub use settlement::{SETTLEMENT_EPSILON, Transfer, settle};
pub use split::{SplitMode, compute_shares};
pub use sync::EchoGuard;
pub use types::{DebtId, GroupId, ParticipantId, ValidationError};
