//! Errors raised by ledger edits.
//!
//! The engine itself never fails; only the mutating component that enforces
//! model invariants reports these.

use thiserror::Error;

use crate::types::{DebtId, GroupId, ParticipantId};

/// Why an edit to a ledger snapshot was refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("a trip needs at least {min} participants")]
    TooFewParticipants { min: usize },

    #[error("participant already exists: {0}")]
    DuplicateParticipant(ParticipantId),

    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("group already exists: {0}")]
    DuplicateGroup(GroupId),

    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    #[error("debt already exists: {0}")]
    DuplicateDebt(DebtId),

    #[error("unknown debt: {0}")]
    UnknownDebt(DebtId),

    #[error("a participant cannot owe themselves: {0}")]
    SelfDebt(ParticipantId),

    #[error("invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("currency already exists: {0}")]
    DuplicateCurrency(String),

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("invalid rate for {code}: {rate}")]
    InvalidRate { code: String, rate: f64 },

    #[error("the base currency rate is fixed at 1: {0}")]
    BaseRateFixed(String),

    #[error("the base currency cannot be removed: {0}")]
    CannotRemoveBase(String),

    #[error("currency {code} is used by {groups} group(s)")]
    CurrencyInUse { code: String, groups: usize },
}
