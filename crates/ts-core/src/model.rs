//! Ledger model: participants, expense groups, existing debts and the
//! snapshot the engine consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::currency::CurrencySet;
use crate::types::{DebtId, GroupId, ParticipantId};

/// Palette assigned to participants, cycled by index.
pub const MEMBER_COLORS: [&str; 8] = [
    "#C17D3C", "#3C7DC1", "#7C3CC1", "#3CC17D", "#C13C6A", "#3CC1B8", "#C1A03C", "#6A3CC1",
];

/// Emoji used for groups created without one.
pub const DEFAULT_GROUP_EMOJI: &str = "💳";

/// Returns the palette color for the participant at `index`.
pub fn color_for_index(index: usize) -> &'static str {
    MEMBER_COLORS[index % MEMBER_COLORS.len()]
}

/// Derives display initials from a name.
///
/// Takes the first letters of the first two whitespace-separated words, or
/// the first two characters when the name is a single word.
pub fn make_initials(name: &str) -> String {
    let name = name.trim();
    let mut words = name.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
        _ => name.chars().take(2).collect::<String>().to_uppercase(),
    }
}

/// A person sharing the trip's expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Presentation-only palette color.
    #[serde(default)]
    pub color: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }

    /// Initials shown in avatars, derived from the current name.
    pub fn initials(&self) -> String {
        make_initials(&self.name)
    }
}

fn default_emoji() -> String {
    DEFAULT_GROUP_EMOJI.to_string()
}

/// One shared expense event.
///
/// `shares` are denominated in the same currency as `total` and are not
/// required to sum to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseGroup {
    pub id: GroupId,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default)]
    pub note: String,
    pub paid_by: ParticipantId,
    pub total: f64,
    /// Currency code; absent means the base currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub shares: BTreeMap<ParticipantId, f64>,
}

impl ExpenseGroup {
    /// Creates a group in the base currency with no label, note or shares.
    pub fn new(id: GroupId, paid_by: ParticipantId, total: f64) -> Self {
        Self {
            id,
            label: String::new(),
            emoji: default_emoji(),
            note: String::new(),
            paid_by,
            total,
            currency: None,
            shares: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currency = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_shares(mut self, shares: BTreeMap<ParticipantId, f64>) -> Self {
        self.shares = shares;
        self
    }

    /// The participant's share in the group currency; absent shares are zero.
    pub fn share_of(&self, participant: &ParticipantId) -> f64 {
        self.shares.get(participant).copied().unwrap_or(0.0)
    }

    /// Sum of all recorded shares in the group currency.
    pub fn shares_total(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Whether this group is denominated in `code`.
    pub fn uses_currency(&self, code: &str) -> bool {
        self.currency.as_deref() == Some(code)
    }
}

/// An out-of-band obligation in base currency, not tied to any group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingDebt {
    pub id: DebtId,
    /// Who owes.
    pub from: ParticipantId,
    /// Who is owed.
    pub to: ParticipantId,
    pub amount: f64,
}

impl ExistingDebt {
    /// Whether the engine folds this debt into final balances.
    ///
    /// Self-debts and non-positive (or NaN) amounts are ignored.
    pub fn is_effective(&self) -> bool {
        self.from != self.to && self.amount > 0.0
    }

    /// Whether either endpoint is `participant`.
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.from == participant || &self.to == participant
    }
}

/// The full ledger state at one point in time.
///
/// This is the unit the engine consumes and the unit the application
/// persists, syncs and tracks in undo history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Trip display name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub groups: Vec<ExpenseGroup>,
    #[serde(default)]
    pub currencies: CurrencySet,
    #[serde(default)]
    pub existing_debts: Vec<ExistingDebt>,
}

impl LedgerSnapshot {
    /// Creates an empty trip with the given currency set.
    pub fn new(name: impl Into<String>, currencies: CurrencySet) -> Self {
        Self {
            name: name.into(),
            participants: Vec::new(),
            groups: Vec::new(),
            currencies,
            existing_debts: Vec::new(),
        }
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn group(&self, id: &GroupId) -> Option<&ExpenseGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Display name for a participant id, falling back to the raw id.
    pub fn display_name<'a>(&'a self, id: &'a ParticipantId) -> &'a str {
        self.participant(id).map_or(id.as_str(), |p| p.name.as_str())
    }

    /// Whether the ledger holds any groups or existing debts.
    pub fn has_entries(&self) -> bool {
        !self.groups.is_empty() || !self.existing_debts.is_empty()
    }
}
