//! Balance computation over a ledger snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::currency::CurrencySet;
use crate::model::{ExistingDebt, ExpenseGroup, LedgerSnapshot, Participant};
use crate::settlement::{Transfer, settle};
use crate::types::ParticipantId;

/// Per-participant amounts in base currency.
pub type BalanceMap = BTreeMap<ParticipantId, f64>;

/// Engine output for one snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    /// Total fronted by each participant.
    pub paid: BalanceMap,
    /// Total of each participant's shares.
    pub owed: BalanceMap,
    /// `paid - owed`, trip expenses only.
    pub trip_net: BalanceMap,
    /// `trip_net` adjusted by existing debts. Positive means owed money.
    pub final_net: BalanceMap,
    /// Settling transfers in emission order.
    pub transactions: Vec<Transfer>,
}

impl Balances {
    /// The participant's final net position; unknown ids are zero.
    pub fn net_of(&self, participant: &ParticipantId) -> f64 {
        self.final_net.get(participant).copied().unwrap_or(0.0)
    }
}

/// Computes paid/owed/net positions and the settling transfers.
///
/// Total over its input: groups paid by unknown participants add nothing to
/// `paid`, missing shares count as zero, unknown currency codes are treated
/// as base, and debts failing [`ExistingDebt::is_effective`] or naming
/// unknown participants only touch the endpoints that exist.
pub fn compute_balances(
    participants: &[Participant],
    groups: &[ExpenseGroup],
    existing_debts: &[ExistingDebt],
    currencies: &CurrencySet,
) -> Balances {
    let mut paid: BalanceMap = participants.iter().map(|p| (p.id.clone(), 0.0)).collect();
    let mut owed = paid.clone();

    for group in groups {
        let currency = group.currency.as_deref();
        if let Some(total) = paid.get_mut(&group.paid_by) {
            *total += currencies.to_base(group.total, currency);
        }
        for participant in participants {
            let share = currencies.to_base(group.share_of(&participant.id), currency);
            if let Some(total) = owed.get_mut(&participant.id) {
                *total += share;
            }
        }
    }

    let trip_net: BalanceMap = paid
        .iter()
        .map(|(id, paid)| (id.clone(), paid - owed.get(id).copied().unwrap_or(0.0)))
        .collect();

    let mut final_net = trip_net.clone();
    for debt in existing_debts.iter().filter(|d| d.is_effective()) {
        if let Some(net) = final_net.get_mut(&debt.to) {
            *net += debt.amount;
        }
        if let Some(net) = final_net.get_mut(&debt.from) {
            *net -= debt.amount;
        }
    }

    let transactions = settle(participants, &final_net);

    tracing::debug!(
        participants = participants.len(),
        groups = groups.len(),
        debts = existing_debts.len(),
        transfers = transactions.len(),
        "computed balances"
    );

    Balances {
        paid,
        owed,
        trip_net,
        final_net,
        transactions,
    }
}

impl LedgerSnapshot {
    /// Runs the engine against this snapshot.
    pub fn balances(&self) -> Balances {
        compute_balances(
            &self.participants,
            &self.groups,
            &self.existing_debts,
            &self.currencies,
        )
    }
}
