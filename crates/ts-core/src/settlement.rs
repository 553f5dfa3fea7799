//! Greedy minimum-transfer settlement.
//!
//! # Algorithm Summary
//!
//! 1. Split participants into debtors (`final_net < -ε`) and creditors
//!    (`final_net > ε`); anyone within `±ε` is settled. Non-finite nets are
//!    skipped.
//! 2. Sort both sides by outstanding amount, largest first (stable, so ties
//!    keep participant order).
//! 3. Sweep both lists with two cursors, paying `min(debt, credit)` each step
//!    and advancing whichever side drops below `ε`.
//!
//! This is not guaranteed to reach the theoretical minimum number of
//! transfers, but every step clears at least one side, so the sweep ends
//! after at most `debtors + creditors` steps.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::Participant;
use crate::types::ParticipantId;

/// Balances within this distance of zero are treated as settled.
pub const SETTLEMENT_EPSILON: f64 = 0.01;

/// A recommended payment from a net debtor to a net creditor, in base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
}

/// An outstanding debit or credit during the sweep.
#[derive(Debug)]
struct Position {
    id: ParticipantId,
    amount: f64,
}

/// Produces the transfers that zero out `final_net`.
///
/// `participants` fixes the classification order; ids missing from
/// `final_net` are skipped, as are repeated ids and non-finite nets.
pub fn settle(
    participants: &[Participant],
    final_net: &BTreeMap<ParticipantId, f64>,
) -> Vec<Transfer> {
    let mut seen = HashSet::new();
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for participant in participants {
        if !seen.insert(&participant.id) {
            continue;
        }
        let Some(&net) = final_net.get(&participant.id) else {
            continue;
        };
        if !net.is_finite() {
            tracing::warn!(participant = %participant.id, net, "skipping non-finite balance");
            continue;
        }
        if net < -SETTLEMENT_EPSILON {
            debtors.push(Position {
                id: participant.id.clone(),
                amount: -net,
            });
        } else if net > SETTLEMENT_EPSILON {
            creditors.push(Position {
                id: participant.id.clone(),
                amount: net,
            });
        }
    }

    debtors.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    creditors.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];
        let pay = debtor.amount.min(creditor.amount);
        if pay > SETTLEMENT_EPSILON {
            transfers.push(Transfer {
                from: debtor.id.clone(),
                to: creditor.id.clone(),
                amount: pay,
            });
        }
        debtor.amount -= pay;
        creditor.amount -= pay;
        if debtor.amount < SETTLEMENT_EPSILON {
            i += 1;
        }
        if creditor.amount < SETTLEMENT_EPSILON {
            j += 1;
        }
    }

    transfers
}
