//! Built-in demo trip.

use std::collections::BTreeMap;

use crate::currency::{CurrencySet, DEFAULT_BASE_CODE, DEFAULT_BASE_SYMBOL};
use crate::model::{ExistingDebt, ExpenseGroup, LedgerSnapshot, Participant, color_for_index};
use crate::types::{DebtId, GroupId, ParticipantId};

const SAMPLE_PEOPLE: [(&str, &str); 4] = [
    ("K", "Avery"),
    ("J", "Jordan"),
    ("S", "Sam"),
    ("Y", "Riley"),
];

type SampleGroup = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    f64,
    &'static str,
    [f64; 4],
);

/// (id, label, emoji, payer, total, note, shares in `SAMPLE_PEOPLE` order)
const SAMPLE_GROUPS: [SampleGroup; 7] = [
    ("g1", "Flight Tickets", "✈️", "J", 76_621.0, "Paid for three travelers", [25_540.33, 25_540.33, 25_540.34, 0.0]),
    ("g2", "Solo Ticket", "🎟️", "Y", 24_392.0, "One person expense", [0.0, 0.0, 0.0, 24_392.0]),
    ("g3", "Common Cash", "💵", "J", 34_014.83, "Shared equally among all 4", [8_503.71, 8_503.71, 8_503.71, 8_503.70]),
    ("g4", "ATM Cash", "🏧", "Y", 20_826.0, "Individual spend by person", [7_480.74, 4_448.42, 4_448.42, 4_448.42]),
    ("g5", "Souvenirs", "🛒", "Y", 6_840.0, "Per person souvenir spend", [3_710.11, 0.0, 777.89, 2_352.0]),
    ("g6", "Hotels (3 Nights)", "🏨", "K", 28_526.11, "Split equally", [7_131.53, 7_131.53, 7_131.53, 7_131.52]),
    ("g7", "Shared Cash", "💰", "K", 39_231.0, "Split equally among all", [9_807.75, 9_807.75, 9_807.75, 9_807.75]),
];

impl LedgerSnapshot {
    /// The demo trip: four travellers, seven groups, one existing debt.
    pub fn sample() -> Self {
        let participants = SAMPLE_PEOPLE
            .iter()
            .enumerate()
            .map(|(i, (id, name))| {
                Participant::new(ParticipantId::from_static(*id), *name, color_for_index(i))
            })
            .collect();

        let groups = SAMPLE_GROUPS
            .iter()
            .map(|(id, label, emoji, payer, total, note, shares)| {
                let shares: BTreeMap<ParticipantId, f64> = SAMPLE_PEOPLE
                    .iter()
                    .zip(shares)
                    .map(|((person, _), share)| (ParticipantId::from_static(*person), *share))
                    .collect();
                let payer = ParticipantId::from_static(*payer);
                let mut group = ExpenseGroup::new(GroupId::from_static(*id), payer, *total)
                    .with_label(*label)
                    .with_shares(shares);
                group.emoji = (*emoji).to_string();
                group.note = (*note).to_string();
                group
            })
            .collect();

        let existing_debts = vec![ExistingDebt {
            id: DebtId::from_static("d1"),
            from: ParticipantId::from_static("J"),
            to: ParticipantId::from_static("K"),
            amount: 40_000.0,
        }];

        Self {
            name: "Thailand Trip".to_string(),
            participants,
            groups,
            currencies: CurrencySet::with_base(DEFAULT_BASE_CODE, DEFAULT_BASE_SYMBOL),
            existing_debts,
        }
    }
}
