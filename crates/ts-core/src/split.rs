//! Share construction modes.
//!
//! Every mode collapses to a plain participant-to-amount mapping before a
//! group is stored; the engine never sees the mode.

use std::collections::BTreeMap;

use crate::model::Participant;
use crate::types::ParticipantId;

/// How a group's shares are derived from user input.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitMode {
    /// The whole total divided equally.
    Equal,
    /// `shared` divided equally, plus a per-participant top-up.
    Mixed {
        shared: f64,
        personal: BTreeMap<ParticipantId, f64>,
    },
    /// Shares entered directly.
    Custom(BTreeMap<ParticipantId, f64>),
}

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derives per-participant shares for a group of `total`.
pub fn compute_shares(
    mode: &SplitMode,
    total: f64,
    participants: &[Participant],
) -> BTreeMap<ParticipantId, f64> {
    match mode {
        SplitMode::Equal => {
            let per = equal_portion(total, participants.len());
            participants.iter().map(|p| (p.id.clone(), per)).collect()
        }
        SplitMode::Mixed { shared, personal } => {
            let per = equal_portion(*shared, participants.len());
            participants
                .iter()
                .map(|p| {
                    let top_up = personal.get(&p.id).copied().unwrap_or(0.0);
                    (p.id.clone(), per + top_up)
                })
                .collect()
        }
        SplitMode::Custom(shares) => shares.clone(),
    }
}

/// Remaining amount in mixed mode once the shared portion and top-ups are
/// accounted for. Non-zero means the entry does not add up to `total`.
pub fn mixed_slack(total: f64, shared: f64, personal: &BTreeMap<ParticipantId, f64>) -> f64 {
    total - shared - personal.values().sum::<f64>()
}

fn equal_portion(amount: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "participant counts are far below 2^52"
    )]
    let count = count as f64;
    round2(amount / count)
}
