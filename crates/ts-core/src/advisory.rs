//! Advisory checks surfaced alongside engine output.
//!
//! None of these block computation; they exist for display.

use serde::{Deserialize, Serialize};

use crate::currency::CurrencySet;
use crate::model::ExpenseGroup;
use crate::types::GroupId;

/// A group whose shares differ from its total by more than this is flagged.
pub const SHARE_MISMATCH_WARNING_THRESHOLD: f64 = 0.5;

/// How far a group's shares drift from its total, in the group currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMismatch {
    pub group_id: GroupId,
    pub total: f64,
    pub shares_total: f64,
    /// `total - shares_total`; positive means under-allocated.
    pub difference: f64,
    pub mismatched: bool,
}

impl ShareMismatch {
    pub fn for_group(group: &ExpenseGroup) -> Self {
        let shares_total = group.shares_total();
        let difference = group.total - shares_total;
        Self {
            group_id: group.id.clone(),
            total: group.total,
            shares_total,
            difference,
            mismatched: difference.abs() > SHARE_MISMATCH_WARNING_THRESHOLD,
        }
    }
}

/// One entry per group, in group order.
pub fn share_mismatches(groups: &[ExpenseGroup]) -> Vec<ShareMismatch> {
    groups.iter().map(ShareMismatch::for_group).collect()
}

/// Sum of all group totals in base currency.
pub fn grand_total(groups: &[ExpenseGroup], currencies: &CurrencySet) -> f64 {
    groups
        .iter()
        .map(|g| currencies.to_base(g.total, g.currency.as_deref()))
        .sum()
}
