//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result, bail};
use ts_core::{DebtId, GroupId, History, LedgerSnapshot, ParticipantId};
use ts_db::{ActivityEntry, Database, StoredTrip};
use uuid::Uuid;

/// Which trip a command operates on and who is writing.
#[derive(Debug, Clone)]
pub struct TripContext {
    pub trip_id: String,
    /// Tag attached to saves and activity entries.
    pub writer: Option<String>,
    pub history_limit: usize,
}

impl TripContext {
    pub fn new(trip_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            writer: None,
            history_limit: ts_core::DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_writer(mut self, writer: impl Into<String>) -> Self {
        self.writer = Some(writer.into());
        self
    }

    #[must_use]
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

/// Loads the stored trip, failing if it does not exist.
pub fn require_trip(db: &Database, ctx: &TripContext) -> Result<StoredTrip> {
    db.require_trip(&ctx.trip_id).with_context(|| {
        format!(
            "failed to load trip '{}' (create it with 'tripsplit init' or 'tripsplit demo')",
            ctx.trip_id
        )
    })
}

pub fn load_snapshot(db: &Database, ctx: &TripContext) -> Result<LedgerSnapshot> {
    Ok(require_trip(db, ctx)?.snapshot)
}

/// Applies one edit to the stored trip.
///
/// Loads the snapshot, runs `edit` (which returns the activity message),
/// records the previous snapshot in undo history, saves with the writer tag,
/// appends to the activity feed and prints a one-line summary. A failed edit
/// leaves the store untouched.
pub fn mutate<W, F>(out: &mut W, db: &mut Database, ctx: &TripContext, edit: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut LedgerSnapshot) -> Result<String>,
{
    let stored = require_trip(db, ctx)?;
    let mut history = stored.history;
    let mut snapshot = stored.snapshot.clone();
    let message = edit(&mut snapshot)?;

    history.set_limit(ctx.history_limit);
    history.record(stored.snapshot);
    commit(out, db, ctx, &snapshot, &history, &message)
}

/// Saves a snapshot and history, logs the activity and prints a summary.
pub fn commit<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    snapshot: &LedgerSnapshot,
    history: &History,
    message: &str,
) -> Result<()> {
    let writer = ctx.writer.as_deref();
    let revision = db
        .save_trip(&ctx.trip_id, snapshot, history, writer)
        .context("failed to save trip")?;
    db.push_activity(&ctx.trip_id, &ActivityEntry::now(writer, message))
        .context("failed to record activity")?;
    tracing::info!(trip_id = %ctx.trip_id, revision, %message, "trip updated");

    let balances = snapshot.balances();
    writeln!(
        out,
        "{message} (revision {revision}, {} to settle)",
        plural(balances.transactions.len(), "transfer")
    )?;
    for mismatch in ts_core::share_mismatches(&snapshot.groups)
        .iter()
        .filter(|m| m.mismatched)
    {
        writeln!(
            out,
            "warning: group {} shares add up to {:.2}, total is {:.2}",
            mismatch.group_id, mismatch.shares_total, mismatch.total
        )?;
    }
    Ok(())
}

/// Resolves a participant by exact id, then by case-insensitive name.
pub fn resolve_participant(snapshot: &LedgerSnapshot, key: &str) -> Result<ParticipantId> {
    let key = key.trim();
    if let Some(p) = snapshot.participants.iter().find(|p| p.id.as_str() == key) {
        return Ok(p.id.clone());
    }
    let wanted = key.to_lowercase();
    let mut matches = snapshot
        .participants
        .iter()
        .filter(|p| p.name.to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(p), None) => Ok(p.id.clone()),
        (Some(_), Some(_)) => bail!("'{key}' matches more than one participant; use the id"),
        (None, _) => bail!("unknown participant '{key}'"),
    }
}

/// Resolves a group by exact id, then by case-insensitive label.
pub fn resolve_group(snapshot: &LedgerSnapshot, key: &str) -> Result<GroupId> {
    let key = key.trim();
    if let Some(g) = snapshot.groups.iter().find(|g| g.id.as_str() == key) {
        return Ok(g.id.clone());
    }
    let wanted = key.to_lowercase();
    let mut matches = snapshot
        .groups
        .iter()
        .filter(|g| g.label.to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(g), None) => Ok(g.id.clone()),
        (Some(_), Some(_)) => bail!("'{key}' matches more than one group; use the id"),
        (None, _) => bail!("unknown group '{key}'"),
    }
}

pub fn resolve_debt(snapshot: &LedgerSnapshot, key: &str) -> Result<DebtId> {
    let key = key.trim();
    snapshot
        .existing_debts
        .iter()
        .find(|d| d.id.as_str() == key)
        .map(|d| d.id.clone())
        .with_context(|| format!("unknown debt '{key}'"))
}

/// Generates a short random id such as `p-1a2b3c4d`.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &uuid[..8])
}

pub fn new_participant_id() -> Result<ParticipantId> {
    Ok(ParticipantId::new(generate_id("p"))?)
}

pub fn new_group_id() -> Result<GroupId> {
    Ok(GroupId::new(generate_id("g"))?)
}

pub fn new_debt_id() -> Result<DebtId> {
    Ok(DebtId::new(generate_id("d"))?)
}

/// Formats an amount with a currency symbol and thousands separators.
///
/// `format_money(-1234.5, "₹")` is `-₹1,234.50`.
pub fn format_money(amount: f64, symbol: &str) -> String {
    let sign = if amount < 0.0 && format!("{:.2}", amount.abs()) != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{symbol}{}", group_thousands(amount.abs()))
}

/// `1234567.891` becomes `1,234,567.89`.
pub fn group_thousands(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{fraction}")
}

pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_is_grouped_and_signed() {
        assert_eq!(format_money(0.0, "₹"), "₹0.00");
        assert_eq!(format_money(999.999, "₹"), "₹1,000.00");
        assert_eq!(format_money(45_582.94, "₹"), "₹45,582.94");
        assert_eq!(format_money(-1_234_567.5, "$"), "-$1,234,567.50");
        assert_eq!(format_money(-0.001, "$"), "$0.00");
    }

    #[test]
    fn participants_resolve_by_id_or_name() {
        let snapshot = LedgerSnapshot::sample();
        assert_eq!(resolve_participant(&snapshot, "K").unwrap().as_str(), "K");
        assert_eq!(
            resolve_participant(&snapshot, "jordan").unwrap().as_str(),
            "J"
        );
        assert!(resolve_participant(&snapshot, "Nobody").is_err());
    }

    #[test]
    fn ambiguous_names_are_rejected() {
        let mut snapshot = LedgerSnapshot::sample();
        snapshot
            .add_participant(ParticipantId::new("J2").unwrap(), "Jordan")
            .unwrap();
        let err = resolve_participant(&snapshot, "Jordan").unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn groups_resolve_by_label() {
        let snapshot = LedgerSnapshot::sample();
        let first = &snapshot.groups[0];
        let id = resolve_group(&snapshot, &first.label.to_uppercase()).unwrap();
        assert_eq!(id, first.id);
    }

    #[test]
    fn generated_ids_are_prefixed() {
        let id = generate_id("g");
        assert!(id.starts_with("g-"));
        assert_eq!(id.len(), 10);
        assert_ne!(id, generate_id("g"));
    }
}
