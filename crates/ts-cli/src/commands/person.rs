//! Participant commands.

use std::io::Write;

use anyhow::Result;
use ts_db::Database;

use super::util::{TripContext, load_snapshot, mutate, new_participant_id, resolve_participant};

pub fn add<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext, name: &str) -> Result<()> {
    let id = new_participant_id()?;
    mutate(out, db, ctx, |snapshot| {
        let added = snapshot.add_participant(id, name)?;
        Ok(format!("Added {} ({})", added.name, added.id))
    })
}

pub fn rename<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    who: &str,
    name: &str,
) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let id = resolve_participant(snapshot, who)?;
        let old = snapshot.display_name(&id).to_string();
        snapshot.rename_participant(&id, name)?;
        Ok(format!("Renamed {old} to {}", name.trim()))
    })
}

/// Removes a participant. Their existing debts go with them.
pub fn remove<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext, who: &str) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let id = resolve_participant(snapshot, who)?;
        let debts_before = snapshot.existing_debts.len();
        let removed = snapshot.remove_participant(&id)?;
        let pruned = debts_before - snapshot.existing_debts.len();
        if pruned > 0 {
            Ok(format!(
                "Removed {} and {pruned} existing debt(s)",
                removed.name
            ))
        } else {
            Ok(format!("Removed {}", removed.name))
        }
    })
}

pub fn list<W: Write>(out: &mut W, db: &Database, ctx: &TripContext) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    if snapshot.participants.is_empty() {
        writeln!(out, "No participants.")?;
        return Ok(());
    }
    writeln!(out, "{:<12} {:<4} {:<20} COLOR", "ID", "", "NAME")?;
    for p in &snapshot.participants {
        writeln!(
            out,
            "{:<12} {:<4} {:<20} {}",
            p.id,
            p.initials(),
            p.name,
            p.color
        )?;
    }
    Ok(())
}
