//! Existing debt commands.

use std::io::Write;

use anyhow::Result;
use ts_core::ExistingDebt;
use ts_db::Database;

use super::util::{
    TripContext, format_money, load_snapshot, mutate, new_debt_id, resolve_debt,
    resolve_participant,
};

pub fn add<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    from: &str,
    to: &str,
    amount: f64,
) -> Result<()> {
    let id = new_debt_id()?;
    mutate(out, db, ctx, |snapshot| {
        let debt = ExistingDebt {
            id,
            from: resolve_participant(snapshot, from)?,
            to: resolve_participant(snapshot, to)?,
            amount,
        };
        let message = format!(
            "Recorded {} owing {} {} ({})",
            snapshot.display_name(&debt.from),
            snapshot.display_name(&debt.to),
            format_money(amount, snapshot.currencies.base_symbol()),
            debt.id
        );
        snapshot.add_debt(debt)?;
        Ok(message)
    })
}

pub fn remove<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext, id: &str) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let id = resolve_debt(snapshot, id)?;
        let removed = snapshot.remove_debt(&id)?;
        Ok(format!("Removed debt {}", removed.id))
    })
}

pub fn list<W: Write>(out: &mut W, db: &Database, ctx: &TripContext) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    if snapshot.existing_debts.is_empty() {
        writeln!(out, "No existing debts.")?;
        return Ok(());
    }
    let symbol = snapshot.currencies.base_symbol();
    writeln!(out, "{:<10} {:<12} {:<12} {:>14}", "ID", "FROM", "TO", "AMOUNT")?;
    for debt in &snapshot.existing_debts {
        writeln!(
            out,
            "{:<10} {:<12} {:<12} {:>14}",
            debt.id,
            snapshot.display_name(&debt.from),
            snapshot.display_name(&debt.to),
            format_money(debt.amount, symbol)
        )?;
    }
    Ok(())
}
