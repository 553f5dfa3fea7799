//! Balance and settlement output.

use std::io::Write;

use anyhow::Result;
use ts_core::{Balances, LedgerSnapshot};
use ts_db::Database;

use super::util::{TripContext, format_money, load_snapshot, plural};

/// Prints paid/owed/net per participant.
pub fn balances<W: Write>(out: &mut W, db: &Database, ctx: &TripContext, json: bool) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    let balances = snapshot.balances();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&balances)?)?;
        return Ok(());
    }
    write_balance_table(out, &snapshot, &balances)
}

/// Prints the transfers that settle the trip.
pub fn settle<W: Write>(out: &mut W, db: &Database, ctx: &TripContext, json: bool) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    let balances = snapshot.balances();
    if json {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&balances.transactions)?
        )?;
        return Ok(());
    }
    write_transfers(out, &snapshot, &balances)
}

/// Table of paid, owed and final net per participant.
pub fn write_balance_table<W: Write>(
    out: &mut W,
    snapshot: &LedgerSnapshot,
    balances: &Balances,
) -> Result<()> {
    let symbol = snapshot.currencies.base_symbol();
    writeln!(
        out,
        "{:<12} {:>14} {:>14} {:>14}",
        "NAME", "PAID", "OWED", "NET"
    )?;
    for participant in &snapshot.participants {
        let id = &participant.id;
        let amount = |map: &ts_core::BalanceMap| map.get(id).copied().unwrap_or(0.0);
        writeln!(
            out,
            "{:<12} {:>14} {:>14} {:>14}",
            participant.name,
            format_money(amount(&balances.paid), symbol),
            format_money(amount(&balances.owed), symbol),
            format_money(amount(&balances.final_net), symbol)
        )?;
    }
    Ok(())
}

pub fn write_transfers<W: Write>(
    out: &mut W,
    snapshot: &LedgerSnapshot,
    balances: &Balances,
) -> Result<()> {
    if balances.transactions.is_empty() {
        writeln!(out, "All settled.")?;
        return Ok(());
    }
    let symbol = snapshot.currencies.base_symbol();
    for transfer in &balances.transactions {
        writeln!(
            out,
            "{} pays {} {}",
            snapshot.display_name(&transfer.from),
            snapshot.display_name(&transfer.to),
            format_money(transfer.amount, symbol)
        )?;
    }
    writeln!(out, "{}", plural(balances.transactions.len(), "transfer"))?;
    Ok(())
}
