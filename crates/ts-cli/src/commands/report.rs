//! Printable trip report.
//!
//! Formatting only: every number comes from the engine or the snapshot.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ts_core::{LedgerSnapshot, grand_total, share_mismatches};
use ts_db::Database;

use super::balances::{write_balance_table, write_transfers};
use super::util::{TripContext, format_money, load_snapshot};

const TOTAL_ROW_LABEL: &str = "TOTAL OWED";

/// Renders the report to `output`, or to `out` when no file is given.
pub fn run<W: Write>(
    out: &mut W,
    db: &Database,
    ctx: &TripContext,
    output: Option<&Path>,
) -> Result<()> {
    let snapshot = load_snapshot(db, ctx)?;
    let report = render(&snapshot, Utc::now())?;
    match output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "Report written to {}", path.display())?;
        }
        None => out.write_all(report.as_bytes())?,
    }
    Ok(())
}

/// Renders the full report as plain text.
pub fn render(snapshot: &LedgerSnapshot, generated_at: DateTime<Utc>) -> Result<String> {
    let balances = snapshot.balances();
    let currencies = &snapshot.currencies;
    let symbol = currencies.base_symbol();

    let mut report = String::new();
    let title = if snapshot.name.is_empty() {
        "Trip"
    } else {
        snapshot.name.as_str()
    };
    writeln!(report, "{title}")?;
    writeln!(
        report,
        "Generated {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    if let Some(base) = currencies.base() {
        writeln!(report, "Base currency: {} ({})", base.code, base.symbol)?;
    }
    writeln!(report)?;

    writeln!(report, "EXPENSES")?;
    if snapshot.groups.is_empty() {
        writeln!(report, "No expense groups.")?;
    } else {
        let mut headers = vec![
            "GROUP".to_string(),
            "CUR".to_string(),
            "PAID BY".to_string(),
            "TOTAL".to_string(),
        ];
        headers.extend(snapshot.participants.iter().map(|p| p.name.clone()));

        let mut rows = Vec::with_capacity(snapshot.groups.len() + 1);
        for group in &snapshot.groups {
            let code = group.currency.as_deref();
            let mut row = vec![
                group.label.clone(),
                code.map_or_else(
                    || currencies.base().map(|c| c.code.clone()).unwrap_or_default(),
                    str::to_string,
                ),
                snapshot.display_name(&group.paid_by).to_string(),
                format_money(currencies.to_base(group.total, code), symbol),
            ];
            row.extend(snapshot.participants.iter().map(|p| {
                format_money(currencies.to_base(group.share_of(&p.id), code), symbol)
            }));
            rows.push(row);
        }

        let mut totals = vec![
            TOTAL_ROW_LABEL.to_string(),
            String::new(),
            String::new(),
            format_money(grand_total(&snapshot.groups, currencies), symbol),
        ];
        totals.extend(snapshot.participants.iter().map(|p| {
            format_money(balances.owed.get(&p.id).copied().unwrap_or(0.0), symbol)
        }));
        rows.push(totals);

        write_table(&mut report, &headers, &rows, 3)?;
    }
    writeln!(report)?;

    let mut buffer = Vec::new();
    write_balance_table(&mut buffer, snapshot, &balances)?;
    writeln!(report, "BALANCES")?;
    report.push_str(&String::from_utf8(buffer)?);
    writeln!(report)?;

    let mut buffer = Vec::new();
    write_transfers(&mut buffer, snapshot, &balances)?;
    writeln!(report, "SETTLEMENT")?;
    report.push_str(&String::from_utf8(buffer)?);

    if !snapshot.existing_debts.is_empty() {
        writeln!(report)?;
        writeln!(report, "EXISTING DEBTS")?;
        for debt in &snapshot.existing_debts {
            let ignored = if debt.is_effective() { "" } else { " (ignored)" };
            writeln!(
                report,
                "{} owes {} {}{ignored}",
                snapshot.display_name(&debt.from),
                snapshot.display_name(&debt.to),
                format_money(debt.amount, symbol)
            )?;
        }
    }

    let mismatches: Vec<_> = share_mismatches(&snapshot.groups)
        .into_iter()
        .filter(|m| m.mismatched)
        .collect();
    if !mismatches.is_empty() {
        writeln!(report)?;
        writeln!(report, "WARNINGS")?;
        for mismatch in mismatches {
            let group = snapshot.group(&mismatch.group_id);
            let label = group.map_or(mismatch.group_id.as_str(), |g| g.label.as_str());
            let group_symbol =
                currencies.symbol_for(group.and_then(|g| g.currency.as_deref()));
            writeln!(
                report,
                "{label}: shares total {} but the group total is {}",
                format_money(mismatch.shares_total, group_symbol),
                format_money(mismatch.total, group_symbol)
            )?;
        }
    }

    Ok(report)
}

/// Writes an aligned table. The first `left` columns are left-aligned, the
/// rest right-aligned.
fn write_table(
    report: &mut String,
    headers: &[String],
    rows: &[Vec<String>],
    left: usize,
) -> std::fmt::Result {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut write_row = |cells: &[String]| -> std::fmt::Result {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            if i < left {
                write!(line, "{cell:<width$}")?;
            } else {
                write!(line, "{cell:>width$}")?;
            }
        }
        writeln!(report, "{}", line.trim_end())
    };

    write_row(headers)?;
    for row in rows {
        write_row(row.as_slice())?;
    }
    Ok(())
}
