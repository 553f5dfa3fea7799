//! Activity feed command.

use std::io::Write;

use anyhow::Result;
use ts_db::Database;

use super::util::{TripContext, require_trip};

/// Prints the most recent activity entries, newest first.
pub fn run<W: Write>(out: &mut W, db: &Database, ctx: &TripContext, limit: usize) -> Result<()> {
    require_trip(db, ctx)?;
    let entries = db.recent_activity(&ctx.trip_id, limit)?;
    if entries.is_empty() {
        writeln!(out, "No activity yet.")?;
        return Ok(());
    }
    for entry in &entries {
        writeln!(
            out,
            "{}  {:<20}  {}",
            entry.ts.format("%Y-%m-%d %H:%M:%S"),
            entry.writer.as_deref().unwrap_or("-"),
            entry.message
        )?;
    }
    Ok(())
}
