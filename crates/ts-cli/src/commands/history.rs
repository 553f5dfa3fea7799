//! Undo and redo over stored snapshots.

use std::io::Write;

use anyhow::Result;
use ts_db::Database;

use super::util::{TripContext, commit, require_trip};

/// Restores the snapshot before the last change.
pub fn undo<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext) -> Result<()> {
    let stored = require_trip(db, ctx)?;
    let mut history = stored.history;
    let Some(previous) = history.undo(stored.snapshot) else {
        writeln!(out, "Nothing to undo.")?;
        return Ok(());
    };
    commit(out, db, ctx, &previous, &history, "Undid last change")
}

/// Reapplies the last undone change.
pub fn redo<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext) -> Result<()> {
    let stored = require_trip(db, ctx)?;
    let mut history = stored.history;
    let Some(next) = history.redo(stored.snapshot) else {
        writeln!(out, "Nothing to redo.")?;
        return Ok(());
    };
    commit(out, db, ctx, &next, &history, "Redid change")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{person, trip};

    #[test]
    fn undo_redo_cycle() {
        let mut db = Database::open_in_memory().unwrap();
        let ctx = TripContext::new("bkk");
        let mut out = Vec::new();
        trip::demo(&mut out, &mut db, &ctx).unwrap();
        person::add(&mut out, &mut db, &ctx, "Morgan").unwrap();
        assert_eq!(db.require_trip("bkk").unwrap().snapshot.participants.len(), 5);

        let mut out = Vec::new();
        undo(&mut out, &mut db, &ctx).unwrap();
        assert_eq!(db.require_trip("bkk").unwrap().snapshot.participants.len(), 4);
        undo(&mut out, &mut db, &ctx).unwrap();
        redo(&mut out, &mut db, &ctx).unwrap();
        redo(&mut out, &mut db, &ctx).unwrap();

        let stored = db.require_trip("bkk").unwrap();
        assert_eq!(stored.snapshot.participants.len(), 5);
        assert_eq!(stored.revision, 4);

        let output = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(output, @r"
        Undid last change (revision 3, 3 transfers to settle)
        Nothing to undo.
        Redid change (revision 4, 3 transfers to settle)
        Nothing to redo.
        ");
    }
}
