//! Trip lifecycle commands.

use std::io::Write;

use anyhow::{Result, bail};
use ts_core::{CurrencySet, History, LedgerError, LedgerSnapshot, MIN_PARTICIPANTS};
use ts_db::Database;

use super::util::{TripContext, commit, mutate, new_participant_id, plural};

/// Options for creating a trip.
#[derive(Debug, Clone)]
pub struct NewTrip<'a> {
    pub name: &'a str,
    pub people: &'a [String],
    pub base_code: &'a str,
    pub base_symbol: &'a str,
}

/// Creates a new trip, refusing to overwrite an existing one or to start
/// below the participant floor.
pub fn init<W: Write>(
    out: &mut W,
    db: &mut Database,
    ctx: &TripContext,
    trip: &NewTrip<'_>,
) -> Result<()> {
    if db.trip_revision(&ctx.trip_id)?.is_some() {
        bail!(
            "trip '{}' already exists; pick another id with --trip",
            ctx.trip_id
        );
    }

    let mut snapshot = LedgerSnapshot::new(
        String::new(),
        CurrencySet::with_base(trip.base_code, trip.base_symbol),
    );
    snapshot.rename_trip(trip.name)?;
    for name in trip.people {
        snapshot.add_participant(new_participant_id()?, name)?;
    }
    if snapshot.participants.len() < MIN_PARTICIPANTS {
        return Err(LedgerError::TooFewParticipants {
            min: MIN_PARTICIPANTS,
        }
        .into());
    }

    let message = format!(
        "Created trip '{}' with {}",
        snapshot.name,
        plural(snapshot.participants.len(), "participant")
    );
    commit(
        out,
        db,
        ctx,
        &snapshot,
        &History::new(ctx.history_limit),
        &message,
    )
}

/// Loads the sample trip, replacing whatever the trip currently holds.
///
/// The replaced snapshot stays reachable through `undo`.
pub fn demo<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext) -> Result<()> {
    if db.trip_revision(&ctx.trip_id)?.is_some() {
        return mutate(out, db, ctx, |snapshot| {
            *snapshot = LedgerSnapshot::sample();
            Ok("Loaded sample trip".to_string())
        });
    }
    commit(
        out,
        db,
        ctx,
        &LedgerSnapshot::sample(),
        &History::new(ctx.history_limit),
        "Loaded sample trip",
    )
}

/// Clears all groups and existing debts, keeping people and currencies.
pub fn reset<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext) -> Result<()> {
    mutate(out, db, ctx, |snapshot| {
        let cleared = snapshot.groups.len();
        snapshot.reset();
        Ok(format!(
            "Reset trip, cleared {}",
            plural(cleared, "expense group")
        ))
    })
}

/// Deletes a trip. Undo history goes with it.
pub fn delete<W: Write>(out: &mut W, db: &mut Database, ctx: &TripContext) -> Result<()> {
    if !db.delete_trip(&ctx.trip_id)? {
        bail!("trip '{}' does not exist", ctx.trip_id);
    }
    tracing::info!(trip_id = %ctx.trip_id, "trip deleted");
    writeln!(out, "Deleted trip '{}'", ctx.trip_id)?;
    Ok(())
}

/// Lists stored trips.
pub fn list<W: Write>(out: &mut W, db: &Database) -> Result<()> {
    let trips = db.list_trips()?;
    if trips.is_empty() {
        writeln!(
            out,
            "No trips yet. Run 'tripsplit init --name <NAME>' or 'tripsplit demo'."
        )?;
        return Ok(());
    }

    writeln!(out, "{:<16} {:<24} {:>8}  UPDATED", "TRIP", "NAME", "REVISION")?;
    for trip in &trips {
        writeln!(
            out,
            "{:<16} {:<24} {:>8}  {}",
            trip.trip_id, trip.name, trip.revision, trip.updated_at
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TripContext {
        TripContext::new("bkk").with_writer("test@00000000")
    }

    #[test]
    fn init_creates_trip_with_participants() {
        let mut db = Database::open_in_memory().unwrap();
        let people = vec!["Avery".to_string(), "Jordan".to_string()];
        let trip = NewTrip {
            name: "Bangkok",
            people: &people,
            base_code: "thb",
            base_symbol: "฿",
        };

        let mut out = Vec::new();
        init(&mut out, &mut db, &ctx(), &trip).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert_eq!(
            output,
            "Created trip 'Bangkok' with 2 participants (revision 1, 0 transfers to settle)\n"
        );
        let stored = db.require_trip("bkk").unwrap();
        assert_eq!(stored.snapshot.participants.len(), 2);
        assert_eq!(stored.snapshot.currencies.base().unwrap().code, "THB");
        assert_eq!(stored.writer.as_deref(), Some("test@00000000"));
    }

    #[test]
    fn init_refuses_existing_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let people = vec!["Avery".to_string(), "Jordan".to_string()];
        let trip = NewTrip {
            name: "Bangkok",
            people: &people,
            base_code: "INR",
            base_symbol: "₹",
        };
        init(&mut Vec::new(), &mut db, &ctx(), &trip).unwrap();
        let err = init(&mut Vec::new(), &mut db, &ctx(), &trip).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_requires_two_participants() {
        let mut db = Database::open_in_memory().unwrap();
        let people = vec!["Avery".to_string()];
        let trip = NewTrip {
            name: "Solo",
            people: &people,
            base_code: "INR",
            base_symbol: "₹",
        };

        let err = init(&mut Vec::new(), &mut db, &ctx(), &trip).unwrap_err();
        assert_eq!(err.to_string(), "a trip needs at least 2 participants");
        assert!(db.load_trip("bkk").unwrap().is_none());

        let trip = NewTrip { people: &[], ..trip };
        assert!(init(&mut Vec::new(), &mut db, &ctx(), &trip).is_err());
    }

    #[test]
    fn demo_then_reset_is_undoable() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        demo(&mut out, &mut db, &ctx()).unwrap();
        reset(&mut out, &mut db, &ctx()).unwrap();

        let output = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(output, @r"
        Loaded sample trip (revision 1, 3 transfers to settle)
        Reset trip, cleared 7 expense groups (revision 2, 0 transfers to settle)
        ");

        let stored = db.require_trip("bkk").unwrap();
        assert!(stored.snapshot.groups.is_empty());
        assert!(stored.snapshot.existing_debts.is_empty());
        assert_eq!(stored.history.undo_depth(), 1);
    }

    #[test]
    fn delete_removes_trip() {
        let mut db = Database::open_in_memory().unwrap();
        demo(&mut Vec::new(), &mut db, &ctx()).unwrap();

        let mut out = Vec::new();
        delete(&mut out, &mut db, &ctx()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Deleted trip 'bkk'\n");
        assert!(db.load_trip("bkk").unwrap().is_none());
        assert!(delete(&mut Vec::new(), &mut db, &ctx()).is_err());
    }

    #[test]
    fn list_shows_empty_hint() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        list(&mut out, &db).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("No trips yet."));
    }
}
