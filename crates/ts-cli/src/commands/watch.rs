//! Follow a trip and reprint balances as collaborators change it.
//!
//! The store is polled by revision. A new revision is only displayed when its
//! content differs from what was last shown, and optionally only when it was
//! written by someone else.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use ts_core::EchoGuard;
use ts_db::{Database, DbError, StoredTrip};

use super::balances::{write_balance_table, write_transfers};
use super::util::TripContext;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Skip revisions tagged with our own writer.
    pub ignore_own: bool,
    /// Stop after this many polls; `None` runs until interrupted.
    pub polls: Option<u64>,
    pub interval: Duration,
}

/// Outcome of one poll.
#[derive(Debug)]
pub enum Poll {
    Unchanged,
    /// A new revision was written by this writer.
    OwnWrite(i64),
    /// A new revision carries the same content as the one last shown.
    Echo(i64),
    Changed(Box<StoredTrip>),
}

/// Tracks what has been shown so far.
#[derive(Debug)]
pub struct Watcher {
    trip_id: String,
    own_writer: Option<String>,
    ignore_own: bool,
    last_revision: Option<i64>,
    shown: EchoGuard,
}

impl Watcher {
    pub fn new(ctx: &TripContext, ignore_own: bool) -> Self {
        Self {
            trip_id: ctx.trip_id.clone(),
            own_writer: ctx.writer.clone(),
            ignore_own,
            last_revision: None,
            shown: EchoGuard::new(),
        }
    }

    pub fn poll(&mut self, db: &Database) -> Result<Poll> {
        let Some(revision) = db.trip_revision(&self.trip_id)? else {
            return Err(DbError::TripNotFound(self.trip_id.clone()).into());
        };
        if Some(revision) == self.last_revision {
            return Ok(Poll::Unchanged);
        }
        let first = self.last_revision.is_none();
        let stored = db.require_trip(&self.trip_id)?;
        self.last_revision = Some(stored.revision);

        if !first
            && self.ignore_own
            && stored.writer.is_some()
            && stored.writer == self.own_writer
        {
            self.shown.note_local_write(&stored.snapshot)?;
            return Ok(Poll::OwnWrite(stored.revision));
        }
        if !self.shown.accept_remote(&stored.snapshot) {
            // accepting the echo cleared it; keep suppressing identical content
            self.shown.note_local_write(&stored.snapshot)?;
            return Ok(Poll::Echo(stored.revision));
        }
        self.shown.note_local_write(&stored.snapshot)?;
        Ok(Poll::Changed(Box::new(stored)))
    }
}

pub fn run<W: Write>(
    out: &mut W,
    db: &Database,
    ctx: &TripContext,
    options: &WatchOptions,
) -> Result<()> {
    let mut watcher = Watcher::new(ctx, options.ignore_own);
    let mut polls = 0_u64;
    loop {
        match watcher.poll(db)? {
            Poll::Unchanged => {}
            Poll::OwnWrite(revision) => {
                tracing::debug!(revision, "skipping own write");
            }
            Poll::Echo(revision) => {
                tracing::debug!(revision, "skipping revision with unchanged content");
            }
            Poll::Changed(stored) => {
                let balances = stored.snapshot.balances();
                writeln!(
                    out,
                    "== {} revision {} by {} at {}",
                    stored.trip_id,
                    stored.revision,
                    stored.writer.as_deref().unwrap_or("unknown"),
                    stored.updated_at.format("%H:%M:%S")
                )?;
                write_balance_table(out, &stored.snapshot, &balances)?;
                write_transfers(out, &stored.snapshot, &balances)?;
                out.flush()?;
            }
        }

        polls += 1;
        if options.polls.is_some_and(|max| polls >= max) {
            return Ok(());
        }
        std::thread::sleep(options.interval);
    }
}
