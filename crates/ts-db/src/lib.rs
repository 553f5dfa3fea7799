//! Storage layer for trip ledgers.
//!
//! Persists full ledger snapshots keyed by trip id using `rusqlite`. The store
//! is last-writer-wins: every save replaces the whole snapshot and bumps the
//! trip's revision, which is how readers notice external replacements.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! For multi-process access (several collaborators on one database file), open a
//! separate `Database` per process; SQLite serializes the writes. Saves take the
//! write lock up front and wait up to [`BUSY_TIMEOUT`] for another writer.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in ISO 8601 format with milliseconds
//! (e.g., `2024-01-15T10:30:00.000Z`), so lexicographic ordering matches
//! chronological ordering.
//!
//! ## Snapshot Storage
//!
//! The `state` column stores the snapshot as camelCase JSON, the same shape
//! collaborators exchange. The `history` column stores the undo/redo stacks.
//! When evolving the snapshot:
//! - Adding fields: give them serde defaults so old rows still load
//! - Removing or renaming fields: requires migrating stored rows

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use thiserror::Error;
use ts_core::{History, LedgerSnapshot};

/// Number of activity entries returned when no limit is given.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

/// How long a write waits for another process holding the lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to encode a snapshot or history as JSON.
    #[error("failed to encode trip state: {0}")]
    Encode(#[from] serde_json::Error),
    /// A stored snapshot or history could not be decoded.
    #[error("invalid stored {column} for trip {trip_id}")]
    InvalidState {
        trip_id: String,
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for trip {trip_id}: {timestamp}")]
    TimestampParse {
        trip_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// No trip is stored under this id.
    #[error("trip not found: {0}")]
    TripNotFound(String),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A trip as last written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrip {
    pub trip_id: String,
    /// Incremented on every save, starting at 1.
    pub revision: i64,
    /// Identity of the writer that produced this revision, if tagged.
    pub writer: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub snapshot: LedgerSnapshot,
    pub history: History,
}

/// Listing entry for a stored trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSummary {
    pub trip_id: String,
    pub name: String,
    pub revision: i64,
    pub updated_at: String,
}

/// One line of a trip's activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub ts: DateTime<Utc>,
    pub writer: Option<String>,
    pub message: String,
}

impl ActivityEntry {
    /// An entry stamped with the current time.
    pub fn now(writer: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            writer: writer.map(String::from),
            message: message.into(),
        }
    }
}

/// Raw `trips` row before JSON/timestamp decoding.
struct TripRow {
    trip_id: String,
    revision: i64,
    writer: Option<String>,
    updated_at: String,
    state: String,
    history: Option<String>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- Trips table: one full ledger snapshot per trip
            -- state: JSON snapshot (participants, groups, currencies, existingDebts)
            -- history: JSON undo/redo stacks
            CREATE TABLE IF NOT EXISTS trips (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                revision INTEGER NOT NULL DEFAULT 0,
                writer TEXT,
                updated_at TEXT NOT NULL,
                state TEXT NOT NULL,
                history TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_trips_updated ON trips(updated_at);

            CREATE TABLE IF NOT EXISTS activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trip_id TEXT NOT NULL,
                ts TEXT NOT NULL,
                writer TEXT,
                message TEXT NOT NULL,
                FOREIGN KEY (trip_id) REFERENCES trips(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_activity_trip_ts ON activity(trip_id, ts);
            ",
        )?;
        Ok(())
    }

    /// Writes the full snapshot for a trip, replacing any previous one.
    ///
    /// Returns the new revision.
    pub fn save_trip(
        &mut self,
        trip_id: &str,
        snapshot: &LedgerSnapshot,
        history: &History,
        writer: Option<&str>,
    ) -> Result<i64, DbError> {
        let state = serde_json::to_string(snapshot)?;
        let history = serde_json::to_string(history)?;
        let updated_at = format_timestamp(Utc::now());

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT revision FROM trips WHERE id = ?",
                [trip_id],
                |row| row.get(0),
            )
            .optional()?;
        let revision = current.unwrap_or(0) + 1;
        tx.execute(
            "
            INSERT INTO trips (id, name, revision, writer, updated_at, state, history)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                revision = excluded.revision,
                writer = excluded.writer,
                updated_at = excluded.updated_at,
                state = excluded.state,
                history = excluded.history
            ",
            params![
                trip_id,
                snapshot.name,
                revision,
                writer,
                updated_at,
                state,
                history
            ],
        )?;
        tx.commit()?;

        tracing::debug!(trip_id, revision, ?writer, "saved trip");
        Ok(revision)
    }

    /// Loads a trip, or `None` if nothing is stored under `trip_id`.
    pub fn load_trip(&self, trip_id: &str) -> Result<Option<StoredTrip>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, revision, writer, updated_at, state, history
                FROM trips
                WHERE id = ?
                ",
                [trip_id],
                |row| {
                    Ok(TripRow {
                        trip_id: row.get(0)?,
                        revision: row.get(1)?,
                        writer: row.get(2)?,
                        updated_at: row.get(3)?,
                        state: row.get(4)?,
                        history: row.get(5)?,
                    })
                },
            )
            .optional()?;
        row.map(decode_trip).transpose()
    }

    /// Loads a trip, failing with [`DbError::TripNotFound`] if absent.
    pub fn require_trip(&self, trip_id: &str) -> Result<StoredTrip, DbError> {
        self.load_trip(trip_id)?
            .ok_or_else(|| DbError::TripNotFound(trip_id.to_string()))
    }

    /// Current revision of a trip without decoding its snapshot.
    pub fn trip_revision(&self, trip_id: &str) -> Result<Option<i64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT revision FROM trips WHERE id = ?",
                [trip_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Lists stored trips ordered by ID.
    pub fn list_trips(&self) -> Result<Vec<TripSummary>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, revision, updated_at FROM trips ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TripSummary {
                trip_id: row.get(0)?,
                name: row.get(1)?,
                revision: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        let mut trips = Vec::new();
        for row in rows {
            trips.push(row?);
        }
        Ok(trips)
    }

    /// Deletes a trip and its activity. Returns whether a trip was removed.
    pub fn delete_trip(&mut self, trip_id: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?", [trip_id])?;
        Ok(deleted > 0)
    }

    /// Appends an entry to a stored trip's activity feed.
    pub fn push_activity(&mut self, trip_id: &str, entry: &ActivityEntry) -> Result<(), DbError> {
        if self.trip_revision(trip_id)?.is_none() {
            return Err(DbError::TripNotFound(trip_id.to_string()));
        }
        self.conn.execute(
            "INSERT INTO activity (trip_id, ts, writer, message) VALUES (?, ?, ?, ?)",
            params![trip_id, format_timestamp(entry.ts), entry.writer, entry.message],
        )?;
        Ok(())
    }

    /// Most recent activity entries for a trip, newest first.
    pub fn recent_activity(
        &self,
        trip_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "
            SELECT ts, writer, message
            FROM activity
            WHERE trip_id = ?
            ORDER BY ts DESC, id DESC
            LIMIT ?
            ",
        )?;
        let rows = stmt.query_map(params![trip_id, limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (ts, writer, message) = row?;
            entries.push(ActivityEntry {
                ts: parse_timestamp(&ts, trip_id)?,
                writer,
                message,
            });
        }
        Ok(entries)
    }
}

fn decode_trip(row: TripRow) -> Result<StoredTrip, DbError> {
    let snapshot =
        serde_json::from_str(&row.state).map_err(|source| DbError::InvalidState {
            trip_id: row.trip_id.clone(),
            column: "state",
            source,
        })?;
    let history = match row.history.as_deref() {
        Some(raw) => serde_json::from_str(raw).map_err(|source| DbError::InvalidState {
            trip_id: row.trip_id.clone(),
            column: "history",
            source,
        })?,
        None => History::default(),
    };
    let updated_at = parse_timestamp(&row.updated_at, &row.trip_id)?;
    Ok(StoredTrip {
        trip_id: row.trip_id,
        revision: row.revision,
        writer: row.writer,
        updated_at,
        snapshot,
        history,
    })
}

fn parse_timestamp(timestamp: &str, trip_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            trip_id: trip_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::TimeZone;

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        let trips_columns = table_columns(&db.conn, "trips");
        assert_eq!(
            trips_columns,
            vec![
                "id",
                "name",
                "revision",
                "writer",
                "updated_at",
                "state",
                "history",
            ]
        );

        let activity_columns = table_columns(&db.conn, "activity");
        assert_eq!(
            activity_columns,
            vec!["id", "trip_id", "ts", "writer", "message"]
        );

        let trips_indexes = index_names(&db.conn, "trips");
        assert!(trips_indexes.contains("idx_trips_updated"));

        let activity_indexes = index_names(&db.conn, "activity");
        assert!(activity_indexes.contains("idx_activity_trip_ts"));
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("trips.db");
        let mut db = Database::open(&path).unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.trip_revision("bkk").unwrap(), Some(1));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let snapshot = LedgerSnapshot::sample();
        let mut history = History::new(10);
        history.record(LedgerSnapshot::default());

        let revision = db
            .save_trip("bkk", &snapshot, &history, Some("writer-1"))
            .unwrap();
        assert_eq!(revision, 1);

        let stored = db.load_trip("bkk").unwrap().expect("trip stored");
        assert_eq!(stored.trip_id, "bkk");
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.writer.as_deref(), Some("writer-1"));
        assert_eq!(stored.snapshot, snapshot);
        assert_eq!(stored.history, history);
    }

    #[test]
    fn revision_increments_per_save() {
        let mut db = Database::open_in_memory().unwrap();
        let mut snapshot = LedgerSnapshot::sample();
        db.save_trip("bkk", &snapshot, &History::default(), Some("a"))
            .unwrap();
        snapshot.reset();
        let revision = db
            .save_trip("bkk", &snapshot, &History::default(), Some("b"))
            .unwrap();

        assert_eq!(revision, 2);
        let stored = db.require_trip("bkk").unwrap();
        assert_eq!(stored.writer.as_deref(), Some("b"));
        assert!(stored.snapshot.groups.is_empty());
    }

    #[test]
    fn writers_on_one_file_share_revisions() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("trips.db");
        let mut alice = Database::open(&path).unwrap();
        let mut bob = Database::open(&path).unwrap();
        let snapshot = LedgerSnapshot::sample();

        let revisions = [
            alice.save_trip("bkk", &snapshot, &History::default(), Some("alice")).unwrap(),
            bob.save_trip("bkk", &snapshot, &History::default(), Some("bob")).unwrap(),
            alice.save_trip("bkk", &snapshot, &History::default(), Some("alice")).unwrap(),
        ];

        assert_eq!(revisions, [1, 2, 3]);
        assert_eq!(bob.require_trip("bkk").unwrap().writer.as_deref(), Some("alice"));
    }

    #[test]
    fn save_waits_for_another_writer() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("trips.db");
        let mut db = Database::open(&path).unwrap();

        let other = Connection::open(&path).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();
        let holder = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            other.execute_batch("COMMIT").unwrap();
        });

        let revision = db
            .save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        holder.join().unwrap();
        assert_eq!(revision, 1);
    }

    #[test]
    fn missing_trip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_trip("nowhere").unwrap().is_none());
        assert!(db.trip_revision("nowhere").unwrap().is_none());
        assert!(matches!(
            db.require_trip("nowhere"),
            Err(DbError::TripNotFound(id)) if id == "nowhere"
        ));
    }

    #[test]
    fn list_trips_orders_by_id() {
        let mut db = Database::open_in_memory().unwrap();
        let history = History::default();
        db.save_trip("tokyo", &LedgerSnapshot::default(), &history, None)
            .unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &history, None)
            .unwrap();

        let trips = db.list_trips().unwrap();
        let ids: Vec<&str> = trips.iter().map(|t| t.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["bkk", "tokyo"]);
        assert_eq!(trips[0].name, "Thailand Trip");
    }

    #[test]
    fn corrupt_state_is_reported() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        db.conn
            .execute("UPDATE trips SET state = '{not json' WHERE id = 'bkk'", [])
            .unwrap();

        let err = db.load_trip("bkk").unwrap_err();
        assert!(matches!(err, DbError::InvalidState { column: "state", .. }));
    }

    #[test]
    fn missing_history_defaults_to_empty() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        db.conn
            .execute("UPDATE trips SET history = NULL WHERE id = 'bkk'", [])
            .unwrap();

        let stored = db.require_trip("bkk").unwrap();
        assert!(!stored.history.can_undo());
    }

    #[test]
    fn activity_is_newest_first_and_limited() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        for minute in 0..25 {
            let entry = ActivityEntry {
                ts: Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap(),
                writer: Some("w".to_string()),
                message: format!("edit {minute}"),
            };
            db.push_activity("bkk", &entry).unwrap();
        }

        let entries = db.recent_activity("bkk", DEFAULT_ACTIVITY_LIMIT).unwrap();
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[0].message, "edit 24");
        assert_eq!(entries[19].message, "edit 5");
    }

    #[test]
    fn activity_requires_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db
            .push_activity("nowhere", &ActivityEntry::now(None, "hello"))
            .unwrap_err();
        assert!(matches!(err, DbError::TripNotFound(_)));
    }

    #[test]
    fn delete_trip_cascades_activity() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_trip("bkk", &LedgerSnapshot::sample(), &History::default(), None)
            .unwrap();
        db.push_activity("bkk", &ActivityEntry::now(None, "created"))
            .unwrap();

        assert!(db.delete_trip("bkk").unwrap());
        assert!(!db.delete_trip("bkk").unwrap());

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM activity", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
