//! rollcall-store — durable storage for enrolled faces and attendance.
//!
//! One SQLite database, two owners: the students table is the signature
//! store (one row per enrolled face, uniqueness scoped to roll number +
//! department + class + semester), the attendance table is the ledger
//! (at most one Present row per roll number per day, enforced by a SQL
//! uniqueness constraint so concurrent writers cannot double-mark).

pub mod attendance;
pub mod codec;
pub mod students;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

pub use attendance::{AttendanceRow, DailySummary, MarkOutcome};
pub use students::{SignatureRow, StudentFilter, StudentSummary};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("an identity with this roll number already exists in this scope")]
    DuplicateScope,
    #[error("corrupt signature blob: {len} bytes is not a whole number of dimensions")]
    CorruptSignature { len: usize },
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS students (
    id           TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    roll_number  TEXT NOT NULL,
    department   TEXT NOT NULL,
    class        TEXT NOT NULL,
    semester     TEXT NOT NULL,
    signature    BLOB NOT NULL,
    image_path   TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (roll_number, department, class, semester)
);

CREATE INDEX IF NOT EXISTS idx_students_class
    ON students (department, class);

CREATE TABLE IF NOT EXISTS attendance (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    roll_number TEXT NOT NULL,
    date        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'Present',
    timestamp   TEXT NOT NULL,
    UNIQUE (roll_number, date)
);
";

/// Handle to the attendance database. Cheap to share behind an `Arc`;
/// the inner connection is serialized by a mutex.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // The connection stays usable after a holder panic.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
