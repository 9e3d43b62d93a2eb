//! Attendance ledger — the attendance table.
//!
//! Append-only with idempotency: one Present row per roll number per day.
//! "Absent" is never written; it is the absence of a Present row for an
//! enrolled identity on a given date, computed at query time.

use crate::{Db, StoreError};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::params;
use serde::Serialize;

const DATE_FMT: &str = "%Y-%m-%d";

/// Result of a ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A new Present row was inserted.
    Marked,
    /// A Present row for this roll number and date already existed.
    AlreadyMarked,
}

/// One reporting row; `date`/`time` are "-" for computed Absent entries.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRow {
    pub roll_number: String,
    pub display_name: String,
    pub status: String,
    pub date: String,
    pub time: String,
}

/// Dashboard counts for one day.
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub total_students: i64,
    pub present: i64,
    pub absent: i64,
}

impl Db {
    /// Record presence for `(roll_number, date)`, at most once.
    ///
    /// The uniqueness constraint is the serialization point: of two
    /// concurrent writers, exactly one inserts; the other observes
    /// [`MarkOutcome::AlreadyMarked`].
    pub fn mark_present(
        &self,
        roll_number: &str,
        date: NaiveDate,
        timestamp: DateTime<Local>,
    ) -> Result<MarkOutcome, StoreError> {
        let changed = self.conn().execute(
            "INSERT INTO attendance (roll_number, date, status, timestamp)
             VALUES (?1, ?2, 'Present', ?3)
             ON CONFLICT (roll_number, date) DO NOTHING",
            params![
                roll_number,
                date.format(DATE_FMT).to_string(),
                timestamp.to_rfc3339()
            ],
        )?;

        if changed == 0 {
            Ok(MarkOutcome::AlreadyMarked)
        } else {
            tracing::info!(roll = roll_number, date = %date, "attendance marked");
            Ok(MarkOutcome::Marked)
        }
    }

    /// Is there a Present row for this roll number on this date?
    pub fn was_present(&self, roll_number: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM attendance WHERE roll_number = ?1 AND date = ?2",
            params![roll_number, date.format(DATE_FMT).to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Reporting read: everyone's status for one date. Present rows come
    /// from the ledger; Absent rows are the enrolled identities without one.
    pub fn attendance_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRow>, StoreError> {
        let date_str = date.format(DATE_FMT).to_string();
        let conn = self.conn();

        let mut rows = Vec::new();
        {
            let mut stmt = conn.prepare(
                "SELECT a.roll_number, s.display_name, a.date, a.timestamp
                 FROM attendance a
                 JOIN students s ON s.roll_number = a.roll_number
                 WHERE a.date = ?1 AND a.status = 'Present'
                 ORDER BY a.timestamp",
            )?;
            let present = stmt.query_map(params![date_str], |row| {
                Ok(AttendanceRow {
                    roll_number: row.get(0)?,
                    display_name: row.get(1)?,
                    status: "Present".into(),
                    date: row.get(2)?,
                    time: time_of(row.get::<_, String>(3)?),
                })
            })?;
            for row in present {
                rows.push(row?);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT s.roll_number, s.display_name
             FROM students s
             WHERE NOT EXISTS (
                 SELECT 1 FROM attendance a
                 WHERE a.roll_number = s.roll_number AND a.date = ?1
             )
             ORDER BY s.roll_number",
        )?;
        let absent = stmt.query_map(params![date_str], |row| {
            Ok(AttendanceRow {
                roll_number: row.get(0)?,
                display_name: row.get(1)?,
                status: "Absent".into(),
                date: "-".into(),
                time: "-".into(),
            })
        })?;
        for row in absent {
            rows.push(row?);
        }

        Ok(rows)
    }

    /// Reporting read: full history for one roll number.
    pub fn attendance_for_roll(&self, roll_number: &str) -> Result<Vec<AttendanceRow>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.roll_number, s.display_name, a.status, a.date, a.timestamp
             FROM attendance a
             JOIN students s ON s.roll_number = a.roll_number
             WHERE a.roll_number = ?1
             ORDER BY a.date DESC",
        )?;
        let rows = stmt.query_map(params![roll_number], history_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Reporting read: history for every student whose name contains `term`.
    pub fn search_attendance_by_name(&self, term: &str) -> Result<Vec<AttendanceRow>, StoreError> {
        let pattern = format!("%{term}%");
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.roll_number, s.display_name, a.status, a.date, a.timestamp
             FROM attendance a
             JOIN students s ON s.roll_number = a.roll_number
             WHERE s.display_name LIKE ?1
             ORDER BY a.date DESC",
        )?;
        let rows = stmt.query_map(params![pattern], history_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Dashboard counts: enrolled, present, and computed absent for a date.
    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, StoreError> {
        let total_students = self.student_count()?;
        // Ledger rows of since-removed students do not count. EXISTS rather
        // than a join: one person may hold several enrollment rows.
        let present: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM attendance a
             WHERE a.date = ?1 AND a.status = 'Present'
               AND EXISTS (
                   SELECT 1 FROM students s WHERE s.roll_number = a.roll_number
               )",
            params![date.format(DATE_FMT).to_string()],
            |row| row.get(0),
        )?;
        Ok(DailySummary {
            date: date.format(DATE_FMT).to_string(),
            total_students,
            present,
            absent: total_students - present,
        })
    }
}

fn history_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttendanceRow> {
    Ok(AttendanceRow {
        roll_number: row.get(0)?,
        display_name: row.get(1)?,
        status: row.get(2)?,
        date: row.get(3)?,
        time: time_of(row.get::<_, String>(4)?),
    })
}

/// Pull the HH:MM:SS part out of an RFC 3339 timestamp.
fn time_of(timestamp: String) -> String {
    DateTime::parse_from_rfc3339(&timestamp)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or(timestamp)
}
