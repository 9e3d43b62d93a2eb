//! Signature store — the students table.

use crate::codec::{decode_signature, encode_signature};
use crate::{Db, StoreError};
use chrono::Local;
use rollcall_core::{Identity, Signature};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

/// An enrolled signature with the identity reference the match engine hands
/// back on a hit.
#[derive(Debug, Clone)]
pub struct SignatureRow {
    pub roll_number: String,
    pub display_name: String,
    pub signature: Signature,
}

/// Identity attributes without the signature, for reporting reads.
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: String,
    pub display_name: String,
    pub roll_number: String,
    pub department: String,
    pub class: String,
    pub semester: String,
    pub image_path: String,
    pub created_at: String,
}

/// Optional filters for [`Db::list_students`]; `None` means no constraint.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub department: Option<String>,
    pub class: Option<String>,
    pub semester: Option<String>,
}

impl Db {
    /// Insert a newly enrolled face. Atomic: either the row exists
    /// afterwards or the call failed and left no trace.
    ///
    /// A second enrollment into the same `(roll_number, department, class,
    /// semester)` scope fails with [`StoreError::DuplicateScope`] — also
    /// under concurrent callers, via the table's uniqueness constraint.
    pub fn insert_student(
        &self,
        identity: &Identity,
        signature: &Signature,
        image_path: &str,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Local::now().to_rfc3339();

        let result = self.conn().execute(
            "INSERT INTO students
                 (id, display_name, roll_number, department, class, semester,
                  signature, image_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                identity.display_name,
                identity.roll_number,
                identity.department,
                identity.class,
                identity.semester,
                encode_signature(signature),
                image_path,
                created_at,
            ],
        );

        match result {
            Ok(_) => {
                tracing::info!(
                    roll = %identity.roll_number,
                    department = %identity.department,
                    class = %identity.class,
                    "student enrolled"
                );
                Ok(id)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateScope)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Does an enrolled face already exist for this exact scope tuple?
    pub fn scope_exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        let conn = self.conn();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students
                 WHERE roll_number = ?1 AND department = ?2
                   AND class = ?3 AND semester = ?4",
                params![
                    identity.roll_number,
                    identity.department,
                    identity.class,
                    identity.semester
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Signatures enrolled in one department + class — the candidate set for
    /// the duplicate-face scan at enrollment time.
    pub fn signatures_in_class(
        &self,
        department: &str,
        class: &str,
    ) -> Result<Vec<SignatureRow>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT roll_number, display_name, signature FROM students
             WHERE department = ?1 AND class = ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![department, class], signature_row)?;
        collect_signature_rows(rows)
    }

    /// Every enrolled signature — the candidate set for recognition, which
    /// matches globally.
    pub fn all_signatures(&self) -> Result<Vec<SignatureRow>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT roll_number, display_name, signature FROM students ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], signature_row)?;
        collect_signature_rows(rows)
    }

    /// Reporting read: enrolled identities, optionally filtered by scope.
    pub fn list_students(&self, filter: &StudentFilter) -> Result<Vec<StudentSummary>, StoreError> {
        let mut sql = String::from(
            "SELECT id, display_name, roll_number, department, class, semester,
                    image_path, created_at
             FROM students WHERE 1=1",
        );
        let mut params: Vec<&str> = Vec::new();
        if let Some(d) = &filter.department {
            sql.push_str(" AND department = ?");
            params.push(d);
        }
        if let Some(c) = &filter.class {
            sql.push_str(" AND class = ?");
            params.push(c);
        }
        if let Some(s) = &filter.semester {
            sql.push_str(" AND semester = ?");
            params.push(s);
        }
        sql.push_str(" ORDER BY department, class, roll_number");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
            Ok(StudentSummary {
                id: row.get(0)?,
                display_name: row.get(1)?,
                roll_number: row.get(2)?,
                department: row.get(3)?,
                class: row.get(4)?,
                semester: row.get(5)?,
                image_path: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn student_count(&self) -> Result<i64, StoreError> {
        let count =
            self.conn()
                .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Administrative removal by row id.
    pub fn remove_student(&self, id: &str) -> Result<bool, StoreError> {
        let changed = self
            .conn()
            .execute("DELETE FROM students WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

fn signature_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn collect_signature_rows(
    rows: impl Iterator<Item = rusqlite::Result<(String, String, Vec<u8>)>>,
) -> Result<Vec<SignatureRow>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        let (roll_number, display_name, blob) = row?;
        out.push(SignatureRow {
            roll_number,
            display_name,
            signature: decode_signature(&blob)?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roll: &str, department: &str, class: &str, semester: &str) -> Identity {
        Identity {
            display_name: format!("Student {roll}"),
            roll_number: roll.into(),
            department: department.into(),
            class: class.into(),
            semester: semester.into(),
        }
    }

    fn sig(seed: f64) -> Signature {
        Signature::new((0..128).map(|i| seed + i as f64 * 0.001).collect())
    }

    #[test]
    fn insert_then_scope_exists() {
        let db = Db::open_in_memory().unwrap();
        let id = identity("17", "CS", "A", "5");
        assert!(!db.scope_exists(&id).unwrap());
        db.insert_student(&id, &sig(0.1), "faces/17.png").unwrap();
        assert!(db.scope_exists(&id).unwrap());
    }

    #[test]
    fn duplicate_scope_is_rejected() {
        let db = Db::open_in_memory().unwrap();
        let id = identity("17", "CS", "A", "5");
        db.insert_student(&id, &sig(0.1), "faces/17.png").unwrap();
        let err = db.insert_student(&id, &sig(0.9), "faces/17b.png");
        assert!(matches!(err, Err(StoreError::DuplicateScope)));
        assert_eq!(db.student_count().unwrap(), 1);
    }

    #[test]
    fn same_roll_other_department_is_a_distinct_scope() {
        let db = Db::open_in_memory().unwrap();
        db.insert_student(&identity("17", "CS", "A", "5"), &sig(0.1), "a.png")
            .unwrap();
        db.insert_student(&identity("17", "EE", "A", "5"), &sig(0.2), "b.png")
            .unwrap();
        assert_eq!(db.student_count().unwrap(), 2);
    }

    #[test]
    fn signatures_round_trip_through_storage() {
        let db = Db::open_in_memory().unwrap();
        let original = sig(0.42);
        db.insert_student(&identity("9", "CS", "A", "5"), &original, "9.png")
            .unwrap();
        let rows = db.all_signatures().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].signature, original);
    }

    #[test]
    fn signatures_in_class_excludes_other_classes() {
        let db = Db::open_in_memory().unwrap();
        db.insert_student(&identity("1", "CS", "A", "5"), &sig(0.1), "1.png")
            .unwrap();
        db.insert_student(&identity("2", "CS", "B", "5"), &sig(0.2), "2.png")
            .unwrap();
        db.insert_student(&identity("3", "EE", "A", "5"), &sig(0.3), "3.png")
            .unwrap();

        let rows = db.signatures_in_class("CS", "A").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].roll_number, "1");
        assert_eq!(db.all_signatures().unwrap().len(), 3);
    }

    #[test]
    fn list_students_with_filter() {
        let db = Db::open_in_memory().unwrap();
        db.insert_student(&identity("1", "CS", "A", "5"), &sig(0.1), "1.png")
            .unwrap();
        db.insert_student(&identity("2", "EE", "A", "3"), &sig(0.2), "2.png")
            .unwrap();

        let all = db.list_students(&StudentFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = db
            .list_students(&StudentFilter {
                department: Some("EE".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].roll_number, "2");
    }

    #[test]
    fn remove_student_by_id() {
        let db = Db::open_in_memory().unwrap();
        let row_id = db
            .insert_student(&identity("1", "CS", "A", "5"), &sig(0.1), "1.png")
            .unwrap();
        assert!(db.remove_student(&row_id).unwrap());
        assert!(!db.remove_student(&row_id).unwrap());
        assert_eq!(db.student_count().unwrap(), 0);
    }
}
