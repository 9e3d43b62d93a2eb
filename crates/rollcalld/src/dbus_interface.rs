//! D-Bus surface for the attendance daemon.
//!
//! Bus name: org.rollcall.Attendance1
//! Object path: /org/rollcall/Attendance1
//!
//! Every method returns a JSON string with a `status` tag and a
//! human-readable `message`, so UI layers can relay results verbatim.
//! Errors never surface as raw D-Bus errors.

use crate::engine::EngineHandle;
use crate::recognize::RecognizeOutcome;
use chrono::{Local, NaiveDate};
use rollcall_core::Identity;
use rollcall_store::{Db, StudentFilter};
use serde_json::json;
use std::sync::Arc;
use zbus::interface;

pub struct RollcallService {
    pub engine: EngineHandle,
    pub db: Arc<Db>,
}

fn ok_with(message: &str, data: serde_json::Value) -> String {
    json!({ "status": "ok", "message": message, "data": data }).to_string()
}

fn error(message: String) -> String {
    json!({ "status": "error", "message": message }).to_string()
}

/// Parse `YYYY-MM-DD`, empty string meaning today.
fn parse_date(date: &str) -> Result<NaiveDate, String> {
    if date.is_empty() {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{date}', expected YYYY-MM-DD"))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[interface(name = "org.rollcall.Attendance1")]
impl RollcallService {
    /// Enroll a student from a JSON identity and an encoded image.
    async fn enroll(&self, identity_json: &str, image: Vec<u8>) -> String {
        let identity: Identity = match serde_json::from_str(identity_json) {
            Ok(id) => id,
            Err(e) => return error(format!("invalid identity payload: {e}")),
        };
        tracing::info!(roll = %identity.roll_number, "enroll requested");

        match self.engine.enroll(identity, image).await {
            Ok(enrollment) => ok_with(
                "Student registered successfully.",
                json!({ "student_id": enrollment.student_id }),
            ),
            Err(e) => error(e.to_string()),
        }
    }

    /// Run one recognition session and mark attendance on a match.
    async fn recognize(&self) -> String {
        tracing::info!("recognize requested");
        match self.engine.recognize().await {
            Ok(RecognizeOutcome::Marked {
                display_name,
                roll_number,
            }) => ok_with(
                &format!("Attendance marked successfully for {display_name}."),
                json!({ "roll_number": roll_number, "marked": true }),
            ),
            Ok(RecognizeOutcome::AlreadyMarked {
                display_name,
                roll_number,
            }) => ok_with(
                &format!("Attendance already marked for {display_name}."),
                json!({ "roll_number": roll_number, "marked": false }),
            ),
            Ok(RecognizeOutcome::NotRecognized) => {
                error("Face not recognized. Please register first.".into())
            }
            Ok(RecognizeOutcome::Timeout) => {
                error("No face detected. Try again with better lighting.".into())
            }
            Err(e) => error(e.to_string()),
        }
    }

    /// Enrolled identities, optionally filtered; empty strings mean no filter.
    async fn list_students(&self, department: &str, class: &str, semester: &str) -> String {
        let filter = StudentFilter {
            department: non_empty(department),
            class: non_empty(class),
            semester: non_empty(semester),
        };
        match self.db.list_students(&filter) {
            Ok(students) => ok_with("", json!(students)),
            Err(e) => error(e.to_string()),
        }
    }

    /// Everyone's Present/Absent status for a date (empty = today).
    async fn attendance_on(&self, date: &str) -> String {
        let date = match parse_date(date) {
            Ok(d) => d,
            Err(e) => return error(e),
        };
        match self.db.attendance_on(date) {
            Ok(rows) => ok_with("", json!(rows)),
            Err(e) => error(e.to_string()),
        }
    }

    /// Remove an enrolled student by row id.
    async fn remove_student(&self, id: &str) -> String {
        match self.db.remove_student(id) {
            Ok(true) => {
                tracing::info!(id, "student removed");
                ok_with("Student removed.", serde_json::Value::Null)
            }
            Ok(false) => error(format!("no student with id {id}")),
            Err(e) => error(e.to_string()),
        }
    }

    /// Attendance history for students whose name contains the term.
    async fn search_attendance(&self, name: &str) -> String {
        match self.db.search_attendance_by_name(name) {
            Ok(rows) => ok_with("", json!(rows)),
            Err(e) => error(e.to_string()),
        }
    }

    /// Dashboard counts for a date (empty = today).
    async fn summary(&self, date: &str) -> String {
        let date = match parse_date(date) {
            Ok(d) => d,
            Err(e) => return error(e),
        };
        match self.db.daily_summary(date) {
            Ok(summary) => ok_with("", json!(summary)),
            Err(e) => error(e.to_string()),
        }
    }

    /// Daemon status information.
    async fn status(&self) -> String {
        match self.db.student_count() {
            Ok(count) => ok_with(
                "",
                json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "enrolled_students": count,
                }),
            ),
            Err(e) => error(e.to_string()),
        }
    }
}
