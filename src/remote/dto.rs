use std::fs::File;

use serde::{Deserialize, Serialize};

/// Body the PHP endpoints return for writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// A copied assignment ready to go out. `file` is read from its current position and
/// streamed as the `pdf` part; `len` is its byte length.
#[derive(Debug)]
pub struct AssignmentUpload {
    pub student_id: i64,
    pub assignment_id: i64,
    pub file: File,
    pub len: u64,
    pub filename: String,
}

pub const ATTENDANCE_PATH: &str = "students/attendance.php";
pub const ASSIGNMENT_SUBMIT_PATH: &str = "students/AssignmentSubmit.php";
pub const STUDENTS_PATH: &str = "students/stud.php";
pub const PENDING_ASSIGNMENT_PATH: &str = "students/pendingAssignment.php";
pub const CLASSES_PATH: &str = "students/classes.php";
pub const TIMETABLE_PATH: &str = "students/timetable.php";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const FILE_PART: &str = "pdf";
/// Query key the delete endpoint expects for the assignment id.
pub const DELETE_ASSIGNMENT_KEY: &str = "Ass_id";
