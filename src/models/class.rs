use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A class taught by a faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: i64,
    pub class_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub year: i32,
}

/// One weekly timetable slot. Times arrive as `HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: i64,
    pub faculty_id: i64,
    pub class_id: i64,
    pub subject: String,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
