use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance status as the server stores it: 0 absent, 1 present, 2 granted leave.
///
/// Codes outside that range are kept as `Unknown` so that reads never fail on them
/// and writes send them through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum AttendanceStatus {
    Absent,
    Present,
    Granted,
    Unknown(i32),
}

impl AttendanceStatus {
    pub fn code(self) -> i32 {
        match self {
            AttendanceStatus::Absent => 0,
            AttendanceStatus::Present => 1,
            AttendanceStatus::Granted => 2,
            AttendanceStatus::Unknown(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Granted => "Granted",
            AttendanceStatus::Unknown(_) => "Unknown",
        }
    }

    /// Next status in the faculty toggle cycle.
    pub fn next(self) -> Self {
        match self {
            AttendanceStatus::Absent => AttendanceStatus::Present,
            AttendanceStatus::Present => AttendanceStatus::Granted,
            AttendanceStatus::Granted | AttendanceStatus::Unknown(_) => AttendanceStatus::Absent,
        }
    }
}

impl From<i32> for AttendanceStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => AttendanceStatus::Absent,
            1 => AttendanceStatus::Present,
            2 => AttendanceStatus::Granted,
            other => AttendanceStatus::Unknown(other),
        }
    }
}

impl From<AttendanceStatus> for i32 {
    fn from(status: AttendanceStatus) -> Self {
        status.code()
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absent" => Ok(AttendanceStatus::Absent),
            "present" => Ok(AttendanceStatus::Present),
            "granted" => Ok(AttendanceStatus::Granted),
            other => other
                .parse::<i32>()
                .map(AttendanceStatus::from)
                .map_err(|_| format!("unknown attendance status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
}

/// Per-student counts shown on the student dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    pub granted: usize,
    pub unknown: usize,
    pub percentage: f64,
}

impl AttendanceSummary {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut summary = AttendanceSummary::default();
        for record in records {
            match record.status {
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Granted => summary.granted += 1,
                AttendanceStatus::Unknown(_) => summary.unknown += 1,
            }
        }

        if !records.is_empty() {
            let attended = (summary.present + summary.granted) as f64;
            summary.percentage = attended / records.len() as f64 * 100.0;
        }
        summary
    }
}
