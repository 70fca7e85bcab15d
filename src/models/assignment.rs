use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAssignment {
    pub id: i64,
    pub faculty_id: i64,
    pub class_id: i64,
    pub subject: String,
    pub description: String,
    #[serde(with = "deadline_format")]
    pub submission_deadline: NaiveDateTime,
}

/// Form a faculty member fills in to post a new pending assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPendingAssignment {
    pub class_id: i64,
    pub faculty_id: i64,
    pub subject: String,
    pub description: String,
    #[serde(with = "deadline_format")]
    pub submission_deadline: NaiveDateTime,
}

impl NewPendingAssignment {
    pub fn deadline_field(&self) -> String {
        self.submission_deadline.format(deadline_format::FORMAT).to_string()
    }
}

/// A file a student has handed in, as listed for faculty review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAssignment {
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    #[serde(with = "deadline_format")]
    pub submission_time: NaiveDateTime,
    #[serde(rename = "fileLocation")]
    pub file_location: String,
}

/// Parses a deadline typed on the command line. A bare date means the end of that day.
pub fn parse_deadline(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(deadline) = NaiveDateTime::parse_from_str(raw, deadline_format::FORMAT) {
        return Ok(deadline);
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(23, 59, 59))
        .ok_or_else(|| format!("expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM:SS\", got {}", raw))
}

/// What a finished upload produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub attempts: u32,
    pub filename: String,
    pub bytes: u64,
}

/// Flattened outcome of a submission, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub http_status: Option<u16>,
    pub message: Option<String>,
}

impl From<&Result<SubmissionReceipt, SubmitError>> for SubmissionResult {
    fn from(result: &Result<SubmissionReceipt, SubmitError>) -> Self {
        match result {
            Ok(receipt) => SubmissionResult {
                success: true,
                http_status: None,
                message: Some(format!(
                    "Uploaded {} ({} bytes) after {} attempt(s)",
                    receipt.filename, receipt.bytes, receipt.attempts
                )),
            },
            Err(e) => SubmissionResult {
                success: false,
                http_status: e.status(),
                message: Some(e.to_string()),
            },
        }
    }
}

// Server sends "YYYY-MM-DD HH:MM:SS", which chrono's default serde rejects.
mod deadline_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn decodes_server_deadline_format() {
        let json = r#"{
            "id": 11,
            "faculty_id": 3,
            "class_id": 2,
            "subject": "Networks",
            "description": "Lab 4 report",
            "submission_deadline": "2024-04-10 23:59:00"
        }"#;
        let assignment: PendingAssignment = serde_json::from_str(json).unwrap();
        assert_eq!(assignment.submission_deadline.to_string(), "2024-04-10 23:59:00");
    }

    #[test]
    fn submissions_use_server_field_names() {
        let json = r#"[{
            "id": 5,
            "student_id": 42,
            "assignment_id": 11,
            "submission_time": "2024-04-09 18:30:12",
            "fileLocation": "uploads/assignment_1712_abc.pdf"
        }]"#;
        let submissions: Vec<SubmittedAssignment> = serde_json::from_str(json).unwrap();
        assert_eq!(submissions[0].file_location, "uploads/assignment_1712_abc.pdf");
        assert_eq!(submissions[0].submission_time.to_string(), "2024-04-09 18:30:12");
    }

    #[test]
    fn deadline_accepts_date_or_full_timestamp() {
        assert_eq!(
            parse_deadline("2024-04-10").unwrap().to_string(),
            "2024-04-10 23:59:59"
        );
        assert_eq!(
            parse_deadline("2024-04-10 09:00:00").unwrap().to_string(),
            "2024-04-10 09:00:00"
        );
        assert!(parse_deadline("next friday").is_err());
    }

    #[test]
    fn result_carries_status_of_last_remote_failure() {
        let result: Result<SubmissionReceipt, SubmitError> = Err(SubmitError::RetriesExhausted {
            attempts: 3,
            last: Box::new(SubmitError::Remote(ApiError::Server {
                status: 503,
                message: "busy".to_string(),
            })),
        });
        let summary = SubmissionResult::from(&result);
        assert!(!summary.success);
        assert_eq!(summary.http_status, Some(503));
        assert!(summary.message.unwrap().contains("after 3 attempts"));
    }
}
