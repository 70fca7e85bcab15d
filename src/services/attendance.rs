use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::cancel::CancelSignal;
use crate::error::SyncError;
use crate::models::{AttendanceStatus, AttendanceSummary};
use crate::remote::RemoteClient;

/// Which write the upsert ended up issuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted { message: String },
    Updated { id: i64, message: String },
}

#[derive(Debug, Default, Serialize)]
pub struct RosterReport {
    pub inserted: usize,
    pub updated: usize,
    pub failed: Vec<RosterFailure>,
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct RosterFailure {
    pub student_id: i64,
    pub status: Option<u16>,
    pub error: String,
}

/// Writes attendance through query-then-branch. The pair of calls is not atomic on the
/// server, so two writers racing on the same (student, date) can both insert.
pub struct AttendanceSync {
    remote: Arc<dyn RemoteClient>,
}

impl AttendanceSync {
    pub fn new(remote: Arc<dyn RemoteClient>) -> Self {
        Self { remote }
    }

    pub async fn upsert_attendance(
        &self,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
        cancel: &CancelSignal,
    ) -> Result<UpsertOutcome, SyncError> {
        let existing = cancel
            .guard(self.remote.query_attendance(student_id, date))
            .await
            .ok_or(SyncError::Cancelled)?;

        // A failed lookup is ambiguous; insert anyway and accept a possible duplicate.
        let existing_id = match existing {
            Ok(records) => records.first().map(|r| r.id),
            Err(e) => {
                warn!(
                    "Attendance lookup failed for student {} on {}, inserting: {}",
                    student_id, date, e
                );
                None
            }
        };

        let outcome = match existing_id {
            Some(id) => {
                let response = cancel
                    .guard(self.remote.update_attendance(id, student_id, status, date))
                    .await
                    .ok_or(SyncError::Cancelled)?
                    .map_err(SyncError::Write)?;
                UpsertOutcome::Updated {
                    id,
                    message: response.message,
                }
            }
            None => {
                let response = cancel
                    .guard(self.remote.insert_attendance(student_id, status, date))
                    .await
                    .ok_or(SyncError::Cancelled)?
                    .map_err(SyncError::Write)?;
                UpsertOutcome::Inserted {
                    message: response.message,
                }
            }
        };

        info!(
            "Attendance for student {} on {} set to {}: {:?}",
            student_id,
            date,
            status.label(),
            outcome
        );
        Ok(outcome)
    }

    /// Marks a whole roster one student at a time. Failures are collected, not fatal.
    pub async fn submit_roster(
        &self,
        entries: &[(i64, AttendanceStatus)],
        date: NaiveDate,
        cancel: &CancelSignal,
    ) -> RosterReport {
        let mut report = RosterReport::default();

        for &(student_id, status) in entries {
            match self.upsert_attendance(student_id, status, date, cancel).await {
                Ok(UpsertOutcome::Inserted { .. }) => report.inserted += 1,
                Ok(UpsertOutcome::Updated { .. }) => report.updated += 1,
                Err(SyncError::Cancelled) => {
                    warn!("Roster submission cancelled at student {}", student_id);
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!("Attendance for student {} not saved: {}", student_id, e);
                    report.failed.push(RosterFailure {
                        student_id,
                        status: e.status(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Roster submitted for {} - inserted: {}, updated: {}, failed: {}",
            date,
            report.inserted,
            report.updated,
            report.failed.len()
        );
        report
    }

    pub async fn summary(
        &self,
        student_id: i64,
        cancel: &CancelSignal,
    ) -> Result<AttendanceSummary, SyncError> {
        let records = cancel
            .guard(self.remote.fetch_attendance(student_id))
            .await
            .ok_or(SyncError::Cancelled)?
            .map_err(SyncError::Query)?;
        Ok(AttendanceSummary::from_records(&records))
    }
}
