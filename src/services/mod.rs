pub mod attendance;
pub mod submission;

pub use attendance::{AttendanceSync, RosterFailure, RosterReport, UpsertOutcome};
pub use submission::{AssignmentSubmitter, FileSource, LocalFile, RetryPolicy};
