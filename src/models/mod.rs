pub mod assignment;
pub mod attendance;
pub mod class;
pub mod student;

pub use assignment::{
    NewPendingAssignment, PendingAssignment, SubmissionReceipt, SubmissionResult,
    SubmittedAssignment, parse_deadline,
};
pub use attendance::{AttendanceRecord, AttendanceStatus, AttendanceSummary};
pub use class::{ClassInfo, TimetableEntry};
pub use student::Student;
