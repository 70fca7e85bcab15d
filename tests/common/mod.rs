#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use campus_client::error::ApiError;
use campus_client::models::{
    AttendanceRecord, AttendanceStatus, ClassInfo, NewPendingAssignment, PendingAssignment,
    Student, SubmittedAssignment, TimetableEntry,
};
use campus_client::remote::{ApiMessage, AssignmentUpload, RemoteClient};
use campus_client::services::FileSource;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query { student_id: i64, date: NaiveDate },
    Insert { student_id: i64, status: i32, date: NaiveDate },
    Update { id: i64, student_id: i64, status: i32, date: NaiveDate },
    Upload { student_id: i64, assignment_id: i64, filename: String, len: usize },
}

/// In-memory stand-in for the PHP API that records every call it receives.
#[derive(Default)]
pub struct MockRemote {
    pub records: Mutex<Vec<AttendanceRecord>>,
    pub calls: Mutex<Vec<Call>>,
    pub fail_queries: bool,
    pub fail_writes: Option<u16>,
    /// Upload responses in order; an empty queue means success.
    pub upload_results: Mutex<VecDeque<Result<(), u16>>>,
    /// Delay before answering queries, to let concurrent callers interleave.
    pub query_delay: Option<Duration>,
    /// Delay before an insert or update is applied.
    pub write_delay: Option<Duration>,
    /// Delay before an upload is answered.
    pub upload_delay: Option<Duration>,
    pub next_id: AtomicUsize,
}

impl MockRemote {
    pub fn with_records(records: Vec<AttendanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            next_id: AtomicUsize::new(100),
            ..Default::default()
        }
    }

    pub fn failing_uploads(statuses: &[u16]) -> Self {
        Self {
            upload_results: Mutex::new(statuses.iter().map(|s| Err(*s)).collect()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Insert { .. }))
            .collect()
    }

    pub fn updates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Update { .. }))
            .collect()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn write_failure(&self) -> Result<(), ApiError> {
        match self.fail_writes {
            Some(status) => Err(ApiError::Server {
                status,
                message: "write rejected".to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub fn record(id: i64, student_id: i64, status: i32, date: NaiveDate) -> AttendanceRecord {
    AttendanceRecord {
        id,
        student_id,
        status: status.into(),
        date,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[async_trait]
impl RemoteClient for MockRemote {
    async fn query_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.record(Call::Query { student_id, date });
        Self::pause(self.query_delay).await;
        if self.fail_queries {
            return Err(ApiError::Server {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id && r.date == date)
            .cloned()
            .collect())
    }

    async fn insert_attendance(
        &self,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError> {
        self.record(Call::Insert {
            student_id,
            status: status.code(),
            date,
        });
        Self::pause(self.write_delay).await;
        self.write_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        self.records.lock().unwrap().push(AttendanceRecord {
            id,
            student_id,
            status,
            date,
        });
        Ok(ApiMessage {
            message: "Attendance recorded".to_string(),
        })
    }

    async fn update_attendance(
        &self,
        id: i64,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError> {
        self.record(Call::Update {
            id,
            student_id,
            status: status.code(),
            date,
        });
        Self::pause(self.write_delay).await;
        self.write_failure()?;
        if let Some(existing) = self.records.lock().unwrap().iter_mut().find(|r| r.id == id) {
            existing.status = status;
        }
        Ok(ApiMessage {
            message: "Attendance updated".to_string(),
        })
    }

    async fn upload_assignment(&self, mut upload: AssignmentUpload) -> Result<(), ApiError> {
        let mut content = Vec::new();
        upload.file.read_to_end(&mut content).unwrap();
        assert_eq!(content.len() as u64, upload.len);
        self.record(Call::Upload {
            student_id: upload.student_id,
            assignment_id: upload.assignment_id,
            filename: upload.filename.clone(),
            len: content.len(),
        });
        Self::pause(self.upload_delay).await;
        match self.upload_results.lock().unwrap().pop_front() {
            Some(Err(status)) => Err(ApiError::Server {
                status,
                message: "upload rejected".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn fetch_attendance(&self, student_id: i64) -> Result<Vec<AttendanceRecord>, ApiError> {
        if self.fail_queries {
            return Err(ApiError::Server {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn fetch_students(&self, _class_id: i64) -> Result<Vec<Student>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_pending_assignments(
        &self,
        _class_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_faculty_assignments(
        &self,
        _faculty_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_classes(&self, _faculty_id: i64) -> Result<Vec<ClassInfo>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_timetable(&self, _class_id: i64) -> Result<Vec<TimetableEntry>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_submissions(&self) -> Result<Vec<SubmittedAssignment>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_pending_assignment(
        &self,
        _assignment: &NewPendingAssignment,
    ) -> Result<ApiMessage, ApiError> {
        Ok(ApiMessage {
            message: "Assignment added".to_string(),
        })
    }

    async fn delete_pending_assignment(&self, _id: i64) -> Result<ApiMessage, ApiError> {
        Ok(ApiMessage {
            message: "Assignment deleted".to_string(),
        })
    }
}

/// File source backed by memory that counts how often it was opened.
pub struct MemorySource {
    pub bytes: Vec<u8>,
    pub unreadable: bool,
    pub opens: AtomicUsize,
}

impl MemorySource {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            unreadable: false,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            bytes: Vec::new(),
            unreadable: true,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl FileSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.unreadable {
            return Err(io::Error::new(io::ErrorKind::NotFound, "content uri gone"));
        }
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}

/// Opens fine, then fails part way through reading.
pub struct BrokenReadSource {
    pub opens: AtomicUsize,
}

impl BrokenReadSource {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

struct BrokenReader {
    served_prefix: bool,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.served_prefix && !buf.is_empty() {
            self.served_prefix = true;
            buf[0] = b'%';
            return Ok(1);
        }
        Err(io::Error::other("content provider died"))
    }
}

impl FileSource for BrokenReadSource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(BrokenReader {
            served_prefix: false,
        }))
    }
}
