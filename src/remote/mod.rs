pub mod dto;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    Body, Client, Response, Url,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::models::{
    AttendanceRecord, AttendanceStatus, ClassInfo, NewPendingAssignment, PendingAssignment,
    Student, SubmittedAssignment, TimetableEntry,
};

pub use dto::{ApiMessage, AssignmentUpload};

#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn query_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, ApiError>;

    async fn insert_attendance(
        &self,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError>;

    async fn update_attendance(
        &self,
        id: i64,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError>;

    async fn upload_assignment(&self, upload: AssignmentUpload) -> Result<(), ApiError>;

    async fn fetch_attendance(&self, student_id: i64) -> Result<Vec<AttendanceRecord>, ApiError>;

    async fn fetch_students(&self, class_id: i64) -> Result<Vec<Student>, ApiError>;

    async fn fetch_pending_assignments(
        &self,
        class_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError>;

    /// Pending assignments a faculty member has posted, across all their classes.
    async fn fetch_faculty_assignments(
        &self,
        faculty_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError>;

    async fn fetch_classes(&self, faculty_id: i64) -> Result<Vec<ClassInfo>, ApiError>;

    async fn fetch_timetable(&self, class_id: i64) -> Result<Vec<TimetableEntry>, ApiError>;

    /// Every uploaded submission; the endpoint takes no filter.
    async fn fetch_submissions(&self) -> Result<Vec<SubmittedAssignment>, ApiError>;

    async fn create_pending_assignment(
        &self,
        assignment: &NewPendingAssignment,
    ) -> Result<ApiMessage, ApiError>;

    async fn delete_pending_assignment(&self, id: i64) -> Result<ApiMessage, ApiError>;
}

pub struct HttpRemoteClient {
    client: Client,
    base_url: Url,
}

impl HttpRemoteClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|_| ConfigError::Invalid {
            var: "CAMPUS_API_BASE_URL",
            value: config.base_url.clone(),
        })?;
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                var: "CAMPUS_API_TIMEOUT_SECS",
                value: format!("{:?} ({})", config.timeout, e),
            })?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self.endpoint(path, params)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let body = read_success(response).await?;

        serde_json::from_str::<Vec<T>>(&body)
            .map_err(|e| ApiError::Decode(format!("{} ({})", e, path)))
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<ApiMessage, ApiError> {
        let url = self.endpoint(path, &[])?;
        let response = self.client.post(url).multipart(form).send().await?;
        let body = read_success(response).await?;
        debug!("{} write response: {}", path, body);

        Ok(write_message(body))
    }
}

// A 2xx body that is not `{message}` still counts; the raw text becomes the message.
fn write_message(body: String) -> ApiMessage {
    serde_json::from_str::<ApiMessage>(&body).unwrap_or(ApiMessage { message: body })
}

fn attendance_form(student_id: i64, status: AttendanceStatus, date: NaiveDate) -> Form {
    Form::new()
        .text("student_id", student_id.to_string())
        .text("status", status.code().to_string())
        .text("date", date.format("%Y-%m-%d").to_string())
}

/// Returns the body of a 2xx response, or the server's complaint otherwise.
///
/// A failure status wins over a broken body: the error keeps the status even when the
/// body cannot be read.
async fn read_success(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: server_message(&body),
        });
    }

    Ok(response.text().await?)
}

fn server_message(body: &str) -> String {
    serde_json::from_str::<ApiMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn query_attendance(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.get_list(
            dto::ATTENDANCE_PATH,
            &[
                ("student_id", student_id.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }

    async fn insert_attendance(
        &self,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError> {
        self.post_form(dto::ATTENDANCE_PATH, attendance_form(student_id, status, date))
            .await
    }

    async fn update_attendance(
        &self,
        id: i64,
        student_id: i64,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Result<ApiMessage, ApiError> {
        let form = attendance_form(student_id, status, date).text("id", id.to_string());
        self.post_form(dto::ATTENDANCE_PATH, form).await
    }

    async fn upload_assignment(&self, upload: AssignmentUpload) -> Result<(), ApiError> {
        let url = self.endpoint(dto::ASSIGNMENT_SUBMIT_PATH, &[])?;
        let body = Body::from(tokio::fs::File::from_std(upload.file));
        let file = Part::stream_with_length(body, upload.len)
            .file_name(upload.filename)
            .mime_str(dto::PDF_CONTENT_TYPE)?;
        let form = Form::new()
            .text("student_id", upload.student_id.to_string())
            .text("assignment_id", upload.assignment_id.to_string())
            .part(dto::FILE_PART, file);

        let response = self.client.post(url).multipart(form).send().await?;
        read_success(response).await?;
        Ok(())
    }

    async fn fetch_attendance(&self, student_id: i64) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.get_list(dto::ATTENDANCE_PATH, &[("student_id", student_id.to_string())])
            .await
    }

    async fn fetch_students(&self, class_id: i64) -> Result<Vec<Student>, ApiError> {
        self.get_list(dto::STUDENTS_PATH, &[("class_id", class_id.to_string())])
            .await
    }

    async fn fetch_pending_assignments(
        &self,
        class_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError> {
        self.get_list(dto::PENDING_ASSIGNMENT_PATH, &[("class_id", class_id.to_string())])
            .await
    }

    async fn fetch_faculty_assignments(
        &self,
        faculty_id: i64,
    ) -> Result<Vec<PendingAssignment>, ApiError> {
        self.get_list(
            dto::PENDING_ASSIGNMENT_PATH,
            &[("faculty_id", faculty_id.to_string())],
        )
        .await
    }

    async fn fetch_classes(&self, faculty_id: i64) -> Result<Vec<ClassInfo>, ApiError> {
        self.get_list(dto::CLASSES_PATH, &[("faculty_id", faculty_id.to_string())])
            .await
    }

    async fn fetch_timetable(&self, class_id: i64) -> Result<Vec<TimetableEntry>, ApiError> {
        self.get_list(dto::TIMETABLE_PATH, &[("class_id", class_id.to_string())])
            .await
    }

    async fn fetch_submissions(&self) -> Result<Vec<SubmittedAssignment>, ApiError> {
        self.get_list(dto::ASSIGNMENT_SUBMIT_PATH, &[]).await
    }

    async fn create_pending_assignment(
        &self,
        assignment: &NewPendingAssignment,
    ) -> Result<ApiMessage, ApiError> {
        let form = Form::new()
            .text("class_id", assignment.class_id.to_string())
            .text("faculty_id", assignment.faculty_id.to_string())
            .text("subject", assignment.subject.clone())
            .text("description", assignment.description.clone())
            .text("submission_deadline", assignment.deadline_field());
        self.post_form(dto::PENDING_ASSIGNMENT_PATH, form).await
    }

    async fn delete_pending_assignment(&self, id: i64) -> Result<ApiMessage, ApiError> {
        let url = self.endpoint(
            dto::PENDING_ASSIGNMENT_PATH,
            &[(dto::DELETE_ASSIGNMENT_KEY, id.to_string())],
        )?;
        debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        let body = read_success(response).await?;

        Ok(write_message(body))
    }
}
