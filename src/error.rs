use std::io;

use thiserror::Error;

/// Failure of a single call against the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Attendance query failed: {0}")]
    Query(#[source] ApiError),

    #[error("Attendance write failed: {0}")]
    Write(#[source] ApiError),

    #[error("Attendance sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// HTTP status of the failed call, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Query(e) | SyncError::Write(e) => e.status(),
            SyncError::Cancelled => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SyncError::Query(e) | SyncError::Write(e) => e.message(),
            SyncError::Cancelled => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Source file could not be opened: {0}")]
    SourceUnreadable(#[source] io::Error),

    #[error("Temporary file error: {0}")]
    TempFile(#[source] io::Error),

    #[error("Copied file is empty")]
    EmptyPayload,

    #[error("Upload failed: {0}")]
    Remote(#[source] ApiError),

    #[error("Submission failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<SubmitError>,
    },

    #[error("Submission cancelled")]
    Cancelled,
}

impl SubmitError {
    /// HTTP status of the underlying remote failure, looking through `RetriesExhausted`.
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmitError::Remote(e) => e.status(),
            SubmitError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}
