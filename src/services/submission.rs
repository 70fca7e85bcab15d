use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::config::{ClientConfig, MAX_RETRIES};
use crate::error::SubmitError;
use crate::models::SubmissionReceipt;
use crate::remote::{AssignmentUpload, RemoteClient};

const COPY_BUF_SIZE: usize = 8 * 1024;

/// Something the submitter can read the assignment bytes from, once per attempt.
pub trait FileSource: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileSource for LocalFile {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay between attempts. `None` retries immediately.
    pub backoff: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            backoff: None,
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            backoff: config.retry_backoff,
        }
    }
}

pub struct AssignmentSubmitter {
    remote: Arc<dyn RemoteClient>,
    policy: RetryPolicy,
    temp_dir: Option<PathBuf>,
}

impl AssignmentSubmitter {
    pub fn new(remote: Arc<dyn RemoteClient>, policy: RetryPolicy) -> Self {
        Self {
            remote,
            policy,
            temp_dir: None,
        }
    }

    pub fn from_config(remote: Arc<dyn RemoteClient>, config: &ClientConfig) -> Self {
        Self::new(remote, RetryPolicy::from(config)).with_temp_dir(config.temp_dir.clone())
    }

    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Copies `source` to a fresh temp file and uploads it, repeating the whole sequence
    /// on any failure until the policy's attempt bound is reached.
    ///
    /// `on_progress` sees 0.0 before the first attempt and 1.0 once the upload is
    /// accepted; the transport does not report anything finer.
    pub async fn submit<P>(
        &self,
        student_id: i64,
        assignment_id: i64,
        source: &dyn FileSource,
        mut on_progress: P,
        cancel: &CancelSignal,
    ) -> Result<SubmissionReceipt, SubmitError>
    where
        P: FnMut(f32),
    {
        let max_attempts = self.policy.max_attempts.max(1);
        on_progress(0.0);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(student_id, assignment_id, source, cancel).await {
                Ok((filename, bytes)) => {
                    info!(
                        "Assignment {} for student {} uploaded as {} on attempt {}",
                        assignment_id, student_id, filename, attempt
                    );
                    on_progress(1.0);
                    return Ok(SubmissionReceipt {
                        attempts: attempt,
                        filename,
                        bytes,
                    });
                }
                Err(SubmitError::Cancelled) => return Err(SubmitError::Cancelled),
                Err(e) => {
                    warn!("Submission attempt {}/{} failed: {}", attempt, max_attempts, e);
                    if attempt >= max_attempts {
                        return Err(SubmitError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    if let Some(delay) = self.policy.backoff {
                        cancel
                            .guard(tokio::time::sleep(delay))
                            .await
                            .ok_or(SubmitError::Cancelled)?;
                    }
                }
            }
        }
    }

    /// One copy+upload cycle. The temp file is removed when this returns.
    async fn attempt(
        &self,
        student_id: i64,
        assignment_id: i64,
        source: &dyn FileSource,
        cancel: &CancelSignal,
    ) -> Result<(String, u64), SubmitError> {
        let mut reader = source.open().map_err(SubmitError::SourceUnreadable)?;
        let mut temp = self.create_temp_file().map_err(SubmitError::TempFile)?;
        let len = copy_source(&mut reader, temp.as_file_mut())?;
        drop(reader);
        if len == 0 {
            return Err(SubmitError::EmptyPayload);
        }

        let filename = file_name(temp.path());
        // Fresh handle positioned at the start; the upload streams from disk.
        let file = temp.reopen().map_err(SubmitError::TempFile)?;
        debug!("Copied {} bytes to {}", len, temp.path().display());

        let upload = AssignmentUpload {
            student_id,
            assignment_id,
            file,
            len,
            filename: filename.clone(),
        };
        cancel
            .guard(self.remote.upload_assignment(upload))
            .await
            .ok_or(SubmitError::Cancelled)?
            .map_err(SubmitError::Remote)?;

        Ok((filename, len))
    }

    fn create_temp_file(&self) -> io::Result<NamedTempFile> {
        let prefix = format!("assignment_{}_", Utc::now().timestamp_millis());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".pdf");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

/// Copies the source into the temp file. Read failures belong to the source and write
/// failures to the temp file, so the two are reported apart.
fn copy_source(reader: &mut dyn Read, file: &mut File) -> Result<u64, SubmitError> {
    let mut buf = [0u8; COPY_BUF_SIZE];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(SubmitError::SourceUnreadable(e)),
        };
        file.write_all(&buf[..n]).map_err(SubmitError::TempFile)?;
        copied += n as u64;
    }
    file.flush().map_err(SubmitError::TempFile)?;

    let on_disk = file.metadata().map_err(SubmitError::TempFile)?.len();
    if on_disk != copied {
        return Err(SubmitError::TempFile(io::Error::other(format!(
            "temp file holds {} bytes, expected {}",
            on_disk, copied
        ))));
    }
    Ok(copied)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
