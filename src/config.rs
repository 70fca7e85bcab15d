use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://netxgroup.in/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const MAX_RETRIES: u32 = 3;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Option<Duration>,
    pub temp_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_backoff: None,
            temp_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(url) = lookup("CAMPUS_API_BASE_URL") {
            config.base_url = normalize_base_url(&url);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CAMPUS_API_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32>(&lookup, "CAMPUS_UPLOAD_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        config.retry_backoff =
            parse_var::<u64>(&lookup, "CAMPUS_UPLOAD_BACKOFF_MS")?.map(Duration::from_millis);
        config.temp_dir = lookup("CAMPUS_UPLOAD_TMP_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    format!("{}/", trimmed)
}
