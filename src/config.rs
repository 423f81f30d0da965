//! Client configuration.

use reqwest::Url;
use std::time::Duration;

use crate::error::AppendError;
use crate::http::{DEFAULT_BACKOFF_UNIT, DEFAULT_RETRIES, RetryMode};

/// Vendor endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.towerdata.com/v5/td";

/// Default per-attempt transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    /// Attempts per transaction, at least 1.
    pub retries: usize,
    pub base_url: String,
    /// Scale of the linear backoff between failed attempts.
    pub backoff_unit: Duration,
    pub retry_mode: RetryMode,
    pub timeout: Duration,
    /// Log raw response status and body at info level.
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            retries: DEFAULT_RETRIES,
            base_url: DEFAULT_BASE_URL.to_string(),
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            retry_mode: RetryMode::default(),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_retry_mode(mut self, mode: RetryMode) -> Self {
        self.retry_mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Checks every field; the first problem found is reported.
    pub fn validate(&self) -> Result<(), AppendError> {
        validate_api_key(&self.api_key)?;
        validate_retries(self.retries)?;
        parse_base_url(&self.base_url)?;
        Ok(())
    }
}

pub(crate) fn validate_api_key(api_key: &str) -> Result<(), AppendError> {
    if api_key.trim().is_empty() {
        return Err(AppendError::Configuration(
            "an API key is required".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_retries(retries: usize) -> Result<(), AppendError> {
    if retries == 0 {
        return Err(AppendError::Configuration(
            "retries must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, AppendError> {
    let url = Url::parse(base_url).map_err(|e| {
        AppendError::Configuration(format!("invalid base URL '{}': {}", base_url, e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppendError::Configuration(format!(
            "unsupported base URL scheme '{}'",
            scheme
        ))),
    }
}

/// Shows the first and last four characters of a key.
pub(crate) fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
