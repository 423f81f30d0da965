//! Append API client: URL construction, retrying dispatch and error bookkeeping.

use log::{debug, warn};
use reqwest::Url;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::{
    ClientConfig, mask_api_key, parse_base_url, validate_api_key, validate_retries,
};
use crate::error::AppendError;
use crate::http::{HttpResponse, ReqwestTransport, RetryMode, Transport, backoff_delay};
use crate::response::{AppendResult, process_response};

/// Opaque vendor fields (`d_first`, `d_zip`, `service`, ...), passed through unvalidated.
pub type RequestParams = HashMap<String, String>;

/// Query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "k2";

/// Field selecting the lookup service.
pub const SERVICE_PARAM: &str = "service";

/// Client for the append service.
///
/// Every operation returns a `Result`. The display text of the most recent
/// failure is also kept and can be read with [`Client::error_message`]; it is
/// cleared on success.
pub struct Client<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    last_error: Mutex<String>,
}

impl Client<ReqwestTransport> {
    /// Creates a client talking to the configured base URL over reqwest.
    pub fn new(config: ClientConfig) -> Result<Self, AppendError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)
            .map_err(|e| AppendError::Configuration(format!("{:#}", e)))?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, AppendError> {
        config.validate()?;
        debug!(
            "Append client for {} (key {}, {} attempts, {:?})",
            config.base_url,
            mask_api_key(&config.api_key),
            config.retries,
            config.retry_mode
        );
        Ok(Self {
            config,
            transport,
            last_error: Mutex::new(String::new()),
        })
    }

    /// Returns the configured API key.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Returns the number of attempts per transaction.
    pub fn retries(&self) -> usize {
        self.config.retries
    }

    /// Returns the endpoint requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the full configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sets the attempt count; zero is rejected.
    pub fn set_retries(&mut self, retries: usize) -> Result<(), AppendError> {
        validate_retries(retries)?;
        self.config.retries = retries;
        Ok(())
    }

    /// Sets the endpoint; it must be an absolute http(s) URL.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<(), AppendError> {
        let base_url = base_url.into();
        parse_base_url(&base_url)?;
        self.config.base_url = base_url;
        Ok(())
    }

    /// Replaces the API key; blank keys are rejected.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<(), AppendError> {
        let api_key = api_key.into();
        validate_api_key(&api_key)?;
        self.config.api_key = api_key;
        Ok(())
    }

    /// Switches between stopping at the first response and running every attempt.
    pub fn set_retry_mode(&mut self, mode: RetryMode) {
        self.config.retry_mode = mode;
    }

    /// Toggles raw response logging at info level.
    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    /// Description of the last failure, or an empty string if the last call succeeded.
    pub fn error_message(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Looks up an email address for a partial identity.
    ///
    /// `service=email` is always set; every other field is sent as given.
    #[tracing::instrument(skip_all)]
    pub async fn append_email(&self, mut data: RequestParams) -> Result<AppendResult, AppendError> {
        data.insert(SERVICE_PARAM.to_string(), "email".to_string());
        self.transaction(data, &json!({})).await
    }

    /// Sends one append transaction and classifies the outcome.
    ///
    /// `query` is sent as URL query fields (the API key is added under `k2`
    /// unless already present); `body` is sent as the JSON request body.
    #[tracing::instrument(skip_all)]
    pub async fn transaction(
        &self,
        mut query: RequestParams,
        body: &Value,
    ) -> Result<AppendResult, AppendError> {
        if !query.contains_key(API_KEY_PARAM) {
            query.insert(API_KEY_PARAM.to_string(), self.config.api_key.clone());
        }

        let result = self.dispatch(&query, body).await;
        self.record(&result);
        result
    }

    /// Builds the request URL from the base URL and query fields.
    ///
    /// Fields are appended in key order so the URL is stable across calls.
    pub fn build_url(&self, query: &RequestParams) -> Result<Url, AppendError> {
        let mut url = parse_base_url(&self.config.base_url)?;
        let mut fields: Vec<(&String, &String)> = query.iter().collect();
        fields.sort();
        if !fields.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in fields {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn dispatch(
        &self,
        query: &RequestParams,
        body: &Value,
    ) -> Result<AppendResult, AppendError> {
        let url = self.build_url(query)?;
        let body = serde_json::to_string(body)
            .map_err(|e| AppendError::Protocol(format!("failed to encode request body: {}", e)))?;

        let response = self.send_with_retry(&url, body).await?;
        process_response(&response, self.config.debug)
    }

    /// Runs the attempt loop and returns the response to classify.
    async fn send_with_retry(&self, url: &Url, body: String) -> Result<HttpResponse, AppendError> {
        let attempts = self.config.retries;
        let mode = self.config.retry_mode;
        let mut last_response = None;
        let mut last_failure = None;

        for attempt in 1..=attempts {
            match self.transport.post_json(url, body.clone()).await {
                Ok(response) => {
                    debug!(
                        "Attempt {}/{} returned status {}",
                        attempt, attempts, response.status
                    );
                    if mode == RetryMode::UntilResponse {
                        return Ok(response);
                    }
                    last_response = Some(response);
                }
                Err(e) => {
                    if mode == RetryMode::UntilResponse && attempt == attempts {
                        warn!("Attempt {}/{} failed ({:#})", attempt, attempts, e);
                    } else {
                        let delay = backoff_delay(self.config.backoff_unit, attempt);
                        warn!(
                            "Attempt {}/{} failed ({:#}), waiting {:?}",
                            attempt, attempts, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_failure = Some(e);
                }
            }
        }

        // Exhaustive mode keeps the last response even if later attempts failed
        match (last_response, last_failure) {
            (Some(response), _) => Ok(response),
            (None, Some(e)) => Err(AppendError::Transport(format!(
                "{:#} (after {} attempts)",
                e, attempts
            ))),
            (None, None) => Err(AppendError::Protocol("no response obtained".to_string())),
        }
    }

    fn record(&self, result: &Result<AppendResult, AppendError>) {
        let mut last_error = self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match result {
            Ok(_) => last_error.clear(),
            Err(e) => {
                debug!("Append transaction failed: {}", e);
                *last_error = e.to_string();
            }
        }
    }
}
