//! JIRA REST transport.
//!
//! This module provides the HTTP client every service goes through. It
//! handles authentication, request/response processing, error mapping and
//! retry of transient failures. Every call takes a cancellation token that
//! aborts both the in-flight request and any backoff sleep.

use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use crate::config::ClientSettings;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Upper bound of a single retry delay in milliseconds.
const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// The JIRA REST transport.
#[derive(Debug, Clone)]
pub struct JiraClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the JIRA instance.
    base_url: String,
    /// Authentication credentials; anonymous access when absent.
    auth: Option<Auth>,
    /// Number of attempts for transient failures.
    max_retries: u32,
}

impl JiraClient {
    /// Create a new transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the HTTP client cannot be built.
    pub fn new(base_url: &str, auth: Option<Auth>, settings: &ClientSettings) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url,
            auth,
            max_retries: settings.max_retries.max(1),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request and deserialize the JSON response.
    ///
    /// `path` is relative to the base URL, e.g. `rest/api/2/priority`.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let value = self.execute_raw(method, path, body, cancel).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Execute a request and return the raw JSON document.
    ///
    /// An empty response body yields `Value::Null`.
    pub async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, self.max_retries);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                result = self.execute_once(method.clone(), &url, body) => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempts < self.max_retries => {
                    let delay = calculate_retry_delay(attempts);
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempts, delay, e
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a single HTTP request.
    async fn execute_once(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        if let Some(auth) = &self.auth {
            request = request.header(header::AUTHORIZATION, auth.header_value());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        handle_response(response).await
    }
}

/// Check the HTTP status and parse the JSON body.
async fn handle_response(response: Response) -> Result<Value> {
    let status = response.status();
    let url = response.url().to_string();

    if status.is_success() {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    } else {
        let error_body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", error_body);

        Err(error_from_response(status, &url, &error_body))
    }
}

/// Create an appropriate error from an HTTP response.
///
/// JIRA reports problems as `{"errorMessages": [...], "errors": {...}}`;
/// both are passed through unmodified.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    let mut messages: Vec<String> = Vec::new();

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(arr) = json.get("errorMessages").and_then(Value::as_array) {
            messages.extend(arr.iter().filter_map(Value::as_str).map(str::to_string));
        }
        if let Some(obj) = json.get("errors").and_then(Value::as_object) {
            messages.extend(obj.iter().map(|(k, v)| match v.as_str() {
                Some(text) => format!("{}: {}", k, text),
                None => format!("{}: {}", k, v),
            }));
        }
    }

    if messages.is_empty() {
        ApiError::from_status(status, url)
    } else {
        ApiError::from_status(status, &messages.join(", "))
    }
}

/// Calculate retry delay with exponential backoff, capped at one minute.
fn calculate_retry_delay(attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .map_or(MAX_RETRY_DELAY_MS, |factor| RETRY_DELAY_MS.saturating_mul(factor))
        .min(MAX_RETRY_DELAY_MS)
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ApiError::InvalidUrl(url.to_string()));
    }

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    Ok(url.to_string())
}
