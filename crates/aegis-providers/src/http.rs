//! HTTP evidence provider and shared HTTP error mapping
//!
//! The research service receives `{"claim_text": ...}` and answers with its
//! JSON dossier, which is passed through unchanged as the evidence bundle.
//!
//! Transport retries happen inside one `gather` call, so they must fit the
//! caller's time bound; [`HttpEvidenceProvider::within`] sizes the attempts.
//!
//! # Examples
//!
//! ```no_run
//! use aegis_providers::HttpEvidenceProvider;
//! use std::time::Duration;
//!
//! let provider = HttpEvidenceProvider::new("http://localhost:8000/research")
//!     .with_max_retries(3)
//!     .within(Duration::from_secs(30));
//! ```

use aegis_domain::traits::EvidenceProvider;
use aegis_domain::ProviderError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default timeout for research requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Shortest per-attempt timeout worth retrying with
pub const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Total backoff slept between `attempts` attempts
fn total_backoff(attempts: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempts.saturating_sub(1)) - 1)
}

/// Build a client with a request timeout
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Classify a non-success HTTP status
pub(crate) fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = format!("HTTP {}: {}", status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::Transient(message)
    } else {
        ProviderError::Permanent(message)
    }
}

/// Classify a transport-level failure
pub(crate) fn request_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else if e.is_builder() {
        ProviderError::Permanent(format!("Invalid request: {}", e))
    } else {
        ProviderError::Transient(format!("Request failed: {}", e))
    }
}

/// Send one request; non-success statuses become provider errors
pub(crate) async fn send_once(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<reqwest::Response, ProviderError> {
    match request.send().await {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, &body))
        }
        Err(e) => Err(request_error(e, timeout)),
    }
}

/// Send a request built by `make`, retrying transient failures with backoff
///
/// Backoff doubles from one second: 1s, 2s, 4s, ...
pub(crate) async fn send_with_retry<F>(
    make: F,
    max_retries: u32,
    timeout: Duration,
) -> Result<reqwest::Response, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_retries.max(1) {
        let error = match send_once(make(), timeout).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if !error.is_transient() {
            return Err(error);
        }
        tracing::debug!("HTTP attempt {} failed: {}", attempts + 1, error);
        last_error = Some(error);

        attempts += 1;
        if attempts < max_retries {
            tokio::time::sleep(Duration::from_secs(2u64.pow(attempts - 1))).await;
        }
    }

    Err(last_error.unwrap_or_else(|| ProviderError::Transient("Max retries exceeded".to_string())))
}

/// Evidence provider backed by a research HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpEvidenceProvider {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
}

#[derive(Serialize)]
struct ResearchRequest<'a> {
    claim_text: &'a str,
}

impl HttpEvidenceProvider {
    /// Create a provider posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            endpoint: endpoint.into(),
            client: build_client(timeout),
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fit every attempt and its backoff inside `budget`
    ///
    /// Attempts are dropped until each one gets at least
    /// [`MIN_ATTEMPT_TIMEOUT`]; a single attempt gets the whole budget.
    pub fn within(self, budget: Duration) -> Self {
        let mut attempts = self.max_retries.max(1);
        while attempts > 1 {
            if let Some(rest) = budget.checked_sub(total_backoff(attempts)) {
                let per_attempt = rest / attempts;
                if per_attempt >= MIN_ATTEMPT_TIMEOUT {
                    return self.with_max_retries(attempts).with_timeout(per_attempt);
                }
            }
            attempts -= 1;
        }
        self.with_max_retries(1).with_timeout(budget)
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Maximum number of attempts per call
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Longest one `gather` call can take, backoff included
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_retries.max(1);
        self.timeout * attempts + total_backoff(attempts)
    }
}

#[async_trait]
impl EvidenceProvider for HttpEvidenceProvider {
    async fn gather(&self, text: &str) -> Result<Value, ProviderError> {
        let body = ResearchRequest { claim_text: text };
        let response = send_with_retry(
            || self.client.post(&self.endpoint).json(&body),
            self.max_retries,
            self.timeout,
        )
        .await?;

        let dossier: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse dossier: {}", e)))?;

        if !dossier.is_object() {
            return Err(ProviderError::Malformed(
                "Research dossier is not a JSON object".to_string(),
            ));
        }
        Ok(dossier)
    }
}
