//! Resilient JSON request client
//!
//! Every request goes through the same loop: send, treat transport errors,
//! non-2xx statuses and undecodable bodies alike as a failed attempt, sleep
//! `attempt * base_delay`, and try again until the policy is exhausted. The
//! last error then propagates to the caller.

use crate::config::ApiConfig;
use crate::error::{QuizTrackError, Result};
use metrics::increment_counter;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Attempt budget and linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `k` is `k * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Examples
    ///
    /// ```
    /// use quiztrack::http::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_millis(1000));
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    /// ```
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// One attempt, no waiting
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Policy described by the API config
    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(api.retry_attempts, api.retry_delay())
    }

    /// Wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// JSON client bound to one base URL
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl ResilientClient {
    /// Create a client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Prefix every endpoint is appended to
    /// * `policy` - Retry policy applied to every request
    /// * `timeout` - Transport timeout of a single attempt
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("quiztrack/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(QuizTrackError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
        })
    }

    /// Client for the tracking API described by `api`
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(
            api.base_url.clone(),
            RetryPolicy::from_config(api),
            api.request_timeout(),
        )
    }

    /// Same client with a different retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// POST `body` as JSON to `endpoint` and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once the retry policy is exhausted
    pub async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        self.execute("POST", &url, || {
            self.client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .json(body)
        })
        .await
    }

    /// GET `path` (may carry a query string) and decode the JSON response
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once the retry policy is exhausted
    pub async fn get_json<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path);
        self.execute("GET", &url, || self.client.get(&url)).await
    }

    async fn execute<R, F>(&self, method: &str, url: &str, build: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            increment_counter!("quiztrack_requests_total", "method" => method.to_string());
            tracing::debug!(method, url, attempt, max_attempts, "Sending request");

            match Self::attempt(build()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    increment_counter!(
                        "quiztrack_request_failures_total",
                        "method" => method.to_string()
                    );
                    tracing::warn!(
                        method,
                        url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Request attempt failed"
                    );

                    if attempt >= max_attempts {
                        return Err(e.context(format!(
                            "{} {} failed after {} attempt(s)",
                            method, url, max_attempts
                        )));
                    }

                    tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt<R: DeserializeOwned>(request: RequestBuilder) -> Result<R> {
        let response = request.send().await.map_err(QuizTrackError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizTrackError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(QuizTrackError::Http)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            QuizTrackError::Decode(format!("unexpected response body: {}", e)).into()
        })
    }
}
