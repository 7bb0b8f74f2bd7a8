//! Where the dashboard reads analytics from

use crate::config::Config;
use crate::dashboard::report::{Envelope, QuizListing, QuizSummary};
use crate::error::Result;
use crate::http::{ResilientClient, RetryPolicy};
use async_trait::async_trait;
use serde_json::Value;

/// Quiz list endpoint
pub const QUIZZES_ENDPOINT: &str = "/api/analytics/quizzes";
/// Per-quiz summary endpoint prefix
pub const QUIZ_SUMMARY_ENDPOINT: &str = "/api/analytics/quiz";
/// Full report script, relative to the analytics base
pub const FULL_REPORT_ENDPOINT: &str = "analytics.php";

/// Analytics read operations
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Quizzes with recorded sessions
    async fn list_quizzes(&self) -> Result<Vec<QuizListing>>;

    /// Live summary of one quiz
    async fn quiz_summary(&self, quiz_id: &str) -> Result<QuizSummary>;

    /// Full report payload of one quiz, as received
    async fn full_report(&self, quiz_id: &str) -> Result<Value>;
}

/// [`AnalyticsSource`] over HTTP
///
/// Both clients make a single attempt per call; the next poll is the retry.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsSource {
    api: ResilientClient,
    analytics: ResilientClient,
}

impl HttpAnalyticsSource {
    /// Create a source
    ///
    /// # Arguments
    ///
    /// * `api` - Client for the `/api/analytics/*` endpoints
    /// * `analytics` - Client for the analytics base serving `analytics.php`
    pub fn new(api: ResilientClient, analytics: ResilientClient) -> Self {
        Self {
            api: api.with_policy(RetryPolicy::single()),
            analytics: analytics.with_policy(RetryPolicy::single()),
        }
    }

    /// Source for the endpoints named in `config`
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.api.request_timeout();
        Ok(Self::new(
            ResilientClient::new(config.api.base_url.clone(), RetryPolicy::single(), timeout)?,
            ResilientClient::new(
                config.dashboard.analytics_base.clone(),
                RetryPolicy::single(),
                timeout,
            )?,
        ))
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Path of the full report request for `quiz_id`
pub fn full_report_path(quiz_id: &str) -> String {
    format!(
        "{}?quiz_id={}&type=full",
        FULL_REPORT_ENDPOINT,
        encode(quiz_id)
    )
}

#[async_trait]
impl AnalyticsSource for HttpAnalyticsSource {
    async fn list_quizzes(&self) -> Result<Vec<QuizListing>> {
        let envelope: Envelope<Vec<QuizListing>> = self.api.get_json(QUIZZES_ENDPOINT).await?;
        envelope.into_data("Failed to load quizzes")
    }

    async fn quiz_summary(&self, quiz_id: &str) -> Result<QuizSummary> {
        let path = format!("{}/{}", QUIZ_SUMMARY_ENDPOINT, encode(quiz_id));
        let envelope: Envelope<QuizSummary> = self.api.get_json(&path).await?;
        envelope.into_data("Failed to load analytics data")
    }

    async fn full_report(&self, quiz_id: &str) -> Result<Value> {
        self.analytics.get_json(&full_report_path(quiz_id)).await
    }
}
