//! Analytics payloads
//!
//! Typed shapes of the analytics endpoints. Backends built on PHP often
//! send counts as strings and leave sections `null`, so numeric fields
//! accept numbers or numeric strings and `null` sections decode as empty.
//! A key field that is absent altogether is a decode error.

use crate::error::{QuizTrackError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{success, data, message?}` envelope of the summary endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the backend produced data
    #[serde(default)]
    pub success: bool,
    /// Payload
    pub data: Option<T>,
    /// Reason for a failure
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload
    ///
    /// # Arguments
    ///
    /// * `failure` - Message used when the backend reports failure without
    ///   one
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Api`] for `success: false` and
    /// [`QuizTrackError::Decode`] for a successful envelope without data
    pub fn into_data(self, failure: &str) -> Result<T> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| failure.to_string());
            return Err(QuizTrackError::Api(message).into());
        }
        self.data.ok_or_else(|| {
            QuizTrackError::Decode("successful response without data".to_string()).into()
        })
    }
}

/// Headline counters of the full report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Visitors who started the quiz
    #[serde(deserialize_with = "lenient_u64")]
    pub total_users: u64,
    /// Visitors who finished it
    #[serde(deserialize_with = "lenient_u64")]
    pub completed_users: u64,
    /// Completion rate in percent
    #[serde(deserialize_with = "lenient_f64")]
    pub completion_rate: f64,
}

/// One funnel step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelEntry {
    /// Slide identifier
    #[serde(deserialize_with = "lenient_string")]
    pub slide_id: String,
    /// Slide heading
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub slide_title: Option<String>,
    /// Users who reached the slide
    #[serde(deserialize_with = "lenient_u64")]
    pub users_reached: u64,
    /// Users who left on the slide
    #[serde(deserialize_with = "lenient_u64")]
    pub drop_off: u64,
}

impl FunnelEntry {
    /// Title, or the slide id when the title is missing or empty
    pub fn label(&self) -> &str {
        self.slide_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.slide_id)
    }
}

/// One row of the drop-off analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropOffEntry {
    /// Slide identifier
    #[serde(deserialize_with = "lenient_string")]
    pub slide_id: String,
    /// Slide heading
    #[serde(default, deserialize_with = "lenient_string")]
    pub slide_title: String,
    /// Users who reached the slide
    #[serde(deserialize_with = "lenient_u64")]
    pub users_reached: u64,
    /// Users who left on the slide
    #[serde(deserialize_with = "lenient_u64")]
    pub drop_off_count: u64,
    /// Share of reached users who left, in percent
    #[serde(deserialize_with = "lenient_f64")]
    pub drop_off_percentage: f64,
    /// Position in the quiz
    #[serde(default, deserialize_with = "lenient_u64")]
    pub sequence_order: u64,
}

/// Selection count of one answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerStat {
    /// Slide the answer belongs to
    #[serde(deserialize_with = "lenient_string")]
    pub slide_id: String,
    /// Human-readable answer
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub answer_text: Option<String>,
    /// Raw answer value
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub answer_value: Option<String>,
    /// Times the answer was picked
    #[serde(deserialize_with = "lenient_u64")]
    pub selection_count: u64,
    /// Share of the slide's selections, in percent
    #[serde(deserialize_with = "lenient_f64")]
    pub selection_percentage: f64,
}

impl AnswerStat {
    /// Answer text, else its raw value
    pub fn display_text(&self) -> &str {
        self.answer_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.answer_value.as_deref())
            .unwrap_or_default()
    }
}

/// Full analytics report of one quiz
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Headline counters
    #[serde(deserialize_with = "null_default")]
    pub stats: Stats,
    /// Funnel steps in order
    #[serde(deserialize_with = "null_default")]
    pub funnel: Vec<FunnelEntry>,
    /// Per-slide drop-off
    #[serde(deserialize_with = "null_default")]
    pub drop_off_analysis: Vec<DropOffEntry>,
    /// Answer distribution
    #[serde(default, deserialize_with = "null_default")]
    pub answer_analytics: Vec<AnswerStat>,
    /// Generation time as reported by the backend
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub generated_at: Option<String>,
}

/// Entry of the quiz list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizListing {
    /// Quiz identifier
    #[serde(deserialize_with = "lenient_string")]
    pub quiz_id: String,
    /// Display title
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Sessions recorded
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_sessions: u64,
}

/// Live per-slide counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideAnalytics {
    /// Slide identifier
    #[serde(default, deserialize_with = "lenient_string")]
    pub slide_id: String,
    /// Slide heading
    #[serde(default, deserialize_with = "lenient_string")]
    pub slide_title: String,
    /// Position in the quiz
    #[serde(default, deserialize_with = "lenient_u64")]
    pub slide_sequence: u64,
    /// Distinct users who saw the slide
    #[serde(default, deserialize_with = "lenient_u64")]
    pub unique_users: u64,
    /// Users on the slide right now
    #[serde(default, deserialize_with = "lenient_u64")]
    pub active_users: u64,
    /// Recorded visits
    #[serde(default, deserialize_with = "lenient_u64")]
    pub visit_count: u64,
}

/// Per-quiz live summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    /// Sessions started
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_sessions: u64,
    /// Sessions completed
    #[serde(default, deserialize_with = "lenient_u64")]
    pub completed_sessions: u64,
    /// Completion rate in percent
    #[serde(default, deserialize_with = "lenient_f64")]
    pub completion_rate: f64,
    /// Users active right now
    #[serde(default, deserialize_with = "lenient_u64")]
    pub active_users: u64,
    /// Per-slide counters in sequence order
    #[serde(default, deserialize_with = "null_default")]
    pub slide_analytics: Vec<SlideAnalytics>,
}

/// Whether a JSON value counts as set, the way the backend's clients test
/// flags: `true`, non-zero numbers, non-empty strings, arrays and objects
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = lenient_f64(deserializer)?;
    if value < 0.0 || !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative count, got {}",
            value
        )));
    }
    Ok(value.round() as u64)
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected text, got {}",
            other
        ))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}
