//! Analytics snapshots
//!
//! A snapshot is one fetched report: the typed view used for rendering
//! plus the raw payload, which is what gets exported. Snapshots are never
//! patched; a refresh replaces the whole value.

use crate::dashboard::report::{is_truthy, AnalyticsReport};
use crate::error::{QuizTrackError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Banner text for an error-flagged payload without a message
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// One fetched analytics report
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSnapshot {
    quiz_id: String,
    report: AnalyticsReport,
    raw: Value,
    fetched_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    /// Build a snapshot from a fetched payload
    ///
    /// # Arguments
    ///
    /// * `quiz_id` - Quiz the report belongs to
    /// * `raw` - Payload as received
    /// * `fetched_at` - When the fetch completed
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Api`] when the payload carries an `error`
    /// flag and [`QuizTrackError::Decode`] when it does not match the
    /// report shape
    pub fn from_payload(
        quiz_id: impl Into<String>,
        raw: Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self> {
        if raw.get("error").map(is_truthy).unwrap_or(false) {
            let message = raw
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(UNKNOWN_ERROR);
            return Err(QuizTrackError::Api(message.to_string()).into());
        }

        let report: AnalyticsReport = serde_json::from_value(raw.clone())
            .map_err(|e| QuizTrackError::Decode(format!("analytics report: {}", e)))?;

        Ok(Self {
            quiz_id: quiz_id.into(),
            report,
            raw,
            fetched_at,
        })
    }

    /// Quiz the report belongs to
    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    /// Typed report
    pub fn report(&self) -> &AnalyticsReport {
        &self.report
    }

    /// Payload as received
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// When the fetch completed
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Backend generation time, else the fetch time
    pub fn last_updated(&self) -> String {
        self.report
            .generated_at
            .clone()
            .unwrap_or_else(|| self.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }

    /// `quiz-analytics-{quiz_id}-{YYYY-MM-DD}.json` for the UTC date of `now`
    pub fn export_file_name(&self, now: DateTime<Utc>) -> String {
        format!(
            "quiz-analytics-{}-{}.json",
            self.quiz_id,
            now.format("%Y-%m-%d")
        )
    }

    /// Raw payload as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.raw).map_err(|e| QuizTrackError::Serialization(e).into())
    }

    /// Write the raw payload into `dir`
    ///
    /// # Returns
    ///
    /// Path of the written file
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn export_to(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(QuizTrackError::Io)?;
        let path = dir.join(self.export_file_name(now));
        std::fs::write(&path, self.to_pretty_json()?).map_err(QuizTrackError::Io)?;
        tracing::info!(path = %path.display(), quiz_id = %self.quiz_id, "Exported analytics");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_error_flag_uses_message() {
        let err = AnalyticsSnapshot::from_payload(
            "lead2",
            json!({"error": true, "message": "Quiz not found"}),
            fetched_at(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "API error: Quiz not found");
    }

    #[test]
    fn test_error_flag_without_message() {
        let err = AnalyticsSnapshot::from_payload("lead2", json!({"error": 1}), fetched_at())
            .unwrap_err();
        assert_eq!(err.to_string(), format!("API error: {}", UNKNOWN_ERROR));
    }

    fn empty_report() -> Value {
        json!({"stats": null, "funnel": [], "drop_off_analysis": []})
    }

    fn with(mut base: Value, key: &str, value: Value) -> Value {
        base[key] = value;
        base
    }

    fn is_decode(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<QuizTrackError>(),
            Some(QuizTrackError::Decode(_))
        )
    }

    #[test]
    fn test_false_error_flag_is_ignored() {
        let raw = with(empty_report(), "error", json!(false));
        let snapshot = AnalyticsSnapshot::from_payload("lead2", raw, fetched_at()).unwrap();
        assert!(snapshot.report().funnel.is_empty());
    }

    #[test]
    fn test_unrelated_payload_is_decode_error() {
        let err = AnalyticsSnapshot::from_payload(
            "lead2",
            json!({"status": "ok", "rows": [1, 2, 3]}),
            fetched_at(),
        )
        .unwrap_err();
        assert!(is_decode(&err), "{:#}", err);
        assert!(err.to_string().starts_with("Decode error: analytics report"));
    }

    #[test]
    fn test_renamed_funnel_field_is_decode_error() {
        let raw = with(
            empty_report(),
            "funnel",
            json!([{"slide_id": "s1", "usersReached": 100, "drop_off": 0}]),
        );
        let err = AnalyticsSnapshot::from_payload("lead2", raw, fetched_at()).unwrap_err();
        assert!(is_decode(&err));
        assert!(err.to_string().contains("users_reached"));
    }

    #[test]
    fn test_last_updated_prefers_backend_time() {
        let raw = with(empty_report(), "generated_at", json!("2024-05-01 09:59:58"));
        let snapshot = AnalyticsSnapshot::from_payload("lead2", raw, fetched_at()).unwrap();
        assert_eq!(snapshot.last_updated(), "2024-05-01 09:59:58");

        let bare =
            AnalyticsSnapshot::from_payload("lead2", empty_report(), fetched_at()).unwrap();
        assert_eq!(bare.last_updated(), "2024-05-01 10:00:00 UTC");
    }

    #[test]
    fn test_export_writes_raw_payload_verbatim() {
        let raw = json!({
            "stats": {"total_users": "10", "completed_users": "2", "completion_rate": "20.00"},
            "funnel": [],
            "drop_off_analysis": null,
            "extra_field": {"kept": true}
        });
        let snapshot = AnalyticsSnapshot::from_payload("lead2", raw.clone(), fetched_at()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 0).unwrap();

        let path = snapshot.export_to(dir.path(), now).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "quiz-analytics-lead2-2024-06-30.json"
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"extra_field\""));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, raw);
    }
}
