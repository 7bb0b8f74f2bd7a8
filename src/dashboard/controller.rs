//! Analytics dashboard
//!
//! [`Dashboard`] fetches one snapshot per refresh and redraws every view
//! from it in a fixed order: counters, funnel results, funnel chart,
//! drop-off table, answer cards, last-updated line. A failed fetch leaves
//! the previous snapshot in place and produces an error banner instead of
//! a frame.

use crate::dashboard::chart::ChartRenderer;
use crate::dashboard::render;
use crate::dashboard::snapshot::AnalyticsSnapshot;
use crate::dashboard::source::AnalyticsSource;
use crate::dashboard::view::{self, DropOffRow, Overview, SlideDetail};
use crate::error::{QuizTrackError, Result};
use chrono::{DateTime, Utc};
use metrics::increment_counter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Chart key of the funnel chart
pub const FUNNEL_CHART: &str = "funnel";

/// Error state of the view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStatus {
    /// Banner text of the last failed fetch
    pub error: Option<String>,
}

/// Full-report dashboard for one selected quiz
pub struct Dashboard {
    source: Arc<dyn AnalyticsSource>,
    charts: Box<dyn ChartRenderer>,
    quiz_id: String,
    snapshot: Option<AnalyticsSnapshot>,
    status: ViewStatus,
}

impl Dashboard {
    /// Create a dashboard showing `quiz_id`
    pub fn new(
        source: Arc<dyn AnalyticsSource>,
        charts: Box<dyn ChartRenderer>,
        quiz_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            charts,
            quiz_id: quiz_id.into(),
            snapshot: None,
            status: ViewStatus::default(),
        }
    }

    /// Selected quiz
    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    /// Last successful snapshot
    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.snapshot.as_ref()
    }

    /// Error state of the last refresh
    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    /// Chart keys currently live
    pub fn live_charts(&self) -> Vec<String> {
        self.charts.live_charts()
    }

    /// Fetch a new snapshot and render it
    ///
    /// # Returns
    ///
    /// The rendered frame, or an error banner when the fetch failed
    pub async fn refresh(&mut self) -> String {
        self.status.error = None;
        tracing::debug!(quiz_id = %self.quiz_id, "Loading analytics");

        match self.fetch().await {
            Ok(snapshot) => {
                increment_counter!("quiztrack_dashboard_refreshes_total", "outcome" => "success");
                tracing::info!(
                    quiz_id = %self.quiz_id,
                    funnel_steps = snapshot.report().funnel.len(),
                    "Analytics refreshed"
                );
                self.snapshot = Some(snapshot);
                self.render()
            }
            Err(e) => {
                increment_counter!("quiztrack_dashboard_refreshes_total", "outcome" => "error");
                tracing::error!(quiz_id = %self.quiz_id, "Error loading analytics: {:#}", e);
                let message = banner_message(&e);
                self.status.error = Some(message.clone());
                render::error_banner(&message)
            }
        }
    }

    async fn fetch(&self) -> Result<AnalyticsSnapshot> {
        let raw = self.source.full_report(&self.quiz_id).await?;
        AnalyticsSnapshot::from_payload(self.quiz_id.clone(), raw, Utc::now())
    }

    /// Switch to another quiz and refresh
    pub async fn select_quiz(&mut self, quiz_id: &str) -> String {
        self.quiz_id = quiz_id.to_string();
        self.refresh().await
    }

    /// Redraw every view from the current snapshot
    ///
    /// Charts from the previous frame are destroyed before new ones are
    /// created.
    pub fn render(&mut self) -> String {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return String::new();
        };
        let report = snapshot.report();

        let mut out = String::new();
        out.push_str(&render::heading(&format!("Quiz Analytics: {}", snapshot.quiz_id())));
        out.push_str(&render::overview(&Overview::from_stats(&report.stats)));

        out.push_str(&render::heading("Funnel"));
        if report.funnel.is_empty() {
            tracing::warn!("No funnel data available");
        }
        out.push_str(&render::funnel_results(&view::funnel_items(&report.funnel)));

        self.charts.destroy(FUNNEL_CHART);
        if let Some(chart) = view::funnel_chart(&report.funnel) {
            match self.charts.create(FUNNEL_CHART, &chart.spec) {
                Ok(drawn) => {
                    out.push('\n');
                    out.push_str(&drawn);
                    out.push_str(&render::funnel_tooltips(&chart.spec.labels, &chart.tooltips));
                }
                Err(e) => tracing::error!("Failed to draw funnel chart: {:#}", e),
            }
        }

        out.push_str(&render::heading("Drop-off Analysis"));
        let rows: Vec<DropOffRow> = report
            .drop_off_analysis
            .iter()
            .map(DropOffRow::from_entry)
            .collect();
        out.push_str(&render::drop_off_table(&rows));

        let cards = view::answer_cards(report);
        if !cards.is_empty() {
            out.push_str(&render::heading("Answers"));
            out.push_str(&render::answer_cards(&cards));
        }

        out.push_str(&format!("\nLast updated: {}\n", snapshot.last_updated()));
        out
    }

    /// Detail view of one drop-off row
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::NoSnapshot`] before the first successful
    /// fetch and [`QuizTrackError::UnknownSlide`] for a slide without a row
    pub fn slide_detail(&self, slide_id: &str) -> Result<String> {
        let snapshot = self.snapshot.as_ref().ok_or(QuizTrackError::NoSnapshot)?;
        let entry = snapshot
            .report()
            .drop_off_analysis
            .iter()
            .find(|e| e.slide_id == slide_id)
            .ok_or_else(|| QuizTrackError::UnknownSlide(slide_id.to_string()))?;
        Ok(render::slide_detail(&SlideDetail::from_entry(entry)))
    }

    /// Write the current snapshot into `dir`
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::NoSnapshot`] before the first successful
    /// fetch, or the write error
    pub fn export(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let snapshot = self.snapshot.as_ref().ok_or(QuizTrackError::NoSnapshot)?;
        snapshot.export_to(dir, now)
    }
}

/// Text shown in the error banner for a failed fetch
///
/// Backend-flagged errors show the backend's message; other failures show
/// the innermost known error.
pub fn banner_message(error: &anyhow::Error) -> String {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<QuizTrackError>())
    {
        Some(QuizTrackError::Api(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::chart::TextChartRenderer;
    use crate::dashboard::report::{QuizListing, QuizSummary};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct CannedSource {
        replies: Mutex<Vec<Result<Value>>>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedSource {
        fn new(replies: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AnalyticsSource for CannedSource {
        async fn list_quizzes(&self) -> Result<Vec<QuizListing>> {
            Ok(Vec::new())
        }

        async fn quiz_summary(&self, _quiz_id: &str) -> Result<QuizSummary> {
            Ok(QuizSummary::default())
        }

        async fn full_report(&self, quiz_id: &str) -> Result<Value> {
            self.requested.lock().unwrap().push(quiz_id.to_string());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn report() -> Value {
        json!({
            "stats": {"total_users": 1000, "completed_users": 250, "completion_rate": 25},
            "funnel": [
                {"slide_id": "s1", "slide_title": "Age", "users_reached": 100, "drop_off": 20},
                {"slide_id": "s2", "slide_title": "Goal", "users_reached": 80, "drop_off": 80}
            ],
            "drop_off_analysis": [
                {"slide_id": "s1", "slide_title": "Age", "users_reached": 100,
                 "drop_off_count": 20, "drop_off_percentage": 20, "sequence_order": 1}
            ],
            "answer_analytics": [
                {"slide_id": "s1", "answer_text": "18-25", "selection_count": 40, "selection_percentage": 40}
            ],
            "generated_at": "2024-05-01 10:00:00"
        })
    }

    fn dashboard(source: Arc<CannedSource>) -> Dashboard {
        Dashboard::new(source, Box::new(TextChartRenderer::default()), "lead2")
    }

    #[tokio::test]
    async fn test_refresh_renders_all_views() {
        colored::control::set_override(false);
        let source = CannedSource::new(vec![Ok(report())]);
        let mut dashboard = dashboard(source.clone());

        let frame = dashboard.refresh().await;

        assert!(frame.contains("Quiz Analytics: lead2"));
        assert!(frame.contains("1,000"));
        assert!(frame.contains("Quiz Funnel - User Journey"));
        assert!(frame.contains("✔ Goal: 80 users"));
        assert!(frame.contains("80.0%"));
        assert!(frame.contains("18-25"));
        assert!(frame.contains("Last updated: 2024-05-01 10:00:00"));
        assert_eq!(dashboard.live_charts(), vec![FUNNEL_CHART.to_string()]);
        assert_eq!(dashboard.status(), &ViewStatus::default());
        assert_eq!(source.requested.lock().unwrap().as_slice(), &["lead2".to_string()]);
    }

    #[tokio::test]
    async fn test_frame_shows_funnel_shares() {
        colored::control::set_override(false);
        let source = CannedSource::new(vec![Ok(report())]);
        let mut dashboard = dashboard(source);

        let frame = dashboard.refresh().await;

        assert!(frame.contains("Users Reached: 100 (100.0%)"));
        assert!(frame.contains("Users Reached: 80 (80.0%)"));
        assert!(frame.contains("Drop-off: 20 (20.00% of users on this slide)"));
        assert!(frame.contains("Drop-off: 80 (100.00% of users on this slide)"));
        let chart_at = frame.find("Quiz Funnel - User Journey").unwrap();
        let shares_at = frame.find("Users Reached: 80 (80.0%)").unwrap();
        let table_at = frame.find("Drop-off Analysis").unwrap();
        assert!(chart_at < shares_at && shares_at < table_at);
    }

    #[tokio::test]
    async fn test_repeated_refresh_keeps_one_chart() {
        let source = CannedSource::new(vec![Ok(report()), Ok(report()), Ok(report())]);
        let mut dashboard = dashboard(source);
        dashboard.refresh().await;
        dashboard.refresh().await;
        dashboard.refresh().await;
        assert_eq!(dashboard.live_charts().len(), 1);
    }

    #[tokio::test]
    async fn test_error_flag_shows_banner_and_keeps_snapshot() {
        colored::control::set_override(false);
        let source = CannedSource::new(vec![
            Ok(report()),
            Ok(json!({"error": true, "message": "Database unavailable"})),
            Ok(json!({"error": true})),
        ]);
        let mut dashboard = dashboard(source);
        dashboard.refresh().await;

        let frame = dashboard.refresh().await;
        assert_eq!(frame, "✖ Database unavailable\n");
        assert_eq!(
            dashboard.status().error.as_deref(),
            Some("Database unavailable")
        );
        assert!(dashboard.snapshot().is_some());

        let frame = dashboard.refresh().await;
        assert_eq!(frame, "✖ Unknown error occurred\n");
    }

    #[tokio::test]
    async fn test_http_failure_banner() {
        let source = CannedSource::new(vec![Err(anyhow::Error::from(
            QuizTrackError::HttpStatus {
                status: 500,
                reason: "Internal Server Error".to_string(),
            },
        )
        .context("GET http://x/analytics.php failed after 1 attempt(s)"))]);
        let mut dashboard = dashboard(source);
        dashboard.refresh().await;
        assert_eq!(
            dashboard.status().error.as_deref(),
            Some("HTTP 500: Internal Server Error")
        );
        assert!(dashboard.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_select_quiz_refetches() {
        let source = CannedSource::new(vec![Ok(report()), Ok(report())]);
        let mut dashboard = dashboard(source.clone());
        dashboard.refresh().await;
        dashboard.select_quiz("lead3").await;
        assert_eq!(dashboard.quiz_id(), "lead3");
        assert_eq!(dashboard.snapshot().unwrap().quiz_id(), "lead3");
        assert_eq!(
            source.requested.lock().unwrap().as_slice(),
            &["lead2".to_string(), "lead3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_export_before_fetch_is_refused() {
        let source = CannedSource::new(vec![]);
        let dashboard = dashboard(source);
        let dir = tempfile::tempdir().unwrap();
        let err = dashboard.export(dir.path(), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "No data to export");
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_export_after_fetch() {
        let source = CannedSource::new(vec![Ok(report())]);
        let mut dashboard = dashboard(source);
        dashboard.refresh().await;
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let path = dashboard.export(dir.path(), now).unwrap();
        assert!(path.ends_with("quiz-analytics-lead2-2024-05-02.json"));
        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, report());
    }

    #[tokio::test]
    async fn test_slide_detail() {
        colored::control::set_override(false);
        let source = CannedSource::new(vec![Ok(report())]);
        let mut dashboard = dashboard(source);
        assert!(dashboard.slide_detail("s1").is_err());
        dashboard.refresh().await;

        let detail = dashboard.slide_detail("s1").unwrap();
        assert!(detail.starts_with("Slide Details: Age"));
        assert!(detail.contains("Retention Rate: 80.0%"));
        assert!(dashboard.slide_detail("nope").is_err());
    }
}
