//! Live per-quiz summary
//!
//! The quick view: which quizzes exist, how many visitors are on each
//! slide right now, and where they leave.

use crate::dashboard::chart::ChartRenderer;
use crate::dashboard::controller::banner_message;
use crate::dashboard::render;
use crate::dashboard::report::{QuizListing, QuizSummary};
use crate::dashboard::source::AnalyticsSource;
use crate::dashboard::view;
use metrics::increment_counter;
use std::sync::Arc;

/// Chart key of the users-per-slide chart
pub const RETENTION_CHART: &str = "retention";
/// Chart key of the drop-off rate chart
pub const DROP_OFF_CHART: &str = "dropoff";

/// Quiz list plus live summary of one quiz
pub struct LiveSummary {
    source: Arc<dyn AnalyticsSource>,
    charts: Box<dyn ChartRenderer>,
    quiz_id: Option<String>,
    quizzes: Vec<QuizListing>,
    summary: Option<QuizSummary>,
}

impl LiveSummary {
    /// Create a summary view, optionally with a quiz selected
    pub fn new(
        source: Arc<dyn AnalyticsSource>,
        charts: Box<dyn ChartRenderer>,
        quiz_id: Option<String>,
    ) -> Self {
        Self {
            source,
            charts,
            quiz_id,
            quizzes: Vec::new(),
            summary: None,
        }
    }

    /// Selected quiz
    pub fn quiz_id(&self) -> Option<&str> {
        self.quiz_id.as_deref()
    }

    /// Select a quiz
    pub fn select(&mut self, quiz_id: &str) {
        self.quiz_id = Some(quiz_id.to_string());
    }

    /// Last fetched quiz list
    pub fn quizzes(&self) -> &[QuizListing] {
        &self.quizzes
    }

    /// Last fetched summary
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    /// Chart keys currently live
    pub fn live_charts(&self) -> Vec<String> {
        self.charts.live_charts()
    }

    /// Reload the quiz list
    ///
    /// # Returns
    ///
    /// The quiz table, or an error banner
    pub async fn refresh_quizzes(&mut self) -> String {
        match self.source.list_quizzes().await {
            Ok(quizzes) => {
                tracing::debug!(count = quizzes.len(), "Quiz list loaded");
                self.quizzes = quizzes;
                render::quiz_list(&self.quizzes)
            }
            Err(e) => {
                tracing::error!("Failed to load quizzes: {:#}", e);
                render::error_banner(&format!("Failed to load quizzes: {}", banner_message(&e)))
            }
        }
    }

    /// Reload the selected quiz's summary and render it
    ///
    /// # Returns
    ///
    /// The summary frame, or an error banner
    pub async fn refresh_summary(&mut self) -> String {
        let Some(quiz_id) = self.quiz_id.clone() else {
            return render::error_banner("Please select a quiz first.");
        };

        match self.source.quiz_summary(&quiz_id).await {
            Ok(summary) => {
                increment_counter!("quiztrack_dashboard_refreshes_total", "outcome" => "success");
                self.summary = Some(summary);
                self.render(&quiz_id)
            }
            Err(e) => {
                increment_counter!("quiztrack_dashboard_refreshes_total", "outcome" => "error");
                tracing::error!(quiz_id = %quiz_id, "Failed to load analytics: {:#}", e);
                render::error_banner(&format!("Failed to load analytics: {}", banner_message(&e)))
            }
        }
    }

    fn render(&mut self, quiz_id: &str) -> String {
        let Some(summary) = self.summary.as_ref() else {
            return String::new();
        };

        let mut out = render::heading(&format!("Live Summary: {}", quiz_id));
        out.push_str(&render::summary_lines(&view::summary_lines(summary)));
        out.push_str(&format!(
            "\nSessions: {}  Completed: {}  Rate: {}  Slides: {}\n\n",
            summary.total_sessions,
            summary.completed_sessions,
            view::format_percentage(summary.completion_rate),
            summary.slide_analytics.len()
        ));

        for (key, spec) in [
            (RETENTION_CHART, view::retention_chart(summary)),
            (DROP_OFF_CHART, view::drop_off_chart(summary)),
        ] {
            match self.charts.replace(key, &spec) {
                Ok(drawn) => {
                    out.push_str(&drawn);
                    out.push('\n');
                }
                Err(e) => tracing::error!(chart = key, "Failed to draw chart: {:#}", e),
            }
        }

        out
    }
}
