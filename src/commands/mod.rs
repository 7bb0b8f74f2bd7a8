/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `track`: Replay a page scenario through the visit tracker
- `dashboard`: Render the full analytics report, once or on a timer
- `summary`: Quiz list plus the live per-slide summary
- `quizzes`: List quizzes known to the backend
- `export`: Fetch one report and write it to disk
*/

use crate::config::Config;
use crate::dashboard::chart::TextChartRenderer;
use crate::dashboard::render;
use crate::dashboard::{Dashboard, HttpAnalyticsSource, LiveSummary};
use crate::error::{QuizTrackError, Result};
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// Quiz listing
pub mod quizzes;

// Scenario replay
pub mod track;

fn poll_interval(seconds: u64, name: &str) -> Result<Duration> {
    if seconds == 0 {
        return Err(QuizTrackError::Config(format!("{} must be greater than 0", name)).into());
    }
    Ok(Duration::from_secs(seconds))
}

fn dashboard_for(config: &Config, quiz_id: String) -> Result<Dashboard> {
    let source = Arc::new(HttpAnalyticsSource::from_config(config)?);
    Ok(Dashboard::new(
        source,
        Box::new(TextChartRenderer::default()),
        quiz_id,
    ))
}

/// Write the loading line, refresh, then write the frame
///
/// The loading line is flushed before the fetch starts. With `slide` set,
/// the detail view of that drop-off row follows a successful frame.
async fn write_refresh<W: Write>(
    out: &mut W,
    dashboard: &mut Dashboard,
    slide: Option<&str>,
) -> Result<()> {
    write!(out, "{}", render::loading_line(dashboard.quiz_id())).map_err(QuizTrackError::Io)?;
    out.flush().map_err(QuizTrackError::Io)?;

    let mut frame = dashboard.refresh().await;
    if let (Some(slide_id), None) = (slide, &dashboard.status().error) {
        match dashboard.slide_detail(slide_id) {
            Ok(detail) => {
                frame.push('\n');
                frame.push_str(&detail);
            }
            Err(e) => frame.push_str(&render::error_banner(&e.to_string())),
        }
    }
    write!(out, "{}", frame).map_err(QuizTrackError::Io)?;
    Ok(())
}

/// Full-report dashboard command
pub mod dashboard {
    use super::*;

    /// Render the dashboard for one quiz
    ///
    /// A failed fetch prints an error banner; in watch mode the next tick
    /// tries again and the last good frame stays the one exported.
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `quiz_id` - Quiz to show, `dashboard.default_quiz_id` when `None`
    /// * `watch` - Keep refreshing until Ctrl-C
    /// * `interval` - Refresh interval override in seconds
    /// * `export_dir` - Export the last snapshot here on exit
    /// * `slide` - Drop-off row to show in detail after each frame
    ///
    /// # Errors
    ///
    /// Returns error for a zero interval, an unbuildable HTTP client, or a
    /// failed export
    pub async fn run_dashboard(
        config: &Config,
        quiz_id: Option<String>,
        watch: bool,
        interval: Option<u64>,
        export_dir: Option<PathBuf>,
        slide: Option<String>,
    ) -> Result<()> {
        let quiz_id = quiz_id.unwrap_or_else(|| config.dashboard.default_quiz_id.clone());
        let period = poll_interval(
            interval.unwrap_or(config.dashboard.refresh_interval_seconds),
            "refresh interval",
        )?;
        tracing::info!(quiz_id = %quiz_id, watch, "Opening dashboard");

        let mut dashboard = dashboard_for(config, quiz_id)?;
        let slide = slide.as_deref();
        let mut stdout = std::io::stdout();
        write_refresh(&mut stdout, &mut dashboard, slide).await?;

        if watch {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        write_refresh(&mut stdout, &mut dashboard, slide).await?;
                    }
                    _ = &mut ctrl_c => {
                        tracing::info!("Interrupted, stopping dashboard");
                        break;
                    }
                }
            }
        }

        if let Some(dir) = export_dir {
            let path = dashboard.export(&dir, Utc::now())?;
            println!("Exported {}", path.display());
        }

        Ok(())
    }
}

/// Live summary command
pub mod summary {
    use super::*;

    /// Print the quiz list and the live summary of `quiz_id`
    ///
    /// In watch mode the quiz list and the summary poll on their own
    /// intervals.
    ///
    /// # Errors
    ///
    /// Returns error for a zero interval or an unbuildable HTTP client
    pub async fn run_summary(config: &Config, quiz_id: String, watch: bool) -> Result<()> {
        let list_period = poll_interval(
            config.dashboard.quiz_list_interval_seconds,
            "dashboard.quiz_list_interval_seconds",
        )?;
        let summary_period = poll_interval(
            config.dashboard.refresh_interval_seconds,
            "dashboard.refresh_interval_seconds",
        )?;
        tracing::info!(quiz_id = %quiz_id, watch, "Opening live summary");

        let source = Arc::new(HttpAnalyticsSource::from_config(config)?);
        let mut live = LiveSummary::new(
            source,
            Box::new(TextChartRenderer::default()),
            Some(quiz_id),
        );

        print!("{}", live.refresh_quizzes().await);
        print!("{}", live.refresh_summary().await);

        if !watch {
            return Ok(());
        }

        let mut list_ticker = tokio::time::interval(list_period);
        let mut summary_ticker = tokio::time::interval(summary_period);
        list_ticker.tick().await;
        summary_ticker.tick().await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = list_ticker.tick() => {
                    print!("{}", live.refresh_quizzes().await);
                }
                _ = summary_ticker.tick() => {
                    print!("{}", live.refresh_summary().await);
                }
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted, stopping live summary");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Snapshot export command
pub mod export {
    use super::*;

    /// Fetch the report of one quiz and write it as pretty JSON
    ///
    /// # Returns
    ///
    /// Path of the written file
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::NoSnapshot`] when the fetch failed, or the
    /// write error
    pub async fn run_export(
        config: &Config,
        quiz_id: Option<String>,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let quiz_id = quiz_id.unwrap_or_else(|| config.dashboard.default_quiz_id.clone());
        let dir = output_dir.unwrap_or(config.dashboard.export_dir.as_path());
        tracing::info!(quiz_id = %quiz_id, dir = %dir.display(), "Exporting analytics");

        let mut dashboard = dashboard_for(config, quiz_id)?;
        dashboard.refresh().await;
        if let Some(message) = &dashboard.status().error {
            eprint!("{}", render::error_banner(message));
        }

        let path = dashboard.export(dir, Utc::now())?;
        println!("{}", path.display());
        Ok(path)
    }
}
