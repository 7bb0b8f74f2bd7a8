//! Scenario replay through the visit tracker
//!
//! The page reacts to a step first (slide activation, scrolling,
//! visibility), then the tracker sees the matching event, the same order a
//! browser delivers them in.

use crate::config::Config;
use crate::error::{QuizTrackError, Result};
use crate::http::ResilientClient;
use crate::page::scenario::{Scenario, Step};
use crate::page::DomSnapshot;
use crate::tracker::{
    HttpTrackingApi, PageEvent, QuizIdStrategy, QuizTracker, TrackerPhase, TrackerStatus,
};
use colored::Colorize;
use prettytable::{format, row, Table};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Class a quiz puts on the slide it shows
pub const ACTIVE_CLASS: &str = "active";

/// Replay a scenario file against the configured backend
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `scenario_path` - Scenario file (YAML or JSON)
/// * `quiz_id` - Fixed quiz id overriding the configured strategy
/// * `complete` - Complete the session after the last step
///
/// # Errors
///
/// Returns error if the scenario cannot be loaded or references an element
/// the page does not have. Backend failures are logged, not returned.
///
/// # Examples
///
/// ```no_run
/// use quiztrack::commands::track::run_track;
/// use quiztrack::config::Config;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// run_track(Config::default(), Path::new("demos/lead2.yaml"), None, true).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_track(
    mut config: Config,
    scenario_path: &Path,
    quiz_id: Option<String>,
    complete: bool,
) -> Result<()> {
    tracing::info!("Replaying scenario {}", scenario_path.display());

    if let Some(quiz_id) = quiz_id {
        tracing::debug!(quiz_id = %quiz_id, "Using fixed quiz id");
        config.tracker.quiz_id = QuizIdStrategy::Fixed { quiz_id };
    }

    let scenario = Scenario::load(scenario_path)?;
    let mut page = scenario.build_page()?;

    let api = Arc::new(HttpTrackingApi::new(ResilientClient::from_config(&config.api)?));
    let mut tracker = QuizTracker::new(&config.tracker, api)?;

    tracker.initialize(&page).await;
    replay(&mut tracker, &mut page, &scenario.steps).await?;

    if complete && tracker.phase() != TrackerPhase::Completed {
        tracker.complete_session().await;
    }

    print_status(&tracker.status());
    Ok(())
}

/// Feed `steps` to an initialized tracker
///
/// # Errors
///
/// Returns [`QuizTrackError::Page`] when a step names an element the page
/// does not have
pub async fn replay(
    tracker: &mut QuizTracker,
    page: &mut DomSnapshot,
    steps: &[Step],
) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(step = index + 1, ?step, "Replaying step");

        match step {
            Step::Click {
                target,
                activate,
                scroll_to,
            } => {
                let element = page.element_by_id(target).ok_or_else(|| {
                    QuizTrackError::Page(format!("click target {:?} not found", target))
                })?;
                if let Some(slide) = activate {
                    page.activate(slide, ACTIVE_CLASS)?;
                }
                if let Some(y) = scroll_to {
                    page.scroll_to(*y);
                }
                tracker
                    .handle_event(&*page, PageEvent::Click { target: element })
                    .await;
            }
            Step::Activate { target } => page.activate(target, ACTIVE_CLASS)?,
            Step::Scroll { y } => page.scroll_to(*y),
            Step::Hide => {
                page.set_hidden(true);
                tracker
                    .handle_event(&*page, PageEvent::VisibilityChange { hidden: true })
                    .await;
            }
            Step::Show => {
                page.set_hidden(false);
                tracker
                    .handle_event(&*page, PageEvent::VisibilityChange { hidden: false })
                    .await;
            }
            Step::Unload => tracker.handle_event(&*page, PageEvent::Unload).await,
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::Complete => {
                tracker.complete_session().await;
            }
        }
    }

    Ok(())
}

fn print_status(status: &TrackerStatus) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Quiz".bold(), status.quiz_id.cyan()]);
    table.add_row(row![
        "Session".bold(),
        status.session_id.as_deref().unwrap_or("-")
    ]);
    table.add_row(row!["Phase".bold(), format!("{:?}", status.phase)]);
    table.add_row(row!["Slides".bold(), status.slide_count]);
    table.add_row(row![
        "Current".bold(),
        status.current_slide.as_deref().unwrap_or("-")
    ]);
    table.add_row(row!["Visited".bold(), status.visited_slides.join(", ")]);
    table.printstd();
}
