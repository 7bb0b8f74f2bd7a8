//! Quiz listing command
//!
//! Prints the quizzes the backend has sessions for, as a table or JSON.

use crate::config::Config;
use crate::dashboard::render;
use crate::dashboard::report::QuizListing;
use crate::dashboard::{AnalyticsSource, HttpAnalyticsSource};
use crate::error::Result;

/// List quizzes known to the backend
///
/// # Arguments
///
/// * `config` - Configuration naming the API base URL
/// * `json` - Print JSON instead of a table
///
/// # Errors
///
/// Returns error if the list cannot be fetched or serialized
///
/// # Examples
///
/// ```no_run
/// use quiztrack::config::Config;
/// use quiztrack::commands::quizzes::list_quizzes;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load("config/config.yaml", &Default::default())?;
/// list_quizzes(&config, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_quizzes(config: &Config, json: bool) -> Result<()> {
    tracing::info!("Listing quizzes from {}", config.api.base_url);

    let source = HttpAnalyticsSource::from_config(config)?;
    let quizzes = source.list_quizzes().await?;
    tracing::debug!(count = quizzes.len(), "Quizzes fetched");

    print!("{}", format_quizzes(&quizzes, json)?);
    Ok(())
}

/// Render the quiz list as a table or pretty JSON
///
/// # Errors
///
/// Returns error if JSON serialization fails
pub fn format_quizzes(quizzes: &[QuizListing], json: bool) -> Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(quizzes)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(render::quiz_list(quizzes))
    }
}
