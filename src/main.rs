//! quiztrack - quiz funnel tracker and analytics dashboard
//!
#![doc = "quiztrack - quiz funnel tracker and analytics dashboard"]
#![doc = "Main entry point for the quiztrack CLI."]

use anyhow::Result;

use quiztrack::cli::{Cli, Commands};
use quiztrack::commands;
use quiztrack::config::Config;
use quiztrack::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    init_logging(&config.logging)?;

    // Execute command
    match cli.command {
        Commands::Track {
            scenario,
            quiz_id,
            complete,
        } => {
            tracing::info!("Starting scenario replay");
            if let Some(q) = &quiz_id {
                tracing::debug!("Using quiz id override: {}", q);
            }
            commands::track::run_track(config, &scenario, quiz_id, complete).await?;
            Ok(())
        }
        Commands::Dashboard {
            quiz_id,
            watch,
            interval,
            export_dir,
            slide,
        } => {
            tracing::info!("Starting dashboard");
            commands::dashboard::run_dashboard(&config, quiz_id, watch, interval, export_dir, slide)
                .await?;
            Ok(())
        }
        Commands::Summary { quiz_id, watch } => {
            tracing::info!("Starting live summary");
            commands::summary::run_summary(&config, quiz_id, watch).await?;
            Ok(())
        }
        Commands::Quizzes { json } => {
            tracing::info!("Starting quiz listing");
            commands::quizzes::list_quizzes(&config, json).await?;
            Ok(())
        }
        Commands::Export {
            quiz_id,
            output_dir,
        } => {
            tracing::info!("Starting analytics export");
            commands::export::run_export(&config, quiz_id, output_dir.as_deref()).await?;
            Ok(())
        }
    }
}
