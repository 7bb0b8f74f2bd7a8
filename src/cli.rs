//! Command-line interface definition for quiztrack
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for scenario tracking, the analytics dashboard,
//! the live summary view, quiz listing, and snapshot export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quiztrack - quiz funnel tracker and analytics dashboard
///
/// Replays quiz page scenarios through the visit tracker and renders
/// funnel analytics fetched from the backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "quiztrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for quiztrack
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay a page scenario through the visit tracker
    Track {
        /// Scenario file (YAML or JSON) describing the page and user steps
        #[arg(short, long)]
        scenario: PathBuf,

        /// Use a fixed quiz id instead of deriving it from the page path
        #[arg(short, long)]
        quiz_id: Option<String>,

        /// Complete the session after the last step
        #[arg(long)]
        complete: bool,
    },

    /// Fetch the full analytics report and render the dashboard
    Dashboard {
        /// Quiz to show (defaults to dashboard.default_quiz_id)
        #[arg(short, long)]
        quiz_id: Option<String>,

        /// Keep refreshing on a timer until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Refresh interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Export the last snapshot to this directory on exit
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Show the drop-off detail of this slide under each frame
        #[arg(short, long)]
        slide: Option<String>,
    },

    /// Show the live per-slide summary for a quiz
    Summary {
        /// Quiz to summarize
        #[arg(short, long)]
        quiz_id: String,

        /// Keep polling the quiz list and summary until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// List quizzes known to the backend
    Quizzes {
        /// Output as JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },

    /// Fetch a report once and write it to a JSON file
    Export {
        /// Quiz to export
        #[arg(short, long)]
        quiz_id: Option<String>,

        /// Directory to write the export into (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            base_url: None,
            command: Commands::Quizzes { json: false },
        }
    }
}
