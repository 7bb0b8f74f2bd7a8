//! quiztrack - quiz funnel tracker and analytics dashboard library
//!
//! Two halves share one HTTP layer: a per-page tracker that records which
//! quiz slides a visitor saw and for how long, and a dashboard that reads
//! the aggregated funnel back.
//!
//! # Architecture
//!
//! - `page`: the page model the tracker observes (DOM snapshot, selectors,
//!   scenario files)
//! - `tracker`: slide detection, visit timing and session lifecycle
//! - `dashboard`: analytics payloads, view models, charts and rendering
//! - `http`: JSON client with linear retry
//! - `config`: configuration loading and validation
//! - `logging`: tracing subscriber setup
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line surface
//!
//! # Example
//!
//! ```no_run
//! use quiztrack::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod logging;
pub mod page;
pub mod tracker;

// Re-export commonly used types
pub use config::Config;
pub use dashboard::{Dashboard, LiveSummary};
pub use error::{QuizTrackError, Result};
pub use tracker::{QuizTracker, TrackingApi};
