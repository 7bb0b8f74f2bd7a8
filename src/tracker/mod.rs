//! Quiz visit tracking
//!
//! This module attaches to a quiz page, works out which slide the visitor
//! is on, and reports sessions and slide visits to the tracking backend.
//!
//! # Modules
//!
//! - [`quiz_id`]: quiz id resolution from the page path
//! - [`detector`]: slide detection and current-slide resolution
//! - [`api`]: backend contract and its HTTP implementation
//! - [`session`]: lifecycle phase, slide timer, and visited-set
//! - [`core`]: the tracker itself
//!
//! # Example
//!
//! ```no_run
//! use quiztrack::config::Config;
//! use quiztrack::http::ResilientClient;
//! use quiztrack::page::Scenario;
//! use quiztrack::tracker::{HttpTrackingApi, QuizTracker};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let api = HttpTrackingApi::new(ResilientClient::from_config(&config.api)?);
//! let page = Scenario::load(Path::new("demos/lead2.yaml"))?.build_page()?;
//!
//! let mut tracker = QuizTracker::new(&config.tracker, Arc::new(api))?;
//! tracker.initialize(&page).await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod core;
pub mod detector;
#[cfg(test)]
pub mod fake;
pub mod quiz_id;
pub mod session;

pub use api::{HttpTrackingApi, SessionId, TrackingApi};
pub use core::{PageEvent, QuizTracker, TrackerStatus};
pub use detector::{SlideDetector, SlideRef};
pub use quiz_id::{quiz_id_from_path, QuizIdStrategy, QuizIdentity};
pub use session::{Clock, SystemClock, TrackerPhase};
