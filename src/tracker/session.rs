//! Tracker state
//!
//! Lifecycle phase, the open slide timer, the visited-set, and the clock
//! the timers read.

use crate::tracker::api::SessionId;
use crate::tracker::detector::SlideRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// Created, not yet attached to a page
    Uninitialized,
    /// Starting the session and detecting slides
    Initializing,
    /// Listening to page events
    Active,
    /// Session reported complete; listeners keep running
    Completed,
}

impl TrackerPhase {
    /// Whether page events are handled in this phase
    pub fn is_listening(&self) -> bool {
        matches!(self, TrackerPhase::Active | TrackerPhase::Completed)
    }
}

/// Slide currently being timed
#[derive(Debug, Clone, PartialEq)]
pub enum SlideState {
    /// No slide resolved yet
    Idle,
    /// A slide is on screen
    Tracking {
        /// The slide
        slide: SlideRef,
        /// When its timer was (re)started
        entered_at: DateTime<Utc>,
    },
}

impl SlideState {
    /// The tracked slide, if any
    pub fn slide(&self) -> Option<&SlideRef> {
        match self {
            SlideState::Idle => None,
            SlideState::Tracking { slide, .. } => Some(slide),
        }
    }
}

/// Session identity as seen by one tracker
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Backend id; `None` until a start succeeds
    pub id: Option<SessionId>,
    /// Quiz identifier
    pub quiz_id: String,
    /// Reported URL path
    pub url_path: String,
    /// Full page URL, sent as visit metadata
    pub href: String,
    /// Reported user agent
    pub user_agent: String,
    /// Per-tab id when tab tagging is on
    pub tab_id: Option<String>,
}

/// Slides already recorded in this session
///
/// Keeps insertion order for status output.
#[derive(Debug, Clone, Default)]
pub struct VisitLog {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl VisitLog {
    /// Whether `slide_id` was recorded
    pub fn contains(&self, slide_id: &str) -> bool {
        self.seen.contains(slide_id)
    }

    /// Mark `slide_id` recorded; false when it already was
    pub fn insert(&mut self, slide_id: &str) -> bool {
        if !self.seen.insert(slide_id.to_string()) {
            return false;
        }
        self.order.push(slide_id.to_string());
        true
    }

    /// Recorded slide ids in order
    pub fn slide_ids(&self) -> &[String] {
        &self.order
    }

    /// Number of recorded slides
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Time source for slide timers
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whole seconds between `from` and `to`, zero when `to` is earlier
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    let millis = (to - from).num_milliseconds().max(0);
    (millis / 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_visit_log_dedup() {
        let mut log = VisitLog::default();
        assert!(log.insert("slide-1"));
        assert!(log.insert("slide-2"));
        assert!(!log.insert("slide-1"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.slide_ids(), &["slide-1".to_string(), "slide-2".to_string()]);
        assert!(log.contains("slide-2"));
        assert!(!log.contains("slide-3"));
    }

    #[test]
    fn test_elapsed_seconds_floors() {
        let start = Utc::now();
        assert_eq!(elapsed_seconds(start, start + Duration::milliseconds(2999)), 2);
        assert_eq!(elapsed_seconds(start, start + Duration::seconds(61)), 61);
        assert_eq!(elapsed_seconds(start, start - Duration::seconds(5)), 0);
    }

    #[test]
    fn test_listening_phases() {
        assert!(!TrackerPhase::Uninitialized.is_listening());
        assert!(!TrackerPhase::Initializing.is_listening());
        assert!(TrackerPhase::Active.is_listening());
        assert!(TrackerPhase::Completed.is_listening());
    }
}
