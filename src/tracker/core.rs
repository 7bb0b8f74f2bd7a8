//! Visit tracker
//!
//! [`QuizTracker`] owns one session for one page load. It resolves the
//! quiz, starts the session, detects slides, and then reacts to page
//! events: navigation clicks trigger a slide recheck, hiding the page or
//! unloading it closes the current slide's timer, and showing it restarts
//! the timer. Every closed timer becomes at most one visit record per
//! slide id.
//!
//! Backend failures are logged and swallowed; nothing here returns an
//! error to the host page.

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::page::{ElementId, PageView, Selector};
use crate::tracker::api::{
    SessionCompleteRequest, SessionId, SessionStartRequest, SlideMetadata, SlideVisitRequest,
    TrackingApi,
};
use crate::tracker::detector::{SlideDetector, SlideRef};
use crate::tracker::session::{
    elapsed_seconds, Clock, Session, SlideState, SystemClock, TrackerPhase, VisitLog,
};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::increment_counter;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Page events the tracker listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Click on an element
    Click {
        /// Clicked element
        target: ElementId,
    },
    /// Document visibility changed
    VisibilityChange {
        /// Whether the document is now hidden
        hidden: bool,
    },
    /// Page is being unloaded
    Unload,
}

/// Snapshot of tracker state for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerStatus {
    /// Lifecycle phase
    pub phase: TrackerPhase,
    /// Quiz identifier
    pub quiz_id: String,
    /// Backend session id
    pub session_id: Option<String>,
    /// Slide being timed
    pub current_slide: Option<String>,
    /// Slides recorded so far, in order
    pub visited_slides: Vec<String>,
    /// Slides found on the page
    pub slide_count: usize,
}

/// Per-page quiz visit tracker
pub struct QuizTracker {
    config: TrackerConfig,
    api: Arc<dyn TrackingApi>,
    clock: Arc<dyn Clock>,
    detector: SlideDetector,
    navigation: Selector,
    phase: TrackerPhase,
    session: Session,
    slides: Vec<ElementId>,
    current: SlideState,
    visited: VisitLog,
}

impl QuizTracker {
    /// Create a tracker
    ///
    /// # Arguments
    ///
    /// * `config` - Quiz id strategy, selectors, and timing
    /// * `api` - Tracking backend
    ///
    /// # Errors
    ///
    /// Returns error if a configured selector does not parse
    pub fn new(config: &TrackerConfig, api: Arc<dyn TrackingApi>) -> Result<Self> {
        Ok(Self {
            detector: SlideDetector::from_config(config)?,
            navigation: Selector::parse(&config.navigation_selector)?,
            config: config.clone(),
            api,
            clock: Arc::new(SystemClock),
            phase: TrackerPhase::Uninitialized,
            session: Session::default(),
            slides: Vec::new(),
            current: SlideState::Idle,
            visited: VisitLog::default(),
        })
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Lifecycle phase
    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    /// Session details
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Slides detected at initialization
    pub fn slides(&self) -> &[ElementId] {
        &self.slides
    }

    /// Slide being timed
    pub fn current_slide(&self) -> Option<&SlideRef> {
        self.current.slide()
    }

    /// Slides recorded in this session
    pub fn visited(&self) -> &VisitLog {
        &self.visited
    }

    /// Summary of the tracker's state
    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            phase: self.phase,
            quiz_id: self.session.quiz_id.clone(),
            session_id: self.session.id.as_ref().map(SessionId::to_string),
            current_slide: self.current.slide().map(|s| s.slide_id.clone()),
            visited_slides: self.visited.slide_ids().to_vec(),
            slide_count: self.slides.len(),
        }
    }

    /// Attach to a page
    ///
    /// Resolves the quiz identity, starts the session, detects slides, and
    /// starts timing the slide on screen. Calling it again is a no-op.
    pub async fn initialize<P: PageView + ?Sized>(&mut self, page: &P) {
        if self.phase != TrackerPhase::Uninitialized {
            tracing::debug!(phase = ?self.phase, "Tracker already initialized");
            return;
        }
        self.phase = TrackerPhase::Initializing;

        let identity = self.config.quiz_id.resolve(
            page.path(),
            &self.config.fallback_quiz_id,
            self.config.max_quiz_id_length,
        );
        let tab_id = self.config.tag_tab_id.then(|| generate_tab_id(self.clock.now()));
        let user_agent = match &tab_id {
            Some(tab) => format!("{} [Tab: {}]", page.user_agent(), tab),
            None => page.user_agent().to_string(),
        };

        self.session = Session {
            id: None,
            quiz_id: identity.quiz_id,
            url_path: identity.url_path,
            href: page.href().to_string(),
            user_agent,
            tab_id,
        };

        self.start_session().await;

        self.slides = self.detector.detect(page);
        self.phase = TrackerPhase::Active;

        tracing::info!(
            quiz_id = %self.session.quiz_id,
            session = ?self.session.id,
            slides = self.slides.len(),
            "Quiz tracker initialized"
        );

        self.check_slide_change(page).await;
    }

    async fn start_session(&mut self) {
        let request = SessionStartRequest {
            url_path: self.session.url_path.clone(),
            user_agent: self.session.user_agent.clone(),
            ip_address: None,
        };

        let response = match self.api.start_session(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to start session: {:#}", e);
                return;
            }
        };

        let message = response.message.clone();
        match response.into_session_id() {
            Ok(Some(id)) => {
                tracing::info!(session_id = %id, tab_id = ?self.session.tab_id, "Session started");
                self.session.id = Some(id);
            }
            Ok(None) => {
                tracing::warn!(message = ?message, "Session start rejected");
            }
            Err(e) => {
                tracing::error!("Failed to start session: {:#}", e);
            }
        }
    }

    /// React to a page event
    ///
    /// Events arriving before initialization finishes are ignored.
    pub async fn handle_event<P: PageView + ?Sized>(&mut self, page: &P, event: PageEvent) {
        if !self.phase.is_listening() {
            tracing::debug!(?event, phase = ?self.phase, "Ignoring event");
            return;
        }

        match event {
            PageEvent::Click { target } => {
                if page.closest(target, &self.navigation).is_none() {
                    return;
                }
                tokio::time::sleep(self.config.click_settle()).await;
                self.check_slide_change(page).await;
            }
            PageEvent::VisibilityChange { hidden: true } => self.record_exit().await,
            PageEvent::VisibilityChange { hidden: false } => self.record_entry(),
            PageEvent::Unload => self.record_exit().await,
        }
    }

    /// Resolve the current slide and switch timers if it changed
    ///
    /// The old slide's exit is recorded before the new slide's timer opens;
    /// both use the same instant.
    pub async fn check_slide_change<P: PageView + ?Sized>(&mut self, page: &P) {
        let Some(element) = self.detector.current_slide(page, &self.slides) else {
            return;
        };

        if self.current.slide().map(|s| s.element) == Some(element) {
            return;
        }

        let now = self.clock.now();
        self.record_exit_at(now).await;

        let slide = self.detector.describe(page, element);
        tracing::info!(
            slide_id = %slide.slide_id,
            title = %slide.title,
            sequence = slide.sequence,
            "Slide changed"
        );
        self.current = SlideState::Tracking {
            slide,
            entered_at: now,
        };
    }

    /// Restart the current slide's timer
    pub fn record_entry(&mut self) {
        let now = self.clock.now();
        if let SlideState::Tracking { entered_at, .. } = &mut self.current {
            *entered_at = now;
        }
    }

    /// Record the current slide as visited up to now
    ///
    /// The timer keeps running; a later exit of the same slide is dropped
    /// by the visited-set once this one succeeds.
    pub async fn record_exit(&mut self) {
        let now = self.clock.now();
        self.record_exit_at(now).await;
    }

    async fn record_exit_at(&mut self, now: DateTime<Utc>) {
        let (slide, entered_at) = match &self.current {
            SlideState::Tracking { slide, entered_at } => (slide.clone(), *entered_at),
            SlideState::Idle => return,
        };
        self.record_visit(&slide, elapsed_seconds(entered_at, now))
            .await;
    }

    /// Post one visit unless the slide was already recorded
    ///
    /// # Returns
    ///
    /// Whether the visit was accepted and added to the visited-set
    pub async fn record_visit(&mut self, slide: &SlideRef, time_spent_seconds: u64) -> bool {
        let Some(session_id) = self.session.id.clone() else {
            tracing::debug!(slide_id = %slide.slide_id, "No session, visit not recorded");
            return false;
        };

        if self.visited.contains(&slide.slide_id) {
            tracing::debug!(slide_id = %slide.slide_id, "Slide already recorded");
            return false;
        }

        let request = SlideVisitRequest {
            session_id,
            slide_id: slide.slide_id.clone(),
            slide_title: slide.title.clone(),
            slide_sequence: slide.sequence,
            time_spent_seconds,
            slide_metadata: SlideMetadata {
                url: self.session.href.clone(),
                timestamp: self
                    .clock
                    .now()
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                tab_id: self.session.tab_id.clone(),
            },
        };

        match self.api.record_visit(&request).await {
            Ok(ack) if ack.success => {
                self.visited.insert(&slide.slide_id);
                increment_counter!("quiztrack_slide_visits_total");
                tracing::info!(
                    slide_id = %slide.slide_id,
                    time_spent_seconds,
                    "Slide visit recorded"
                );
                true
            }
            Ok(ack) => {
                tracing::warn!(
                    slide_id = %slide.slide_id,
                    message = ?ack.message,
                    "Slide visit rejected"
                );
                false
            }
            Err(e) => {
                tracing::error!(slide_id = %slide.slide_id, "Failed to record slide visit: {:#}", e);
                false
            }
        }
    }

    /// Report the session complete
    ///
    /// # Returns
    ///
    /// Whether the backend accepted the completion
    pub async fn complete_session(&mut self) -> bool {
        let Some(session_id) = self.session.id.clone() else {
            tracing::error!("No active session to complete");
            return false;
        };

        let request = SessionCompleteRequest {
            session_id: session_id.clone(),
        };
        match self.api.complete_session(&request).await {
            Ok(ack) if ack.success => {
                self.phase = TrackerPhase::Completed;
                tracing::info!(session_id = %session_id, "Session completed");
                true
            }
            Ok(ack) => {
                tracing::warn!(message = ?ack.message, "Session completion rejected");
                false
            }
            Err(e) => {
                tracing::error!("Failed to complete session: {:#}", e);
                false
            }
        }
    }
}

/// `{millis}-{9 base36 chars}`, unique per tab in practice
fn generate_tab_id(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}
