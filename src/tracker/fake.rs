//! In-process test doubles for the tracker
//!
//! [`FakeTrackingApi`] records every request and answers from canned
//! settings; [`ManualClock`] only moves when told to.

use crate::error::{QuizTrackError, Result};
use crate::tracker::api::{
    Ack, SessionCompleteRequest, SessionId, SessionStartRequest, SessionStartResponse,
    SlideVisitRequest, TrackingApi,
};
use crate::tracker::session::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Recording fake of the tracking backend
#[derive(Debug)]
pub struct FakeTrackingApi {
    session_id: Option<SessionId>,
    fail_start: AtomicBool,
    fail_visits: AtomicBool,
    reject_visits: AtomicBool,
    starts: Mutex<Vec<SessionStartRequest>>,
    visits: Mutex<Vec<SlideVisitRequest>>,
    completes: Mutex<Vec<SessionCompleteRequest>>,
}

impl FakeTrackingApi {
    /// Backend that hands out `session_id`
    pub fn new(session_id: &str) -> Self {
        Self::with_session(Some(SessionId::Text(session_id.to_string())))
    }

    /// Backend that answers `success: false` to session starts
    pub fn rejecting() -> Self {
        Self::with_session(None)
    }

    fn with_session(session_id: Option<SessionId>) -> Self {
        Self {
            session_id,
            fail_start: AtomicBool::new(false),
            fail_visits: AtomicBool::new(false),
            reject_visits: AtomicBool::new(false),
            starts: Mutex::new(Vec::new()),
            visits: Mutex::new(Vec::new()),
            completes: Mutex::new(Vec::new()),
        }
    }

    /// Make session starts fail at the transport level
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Make visit posts fail at the transport level
    pub fn set_fail_visits(&self, fail: bool) {
        self.fail_visits.store(fail, Ordering::SeqCst);
    }

    /// Make visit posts answer `success: false`
    pub fn set_reject_visits(&self, reject: bool) {
        self.reject_visits.store(reject, Ordering::SeqCst);
    }

    /// Session start requests received
    pub fn starts(&self) -> Vec<SessionStartRequest> {
        self.starts.lock().unwrap().clone()
    }

    /// Visit requests received, failed ones included
    pub fn visits(&self) -> Vec<SlideVisitRequest> {
        self.visits.lock().unwrap().clone()
    }

    /// Complete requests received
    pub fn completes(&self) -> Vec<SessionCompleteRequest> {
        self.completes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingApi for FakeTrackingApi {
    async fn start_session(&self, request: &SessionStartRequest) -> Result<SessionStartResponse> {
        self.starts.lock().unwrap().push(request.clone());
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(QuizTrackError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".to_string(),
            }
            .into());
        }
        Ok(SessionStartResponse {
            success: self.session_id.is_some(),
            session_id: self.session_id.clone(),
            message: None,
        })
    }

    async fn record_visit(&self, request: &SlideVisitRequest) -> Result<Ack> {
        self.visits.lock().unwrap().push(request.clone());
        if self.fail_visits.load(Ordering::SeqCst) {
            return Err(QuizTrackError::HttpStatus {
                status: 500,
                reason: "Internal Server Error".to_string(),
            }
            .into());
        }
        Ok(Ack {
            success: !self.reject_visits.load(Ordering::SeqCst),
            message: None,
        })
    }

    async fn complete_session(&self, request: &SessionCompleteRequest) -> Result<Ack> {
        self.completes.lock().unwrap().push(request.clone());
        Ok(Ack {
            success: true,
            message: None,
        })
    }
}

/// Clock moved by hand
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock stopped at 2024-01-01T00:00:00Z
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move forward by `seconds`
    pub fn advance_secs(&self, seconds: i64) {
        *self.now.lock().unwrap() += Duration::seconds(seconds);
    }

    /// Move forward by `millis`
    pub fn advance_millis(&self, millis: i64) {
        *self.now.lock().unwrap() += Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
