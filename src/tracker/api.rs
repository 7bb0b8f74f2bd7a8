//! Tracking backend contract
//!
//! [`TrackingApi`] is the seam between the tracker and the backend. The
//! HTTP implementation posts through [`ResilientClient`], so every call
//! inherits its retry policy. A fake lives in [`super::fake`] for tests.

use crate::error::{QuizTrackError, Result};
use crate::http::ResilientClient;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Session start endpoint
pub const SESSION_START_ENDPOINT: &str = "/api/tracking/session/start";
/// Slide visit endpoint
pub const SLIDE_VISIT_ENDPOINT: &str = "/api/tracking/slide/visit";
/// Session complete endpoint
pub const SESSION_COMPLETE_ENDPOINT: &str = "/api/tracking/session/complete";

/// Backend-assigned session identifier
///
/// Backends hand out either strings or integers. The original JSON value is
/// kept so it can be echoed back exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionId {
    /// String id
    Text(String),
    /// Numeric id
    Number(i64),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Text(s) => write!(f, "{}", s),
            SessionId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SessionId::Text(s) => serializer.serialize_str(s),
            SessionId::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => SessionId::Text(s),
            Raw::Number(n) => SessionId::Number(n),
        })
    }
}

/// Body of the session start request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStartRequest {
    /// Path of the quiz page
    pub url_path: String,
    /// Browser user agent, possibly tab-tagged
    pub user_agent: String,
    /// Always null; the backend fills it in
    pub ip_address: Option<String>,
}

/// Answer to the session start request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionStartResponse {
    /// Whether the backend accepted the session
    #[serde(default)]
    pub success: bool,
    /// Assigned session id
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Reason for a rejection
    #[serde(default)]
    pub message: Option<String>,
}

impl SessionStartResponse {
    /// Session id of an accepted start, `None` for a rejected one
    ///
    /// # Errors
    ///
    /// Returns [`QuizTrackError::Decode`] when the backend reports success
    /// without an id
    pub fn into_session_id(self) -> Result<Option<SessionId>> {
        match (self.success, self.session_id) {
            (true, Some(id)) => Ok(Some(id)),
            (true, None) => Err(QuizTrackError::Decode(
                "session start succeeded without a session_id".to_string(),
            )
            .into()),
            (false, _) => Ok(None),
        }
    }
}

/// Extra context stored with a visit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideMetadata {
    /// Full page URL
    pub url: String,
    /// Moment the visit was recorded, RFC 3339 with milliseconds
    pub timestamp: String,
    /// Per-tab id when tab tagging is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// Body of the slide visit request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideVisitRequest {
    /// Owning session
    pub session_id: SessionId,
    /// Slide identifier
    pub slide_id: String,
    /// Slide heading
    pub slide_title: String,
    /// Slide position
    pub slide_sequence: u32,
    /// Whole seconds spent on the slide
    pub time_spent_seconds: u64,
    /// Extra context
    pub slide_metadata: SlideMetadata,
}

/// Body of the session complete request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCompleteRequest {
    /// Session being completed
    pub session_id: SessionId,
}

/// Plain `{success, message?}` answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ack {
    /// Whether the backend accepted the call
    #[serde(default)]
    pub success: bool,
    /// Reason for a rejection
    #[serde(default)]
    pub message: Option<String>,
}

/// Tracking backend operations
///
/// Implementations report transport failures as errors; a `success: false`
/// answer is a valid response and is left to the caller.
#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// Open a session
    async fn start_session(&self, request: &SessionStartRequest) -> Result<SessionStartResponse>;

    /// Record one slide visit
    async fn record_visit(&self, request: &SlideVisitRequest) -> Result<Ack>;

    /// Mark a session complete
    async fn complete_session(&self, request: &SessionCompleteRequest) -> Result<Ack>;
}

/// [`TrackingApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpTrackingApi {
    client: ResilientClient,
}

impl HttpTrackingApi {
    /// Wrap a client pointing at the tracking backend
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrackingApi for HttpTrackingApi {
    async fn start_session(&self, request: &SessionStartRequest) -> Result<SessionStartResponse> {
        self.client.post_json(SESSION_START_ENDPOINT, request).await
    }

    async fn record_visit(&self, request: &SlideVisitRequest) -> Result<Ack> {
        self.client.post_json(SLIDE_VISIT_ENDPOINT, request).await
    }

    async fn complete_session(&self, request: &SessionCompleteRequest) -> Result<Ack> {
        self.client.post_json(SESSION_COMPLETE_ENDPOINT, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_accepts_string_and_number() {
        let text: SessionId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(text, SessionId::Text("abc-1".to_string()));
        let number: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(number, SessionId::Number(42));
        assert_eq!(number.to_string(), "42");
        assert!(serde_json::from_str::<SessionId>("true").is_err());
    }

    #[test]
    fn test_session_id_echoed_unchanged() {
        let body = SessionCompleteRequest {
            session_id: SessionId::Number(7),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"session_id":7}"#);
    }

    #[test]
    fn test_start_response_session_id() {
        let ok: SessionStartResponse =
            serde_json::from_str(r#"{"success":true,"session_id":"s-1"}"#).unwrap();
        assert_eq!(
            ok.into_session_id().unwrap(),
            Some(SessionId::Text("s-1".to_string()))
        );

        let rejected: SessionStartResponse =
            serde_json::from_str(r#"{"success":false,"message":"quiz closed"}"#).unwrap();
        assert_eq!(rejected.message.as_deref(), Some("quiz closed"));
        assert_eq!(rejected.into_session_id().unwrap(), None);

        let missing: SessionStartResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(missing.into_session_id().is_err());
    }

    #[test]
    fn test_start_request_sends_null_ip() {
        let body = SessionStartRequest {
            url_path: "/lead2".to_string(),
            user_agent: "ua".to_string(),
            ip_address: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["url_path"], "/lead2");
        assert!(value["ip_address"].is_null());
    }

    #[test]
    fn test_visit_metadata_omits_missing_tab() {
        let body = SlideVisitRequest {
            session_id: SessionId::Text("s".to_string()),
            slide_id: "slide-1".to_string(),
            slide_title: "Age".to_string(),
            slide_sequence: 1,
            time_spent_seconds: 4,
            slide_metadata: SlideMetadata {
                url: "https://q.example.com/lead2".to_string(),
                timestamp: "2024-01-01T00:00:00.000Z".to_string(),
                tab_id: None,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["time_spent_seconds"], 4);
        assert!(value["slide_metadata"].get("tab_id").is_none());
    }
}
