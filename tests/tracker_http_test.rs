//! Tracker lifecycle over HTTP against a `wiremock` backend

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use quiztrack::config::TrackerConfig;
use quiztrack::http::{ResilientClient, RetryPolicy};
use quiztrack::page::PageView;
use quiztrack::tracker::{HttpTrackingApi, PageEvent, QuizTracker, TrackerPhase};

mod common;

fn tracker(server: &MockServer, attempts: u32) -> QuizTracker {
    let client = ResilientClient::new(
        server.uri(),
        RetryPolicy::new(attempts, Duration::from_millis(5)),
        Duration::from_secs(5),
    )
    .expect("client");
    let config = TrackerConfig {
        click_settle_ms: 0,
        ..TrackerConfig::default()
    };
    QuizTracker::new(&config, Arc::new(HttpTrackingApi::new(client))).expect("tracker")
}

async fn mount_start(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/tracking/session/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("json body")
}

#[tokio::test]
async fn test_full_session_flow() {
    let server = MockServer::start().await;
    mount_start(&server, json!({"success": true, "session_id": 42})).await;
    Mock::given(method("POST"))
        .and(path("/api/tracking/slide/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tracking/session/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = common::two_slide_page();
    let mut tracker = tracker(&server, 3);
    tracker.initialize(&page).await;
    assert_eq!(tracker.phase(), TrackerPhase::Active);
    assert_eq!(tracker.status().session_id.as_deref(), Some("42"));

    page.activate("slide-2", "active").unwrap();
    let next = page.element_by_id("next-1").unwrap();
    tracker
        .handle_event(&page, PageEvent::Click { target: next })
        .await;
    tracker
        .handle_event(&page, PageEvent::VisibilityChange { hidden: true })
        .await;
    tracker.handle_event(&page, PageEvent::Unload).await;
    assert!(tracker.complete_session().await);

    assert_eq!(tracker.phase(), TrackerPhase::Completed);
    assert_eq!(tracker.visited().slide_ids(), ["slide-1", "slide-2"]);

    let requests = server.received_requests().await.unwrap();
    let start = json_body(&requests[0]);
    assert_eq!(start["url_path"], "/lead2");
    assert_eq!(start["user_agent"], "Mozilla/5.0 test");

    let visits: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/api/tracking/slide/visit")
        .map(json_body)
        .collect();
    assert_eq!(visits[0]["session_id"], 42);
    assert_eq!(visits[0]["slide_id"], "slide-1");
    assert_eq!(visits[0]["slide_title"], "How old are you?");
    assert_eq!(visits[0]["slide_sequence"], 1);
    assert_eq!(visits[0]["slide_metadata"]["url"], page.href());
    assert_eq!(visits[1]["slide_id"], "slide-2");
    assert_eq!(visits[1]["slide_sequence"], 2);
}

#[tokio::test]
async fn test_failed_visit_posts_leave_slide_unvisited() {
    let server = MockServer::start().await;
    mount_start(&server, json!({"success": true, "session_id": "s-1"})).await;
    Mock::given(method("POST"))
        .and(path("/api/tracking/slide/visit"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let page = common::two_slide_page();
    let mut tracker = tracker(&server, 3);
    tracker.initialize(&page).await;
    tracker.record_exit().await;

    assert!(!tracker.visited().contains("slide-1"));
    assert!(tracker.visited().is_empty());
}

#[tokio::test]
async fn test_rejected_session_start_records_nothing() {
    let server = MockServer::start().await;
    mount_start(&server, json!({"success": false, "message": "quiz disabled"})).await;
    Mock::given(method("POST"))
        .and(path("/api/tracking/slide/visit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let page = common::two_slide_page();
    let mut tracker = tracker(&server, 1);
    tracker.initialize(&page).await;
    tracker.handle_event(&page, PageEvent::Unload).await;

    assert!(tracker.session().id.is_none());
    assert!(!tracker.complete_session().await);
    assert_eq!(tracker.phase(), TrackerPhase::Active);
}
