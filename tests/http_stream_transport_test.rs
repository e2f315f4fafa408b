//! HTTP reply transport integration tests
//!
//! Tests `HttpStreamTransport` against a `wiremock` mock server.
//!
//! Use `set_body_raw(bytes, "text/event-stream")` for SSE responses;
//! `set_body_string` would force `text/plain`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moodchat::auth::StaticCredentials;
use moodchat::models::ActionType;
use moodchat::transport::{
    HttpStreamTransport, StreamEvent, StreamRequest, StreamTransport,
};

use common::{api_config, sse_body, stream_config, STREAM_PATH};

fn make_transport(base_url: &str, token: Option<&str>, idle_secs: u64) -> HttpStreamTransport {
    let credentials = match token {
        Some(token) => StaticCredentials::new(token),
        None => StaticCredentials::none(),
    };
    HttpStreamTransport::new(
        &api_config(base_url),
        &stream_config(idle_secs),
        Arc::new(credentials),
    )
    .expect("valid transport config")
}

fn request(message: &str) -> StreamRequest {
    StreamRequest {
        session_id: "s-1".to_string(),
        message: message.to_string(),
    }
}

async fn collect(transport: &HttpStreamTransport, message: &str) -> Vec<StreamEvent> {
    let stream = transport.open(request(message)).await.expect("open");
    tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("stream should finish")
}

fn sse(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream")
}

#[tokio::test]
async fn test_full_reply_decoded_in_order() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        ("token", r#"{"content":"Hi"}"#),
        (
            "action",
            r#"{"type":"write_diary","label":"Write it down","path":"/diary/new"}"#,
        ),
        ("diary-reference", r#"{"diary_id":"d1","title":"Walk"}"#),
        ("token", r#"{"content":" there"}"#),
        ("done", r#"{"diary_ids":["d1"]}"#),
    ]);

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(header("accept", "text/event-stream"))
        .and(body_json(serde_json::json!({
            "session_id": "s-1",
            "message": "Hello"
        })))
        .respond_with(sse(body))
        .expect(1)
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 5), "Hello").await;

    assert_eq!(events.len(), 5, "got: {events:?}");
    assert_eq!(events[0], StreamEvent::Token("Hi".into()));
    assert!(matches!(&events[1], StreamEvent::Action(a) if a.action_type == ActionType::WriteDiary));
    assert!(matches!(&events[2], StreamEvent::DiaryReferences(r) if r[0].diary_id == "d1"));
    assert_eq!(events[3], StreamEvent::Token(" there".into()));
    assert_eq!(
        events[4],
        StreamEvent::Done {
            diary_ids: vec!["d1".into()]
        }
    );
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(sse(sse_body(&[("done", "{}")])))
        .expect(1)
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), Some("secret-token"), 5), "hi").await;
    assert_eq!(events, vec![StreamEvent::Done { diary_ids: vec![] }]);
}

#[tokio::test]
async fn test_http_error_status_becomes_error_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model unavailable"))
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 5), "hi").await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error { message } => {
            assert!(message.contains("500"), "message: {message}");
            assert!(message.contains("model unavailable"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_failure_becomes_error_event() {
    // Nothing listens on port 1.
    let events = collect(&make_transport("http://127.0.0.1:1", None, 5), "hi").await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StreamEvent::Error { message } if message.contains("request failed")));
}

#[tokio::test]
async fn test_upstream_error_frame() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        ("token", r#"{"content":"I think"}"#),
        ("error", r#"{"message":"rate limited"}"#),
    ]);
    Mock::given(method("POST"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 5), "hi").await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Token("I think".into()),
            StreamEvent::error("rate limited"),
        ]
    );
}

#[tokio::test]
async fn test_body_without_done_ends_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(sse_body(&[("token", r#"{"content":"cut"}"#)])))
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 5), "hi").await;
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], StreamEvent::Error { message } if message.contains("before completion")));
}

#[tokio::test]
async fn test_done_sentinel_and_crlf_framing() {
    let server = MockServer::start().await;
    let body = "event: token\r\ndata: {\"content\":\"ok\"}\r\n\r\n: keep-alive\r\n\r\ndata: [DONE]\r\n\r\n";
    Mock::given(method("POST"))
        .respond_with(sse(body.to_string()))
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 5), "hi").await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Token("ok".into()),
            StreamEvent::Done { diary_ids: vec![] },
        ]
    );
}

#[tokio::test]
async fn test_slow_response_hits_idle_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(sse_body(&[("done", "{}")])).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 1), "hi").await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StreamEvent::Error { message } if message.contains("no response within")));
}

#[tokio::test]
async fn test_cancel_releases_stream_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(sse_body(&[("done", "{}")])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = make_transport(&server.uri(), None, 30);
    let mut stream = transport.open(request("hi")).await.expect("open");
    stream.cancel();

    let next = tokio::time::timeout(Duration::from_millis(500), stream.next())
        .await
        .expect("cancelled stream must not block");
    assert_eq!(next, None);
}

#[tokio::test]
async fn test_slow_error_response_still_fails_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("overloaded")
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let events = collect(&make_transport(&server.uri(), None, 1), "hi").await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StreamEvent::Error { .. }));
}
