//! Request pipeline tests: events, retries, timeouts
mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::ScriptedTransport;
use courier::event::{EventHandler, EventKind, LoggerSubscriber, Outcome, RetryStrategy, Subscriber};
use courier::http::{Headers, Method};
use courier::{Configuration, CourierError, HttpAdapter, InternalRequest, Request, Response, Result};

/// Records which callbacks fired, in order
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventHandler for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        EventKind::all().into_iter().map(|kind| (kind, 50)).collect()
    }

    fn on_pre_send(&self, request: InternalRequest, _config: &Configuration) -> Result<InternalRequest> {
        self.events.lock().unwrap().push(format!("pre_send {}", request.url()));
        Ok(request)
    }

    fn on_post_send(&self, request: &InternalRequest, response: Response, _config: &Configuration) -> Outcome {
        self.events
            .lock()
            .unwrap()
            .push(format!("post_send {} {}", request.url(), response.status_code()));
        Outcome::Continue(response)
    }

    fn on_exception(&self, request: &InternalRequest, error: CourierError, _config: &Configuration) -> Outcome {
        self.events.lock().unwrap().push(format!("exception {}", request.url()));
        Outcome::Failed(error)
    }
}

/// Turns any transport failure into a canned 503
struct Fallback;

impl EventHandler for Fallback {
    fn name(&self) -> &str {
        "fallback"
    }

    fn subscribed_events(&self) -> Vec<(EventKind, i32)> {
        vec![(EventKind::Exception, -10)]
    }

    fn on_exception(&self, _request: &InternalRequest, error: CourierError, _config: &Configuration) -> Outcome {
        if error.is_transport() {
            Outcome::Resolved(Response::new(503).with_reason_phrase("Fallback"))
        } else {
            Outcome::Failed(error)
        }
    }
}

fn recorder() -> (Recorder, Arc<Mutex<Vec<String>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    (
        Recorder {
            events: Arc::clone(&events),
        },
        events,
    )
}

// ============================================================================
// Round trip
// ============================================================================

#[tokio::test]
async fn test_canned_response_passes_through_unchanged() {
    let canned = Response::new(200)
        .with_reason_phrase("OK")
        .with_header("Content-Type", "application/json")
        .with_header("X-Request-Id", "abc")
        .with_body("{\"ok\":true}");
    let transport = ScriptedTransport::new().on("http://example.com/echo", common::Reply::Respond(canned));
    let adapter = HttpAdapter::new(transport);

    let request = Request::new("http://example.com/echo", Method::Get);
    let response = adapter.send_request(request).await.unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.reason_phrase(), "OK");
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("x-request-id"), Some("abc"));
    assert_eq!(response.text(), "{\"ok\":true}");
    assert_eq!(response.redirect_count().unwrap_or(0), 0);
    assert_eq!(response.request().unwrap().url(), "http://example.com/echo");
}

#[tokio::test]
async fn test_convenience_verbs_set_method_and_version() {
    let transport = ScriptedTransport::new().ok("http://example.com/", "");
    let adapter = HttpAdapter::new(transport)
        .with_configuration(Configuration::default().with_protocol_version(courier::ProtocolVersion::Http10));

    adapter.head("http://example.com/", Headers::new()).await.unwrap();
    adapter.options("http://example.com/", Headers::new(), "").await.unwrap();
    adapter.delete("http://example.com/", Headers::new(), courier::Payload::Empty).await.unwrap();
    adapter.trace("http://example.com/", Headers::new()).await.unwrap();

    let methods: Vec<Method> = adapter.transport().requests().iter().map(|r| r.method()).collect();
    assert_eq!(methods, vec![Method::Head, Method::Options, Method::Delete, Method::Trace]);
    assert!(adapter
        .transport()
        .requests()
        .iter()
        .all(|r| r.protocol_version() == courier::ProtocolVersion::Http10));
}

#[tokio::test]
async fn test_send_with_files_reaches_transport() {
    let transport = ScriptedTransport::new().ok("http://example.com/upload", "stored");
    let adapter = HttpAdapter::new(transport);

    let mut files = courier::FileData::new();
    files.insert("doc".into(), "/tmp/doc.txt".into());
    let response = adapter
        .send("http://example.com/upload", Method::Post, Headers::new(), courier::FormData::new(), files)
        .await
        .unwrap();

    assert_eq!(response.text(), "stored");
    assert!(adapter.transport().requests()[0].has_files());
}

// ============================================================================
// Event ordering
// ============================================================================

#[tokio::test]
async fn test_events_fire_per_hop() {
    let (recorder, events) = recorder();
    let transport = ScriptedTransport::new().redirect("/a", 302, "/b").ok("/b", "ok");
    let adapter = HttpAdapter::new(transport).with_subscriber(Subscriber::custom(recorder));

    adapter.get("/a", Headers::new()).await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["pre_send /a", "post_send /a 302", "pre_send /b", "post_send /b 200"]
    );
}

#[tokio::test]
async fn test_transport_failure_goes_through_exception() {
    let (recorder, events) = recorder();
    let transport = ScriptedTransport::new().fail("http://example.com/", "refused");
    let adapter = HttpAdapter::new(transport).with_subscriber(Subscriber::custom(recorder));

    let err = adapter.get("http://example.com/", Headers::new()).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(
        *events.lock().unwrap(),
        vec!["pre_send http://example.com/", "exception http://example.com/"]
    );
}

#[tokio::test]
async fn test_exception_subscriber_can_recover() {
    let transport = ScriptedTransport::new().fail("http://example.com/", "refused");
    let adapter = HttpAdapter::new(transport).with_subscriber(Subscriber::custom(Fallback));

    let response = adapter.get("http://example.com/", Headers::new()).await.unwrap();

    assert_eq!(response.status_code(), 503);
    assert_eq!(response.reason_phrase(), "Fallback");
}

#[tokio::test]
async fn test_budget_failure_is_dispatched_as_exception() {
    let (recorder, events) = recorder();
    let transport = ScriptedTransport::new().redirect("/a", 302, "/a");
    let adapter = HttpAdapter::new(transport)
        .with_configuration(Configuration::default().with_max_redirects(1))
        .with_subscriber(Subscriber::custom(recorder));

    let err = adapter.get("/a", Headers::new()).await.unwrap_err();

    assert!(matches!(err, CourierError::MaxRedirectsExceeded { .. }));
    assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("exception /a"));
}

#[tokio::test]
async fn test_logger_does_not_change_outcome() {
    let transport = ScriptedTransport::new().redirect("/a", 301, "/b").ok("/b", "ok");
    let adapter = HttpAdapter::new(transport).with_subscriber(LoggerSubscriber::default());

    let response = adapter.get("/a", Headers::new()).await.unwrap();

    assert_eq!(response.text(), "ok");
    assert_eq!(response.redirect_count(), Some(1));
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let transport = ScriptedTransport::new()
        .fail("http://example.com/", "reset")
        .fail("http://example.com/", "reset")
        .ok("http://example.com/", "third time");
    let adapter = HttpAdapter::new(transport)
        .with_subscriber(Subscriber::retry(3, RetryStrategy::Constant(Duration::from_millis(1))));

    let response = adapter.get("http://example.com/", Headers::new()).await.unwrap();

    assert_eq!(response.text(), "third time");
    assert_eq!(adapter.transport().hits("http://example.com/"), 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_limit() {
    let transport = ScriptedTransport::new().fail("http://example.com/", "down");
    let adapter = HttpAdapter::new(transport)
        .with_subscriber(Subscriber::retry(2, RetryStrategy::Linear(Duration::from_millis(1))));

    let err = adapter.get("http://example.com/", Headers::new()).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(adapter.transport().hits("http://example.com/"), 3);
}

#[tokio::test]
async fn test_each_redirect_hop_gets_its_own_retries() {
    let transport = ScriptedTransport::new()
        .fail("http://example.com/a", "reset")
        .redirect("http://example.com/a", 302, "/b")
        .fail("http://example.com/b", "reset")
        .ok("http://example.com/b", "arrived");
    let adapter = HttpAdapter::new(transport)
        .with_subscriber(Subscriber::retry(1, RetryStrategy::Constant(Duration::from_millis(1))));

    let response = adapter.get("http://example.com/a", Headers::new()).await.unwrap();

    assert_eq!(response.text(), "arrived");
    assert_eq!(response.redirect_count(), Some(1));
    assert_eq!(adapter.transport().hits("http://example.com/a"), 2);
    assert_eq!(adapter.transport().hits("http://example.com/b"), 2);
}

#[tokio::test]
async fn test_invalid_request_is_not_retried() {
    let transport = ScriptedTransport::new().ok("http://example.com/", "never");
    let adapter = HttpAdapter::new(transport)
        .with_subscriber(Subscriber::retry(5, RetryStrategy::Constant(Duration::from_millis(1))));

    let mut data = courier::FormData::new();
    data.insert("a".into(), "b".into());
    let request = InternalRequest::new("http://example.com/", Method::Post)
        .with_body("raw")
        .with_data(data);

    let err = adapter.send_internal_request(request).await.unwrap_err();

    assert!(matches!(err, CourierError::InvalidRequest(_)));
    assert_eq!(adapter.transport().hits("http://example.com/"), 0);
}

// ============================================================================
// Timeout
// ============================================================================

#[tokio::test]
async fn test_slow_transport_times_out() {
    let transport = ScriptedTransport::new().delayed("http://example.com/slow", Duration::from_millis(500), "late");
    let adapter = HttpAdapter::new(transport)
        .with_configuration(Configuration::default().with_timeout(Duration::from_millis(20)));

    let err = adapter.get("http://example.com/slow", Headers::new()).await.unwrap_err();

    match err {
        CourierError::Timeout { url, timeout } => {
            assert_eq!(url, "http://example.com/slow");
            assert!((timeout - 0.02).abs() < 1e-9);
        }
        other => panic!("unexpected error: {}", other),
    }
}
