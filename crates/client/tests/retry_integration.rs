//! Integration tests for the async client's retry behaviour.
//!
//! Exercises the reqwest transport end to end against a mock server:
//! retryable statuses, terminal statuses, method gating, exhaustion, and
//! connection-level failures.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hermod_client::{Client, ClientError, Req, RetryPolicy, StatusCode};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hermod_client=debug")
        .try_init();
}

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed(max_attempts, Duration::from_millis(5)).unwrap()
}

fn client() -> Client {
    Client::builder().timeout(Duration::from_secs(10)).build().expect("client")
}

/// Responds with `failures` retryable statuses before succeeding.
fn flaky_responder(failures: usize) -> impl Fn(&wiremock::Request) -> ResponseTemplate {
    let seen = Arc::new(AtomicUsize::new(0));
    move |_req: &wiremock::Request| {
        let current = seen.fetch_add(1, Ordering::SeqCst);
        if current < failures {
            ResponseTemplate::new(503)
        } else {
            ResponseTemplate::new(200).set_body_string("recovered")
        }
    }
}

#[tokio::test]
async fn success_needs_no_retry() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client()
        .execute_with_policy(Req::get(&server.uri()).unwrap(), &quick_policy(3))
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::OK);
    assert_eq!(reply.text(), "ok");
}

#[tokio::test]
async fn retryable_statuses_are_retried_until_success() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(flaky_responder(2))
        .expect(3)
        .mount(&server)
        .await;

    let reply = client()
        .execute_with_policy(Req::get(&server.uri()).unwrap(), &quick_policy(5))
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::OK);
    assert_eq!(reply.text(), "recovered");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn terminal_statuses_are_not_retried() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client()
        .execute_with_policy(Req::get(&server.uri()).unwrap(), &quick_policy(5))
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::NOT_FOUND);
}

/// POST is not retry-eligible without the policy opt-in, even on 503.
#[tokio::test]
async fn post_executes_once_without_opt_in() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let req = Req::post(&server.uri()).unwrap().body_text("{}");
    let reply = client()
        .execute_with_policy(req, &quick_policy(5))
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn post_retries_with_opt_in() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(flaky_responder(1))
        .expect(2)
        .mount(&server)
        .await;

    let req = Req::post(&server.uri()).unwrap().body_text("{}");
    let reply = client()
        .execute_with_policy(req, &quick_policy(5).allow_post())
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::OK);
}

/// Exhausting attempts on a retryable status yields the final response.
#[tokio::test]
async fn exhaustion_returns_the_final_response() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let reply = client()
        .execute_with_policy(Req::get(&server.uri()).unwrap(), &quick_policy(3))
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::SERVICE_UNAVAILABLE);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn connection_refused_retries_then_errors() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so requests fail with ECONNREFUSED
    let url = format!("http://{addr}/");

    let err = client()
        .execute_with_policy(Req::get(&url).unwrap(), &quick_policy(2))
        .await
        .expect_err("must fail");

    match err {
        ClientError::Transport { method, url: failed, .. } => {
            assert_eq!(method, hermod_client::Method::GET);
            assert_eq!(failed.as_str(), url);
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn json_replies_decode() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "hermod"})),
        )
        .mount(&server)
        .await;

    #[derive(serde::Deserialize)]
    struct Payload {
        name: String,
    }

    let reply = client().execute(Req::get(&server.uri()).unwrap()).await.expect("reply");
    let payload: Payload = reply.json().expect("json");

    assert_eq!(payload.name, "hermod");
}

/// A streaming body executes through the one-shot path and reaches the
/// server intact.
#[tokio::test]
async fn streaming_body_executes_once() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    // Even with POST opted in and a generous policy, the single-use body
    // pins this to one attempt.
    let req = Req::post(&server.uri()).unwrap().body_stream("streamed payload");
    let reply = client()
        .execute_with_policy(req, &quick_policy(5).allow_post())
        .await
        .expect("reply");

    assert_eq!(reply.status(), StatusCode::SERVICE_UNAVAILABLE);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, b"streamed payload");
}
