//! Integration tests: workflow client against a local mock webhook server.
//!
//! Exercises the full execute path: attempt counting, retry-then-succeed,
//! non-retried failures, embedded error passthrough and the health probe.

use flowgate_core::client::WorkflowClient;
use flowgate_core::config::AppConfig;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointed at the mock server, with near-zero backoff so retry tests
/// stay fast.
fn test_config(base_url: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.workflow.webhook_url = base_url.to_string();
    cfg.workflow.api_key = "test-key".to_string();
    cfg.workflow.timeout_ms = 2_000;
    cfg.workflow.max_retries = 3;
    cfg.workflow.retry_delay_ms = 1;
    cfg
}

#[tokio::test]
async fn success_returns_parsed_body_and_sends_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({"message": "hi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "echo": "hi",
            "processed": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    let result = client.execute("echo", &json!({"message": "hi"})).await;

    let data = result.into_result().expect("should succeed");
    assert_eq!(data["echo"], "hi");
    assert_eq!(data["processed"], true);
}

#[tokio::test]
async fn transient_failures_are_retried_then_succeed_on_third_attempt() {
    let server = MockServer::start().await;
    // First two attempts are throttled, the third succeeds.
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "echo": "hi"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    let result = client.execute("echo", &json!({"message": "hi"})).await;

    assert!(result.is_success());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn network_failures_are_retried_then_succeed_when_upstream_returns() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Reserve an ephemeral port, then leave it closed so the first attempts
    // are refused at the connection level.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut cfg = test_config(&format!("http://{addr}"));
    cfg.workflow.max_retries = 3;
    cfg.workflow.retry_delay_ms = 200;
    let client = WorkflowClient::new(&cfg).unwrap();

    let call =
        tokio::spawn(async move { client.execute("echo", &json!({"message": "hi"})).await });

    // Attempts 1 and 2 run at ~0 ms and ~200 ms against the closed port.
    // Bring the upstream back before attempt 3 at ~600 ms (200 + 400 backoff).
    tokio::time::sleep(std::time::Duration::from_millis(350)).await;
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let served = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let body = r#"{"success":true,"echo":"hi"}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
    });

    let result = call.await.unwrap();
    served.await.unwrap();

    let data = result.into_result().expect("should succeed once upstream is back");
    assert_eq!(data["echo"], "hi");
}

#[tokio::test]
async fn rate_limit_failures_exhaust_retries_then_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut cfg = test_config(&server.uri());
    cfg.workflow.max_retries = 2;
    let client = WorkflowClient::new(&cfg).unwrap();
    let result = client.execute("echo", &json!({"message": "hi"})).await;

    let error = result.error().expect("should fail");
    assert_eq!(error.code, "RATE_LIMIT");
    // First attempt plus two retries.
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn validation_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {
                "code": "VALIDATION_ERROR",
                "message": "message is required",
                "details": {"field": "message"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    let result = client.execute("echo", &json!({})).await;

    let error = result.error().expect("should fail");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(error.message, "message is required");
    // Embedded error passed through untouched, not re-wrapped.
    assert_eq!(error.details, Some(json!({"field": "message"})));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_remote_code_is_classified_from_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": "E_FIELD", "message": "field `message` is required"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    let result = client.execute("echo", &json!({})).await;

    assert_eq!(result.error().unwrap().code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn http_5xx_is_a_workflow_error_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    let result = client.execute("echo", &json!({"message": "hi"})).await;

    let error = result.error().expect("should fail");
    assert_eq!(error.code, "WORKFLOW_ERROR");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn disabling_auto_retry_fails_on_first_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/echo"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = test_config(&server.uri());
    cfg.features.auto_retry = false;
    let client = WorkflowClient::new(&cfg).unwrap();
    let result = client.execute("echo", &json!({"message": "hi"})).await;

    assert_eq!(result.error().unwrap().code, "RATE_LIMIT");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn connection_failure_surfaces_as_network_error() {
    // Nothing is listening on this port; every attempt is refused.
    let mut cfg = test_config("http://127.0.0.1:9");
    cfg.workflow.max_retries = 1;
    let client = WorkflowClient::new(&cfg).unwrap();

    let result = client.execute("echo", &json!({"message": "hi"})).await;

    let error = result.error().expect("should fail");
    assert_eq!(error.code, "NETWORK_ERROR");
}

#[tokio::test]
async fn health_check_reports_reachability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = WorkflowClient::new(&test_config(&server.uri())).unwrap();
    assert!(client.health_check().await);

    let unreachable = WorkflowClient::new(&test_config("http://127.0.0.1:9")).unwrap();
    assert!(!unreachable.health_check().await);
}
