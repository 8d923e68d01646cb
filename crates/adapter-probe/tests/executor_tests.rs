//! Probe execution against a simulated backend.

use adapter_core::ServerId;
use adapter_probe::{AdHocRequest, FormField, RequestBody, RequestExecutor, ToggleEntry};
use adapter_registry::{BackendRegistry, BackendServer, MemoryStore};
use std::sync::Arc;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn registry_with(base_url: &str) -> (Arc<BackendRegistry>, ServerId) {
    let registry = Arc::new(BackendRegistry::new(Arc::new(MemoryStore::new())));
    let server = BackendServer::new("probe-target", base_url);
    let id = server.id.clone();
    registry.add(server).await.expect("add");
    (registry, id)
}

#[tokio::test]
async fn successful_probe_captures_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-served-by", "mock")
                .set_body_string(r#"{"version":"0.5.1"}"#),
        )
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let response = executor
        .execute(&AdHocRequest::new("GET", id, "/api/version"))
        .await;

    assert_eq!(response.status_code, Some(200));
    assert_eq!(response.status_text.as_deref(), Some("OK"));
    assert_eq!(response.body, r#"{"version":"0.5.1"}"#);
    assert!(response.error.is_none());
    assert!(response
        .headers
        .iter()
        .any(|h| h.key == "x-served-by" && h.value == "mock"));
}

#[tokio::test]
async fn disabled_headers_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .and(header("x-keep", "yes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("GET", id, "/api/tags");
    request.headers = vec![
        ToggleEntry::new("x-keep", "yes"),
        ToggleEntry::disabled("x-drop", "no"),
    ];

    let response = executor.execute(&request).await;
    assert_eq!(response.status_code, Some(200));

    let received = &server.received_requests().await.expect("requests")[0];
    assert!(received.headers.get("x-drop").is_none());
}

#[tokio::test]
async fn disabled_query_params_are_omitted_from_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("GET", id, "/api/tags");
    request.query_params = vec![
        ToggleEntry::new("format", "json"),
        ToggleEntry::disabled("verbose", "true"),
    ];

    let response = executor.execute(&request).await;
    assert_eq!(response.status_code, Some(200));

    let received: &Request = &server.received_requests().await.expect("requests")[0];
    assert!(!received.url.as_str().contains("verbose"));

    // The disabled entry stays in the request state for re-enabling.
    assert_eq!(request.query_params[1].value, "true");
    assert!(!request.query_params[1].enabled);
}

#[tokio::test]
async fn raw_body_sets_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/show"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"model":"llama3"}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("POST", id, "/api/show");
    request.body = RequestBody::Raw {
        content: r#"{"model":"llama3"}"#.to_string(),
        content_type: "application/json".to_string(),
    };

    let response = executor.execute(&request).await;
    assert_eq!(response.status_code, Some(200));
}

#[tokio::test]
async fn enabled_content_type_header_replaces_the_body_implied_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("POST", id, "/api/generate");
    request.body = RequestBody::Raw {
        content: "prompt: hi".to_string(),
        content_type: "application/json".to_string(),
    };
    request.headers = vec![ToggleEntry::new("content-type", "text/plain")];

    let response = executor.execute(&request).await;
    assert_eq!(response.status_code, Some(200));

    let received: &Request = &server.received_requests().await.expect("requests")[0];
    let values: Vec<_> = received
        .headers
        .get_all("content-type")
        .iter()
        .map(|v| v.to_str().expect("ascii header"))
        .collect();
    assert_eq!(values, vec!["text/plain"]);
}

#[tokio::test]
async fn invalid_header_name_is_reported_in_the_error_field() {
    let (registry, id) = registry_with("http://127.0.0.1:11434").await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("GET", id, "/api/tags");
    request.headers = vec![ToggleEntry::new("not a header", "x")];

    let response = executor.execute(&request).await;
    assert!(response.status_code.is_none());
    assert!(response
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("invalid header name"));
}

#[tokio::test]
async fn form_body_is_urlencoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("model=llama3&keep_alive=5m"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let mut request = AdHocRequest::new("POST", id, "/submit");
    request.body = RequestBody::Form {
        fields: vec![
            FormField {
                key: "model".to_string(),
                value: "llama3".to_string(),
            },
            FormField {
                key: "keep_alive".to_string(),
                value: "5m".to_string(),
            },
        ],
    };

    let response = executor.execute(&request).await;
    assert_eq!(response.status_code, Some(200));
}

#[tokio::test]
async fn http_error_status_is_an_ordinary_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/unknown"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let (registry, id) = registry_with(&server.uri()).await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let response = executor
        .execute(&AdHocRequest::new("GET", id, "/api/unknown"))
        .await;

    assert_eq!(response.status_code, Some(404));
    assert_eq!(response.body, "not found");
    assert!(response.error.is_none());
}

#[tokio::test]
async fn transport_failure_populates_error_only() {
    // Nothing listens on this port.
    let (registry, id) = registry_with("http://127.0.0.1:9").await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let response = executor
        .execute(&AdHocRequest::new("GET", id, "/api/tags"))
        .await;

    assert!(response.status_code.is_none());
    assert!(response.error.is_some());
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn unknown_target_is_reported_in_the_error_field() {
    let registry = Arc::new(BackendRegistry::new(Arc::new(MemoryStore::new())));
    let executor = RequestExecutor::new(registry).expect("executor");

    let response = executor
        .execute(&AdHocRequest::new(
            "GET",
            ServerId::new("ghost"),
            "/api/tags",
        ))
        .await;

    assert!(response.status_code.is_none());
    assert!(response.error.as_deref().unwrap_or_default().contains("ghost"));
}

#[tokio::test]
async fn invalid_method_is_reported_in_the_error_field() {
    let (registry, id) = registry_with("http://127.0.0.1:11434").await;
    let executor = RequestExecutor::new(registry).expect("executor");

    let response = executor
        .execute(&AdHocRequest::new("NOT A METHOD", id, "/api/tags"))
        .await;

    assert!(response.status_code.is_none());
    assert!(response
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("invalid HTTP method"));
}
