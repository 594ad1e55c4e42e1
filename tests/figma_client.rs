//! Integration tests for the Figma HTTP client.
//!
//! A local mock server stands in for `api.figma.com`, so these tests check
//! the exact requests sent and how every class of response is mapped.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use figma_mcp::figma::{
    normalize_result, AuthMode, FetchRequest, FigmaApi, FigmaClient, FigmaError,
};

const API_KEY: &str = "figd_test_key";

fn client(server: &MockServer, auth: AuthMode) -> FigmaClient {
    FigmaClient::with_options(auth, &format!("{}/v1", server.uri()), Duration::from_secs(5))
        .expect("client should build")
}

fn api_key() -> AuthMode {
    AuthMode::ApiKey(API_KEY.to_string())
}

fn file_body() -> serde_json::Value {
    json!({
        "name": "Marketing site",
        "lastModified": "2026-03-01T12:00:00Z",
        "thumbnailUrl": "https://example.com/thumb.png",
        "version": "123",
        "document": {
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [{
                "id": "0:1",
                "name": "Page 1",
                "type": "CANVAS",
                "backgroundColor": {"r": 1, "g": 1, "b": 1, "a": 1},
                "children": [{
                    "id": "1:2",
                    "name": "Desktop",
                    "type": "FRAME",
                    "absoluteBoundingBox": {"x": -100.0, "y": 250.0, "width": 1440.0, "height": 1024.0}
                }]
            }]
        }
    })
}

fn nodes_body(id: &str) -> serde_json::Value {
    json!({
        "name": "Marketing site",
        "lastModified": "2026-03-01T12:00:00Z",
        "nodes": {
            id: {
                "document": {
                    "id": id,
                    "name": "Card",
                    "type": "FRAME",
                    "absoluteBoundingBox": {"x": 10.0, "y": 20.0, "width": 300.0, "height": 200.0}
                },
                "components": {},
                "styles": {}
            }
        }
    })
}

// =============================================================================
// Successful Requests
// =============================================================================

#[tokio::test]
async fn test_fetch_file_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123"))
        .and(header("X-Figma-Token", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123"))
        .await
        .unwrap();

    assert_eq!(result.name.as_deref(), Some("Marketing site"));
    assert_eq!(result.nodes.len(), 1);
    assert_eq!(result.nodes[0].node_type, "DOCUMENT");

    let frame = &result.nodes[0].children[0].children[0];
    assert_eq!(frame.id, "1:2");
    assert!(frame.top.is_none(), "client must not normalise");

    let result = normalize_result(result);
    let frame = &result.nodes[0].children[0].children[0];
    assert_eq!(frame.top, Some(250.0));
    assert_eq!(frame.left, Some(-100.0));
}

#[tokio::test]
async fn test_fetch_node_with_oauth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123/nodes"))
        .and(query_param("ids", "4:17"))
        .and(query_param("depth", "2"))
        .and(header("Authorization", "Bearer oauth-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body("4:17")))
        .expect(1)
        .mount(&server)
        .await;

    let request = FetchRequest::file("FILE123").with_node("4-17").with_depth(2);
    let result = client(&server, AuthMode::OAuth("oauth-token".to_string()))
        .fetch(&request)
        .await
        .unwrap();

    assert_eq!(result.nodes.len(), 1);
    assert_eq!(result.nodes[0].id, "4:17");
    assert!(result.nodes[0].absolute_bounding_box.is_some());
}

#[tokio::test]
async fn test_file_depth_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123"))
        .and(query_param("depth", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body()))
        .expect(1)
        .mount(&server)
        .await;

    let request = FetchRequest::file("FILE123").with_depth(1);
    assert!(client(&server, api_key()).fetch(&request).await.is_ok());
}

// =============================================================================
// Error Mapping
// =============================================================================

#[tokio::test]
async fn test_null_node_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123/nodes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "x", "nodes": {"1:1": null}})),
        )
        .mount(&server)
        .await;

    let err = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123").with_node("1:1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FigmaError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_absent_node_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123/nodes"))
        .and(query_param("ids", "1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x", "nodes": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123").with_node("1-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FigmaError::NotFound { .. }), "{err:?}");
    assert!(err.to_string().contains("1:1"));
}

#[tokio::test]
async fn test_instance_node_id_round_trips() {
    let id = "I1:2;3:4";
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/files/FILE123/nodes"))
        .and(query_param("ids", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_body(id)))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123").with_node("I1-2;3-4"))
        .await
        .unwrap();
    assert_eq!(result.nodes[0].id, id);
}

#[tokio::test]
async fn test_status_codes_are_mapped() {
    let cases: [(u16, fn(&FigmaError) -> bool); 4] = [
        (401, |e| matches!(e, FigmaError::Auth { status: 401 })),
        (403, |e| matches!(e, FigmaError::Auth { status: 403 })),
        (404, |e| matches!(e, FigmaError::NotFound { .. })),
        (500, |e| matches!(e, FigmaError::Api { status: 500, .. })),
    ];

    for (status, check) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"status": status, "err": "nope"})),
            )
            .mount(&server)
            .await;

        let err = client(&server, api_key())
            .fetch(&FetchRequest::file("FILE123"))
            .await
            .unwrap_err();
        assert!(check(&err), "HTTP {status} mapped to {err:?}");
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "42"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FigmaError::RateLimited {
            retry_after: Some(42)
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123"))
        .await
        .unwrap_err();
    assert!(matches!(err, FigmaError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(file_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = FigmaClient::with_options(
        api_key(),
        &format!("{}/v1", server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = client
        .fetch(&FetchRequest::file("FILE123"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, FigmaError::Transport { timeout: true, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_errors_do_not_leak_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client(&server, api_key())
        .fetch(&FetchRequest::file("FILE123"))
        .await
        .unwrap_err();
    assert!(!err.to_string().contains(API_KEY));
    assert!(!format!("{err:?}").contains(API_KEY));
}
