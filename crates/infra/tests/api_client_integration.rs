//! Request dispatch and error classification against a mock server.

mod support;

use std::time::Duration;

use koshflow_domain::{FieldError, RetrySettings};
use koshflow_infra::{
    fetch_report, ApiClient, ApiError, ApiErrorCategory, ApiRetry, ReportKind, RequestOptions,
    Resource, ResourceApi,
};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use support::{bearer, TestClient};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn error_for(status: u16, body: Value) -> ApiError {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/42"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    fixture.client.get::<Value>("/invoices/42").await.unwrap_err()
}

#[tokio::test]
async fn classifies_error_statuses() {
    let cases = [
        (400, ApiErrorCategory::Validation, false),
        (403, ApiErrorCategory::Authorization, false),
        (404, ApiErrorCategory::NotFound, false),
        (409, ApiErrorCategory::Conflict, false),
        (418, ApiErrorCategory::Client, false),
        (429, ApiErrorCategory::RateLimit, true),
        (500, ApiErrorCategory::Server, true),
        (503, ApiErrorCategory::Server, true),
    ];

    for (status, category, retryable) in cases {
        let err = error_for(status, json!({ "error": "nope" })).await;
        assert_eq!(err.status(), Some(status), "{status}");
        assert_eq!(err.category(), category, "{status}");
        assert_eq!(err.should_retry(), retryable, "{status}");
        assert_eq!(err.message(), "nope");
    }
}

#[tokio::test]
async fn validation_error_carries_field_details() {
    let err = error_for(
        422,
        json!({
            "error": {
                "message": "Validation failed",
                "code": "VALIDATION_ERROR",
                "details": [{ "field": "email", "message": "invalid" }]
            }
        }),
    )
    .await;

    assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.code(), Some("VALIDATION_ERROR"));
    assert_eq!(err.message(), "Validation failed");
    assert_eq!(err.details(), [FieldError::new("email", "invalid")]);
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/42"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let err = fixture.client.get::<Value>("/invoices/42").await.unwrap_err();

    assert_eq!(err.message(), "Request failed: 502 Bad Gateway");
    assert!(err.details().is_empty());
}

#[tokio::test]
async fn truncated_error_body_falls_back_to_status_line() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 500 Internal Server Error\r\n\
                    content-type: application/json\r\n\
                    content-length: 64\r\n\r\n";
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(br#"{"error": "Ledger unavail"#).await;
        let _ = socket.shutdown().await;
    });

    let client = ApiClient::builder()
        .base_url(format!("http://{addr}/api"))
        .timeout(Duration::from_secs(2))
        .build()
        .expect("client");

    let err = client.get::<Value>("/ledgers").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "Request failed: 500 Internal Server Error");
}

#[tokio::test]
async fn rate_limit_exposes_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/aging"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({ "error": "Slow down" })),
        )
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let err = fixture.client.get::<Value>("/reports/aging").await.unwrap_err();

    match err {
        ApiError::RateLimited(failure) => {
            assert_eq!(failure.retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[tokio::test]
async fn sends_json_headers_bearer_query_and_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/invoices"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", bearer("access-1").as_str()))
        .and(header("x-request-id", "abc-123"))
        .and(query_param("draft", "true"))
        .and(body_json(json!({ "customerId": 7, "items": [] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::logged_in(&server, "access-1", "r1").await;
    let options = RequestOptions::new()
        .body(json!({ "customerId": 7, "items": [] }))
        .header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("abc-123"))
        .query("draft", "true");

    let body = fixture
        .client
        .request(Method::POST, "/invoices", options)
        .await
        .expect("request should succeed");

    assert_eq!(body, json!({ "id": 99 }));
}

#[tokio::test]
async fn caller_header_overrides_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/products/3"))
        .and(header("content-type", "application/merge-patch+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let options = RequestOptions::new().body(json!({ "price": 10 })).header(
        reqwest::header::CONTENT_TYPE,
        HeaderValue::from_static("application/merge-patch+json"),
    );

    fixture
        .client
        .request(Method::PATCH, "/products/3", options)
        .await
        .expect("request should succeed");
}

#[tokio::test]
async fn empty_success_bodies_decode_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/contacts/5"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/contacts/5/archive"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let deleted: Value = fixture.client.delete("/contacts/5").await.expect("delete");
    let archived: Value =
        fixture.client.post("/contacts/5/archive", &json!({})).await.expect("archive");

    assert_eq!(deleted, Value::Null);
    assert_eq!(archived, Value::Null);
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let err = fixture.client.get::<Value>("/accounts").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    assert!(!err.should_retry());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/balance-sheet"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .timeout(Duration::from_millis(200))
        .build()
        .expect("client");

    let err = client.get::<Value>("/reports/balance-sheet").await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout(_)), "got {err:?}");
    assert_eq!(err.category(), ApiErrorCategory::Network);
    assert!(err.should_retry());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = ApiClient::builder()
        .base_url("http://127.0.0.1:9/api")
        .timeout(Duration::from_secs(2))
        .build()
        .expect("client");

    let err = client.get::<Value>("/contacts").await.unwrap_err();

    assert_eq!(err.category(), ApiErrorCategory::Network);
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn retry_recovers_from_transient_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "sku": "A1" }])))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let retry = ApiRetry::from_settings(&RetrySettings {
        max_attempts: 3,
        base_delay_ms: 5,
        max_delay_ms: 20,
    })
    .expect("valid settings");

    let client = &fixture.client;
    let body: Value = retry.run(|| client.get("/products")).await.expect("third attempt succeeds");

    assert_eq!(body, json!([{ "sku": "A1" }]));
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
}

#[tokio::test]
async fn retry_does_not_repeat_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Product not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let retry = ApiRetry::from_settings(&RetrySettings::default()).expect("valid settings");

    let client = &fixture.client;
    let err = retry.run(|| client.get::<Value>("/products/404")).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn retry_caps_long_retry_after_at_max_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "3600")
                .set_body_json(json!({ "error": "Too many requests" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let retry = ApiRetry::from_settings(&RetrySettings {
        max_attempts: 2,
        base_delay_ms: 1,
        max_delay_ms: 4,
    })
    .expect("valid settings");

    let client = &fixture.client;
    let err = tokio::time::timeout(
        Duration::from_secs(2),
        retry.run(|| client.get::<Value>("/products")),
    )
    .await
    .expect("backoff ceiling bounds the wait")
    .unwrap_err();

    assert!(matches!(err, ApiError::RateLimited(_)), "got {err:?}");
}

#[tokio::test]
async fn resource_and_report_helpers_hit_expected_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .and(query_param("type", "customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/contacts/1"))
        .and(body_json(json!({ "name": "Acme" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Acme" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/profit-loss"))
        .and(query_param("from", "2024-04-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "net": 1200 })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let contacts = ResourceApi::new(&fixture.client, Resource::Contacts);

    let listed = contacts.list(&[("type".into(), "customer".into())]).await.expect("list");
    let updated = contacts.update("1", json!({ "name": "Acme" })).await.expect("update");
    let range = [("from".to_string(), "2024-04-01".to_string())];
    let report =
        fetch_report(&fixture.client, ReportKind::ProfitLoss, &range).await.expect("report");

    assert_eq!(listed, json!([{ "id": 1 }]));
    assert_eq!(updated["name"], "Acme");
    assert_eq!(report["net"], 1200);
}
