//! End-to-end refresh behaviour of the API client against a mock server.

mod support;

use std::time::Duration;

use futures::future::join_all;
use koshflow_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use koshflow_infra::ApiError;
use serde_json::{json, Value};
use support::{bearer, token_payload, TestClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" }))
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .and(header("authorization", bearer("stale").as_str()))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/invoices"))
        .and(header("authorization", bearer("fresh").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_payload("fresh", "r2"))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::logged_in(&server, "stale", "r1").await;
    let requests = (0..8).map(|_| fixture.client.get::<Value>("/invoices"));
    let results = join_all(requests).await;

    for result in results {
        assert_eq!(result.expect("request should succeed after refresh"), json!({ "data": [] }));
    }
    assert_eq!(fixture.client.tokens().access_token().await.as_deref(), Some("fresh"));
    assert_eq!(fixture.client.tokens().refresh_token().await.as_deref(), Some("r2"));

    let stored = fixture.persistence.snapshot();
    assert_eq!(stored.get(ACCESS_TOKEN_KEY).map(String::as_str), Some("fresh"));
    assert_eq!(stored.get(REFRESH_TOKEN_KEY).map(String::as_str), Some("r2"));
    assert_eq!(fixture.observer.calls(), 0);
    assert!(!fixture.client.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn second_unauthorized_after_refresh_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/dashboard"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_payload("fresh", "r2")))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::logged_in(&server, "stale", "r1").await;
    let err = fixture.client.get::<Value>("/reports/dashboard").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)), "got {err:?}");
    assert_eq!(err.status(), Some(401));
    // The refreshed pair is kept; only a failed refresh ends the session.
    assert_eq!(fixture.client.tokens().access_token().await.as_deref(), Some("fresh"));
    assert_eq!(fixture.observer.calls(), 0);
}

#[tokio::test]
async fn rejected_refresh_clears_session_and_notifies_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "Invalid refresh token" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::logged_in(&server, "stale", "r1").await;
    let requests = (0..4).map(|_| fixture.client.get::<Value>("/contacts"));
    let results = join_all(requests).await;

    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired(_)), "got {err:?}");
        assert!(err.to_string().contains("Invalid refresh token"));
    }
    assert_eq!(fixture.client.tokens().access_token().await, None);
    assert_eq!(fixture.client.tokens().refresh_token().await, None);
    assert!(fixture.persistence.snapshot().is_empty());
    assert_eq!(fixture.observer.calls(), 1);
}

#[tokio::test]
async fn unauthorized_without_refresh_token_skips_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_payload("fresh", "r2")))
        .expect(0)
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    fixture.client.tokens().set_access_token(Some("orphan".into())).await.expect("store token");

    let err = fixture.client.get::<Value>("/products").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)), "got {err:?}");
    assert_eq!(err.message(), "Token expired");
    assert_eq!(fixture.observer.calls(), 0);
}

#[tokio::test]
async fn unauthenticated_request_sends_no_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/taxes"))
        .and(header("authorization", bearer("anything").as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/taxes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "rate": 18 }])))
        .mount(&server)
        .await;

    let fixture = TestClient::new(&server);
    let body: Value = fixture.client.get("/taxes").await.expect("request should succeed");

    assert_eq!(body, json!([{ "rate": 18 }]));
    let received = server.received_requests().await.expect("recording enabled");
    assert!(received.iter().all(|r| !r.headers.contains_key("authorization")));
}

#[tokio::test]
async fn unreadable_refresh_response_expires_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = TestClient::logged_in(&server, "stale", "r1").await;
    let err = fixture.client.get::<Value>("/accounts").await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired(_)), "got {err:?}");
    assert!(!fixture.client.tokens().has_refresh_token().await);
    assert_eq!(fixture.observer.calls(), 1);
    assert!(fixture.observer.reasons()[0].contains("could not be decoded"));
}
