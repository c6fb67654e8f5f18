//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use koshflow_core::{InMemoryTokenPersistence, RefreshFailure, SessionObserver};
use koshflow_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use koshflow_infra::{ApiClient, AuthService};
use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const DEMO_EMAIL: &str = "demo@koshflow.com";
pub const DEMO_PASSWORD: &str = "demo123";

/// Observer that records every session-expired notification.
#[derive(Default)]
pub struct RecordingObserver {
    calls: AtomicUsize,
    reasons: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_expired(&self, reason: &RefreshFailure) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reasons.lock().push(reason.to_string());
    }
}

/// Client wired to a mock server with in-memory persistence.
pub struct TestClient {
    pub client: Arc<ApiClient>,
    pub persistence: InMemoryTokenPersistence,
    pub observer: Arc<RecordingObserver>,
}

impl TestClient {
    pub fn new(server: &MockServer) -> Self {
        Self::with_persistence(server, InMemoryTokenPersistence::new())
    }

    /// Client whose persistence already holds `access`/`refresh`.
    pub fn with_stored_session(server: &MockServer, access: &str, refresh: &str) -> Self {
        let persistence = InMemoryTokenPersistence::with_entries([
            (ACCESS_TOKEN_KEY, access),
            (REFRESH_TOKEN_KEY, refresh),
        ]);
        Self::with_persistence(server, persistence)
    }

    fn with_persistence(server: &MockServer, persistence: InMemoryTokenPersistence) -> Self {
        let observer = Arc::new(RecordingObserver::default());
        let client = ApiClient::builder()
            .base_url(format!("{}/api", server.uri()))
            .timeout(Duration::from_secs(5))
            .persistence(Arc::new(persistence.clone()))
            .observer(observer.clone())
            .build()
            .expect("client should build");

        Self { client: Arc::new(client), persistence, observer }
    }

    /// Client with `access`/`refresh` already loaded into memory.
    pub async fn logged_in(server: &MockServer, access: &str, refresh: &str) -> Self {
        let fixture = Self::with_stored_session(server, access, refresh);
        assert!(fixture.client.tokens().initialize().await.expect("initialize"));
        fixture
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(Arc::clone(&self.client))
    }
}

pub fn auth_payload(access: &str, refresh: &str) -> Value {
    json!({
        "user": { "id": 1, "email": DEMO_EMAIL, "name": "Demo User", "role": "admin" },
        "company": { "id": "c-1", "name": "Demo Traders", "gstin": "27AAPFU0939F1ZV" },
        "accessToken": access,
        "refreshToken": refresh,
    })
}

pub fn token_payload(access: &str, refresh: &str) -> Value {
    json!({ "accessToken": access, "refreshToken": refresh })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
