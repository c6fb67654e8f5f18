//! Shared fixtures for app integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use koshflow_app::AppContext;
use koshflow_core::InMemoryTokenPersistence;
use koshflow_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use koshflow_domain::{Config, RetrySettings, StorageBackend};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const DEMO_EMAIL: &str = "demo@koshflow.com";
pub const DEMO_PASSWORD: &str = "demo123";

/// Config pointing at the mock server with fast retries.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    config.api.timeout_secs = 5;
    config.retry = RetrySettings { max_attempts: 3, base_delay_ms: 5, max_delay_ms: 20 };
    config.storage.backend = StorageBackend::Memory;
    config
}

/// Context plus a handle on its token persistence.
pub struct TestApp {
    pub ctx: AppContext,
    pub persistence: InMemoryTokenPersistence,
}

impl TestApp {
    pub fn new(server: &MockServer) -> Self {
        Self::with_persistence(server, InMemoryTokenPersistence::new())
    }

    /// Simulates a previous run that left `access`/`refresh` on disk.
    pub fn with_stored_session(server: &MockServer, access: &str, refresh: &str) -> Self {
        let persistence = InMemoryTokenPersistence::with_entries([
            (ACCESS_TOKEN_KEY, access),
            (REFRESH_TOKEN_KEY, refresh),
        ]);
        Self::with_persistence(server, persistence)
    }

    fn with_persistence(server: &MockServer, persistence: InMemoryTokenPersistence) -> Self {
        let ctx = AppContext::with_persistence(test_config(server), Arc::new(persistence.clone()))
            .expect("context should build");
        Self { ctx, persistence }
    }
}

pub fn auth_payload(access: &str, refresh: &str) -> Value {
    json!({
        "user": { "id": 1, "email": DEMO_EMAIL, "name": "Demo User" },
        "company": { "id": 1, "name": "Demo Traders" },
        "accessToken": access,
        "refreshToken": refresh,
    })
}

pub fn profile_payload() -> Value {
    json!({
        "user": { "id": 1, "email": DEMO_EMAIL, "name": "Demo User" },
        "company": { "id": 1, "name": "Demo Traders" },
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
