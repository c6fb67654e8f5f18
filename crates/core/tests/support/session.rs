//! Doubles for the session ports

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use koshflow_core::{
    InMemoryTokenPersistence, RefreshCoordinator, RefreshFailure, RefreshTransport,
    SessionError, SessionObserver, TokenPersistence, TokenStore,
};
use koshflow_domain::TokenPair;

/// Transport that rotates tokens after a delay and counts upstream calls.
pub struct SlowRotatingTransport {
    calls: AtomicUsize,
    delay: Duration,
    fail: AtomicBool,
    seen_refresh_tokens: Mutex<Vec<String>>,
}

impl SlowRotatingTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            fail: AtomicBool::new(false),
            seen_refresh_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(delay: Duration) -> Self {
        let transport = Self::new(delay);
        transport.fail.store(true, Ordering::SeqCst);
        transport
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen_refresh_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshTransport for SlowRotatingTransport {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshFailure> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_refresh_tokens.lock().unwrap().push(refresh_token.to_string());
        tokio::time::sleep(self.delay).await;

        if self.fail.load(Ordering::SeqCst) {
            return Err(RefreshFailure::Rejected {
                status: 401,
                message: "Invalid refresh token".into(),
            });
        }
        Ok(TokenPair::new(format!("access-{n}"), format!("refresh-{n}")))
    }
}

/// Observer recording every expiry notification.
#[derive(Default)]
pub struct RecordingObserver {
    reasons: Mutex<Vec<RefreshFailure>>,
}

impl RecordingObserver {
    pub fn reasons(&self) -> Vec<RefreshFailure> {
        self.reasons.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_expired(&self, reason: &RefreshFailure) {
        self.reasons.lock().unwrap().push(reason.clone());
    }
}

/// Persistence counting writes and optionally failing them.
#[derive(Default)]
pub struct CountingPersistence {
    inner: InMemoryTokenPersistence,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingPersistence {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contents(&self) -> std::collections::HashMap<String, String> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl TokenPersistence for CountingPersistence {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SessionError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::Storage("disk full".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}

/// A logged-in session wired to the given transport.
pub struct Harness {
    pub store: Arc<TokenStore>,
    pub coordinator: RefreshCoordinator,
    pub transport: Arc<SlowRotatingTransport>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub async fn logged_in(transport: SlowRotatingTransport) -> Self {
        let store = Arc::new(TokenStore::new(Arc::new(InMemoryTokenPersistence::new())));
        store.set_pair(TokenPair::new("access-0", "refresh-0")).await.unwrap();

        let transport = Arc::new(transport);
        let observer = Arc::new(RecordingObserver::default());
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&transport) as Arc<dyn RefreshTransport>,
            Arc::clone(&observer) as Arc<dyn SessionObserver>,
        );

        Self { store, coordinator, transport, observer }
    }
}
