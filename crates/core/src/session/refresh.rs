//! Single-flight token refresh
//!
//! Any number of callers that see an unauthorized response while a refresh is
//! pending attach to the same shared future, so the refresh endpoint is hit
//! once per fan-in. The pending future lives in the coordinator state: if the
//! caller that started it is dropped, the next attached caller drives it to
//! completion.
//!
//! The state mutex is a `parking_lot` lock and is never held across an
//! `.await`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::RefreshFailure;
use super::ports::{RefreshTransport, SessionObserver};
use super::token_store::TokenStore;

type PendingRefresh = Shared<BoxFuture<'static, Result<String, RefreshFailure>>>;

/// Coordinator state
#[derive(Clone)]
pub enum RefreshState {
    Idle,
    Refreshing { generation: u64, pending: PendingRefresh },
}

impl fmt::Debug for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Refreshing { generation, .. } => {
                f.debug_struct("Refreshing").field("generation", generation).finish()
            }
        }
    }
}

struct Slot {
    state: RefreshState,
    /// Number of refreshes that have settled
    settled: u64,
}

struct Inner {
    store: Arc<TokenStore>,
    transport: Arc<dyn RefreshTransport>,
    observer: Arc<dyn SessionObserver>,
    slot: Mutex<Slot>,
    next_generation: AtomicU64,
    upstream_calls: AtomicU64,
}

/// Serializes refreshes for one [`TokenStore`].
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<TokenStore>,
        transport: Arc<dyn RefreshTransport>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                observer,
                slot: Mutex::new(Slot { state: RefreshState::Idle, settled: 0 }),
                next_generation: AtomicU64::new(1),
                upstream_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> RefreshState {
        self.inner.slot.lock().state.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.inner.slot.lock().state, RefreshState::Refreshing { .. })
    }

    /// Refresh calls issued to the transport so far
    pub fn upstream_calls(&self) -> u64 {
        self.inner.upstream_calls.load(Ordering::SeqCst)
    }

    /// Obtain an access token that supersedes `rejected`.
    ///
    /// `rejected` is the token the unauthorized request carried. If the store
    /// already holds a different token, a refresh settled in between and that
    /// token is returned without another upstream call. Otherwise the caller
    /// joins the in-flight refresh, starting one when idle.
    ///
    /// On failure the store has been cleared and the observer notified.
    #[instrument(skip_all)]
    pub async fn refresh(&self, rejected: Option<&str>) -> Result<String, RefreshFailure> {
        loop {
            let seen = self.inner.slot.lock().settled;

            if let Some(current) = self.inner.store.access_token().await {
                if rejected.is_some_and(|token| token != current) {
                    debug!("Access token already superseded; skipping refresh");
                    return Ok(current);
                }
            }

            let pending = {
                let mut slot = self.inner.slot.lock();
                if let RefreshState::Refreshing { generation, pending } = &slot.state {
                    debug!(generation, "Attaching to in-flight refresh");
                    pending.clone()
                } else if slot.settled != seen {
                    // A refresh settled while the store was being read.
                    continue;
                } else {
                    let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
                    debug!(generation, "Starting refresh");
                    let pending = Inner::start(Arc::clone(&self.inner), generation);
                    slot.state = RefreshState::Refreshing { generation, pending: pending.clone() };
                    pending
                }
            };

            return pending.await;
        }
    }
}

impl Inner {
    fn start(inner: Arc<Self>, generation: u64) -> PendingRefresh {
        async move {
            let result = inner.run().await;
            inner.settle(generation);
            result
        }
        .boxed()
        .shared()
    }

    async fn run(&self) -> Result<String, RefreshFailure> {
        let Some(refresh_token) = self.store.refresh_token().await else {
            debug!("Refresh token vanished before refresh started");
            return Err(RefreshFailure::MissingRefreshToken);
        };

        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        let pair = match self.transport.refresh(&refresh_token).await {
            Ok(pair) => pair,
            Err(failure) => {
                self.teardown(&failure).await;
                return Err(failure);
            }
        };

        let access_token = pair.access_token.clone();
        if let Err(err) = self.store.set_pair(pair).await {
            let failure = RefreshFailure::Storage(err.to_string());
            self.teardown(&failure).await;
            return Err(failure);
        }

        info!("Access token refreshed");
        Ok(access_token)
    }

    async fn teardown(&self, failure: &RefreshFailure) {
        warn!(error = %failure, "Refresh failed; clearing session");
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "Failed to clear persisted tokens");
        }
        self.observer.session_expired(failure);
    }

    fn settle(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if matches!(
            slot.state,
            RefreshState::Refreshing { generation: current, .. } if current == generation
        ) {
            slot.state = RefreshState::Idle;
        }
        slot.settled += 1;
    }
}
