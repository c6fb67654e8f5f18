//! Concurrency behaviour of the refresh coordinator

mod support;

use std::time::Duration;

use futures::future::join_all;
use koshflow_core::{RefreshFailure, RefreshState};
use support::session::{Harness, SlowRotatingTransport};

/// N concurrent callers rejecting the same token share one upstream refresh
/// and all resume with the same new token.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_refresh() {
    let harness = Harness::logged_in(SlowRotatingTransport::new(Duration::from_millis(50))).await;

    let tasks = (0..16).map(|_| {
        let coordinator = harness.coordinator.clone();
        tokio::spawn(async move { coordinator.refresh(Some("access-0")).await })
    });
    let results = join_all(tasks).await;

    for result in results {
        assert_eq!(result.unwrap().unwrap(), "access-1");
    }
    assert_eq!(harness.transport.calls(), 1);
    assert_eq!(harness.coordinator.upstream_calls(), 1);
    assert!(matches!(harness.coordinator.state(), RefreshState::Idle));
}

/// A caller whose rejected token was already replaced does not refresh again.
#[tokio::test]
async fn late_arrival_reuses_settled_token() {
    let harness = Harness::logged_in(SlowRotatingTransport::new(Duration::from_millis(5))).await;

    harness.coordinator.refresh(Some("access-0")).await.unwrap();
    let late = harness.coordinator.refresh(Some("access-0")).await.unwrap();

    assert_eq!(late, "access-1");
    assert_eq!(harness.transport.calls(), 1);
}

/// Sequential refreshes use the rotated refresh token each time.
#[tokio::test]
async fn sequential_refreshes_rotate() {
    let harness = Harness::logged_in(SlowRotatingTransport::new(Duration::from_millis(1))).await;

    harness.coordinator.refresh(Some("access-0")).await.unwrap();
    let second = harness.coordinator.refresh(Some("access-1")).await.unwrap();

    assert_eq!(second, "access-2");
    assert_eq!(harness.transport.seen_refresh_tokens(), vec!["refresh-0", "refresh-1"]);
}

/// A failed refresh clears both tokens and notifies the observer exactly
/// once, however many callers were attached.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_tears_down_once() {
    let harness =
        Harness::logged_in(SlowRotatingTransport::failing(Duration::from_millis(30))).await;

    let tasks = (0..8).map(|_| {
        let coordinator = harness.coordinator.clone();
        tokio::spawn(async move { coordinator.refresh(Some("access-0")).await })
    });
    let results = join_all(tasks).await;

    for result in results {
        assert!(matches!(result.unwrap(), Err(RefreshFailure::Rejected { status: 401, .. })));
    }
    assert_eq!(harness.transport.calls(), 1);
    assert_eq!(harness.observer.reasons().len(), 1);
    assert_eq!(harness.store.access_token().await, None);
    assert_eq!(harness.store.refresh_token().await, None);
}

/// Dropping the caller that started a refresh leaves it resumable.
#[tokio::test]
async fn abandoned_refresh_is_driven_by_next_caller() {
    let harness = Harness::logged_in(SlowRotatingTransport::new(Duration::from_millis(50))).await;

    let started = tokio::time::timeout(
        Duration::from_millis(10),
        harness.coordinator.refresh(Some("access-0")),
    )
    .await;
    assert!(started.is_err(), "first caller should time out while refresh is pending");
    assert!(harness.coordinator.is_refreshing());

    let token = harness.coordinator.refresh(Some("access-0")).await.unwrap();

    assert_eq!(token, "access-1");
    assert_eq!(harness.transport.calls(), 1);
    assert!(!harness.coordinator.is_refreshing());
}
