//! Integration tests for Store action broadcasting
//!
//! Hosts re-render whenever the store reduces an action, and tests use
//! `send_and_wait_for` to block until a feed result has been applied.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use seat_picker_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use seat_picker_runtime::{Store, StoreError};
use std::collections::BTreeSet;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum FeedAction {
    /// Ask the (fake) feed for a snapshot
    Poll { snapshot: Vec<u32> },
    /// Feed answered
    Delivered { unavailable: Vec<u32> },
    /// Feed answered with nothing usable
    Failed,
    /// Host gesture with no effects
    Touch,
}

#[derive(Debug, Clone, Default)]
struct FeedState {
    unavailable: BTreeSet<u32>,
    deliveries: u32,
}

#[derive(Clone)]
struct FeedEnvironment;

#[derive(Clone)]
struct FeedReducer;

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::Poll { snapshot } => smallvec![Effect::Future(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if snapshot.is_empty() {
                    Some(FeedAction::Failed)
                } else {
                    Some(FeedAction::Delivered { unavailable: snapshot })
                }
            }))],
            FeedAction::Delivered { unavailable } => {
                state.unavailable = unavailable.into_iter().collect();
                state.deliveries += 1;
                smallvec![Effect::None]
            },
            FeedAction::Failed | FeedAction::Touch => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<FeedState, FeedAction, FeedEnvironment, FeedReducer> {
    Store::new(FeedState::default(), FeedReducer, FeedEnvironment)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn send_and_wait_for_returns_feed_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            FeedAction::Poll { snapshot: vec![4, 2] },
            |a| matches!(a, FeedAction::Delivered { .. } | FeedAction::Failed),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, FeedAction::Delivered { unavailable: vec![4, 2] });

    // The result was reduced before it was broadcast
    let unavailable = store.state(|s| s.unavailable.clone()).await;
    assert_eq!(unavailable, BTreeSet::from([2, 4]));
}

#[tokio::test]
async fn send_and_wait_for_surfaces_failures() {
    let store = store();

    let result = store
        .send_and_wait_for(
            FeedAction::Poll { snapshot: vec![] },
            |a| matches!(a, FeedAction::Delivered { .. } | FeedAction::Failed),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, FeedAction::Failed);
    assert_eq!(store.state(|s| s.deliveries).await, 0);
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = store();

    let result = store
        .send_and_wait_for(
            FeedAction::Touch,
            |a| matches!(a, FeedAction::Delivered { .. }),
            Duration::from_millis(20),
        )
        .await;

    assert_eq!(result, Err(StoreError::Timeout));
}

#[tokio::test]
async fn subscribers_see_every_reduced_action_in_order() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let _ = store.send(FeedAction::Touch).await.unwrap();
    let mut handle = store.send(FeedAction::Poll { snapshot: vec![7] }).await.unwrap();
    handle.wait().await;

    assert_eq!(rx.recv().await.unwrap(), FeedAction::Touch);
    assert_eq!(rx.recv().await.unwrap(), FeedAction::Poll { snapshot: vec![7] });
    assert_eq!(rx.recv().await.unwrap(), FeedAction::Delivered { unavailable: vec![7] });
}

#[tokio::test]
async fn multiple_subscribers_receive_same_actions() {
    let store = store();
    let mut first = store.subscribe_actions();
    let mut second = store.subscribe_actions();

    let _ = store.send(FeedAction::Touch).await.unwrap();

    assert_eq!(first.recv().await.unwrap(), FeedAction::Touch);
    assert_eq!(second.recv().await.unwrap(), FeedAction::Touch);
}

#[tokio::test]
async fn concurrent_deliveries_are_serialised() {
    let store = store();

    let handles: Vec<_> = (1..=10)
        .map(|seat| {
            let store = store.clone();
            tokio::spawn(async move {
                let _ = store.send(FeedAction::Delivered { unavailable: vec![seat] }).await;
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let (deliveries, unavailable) = store.state(|s| (s.deliveries, s.unavailable.len())).await;
    assert_eq!(deliveries, 10);
    // Each delivery replaced the whole set
    assert_eq!(unavailable, 1);
}
