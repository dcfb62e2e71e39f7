//! # Seat Picker Runtime
//!
//! Runtime implementation for the seat picker's reducer architecture.
//!
//! This crate provides the [`Store`]: the single owner of a reducer's state.
//! The host (UI) and the availability feed both talk to the engine through a
//! store, which guarantees that transitions run one at a time and to
//! completion before the next action is accepted.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, serialises reducer calls, executes effects
//! - **Effect Executor**: Runs effect descriptions and feeds actions back to the reducer
//! - **Action Broadcast**: Every reduced action is published so hosts can re-render
//!
//! ## Example
//!
//! ```ignore
//! use seat_picker_runtime::Store;
//!
//! let store = Store::new(initial_state, SeatPickerReducer::new(), environment);
//!
//! // Forward a user gesture
//! store.send(SeatPickerAction::ToggleSeat { seat_id }).await?;
//!
//! // Read a projection of the current state
//! let valid = store.state(|s| s.engine.current_validity()).await;
//! ```

use seat_picker_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};

/// Store failures
pub mod error {
    use thiserror::Error;

    /// Why a store call did not go through
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// `send()` after `shutdown()` was called
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown timeout elapsed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action was reduced in time
        #[error("Timeout waiting for action")]
        Timeout,

        /// The action broadcast closed under a waiting caller
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Default capacity of the action broadcast channel
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Completion tracker for the effects of one [`Store::send()`]
///
/// Waiting covers the immediate effects only: a fetch effect is complete once
/// its result action has been reduced, but a poll scheduled by that result is
/// not part of the handle.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running for this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait until every effect started by the action has settled
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, nothing can still be running
                break;
            }
        }
    }

    /// [`EffectHandle::wait`] bounded by `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the handle counter on drop, even if the effect panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: decrements the store-wide pending counter on drop
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolves once shutdown has been requested
async fn shutdown_requested(mut signal: watch::Receiver<bool>) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Single owner of a reducer's state
///
/// Reads go through [`Store::state`], writes only through [`Store::send`].
/// Effects returned by the reducer run on the tokio runtime and whatever
/// action they produce is sent back in.
///
/// Clones share the same state; hand a clone to every component that needs
/// to dispatch or read.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<watch::Sender<bool>>,
    pending_effects: Arc<AtomicUsize>,
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Send + Clone + std::fmt::Debug + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Store with the default broadcast capacity
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, DEFAULT_BROADCAST_CAPACITY)
    }

    /// Store whose action broadcast keeps `capacity` actions
    ///
    /// Slow subscribers that fall more than `capacity` actions behind will
    /// observe a lag and skip ahead.
    #[must_use]
    pub fn with_broadcast_capacity(initial_state: S, reducer: R, environment: E, capacity: usize) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(shutdown),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Reduce `action` under the write lock, publish it, then start its effects
    ///
    /// Returns once the effects are started. Use the returned handle to wait
    /// for them.
    /// Concurrent sends serialise at the reducer, in the order they acquire
    /// the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        if self.is_shutting_down() {
            tracing::warn!(?action, "Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        tracing::debug!(?action, "Processing action");
        metrics::counter!("store.commands.total").increment(1);

        let (handle, tracking) = EffectHandle::new();
        let observed = (self.action_broadcast.receiver_count() > 0).then(|| action.clone());

        let effects = {
            let mut state = self.state.write().await;

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds").record(start.elapsed().as_secs_f64());

            tracing::trace!("Reducer completed, returned {} effects", effects.len());
            effects
        };

        if let Some(action) = observed {
            let _ = self.action_broadcast.send(action);
        }

        for effect in effects {
            self.execute_effect(effect, tracking.clone());
        }

        Ok(handle)
    }

    /// Send an action and wait for a matching action to be reduced
    ///
    /// Subscribes before sending, so the initial action itself is also offered
    /// to `predicate`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action within `timeout`
    /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
    /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
    pub async fn send_and_wait_for<F>(&self, action: A, predicate: F, timeout: Duration) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to every action reduced by this store
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Run `f` against the current state under the read lock
    ///
    /// ```ignore
    /// let selected = store.state(|s| s.engine.current_selection()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&*state)
    }

    /// Number of effects currently running across all handles
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Whether `shutdown` has been called
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Stop accepting actions and wait for running effects to settle
    ///
    /// New actions are rejected from this point on. Pending delays and
    /// futures are discarded without feeding their actions back, so a poll
    /// that resolves after teardown never reaches the state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when `timeout` elapses.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Initiating shutdown");
        self.shutdown.send_replace(true);

        let start = tokio::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            let pending = self.pending_effects();
            if pending == 0 {
                tracing::info!("All effects settled, shutdown complete");
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(pending_effects = pending, "Shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Spawn a tracked task for an async effect body
    fn spawn_tracked<F>(&self, tracking: &EffectTracking, body: F)
    where
        F: std::future::Future<Output = Option<A>> + Send + 'static,
    {
        tracking.increment();
        self.pending_effects.fetch_add(1, Ordering::SeqCst);

        let guard = DecrementGuard(tracking.clone());
        let pending = PendingGuard(Arc::clone(&self.pending_effects));
        let stop = self.shutdown.subscribe();
        let store = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let _pending = pending;

            let action = tokio::select! {
                action = body => action,
                () = shutdown_requested(stop) => {
                    tracing::debug!("Discarding effect: store is shutting down");
                    metrics::counter!("store.effects.discarded").increment(1);
                    None
                },
            };

            if let Some(action) = action {
                let _ = store.send(action).await;
            }
        });
    }

    /// Start `effect`, counting it against `tracking`
    ///
    /// `Sequential` children each get their own handle so the next one starts
    /// only after the previous one has settled.
    #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
    fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Future(fut) => {
                metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                self.spawn_tracked(&tracking, fut);
            },
            Effect::Delay { duration, action } => {
                tracing::trace!(?duration, "Scheduling delayed action");
                metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                self.spawn_tracked(&tracking, async move {
                    tokio::time::sleep(duration).await;
                    Some(*action)
                });
            },
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute_effect(effect, tracking.clone());
                }
            },
            Effect::Sequential(effects) => {
                metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                let store = self.clone();
                self.spawn_tracked(&tracking, async move {
                    for effect in effects {
                        let (mut step, step_tracking) = EffectHandle::new();
                        store.execute_effect(effect, step_tracking);
                        step.wait().await;
                    }
                    None
                });
            },
        }
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}
