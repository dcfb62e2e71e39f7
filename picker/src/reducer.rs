//! Reducer wiring the selection engine and the availability feed into a store.
//!
//! User gestures are reduced synchronously against the [`SelectionEngine`].
//! The feed is a poll-then-sleep loop expressed as effects:
//!
//! ```text
//! StartFeed ──fetch──▶ FeedDelivered ──delay──▶ PollAvailability ──fetch──▶ ...
//! ```
//!
//! Every loop carries a generation number. `StartFeed` and `StopFeed` bump it,
//! so fetches and delays belonging to an older loop are dropped when they come
//! back instead of overwriting fresher data.

use crate::catalog::SeatCatalog;
use crate::digits;
use crate::engine::SelectionEngine;
use crate::error::{FeedError, SelectionError};
use crate::feed::{AvailabilityFeed, PollSchedule};
use crate::plan::DistancingPolicy;
use crate::types::{SeatId, TicketType};
use chrono::{DateTime, Utc};
use seat_picker_core::environment::Clock;
use seat_picker_core::{async_effect, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Health of the availability feed as seen by the host
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not polling
    #[default]
    Idle,
    /// Polling started, no snapshot yet
    Awaiting,
    /// Last poll succeeded
    Live {
        /// When the last snapshot was applied
        last_update: DateTime<Utc>,
        /// Snapshots applied since the store started
        updates: u64,
    },
    /// Last poll failed; the engine still shows the previous snapshot
    Degraded {
        /// Failures in a row
        consecutive_failures: u32,
        /// Most recent failure
        last_error: FeedError,
    },
}

/// Everything the store owns
#[derive(Clone, Debug)]
pub struct SeatPickerState {
    /// The selection engine
    pub engine: SelectionEngine,
    /// Feed health
    pub feed: FeedStatus,
    /// Current poll loop; results from other generations are dropped
    pub generation: u64,
    /// Whether a poll loop is running
    pub polling: bool,
    /// Snapshots applied so far
    pub updates: u64,
    /// Rejection of the most recent gesture, cleared by the next accepted one
    pub last_error: Option<SelectionError>,
}

impl SeatPickerState {
    /// Initial state over `catalog`
    #[must_use]
    pub fn new(catalog: Arc<SeatCatalog>) -> Self {
        Self::with_engine(SelectionEngine::new(catalog))
    }

    /// Initial state around an already configured engine
    #[must_use]
    pub const fn with_engine(engine: SelectionEngine) -> Self {
        Self {
            engine,
            feed: FeedStatus::Idle,
            generation: 0,
            polling: false,
            updates: 0,
            last_error: None,
        }
    }

    /// Initial state with an explicit distancing policy
    #[must_use]
    pub fn with_distancing(catalog: Arc<SeatCatalog>, distancing: DistancingPolicy) -> Self {
        Self::with_engine(SelectionEngine::new(catalog).with_distancing(distancing))
    }

    fn consecutive_failures(&self) -> u32 {
        match &self.feed {
            FeedStatus::Degraded {
                consecutive_failures, ..
            } => *consecutive_failures,
            _ => 0,
        }
    }

    fn accept<T>(&mut self, result: Result<T, SelectionError>) {
        self.last_error = result.err();
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the seat picker
#[derive(Clone, Debug, PartialEq)]
pub enum SeatPickerAction {
    // Host gestures
    /// Set a ticket count directly (negative clamps to 0)
    SetTicketCount {
        /// Ticket type
        ticket_type: TicketType,
        /// Requested count
        count: i64,
    },
    /// Set a ticket count by wire name (`STANDARD`, `MEMBER`)
    SetTicketCountByName {
        /// Ticket type name
        name: String,
        /// Requested count
        count: i64,
    },
    /// `+`/`-` button on the digit input
    AdjustTicketCount {
        /// Ticket type
        ticket_type: TicketType,
        /// Step, usually `1` or `-1`
        delta: i64,
    },
    /// Raw text typed into the digit input
    EnterTicketDigits {
        /// Ticket type
        ticket_type: TicketType,
        /// Text as typed
        input: String,
    },
    /// Click on a seat
    ToggleSeat {
        /// The seat
        seat_id: SeatId,
    },

    // Availability
    /// Full snapshot pushed by the host
    AvailabilityUpdated {
        /// Every unavailable seat
        unavailable: Vec<SeatId>,
    },
    /// Start a new poll loop
    StartFeed,
    /// Stop polling; in-flight polls are dropped
    StopFeed,
    /// Timer fired: poll again
    PollAvailability {
        /// Loop that scheduled this poll
        generation: u64,
    },
    /// Feed answered
    FeedDelivered {
        /// Loop that asked
        generation: u64,
        /// Snapshot or failure
        result: Result<Vec<SeatId>, FeedError>,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Injected dependencies
#[derive(Clone)]
pub struct SeatPickerEnvironment {
    /// Availability source
    pub feed: Arc<dyn AvailabilityFeed>,
    /// Time source for `last_update`
    pub clock: Arc<dyn Clock>,
    /// Poll interval and backoff
    pub schedule: PollSchedule,
}

impl SeatPickerEnvironment {
    /// Environment with the default schedule
    #[must_use]
    pub fn new(feed: Arc<dyn AvailabilityFeed>, clock: Arc<dyn Clock>) -> Self {
        Self {
            feed,
            clock,
            schedule: PollSchedule::default(),
        }
    }

    /// Replace the poll schedule
    #[must_use]
    pub const fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the seat picker
#[derive(Clone, Debug, Default)]
pub struct SeatPickerReducer;

impl SeatPickerReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fetch(env: &SeatPickerEnvironment, generation: u64) -> Effect<SeatPickerAction> {
        let feed = Arc::clone(&env.feed);
        async_effect! {
            let result = feed.fetch_unavailable().await;
            Some(SeatPickerAction::FeedDelivered { generation, result })
        }
    }

    fn apply_snapshot(state: &mut SeatPickerState, unavailable: Vec<SeatId>, env: &SeatPickerEnvironment) {
        state.engine.set_unavailable(unavailable);
        state.updates += 1;
        state.feed = FeedStatus::Live {
            last_update: env.clock.now(),
            updates: state.updates,
        };
        metrics::counter!("seat_picker.feed.updates").increment(1);
    }

    fn is_current(state: &SeatPickerState, generation: u64) -> bool {
        state.polling && generation == state.generation
    }
}

impl Reducer for SeatPickerReducer {
    type State = SeatPickerState;
    type Action = SeatPickerAction;
    type Environment = SeatPickerEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Gestures ==========
            SeatPickerAction::SetTicketCount { ticket_type, count } => {
                state.engine.set_ticket_count(ticket_type, count);
                state.last_error = None;
                smallvec![Effect::None]
            },

            SeatPickerAction::SetTicketCountByName { name, count } => {
                let result = state.engine.set_ticket_count_by_name(&name, count).map(|_| ());
                state.accept(result);
                smallvec![Effect::None]
            },

            SeatPickerAction::AdjustTicketCount { ticket_type, delta } => {
                let current = state.engine.current_selection().ticket_selection().get(ticket_type);
                state.engine.set_ticket_count(ticket_type, i64::from(digits::adjust(current, delta)));
                state.last_error = None;
                smallvec![Effect::None]
            },

            SeatPickerAction::EnterTicketDigits { ticket_type, input } => {
                let count = digits::parse_digit_input(&input);
                state.engine.set_ticket_count(ticket_type, i64::from(count));
                state.last_error = None;
                smallvec![Effect::None]
            },

            SeatPickerAction::ToggleSeat { seat_id } => {
                let result = state.engine.toggle_seat(seat_id).map(|_| ());
                state.accept(result);
                smallvec![Effect::None]
            },

            // ========== Availability ==========
            SeatPickerAction::AvailabilityUpdated { unavailable } => {
                Self::apply_snapshot(state, unavailable, env);
                smallvec![Effect::None]
            },

            SeatPickerAction::StartFeed => {
                state.generation += 1;
                state.polling = true;
                state.feed = FeedStatus::Awaiting;
                tracing::info!(generation = state.generation, "Starting availability feed");
                smallvec![Self::fetch(env, state.generation)]
            },

            SeatPickerAction::StopFeed => {
                if state.polling {
                    tracing::info!(generation = state.generation, "Stopping availability feed");
                }
                state.generation += 1;
                state.polling = false;
                state.feed = FeedStatus::Idle;
                smallvec![Effect::None]
            },

            SeatPickerAction::PollAvailability { generation } => {
                if !Self::is_current(state, generation) {
                    tracing::debug!(generation, current = state.generation, "Dropped stale poll");
                    return smallvec![Effect::None];
                }
                smallvec![Self::fetch(env, generation)]
            },

            SeatPickerAction::FeedDelivered { generation, result } => {
                if !Self::is_current(state, generation) {
                    tracing::debug!(generation, current = state.generation, "Dropped stale feed result");
                    return smallvec![Effect::None];
                }

                let failures = match result {
                    Ok(unavailable) => {
                        Self::apply_snapshot(state, unavailable, env);
                        0
                    },
                    Err(error) => {
                        let consecutive_failures = state.consecutive_failures().saturating_add(1);
                        tracing::warn!(%error, consecutive_failures, "Availability feed failed");
                        metrics::counter!("seat_picker.feed.failures").increment(1);
                        state.feed = FeedStatus::Degraded {
                            consecutive_failures,
                            last_error: error,
                        };
                        consecutive_failures
                    },
                };

                smallvec![delay! {
                    duration: env.schedule.next_delay(failures),
                    action: SeatPickerAction::PollAvailability { generation }
                }]
            },
        }
    }
}
