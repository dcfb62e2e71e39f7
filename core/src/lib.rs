//! # Seat Picker Core
//!
//! The reducer architecture the seat picker is built on.
//!
//! The seat-selection engine is a state machine: user gestures (ticket counts,
//! seat toggles) and availability snapshots from an external feed arrive as
//! discrete actions, and each action is reduced to a new state plus a list of
//! effect descriptions (for example "fetch availability, then poll again in
//! five seconds"). This crate holds those abstractions and nothing else.
//!
//! ## Vocabulary
//!
//! - **State**: owned by exactly one store, mutated only inside `reduce`
//! - **Action**: every input, whether it comes from the user or from an effect
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`, no I/O
//! - **Effect**: a value describing work for the runtime, never the work itself
//! - **Environment**: clock, feed and other collaborators, injected as traits
//!
//! ## Example
//!
//! ```ignore
//! use seat_picker_core::*;
//!
//! #[derive(Clone, Debug)]
//! enum PickerAction {
//!     ToggleSeat { seat_id: SeatId },
//!     AvailabilityUpdated { unavailable: Vec<SeatId> },
//! }
//!
//! impl Reducer for PickerReducer {
//!     type State = PickerState;
//!     type Action = PickerAction;
//!     type Environment = PickerEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut PickerState,
//!         action: PickerAction,
//!         env: &PickerEnvironment,
//!     ) -> SmallVec<[Effect<PickerAction>; 4]> {
//!         // Transition rules go here
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// The [`Reducer`](reducer::Reducer) trait
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Transition rules for one kind of state
    ///
    /// Implementations must be deterministic given the same state, action and
    /// environment answers. Anything slow or fallible that talks to the outside
    /// world is returned as an [`Effect`] instead of being performed here.
    ///
    /// Most actions produce no side effects, so the effect list is a
    /// `SmallVec` that stays on the stack for the common case.
    pub trait Reducer {
        /// State mutated by this reducer
        type State;

        /// Inputs this reducer understands
        type Action;

        /// Injected collaborators
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// A rejected action must leave `state` exactly as it was apart from
        /// whatever error reporting the state carries.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of work for the runtime
pub mod effect {
    use futures::future::BoxFuture;
    use std::fmt;
    use std::time::Duration;

    /// Work a reducer asks the runtime to do
    ///
    /// Building an effect has no side effects; the store executes it after the
    /// reducer returns and feeds any resulting action back in.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Start all of these at once
        Parallel(Vec<Effect<Action>>),

        /// Run these one after another, each to completion
        Sequential(Vec<Effect<Action>>),

        /// Dispatch `action` once `duration` has elapsed (poll intervals, backoff)
        Delay {
            /// Wait before dispatching
            duration: Duration,
            /// Dispatched when the wait is over
            action: Box<Action>,
        },

        /// Await a future (a feed fetch, say); `Some(action)` is dispatched
        Future(BoxFuture<'static, Option<Action>>),
    }

    impl<Action: fmt::Debug> fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::None => f.write_str("None"),
                Self::Parallel(effects) => f.debug_tuple("Parallel").field(effects).finish(),
                Self::Sequential(effects) => f.debug_tuple("Sequential").field(effects).finish(),
                Self::Delay { duration, action } => f
                    .debug_struct("Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                // The future itself is opaque
                Self::Future(_) => f.write_str("Future(..)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Shorthand for [`Effect::Parallel`]
        #[must_use]
        pub const fn merge(effects: Vec<Self>) -> Self {
            Self::Parallel(effects)
        }

        /// Shorthand for [`Effect::Sequential`]
        #[must_use]
        pub const fn chain(effects: Vec<Self>) -> Self {
            Self::Sequential(effects)
        }

        /// Whether running this effect would do nothing at all
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Self::None => true,
                Self::Parallel(effects) | Self::Sequential(effects) => effects.iter().all(Self::is_none),
                Self::Delay { .. } | Self::Future(_) => false,
            }
        }
    }
}

/// Collaborator traits injected through a reducer's environment
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time
    ///
    /// The seat picker stamps every availability update with the time it was
    /// applied, so hosts can show how fresh the seat map is.
    pub trait Clock: Send + Sync {
        /// Current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
