//! # Seat Picker Testing
//!
//! Shared test support for the seat picker workspace: clocks that hold still
//! or move on command, and [`ReducerTest`] for replaying a short gesture
//! history through a reducer.
//!
//! ```ignore
//! use seat_picker_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(SeatPickerReducer::new())
//!     .with_env(test_environment())
//!     .given_state(SeatPickerState::new(catalog))
//!     .when_action(SeatPickerAction::ToggleSeat { seat_id: SeatId::new(0) })
//!     .then_state(|state| assert_eq!(state.engine.current_selection().limit(), 1))
//!     .run();
//! ```

use chrono::{DateTime, TimeZone, Utc};
use seat_picker_core::environment::Clock;


/// [`Clock`] stand-ins
pub mod mocks {
    use super::{Clock, DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    /// Clock frozen at one instant
    ///
    /// ```
    /// use seat_picker_testing::mocks::FixedClock;
    /// use seat_picker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        at: DateTime<Utc>,
    }

    impl FixedClock {
        /// Freeze at `at`
        #[must_use]
        pub const fn new(at: DateTime<Utc>) -> Self {
            Self { at }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.at
        }
    }

    /// Clock that only moves when a test tells it to
    ///
    /// Lets a test check that each availability update is stamped with the
    /// time it was applied.
    #[derive(Debug)]
    pub struct ManualClock {
        millis: AtomicI64,
    }

    impl ManualClock {
        /// Start at `start`
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: AtomicI64::new(start.timestamp_millis()),
            }
        }

        /// Move forward by `by`
        pub fn advance(&self, by: Duration) {
            let step = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
            self.millis.fetch_add(step, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
        }
    }

    /// [`FixedClock`] at midnight UTC on 2025-01-01
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
