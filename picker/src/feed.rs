//! The external availability feed.
//!
//! A feed answers "which seats are unavailable right now?" with a full
//! snapshot. How often it is asked is up to the reducer's poll loop and the
//! [`PollSchedule`] in its environment.

use crate::error::FeedError;
use crate::types::SeatId;
use futures::future::BoxFuture;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Source of unavailability snapshots
///
/// Returns `BoxFuture` instead of `async fn` so it can sit behind `Arc<dyn _>`
/// in the environment.
pub trait AvailabilityFeed: Send + Sync {
    /// Fetch the complete set of currently unavailable seats
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the source cannot be reached or its answer is
    /// unusable.
    fn fetch_unavailable(&self) -> BoxFuture<'_, Result<Vec<SeatId>, FeedError>>;
}

// ============================================================================
// Random simulation
// ============================================================================

struct RandomFeedState {
    rng: StdRng,
    unavailable: Option<BTreeSet<SeatId>>,
}

/// Simulated box office
///
/// The first fetch marks a random share of the seats unavailable. Every later
/// fetch flips one random seat, so seats come and go the way they would with
/// other customers booking and releasing.
pub struct RandomAvailabilityFeed {
    seats: Vec<SeatId>,
    ratio: f64,
    latency: Duration,
    state: Mutex<RandomFeedState>,
}

impl RandomAvailabilityFeed {
    /// Feed over `seats`, initially marking `ratio` (0.0 - 1.0) of them unavailable
    #[must_use]
    pub fn new(seats: impl IntoIterator<Item = SeatId>, ratio: f64) -> Self {
        Self::with_rng(seats, ratio, StdRng::from_entropy())
    }

    /// Deterministic feed for reproducible demos and tests
    #[must_use]
    pub fn seeded(seats: impl IntoIterator<Item = SeatId>, ratio: f64, seed: u64) -> Self {
        Self::with_rng(seats, ratio, StdRng::seed_from_u64(seed))
    }

    fn with_rng(seats: impl IntoIterator<Item = SeatId>, ratio: f64, rng: StdRng) -> Self {
        Self {
            seats: seats.into_iter().collect(),
            ratio: ratio.clamp(0.0, 1.0),
            latency: Duration::ZERO,
            state: Mutex::new(RandomFeedState { rng, unavailable: None }),
        }
    }

    /// Simulated network round trip before every answer
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn initial_sample_size(&self) -> usize {
        (self.seats.len() as f64 * self.ratio).round() as usize
    }
}

impl AvailabilityFeed for RandomAvailabilityFeed {
    fn fetch_unavailable(&self) -> BoxFuture<'_, Result<Vec<SeatId>, FeedError>> {
        Box::pin(async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let mut state = self.state.lock().await;
            let RandomFeedState { rng, unavailable } = &mut *state;

            match unavailable {
                None => {
                    let sample: BTreeSet<SeatId> = self
                        .seats
                        .choose_multiple(rng, self.initial_sample_size())
                        .copied()
                        .collect();
                    let snapshot = sample.iter().copied().collect();
                    *unavailable = Some(sample);
                    Ok(snapshot)
                },
                Some(current) => {
                    if let Some(seat_id) = self.seats.choose(rng).copied() {
                        if !current.remove(&seat_id) {
                            current.insert(seat_id);
                        }
                    }
                    Ok(current.iter().copied().collect())
                },
            }
        })
    }
}

// ============================================================================
// Fixed feeds
// ============================================================================

/// Feed that always answers with the same snapshot
#[derive(Clone, Debug, Default)]
pub struct StaticFeed {
    unavailable: Vec<SeatId>,
}

impl StaticFeed {
    /// Always report `unavailable`
    #[must_use]
    pub fn new(unavailable: impl IntoIterator<Item = SeatId>) -> Self {
        Self {
            unavailable: unavailable.into_iter().collect(),
        }
    }
}

impl AvailabilityFeed for StaticFeed {
    fn fetch_unavailable(&self) -> BoxFuture<'_, Result<Vec<SeatId>, FeedError>> {
        let snapshot = self.unavailable.clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

/// Feed that replays a script of answers
///
/// Once the script runs out the last answer repeats; an empty script answers
/// with "everything available".
#[derive(Default)]
pub struct ScriptedFeed {
    script: Mutex<VecDeque<Result<Vec<SeatId>, FeedError>>>,
    last: Mutex<Option<Result<Vec<SeatId>, FeedError>>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    /// Replay `answers` in order
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Result<Vec<SeatId>, FeedError>>) -> Self {
        Self {
            script: Mutex::new(answers.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times the feed has been asked
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AvailabilityFeed for ScriptedFeed {
    fn fetch_unavailable(&self) -> BoxFuture<'_, Result<Vec<SeatId>, FeedError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let next = self.script.lock().await.pop_front();
            let mut last = self.last.lock().await;
            if let Some(answer) = next {
                *last = Some(answer);
            }
            last.clone().unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}

// ============================================================================
// Poll schedule
// ============================================================================

/// When to ask the feed again
///
/// After a success the loop sleeps for `interval`. After `n` consecutive
/// failures it backs off exponentially: `backoff_initial * multiplier^(n-1)`,
/// capped at `backoff_max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollSchedule {
    /// Delay between successful polls
    pub interval: Duration,
    /// Delay after the first failure
    pub backoff_initial: Duration,
    /// Upper bound for the failure delay
    pub backoff_max: Duration,
    /// Growth factor per consecutive failure
    pub multiplier: f64,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            backoff_initial: Duration::from_millis(500),
            backoff_max: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl PollSchedule {
    /// Delay before the next poll given the current failure streak
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn next_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.interval;
        }

        let exponent = i32::try_from(consecutive_failures - 1).unwrap_or(i32::MAX);
        let delay_ms = self.backoff_initial.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_ms = self.backoff_max.as_millis() as f64;

        if delay_ms.is_finite() && delay_ms < max_ms {
            Duration::from_millis(delay_ms as u64)
        } else {
            self.backoff_max
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(raw: std::ops::Range<u32>) -> Vec<SeatId> {
        raw.map(SeatId::new).collect()
    }

    #[tokio::test]
    async fn random_feed_samples_ratio_first() {
        let feed = RandomAvailabilityFeed::seeded(ids(0..20), 0.25, 7);
        let first = feed.fetch_unavailable().await.unwrap();

        assert_eq!(first.len(), 5);
        assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn random_feed_flips_one_seat_per_poll() {
        let feed = RandomAvailabilityFeed::seeded(ids(0..20), 0.25, 7);
        let mut previous: BTreeSet<_> = feed.fetch_unavailable().await.unwrap().into_iter().collect();

        for _ in 0..10 {
            let next: BTreeSet<_> = feed.fetch_unavailable().await.unwrap().into_iter().collect();
            assert_eq!(previous.symmetric_difference(&next).count(), 1);
            previous = next;
        }
    }

    #[tokio::test]
    async fn same_seed_same_answers() {
        let first = RandomAvailabilityFeed::seeded(ids(0..50), 0.5, 42);
        let second = RandomAvailabilityFeed::seeded(ids(0..50), 0.5, 42);

        for _ in 0..3 {
            assert_eq!(
                first.fetch_unavailable().await.unwrap(),
                second.fetch_unavailable().await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn empty_catalog_is_always_available() {
        let feed = RandomAvailabilityFeed::seeded(Vec::new(), 0.25, 1);
        assert!(feed.fetch_unavailable().await.unwrap().is_empty());
        assert!(feed.fetch_unavailable().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_the_answer() {
        let feed = RandomAvailabilityFeed::seeded(ids(0..4), 0.0, 1).with_latency(Duration::from_secs(5));
        let start = tokio::time::Instant::now();

        feed.fetch_unavailable().await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn static_feed_repeats_itself() {
        let feed = StaticFeed::new([SeatId::new(3)]);
        assert_eq!(feed.fetch_unavailable().await, Ok(vec![SeatId::new(3)]));
        assert_eq!(feed.fetch_unavailable().await, Ok(vec![SeatId::new(3)]));
    }

    #[tokio::test]
    async fn scripted_feed_replays_then_repeats_last() {
        let feed = ScriptedFeed::new([
            Ok(vec![SeatId::new(1)]),
            Err(FeedError::Unreachable("timeout".to_string())),
        ]);

        assert_eq!(feed.fetch_unavailable().await, Ok(vec![SeatId::new(1)]));
        assert!(feed.fetch_unavailable().await.is_err());
        assert!(feed.fetch_unavailable().await.is_err());
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn empty_script_reports_everything_available() {
        let feed = ScriptedFeed::default();
        assert_eq!(feed.fetch_unavailable().await, Ok(Vec::new()));
    }

    #[test]
    fn schedule_uses_interval_after_success() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.next_delay(0), Duration::from_secs(5));
    }

    #[test]
    fn schedule_backs_off_exponentially() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.next_delay(1), Duration::from_millis(500));
        assert_eq!(schedule.next_delay(2), Duration::from_millis(1000));
        assert_eq!(schedule.next_delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn schedule_caps_backoff() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.next_delay(10), Duration::from_secs(30));
        assert_eq!(schedule.next_delay(u32::MAX), Duration::from_secs(30));
    }
}
