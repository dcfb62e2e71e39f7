//! Current unavailability as reported by the external feed.
//!
//! The feed always sends a full snapshot, so the tracker only knows one
//! operation: [`AvailabilityTracker::replace`]. Snapshots are shared behind an
//! `Arc` and never mutated, which lets the selection state and the seat plan
//! hold on to them without copying.

use crate::types::SeatId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable set of unavailable seat ids
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilitySnapshot(Arc<BTreeSet<SeatId>>);

impl AvailabilitySnapshot {
    /// Whether `seat_id` is marked unavailable
    #[must_use]
    pub fn contains(&self, seat_id: SeatId) -> bool {
        self.0.contains(&seat_id)
    }

    /// Unavailable ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.0.iter().copied()
    }

    /// Number of unavailable seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every seat is available
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SeatId> for AvailabilitySnapshot {
    fn from_iter<I: IntoIterator<Item = SeatId>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

/// What a replace changed, for logging
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvailabilityChange {
    /// Seats unavailable now but not before
    pub newly_unavailable: Vec<SeatId>,
    /// Seats available again
    pub newly_available: Vec<SeatId>,
}

impl AvailabilityChange {
    /// Whether the snapshot was identical to the previous one
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.newly_unavailable.is_empty() && self.newly_available.is_empty()
    }
}

/// Owner of the current unavailability snapshot
#[derive(Clone, Debug, Default)]
pub struct AvailabilityTracker {
    current: AvailabilitySnapshot,
    replacements: u64,
}

impl AvailabilityTracker {
    /// Tracker with every seat available
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute the whole unavailable set
    ///
    /// Seats missing from `unavailable` are available again. Replacing with
    /// the same set twice is a no-op apart from the replacement counter.
    pub fn replace(&mut self, unavailable: impl IntoIterator<Item = SeatId>) -> AvailabilityChange {
        let next: AvailabilitySnapshot = unavailable.into_iter().collect();

        let change = AvailabilityChange {
            newly_unavailable: next.0.difference(&self.current.0).copied().collect(),
            newly_available: self.current.0.difference(&next.0).copied().collect(),
        };

        self.current = next;
        self.replacements += 1;
        change
    }

    /// The current snapshot (cheap to clone)
    #[must_use]
    pub fn snapshot(&self) -> AvailabilitySnapshot {
        self.current.clone()
    }

    /// Whether `seat_id` is currently unavailable
    #[must_use]
    pub fn is_unavailable(&self, seat_id: SeatId) -> bool {
        self.current.contains(seat_id)
    }

    /// How many snapshots have been applied
    #[must_use]
    pub const fn replacements(&self) -> u64 {
        self.replacements
    }
}
