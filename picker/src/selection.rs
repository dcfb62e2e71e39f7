//! The selection snapshot: requested tickets, picked seats, known unavailability.
//!
//! [`SelectionState`] is read by everyone but only mutated by the
//! [`SelectionEngine`](crate::engine::SelectionEngine); its mutators are
//! crate-private and each one leaves the invariants intact:
//!
//! 1. `selected_seats.len() <= ticket_selection.total()`
//! 2. no selected seat is in `unavailable_seats`

use crate::availability::AvailabilitySnapshot;
use crate::types::{SeatId, TicketSelection, TicketType};
use serde::{Deserialize, Serialize};

/// Selected seat ids in selection order, oldest first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedSeats(Vec<SeatId>);

impl SelectedSeats {
    /// Whether `seat_id` is selected
    #[must_use]
    pub fn contains(&self, seat_id: SeatId) -> bool {
        self.0.contains(&seat_id)
    }

    /// Ids in selection order
    #[must_use]
    pub fn as_slice(&self) -> &[SeatId] {
        &self.0
    }

    /// Ids in selection order
    pub fn iter(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.0.iter().copied()
    }

    /// Number of selected seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, seat_id: SeatId) {
        if !self.contains(seat_id) {
            self.0.push(seat_id);
        }
    }

    fn remove(&mut self, seat_id: SeatId) -> bool {
        let before = self.0.len();
        self.0.retain(|id| *id != seat_id);
        self.0.len() != before
    }

    /// Drop the oldest entries until at most `limit` remain
    fn truncate_front(&mut self, limit: usize) -> Vec<SeatId> {
        let excess = self.0.len().saturating_sub(limit);
        self.0.drain(..excess).collect()
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(SeatId) -> bool) -> Vec<SeatId> {
        let mut removed = Vec::new();
        self.0.retain(|id| {
            let drop = predicate(*id);
            if drop {
                removed.push(*id);
            }
            !drop
        });
        removed
    }
}

/// Outcome of a single selection transition
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Transition {
    /// Seats dropped because the selection exceeded the ticket total
    pub evicted: Vec<SeatId>,
    /// Seats dropped because they became unavailable
    pub forced_out: Vec<SeatId>,
    /// The default ticket type was bumped to admit the first seat
    pub auto_ticket: bool,
}

/// Snapshot of the engine's state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    ticket_selection: TicketSelection,
    selected_seats: SelectedSeats,
    unavailable_seats: AvailabilitySnapshot,
}

impl SelectionState {
    /// All ticket counts zero, nothing selected, everything available
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested ticket counts
    #[must_use]
    pub const fn ticket_selection(&self) -> &TicketSelection {
        &self.ticket_selection
    }

    /// Selected seats, oldest first
    #[must_use]
    pub const fn selected_seats(&self) -> &SelectedSeats {
        &self.selected_seats
    }

    /// Seats the feed last marked unavailable
    #[must_use]
    pub const fn unavailable_seats(&self) -> &AvailabilitySnapshot {
        &self.unavailable_seats
    }

    /// Selection limit: total requested tickets across all types
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.ticket_selection.total()
    }

    /// Tickets requested and exactly that many seats picked
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let limit = self.limit();
        limit > 0 && self.selected_seats.len() == limit as usize
    }

    pub(crate) fn set_ticket_count(&mut self, ticket_type: TicketType, count: u32) -> Transition {
        self.ticket_selection.set(ticket_type, count);
        Transition {
            evicted: self.enforce_limit(),
            ..Transition::default()
        }
    }

    /// Toggle a seat known to exist in the catalog
    pub(crate) fn toggle(&mut self, seat_id: SeatId) -> Transition {
        let mut transition = Transition::default();

        if self.unavailable_seats.contains(seat_id) {
            return transition;
        }

        if !self.selected_seats.remove(seat_id) {
            if self.limit() == 0 {
                self.ticket_selection.set(TicketType::DEFAULT, 1);
                transition.auto_ticket = true;
            }
            self.selected_seats.push(seat_id);
        }

        transition.evicted = self.enforce_limit();
        transition
    }

    pub(crate) fn set_unavailable(&mut self, unavailable: AvailabilitySnapshot) -> Transition {
        let forced_out = self
            .selected_seats
            .remove_where(|seat_id| unavailable.contains(seat_id));
        self.unavailable_seats = unavailable;

        Transition {
            forced_out,
            ..Transition::default()
        }
    }

    /// FIFO eviction down to the current limit
    fn enforce_limit(&mut self) -> Vec<SeatId> {
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        self.selected_seats.truncate_front(limit)
    }
}
