//! The selection state engine.
//!
//! [`SelectionEngine`] owns the [`SelectionState`] and the
//! [`AvailabilityTracker`] and is the only thing that mutates either. Every
//! public operation is atomic: it either fails validation and leaves the state
//! as it was, or applies completely and re-establishes the invariants (at most
//! `limit` seats selected, no unavailable seat selected) before returning.

use crate::availability::AvailabilityTracker;
use crate::catalog::SeatCatalog;
use crate::error::SelectionError;
use crate::plan::{self, DistancingPolicy, SeatPlan};
use crate::selection::{SelectionState, Transition};
use crate::types::{SeatId, TicketType};
use std::sync::Arc;

/// Seat-selection state machine over a shared catalog
#[derive(Clone, Debug)]
pub struct SelectionEngine {
    catalog: Arc<SeatCatalog>,
    availability: AvailabilityTracker,
    state: SelectionState,
    distancing: DistancingPolicy,
}

impl SelectionEngine {
    /// Fresh engine: no tickets, no seats, everything available
    #[must_use]
    pub fn new(catalog: Arc<SeatCatalog>) -> Self {
        Self {
            catalog,
            availability: AvailabilityTracker::new(),
            state: SelectionState::new(),
            distancing: DistancingPolicy::default(),
        }
    }

    /// Choose whether the seat plan flags distancing seats
    #[must_use]
    pub const fn with_distancing(mut self, distancing: DistancingPolicy) -> Self {
        self.distancing = distancing;
        self
    }

    /// The catalog this engine selects from
    #[must_use]
    pub const fn catalog(&self) -> &Arc<SeatCatalog> {
        &self.catalog
    }

    /// The availability tracker fed by [`SelectionEngine::set_unavailable`]
    #[must_use]
    pub const fn availability(&self) -> &AvailabilityTracker {
        &self.availability
    }

    /// Set the requested count for one ticket type
    ///
    /// Negative counts are clamped to 0. If the new total is below the number
    /// of selected seats, the oldest selections are dropped.
    pub fn set_ticket_count(&mut self, ticket_type: TicketType, count: i64) -> &SelectionState {
        let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
        let transition = self.state.set_ticket_count(ticket_type, count);
        tracing::debug!(%ticket_type, count, limit = self.state.limit(), "Ticket count set");
        self.record(&transition);
        &self.state
    }

    /// [`SelectionEngine::set_ticket_count`] with a wire name (`STANDARD`, `MEMBER`)
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidTicketType`] for an unrecognised name;
    /// the state is unchanged.
    pub fn set_ticket_count_by_name(&mut self, name: &str, count: i64) -> Result<&SelectionState, SelectionError> {
        let ticket_type = name.parse::<TicketType>().inspect_err(|error| {
            tracing::warn!(%error, "Rejected ticket count update");
        })?;
        Ok(self.set_ticket_count(ticket_type, count))
    }

    /// Select or deselect a seat
    ///
    /// Unavailable seats are left alone. Selecting the first seat while no
    /// tickets are requested assumes one `STANDARD` ticket. Selecting beyond
    /// the limit drops the oldest selection.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidSeatReference`] if `seat_id` is not in
    /// the catalog; the state is unchanged.
    pub fn toggle_seat(&mut self, seat_id: SeatId) -> Result<&SelectionState, SelectionError> {
        if !self.catalog.contains(seat_id) {
            tracing::warn!(%seat_id, "Rejected toggle of unknown seat");
            return Err(SelectionError::InvalidSeatReference(seat_id));
        }

        if self.availability.is_unavailable(seat_id) {
            tracing::debug!(%seat_id, "Ignored toggle of unavailable seat");
        }

        let transition = self.state.toggle(seat_id);
        if transition.auto_ticket {
            tracing::debug!(%seat_id, ticket_type = %TicketType::DEFAULT, "Assumed one ticket for first seat");
        }
        self.record(&transition);
        Ok(&self.state)
    }

    /// Replace the unavailable set with a full snapshot from the feed
    ///
    /// Ids not in the catalog are dropped. Selected seats that are now
    /// unavailable are deselected; the others keep their order. Applying the
    /// same snapshot twice gives the same state as applying it once.
    pub fn set_unavailable(&mut self, unavailable: impl IntoIterator<Item = SeatId>) -> &SelectionState {
        let (known, unknown): (Vec<SeatId>, Vec<SeatId>) =
            unavailable.into_iter().partition(|seat_id| self.catalog.contains(*seat_id));
        if !unknown.is_empty() {
            tracing::warn!(?unknown, "Dropped unknown seat ids from availability snapshot");
        }

        let change = self.availability.replace(known);
        if !change.is_empty() {
            tracing::debug!(
                newly_unavailable = change.newly_unavailable.len(),
                newly_available = change.newly_available.len(),
                "Availability changed"
            );
        }

        let transition = self.state.set_unavailable(self.availability.snapshot());
        self.record(&transition);
        &self.state
    }

    /// The current selection snapshot
    #[must_use]
    pub const fn current_selection(&self) -> &SelectionState {
        &self.state
    }

    /// Whether the selection is complete: tickets requested and all seats picked
    #[must_use]
    pub fn current_validity(&self) -> bool {
        self.state.is_valid()
    }

    /// Project the current state into a seat plan
    #[must_use]
    pub fn current_seat_plan(&self) -> SeatPlan {
        plan::project(
            &self.catalog,
            self.state.unavailable_seats(),
            self.state.selected_seats(),
            self.distancing,
        )
    }

    /// Labels (`A4`) of the selected seats, sorted
    #[must_use]
    pub fn selected_seat_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .state
            .selected_seats()
            .iter()
            .filter_map(|seat_id| self.catalog.label(seat_id))
            .collect();
        labels.sort();
        labels
    }

    fn record(&self, transition: &Transition) {
        if !transition.evicted.is_empty() {
            tracing::debug!(evicted = ?transition.evicted, limit = self.state.limit(), "Evicted oldest selections");
            metrics::counter!("seat_picker.seats.evicted", "reason" => "limit")
                .increment(transition.evicted.len() as u64);
        }
        if !transition.forced_out.is_empty() {
            tracing::info!(seats = ?transition.forced_out, "Deselected seats that became unavailable");
            metrics::counter!("seat_picker.seats.evicted", "reason" => "unavailable")
                .increment(transition.forced_out.len() as u64);
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::SeatStatus;

    fn engine() -> SelectionEngine {
        SelectionEngine::new(Arc::new(SeatCatalog::demo()))
    }

    fn seat(raw: u32) -> SeatId {
        SeatId::new(raw)
    }

    fn selected(engine: &SelectionEngine) -> Vec<u32> {
        engine.current_selection().selected_seats().iter().map(SeatId::get).collect()
    }

    #[test]
    fn negative_count_clamps_to_zero() {
        let mut engine = engine();
        let state = engine.set_ticket_count(TicketType::Member, -3);
        assert_eq!(state.ticket_selection().get(TicketType::Member), 0);
    }

    #[test]
    fn typed_count_is_not_capped_at_nine() {
        let mut engine = engine();
        let state = engine.set_ticket_count(TicketType::Standard, 12);
        assert_eq!(state.limit(), 12);
    }

    #[test]
    fn unknown_ticket_name_is_rejected() {
        let mut engine = engine();
        engine.set_ticket_count(TicketType::Standard, 2);
        let before = engine.current_selection().clone();

        let result = engine.set_ticket_count_by_name("CHILD", 1);

        assert_eq!(result, Err(SelectionError::InvalidTicketType("CHILD".to_string())));
        assert_eq!(engine.current_selection(), &before);
    }

    #[test]
    fn ticket_count_by_name() {
        let mut engine = engine();
        let state = engine.set_ticket_count_by_name("MEMBER", 2).expect("known type");
        assert_eq!(state.ticket_selection().get(TicketType::Member), 2);
    }

    #[test]
    fn unknown_seat_is_rejected_without_change() {
        let mut engine = engine();
        engine.toggle_seat(seat(1)).expect("seat 1");
        let before = engine.current_selection().clone();

        let result = engine.toggle_seat(seat(42));

        assert_eq!(result, Err(SelectionError::InvalidSeatReference(seat(42))));
        assert_eq!(engine.current_selection(), &before);
    }

    #[test]
    fn fifo_eviction_when_total_drops() {
        let mut engine = engine();
        engine.set_ticket_count(TicketType::Standard, 3);
        for id in [0, 1, 2] {
            engine.toggle_seat(seat(id)).expect("demo seat");
        }

        engine.set_ticket_count(TicketType::Standard, 1);

        assert_eq!(selected(&engine), [2]);
    }

    #[test]
    fn validity_follows_selection() {
        let mut engine = engine();
        engine.set_ticket_count(TicketType::Standard, 1);
        engine.set_ticket_count(TicketType::Member, 1);
        engine.toggle_seat(seat(7)).expect("B1");
        assert!(!engine.current_validity());

        engine.toggle_seat(seat(8)).expect("B2");
        assert!(engine.current_validity());

        engine.toggle_seat(seat(7)).expect("B1");
        assert!(!engine.current_validity());
    }

    #[test]
    fn unavailable_update_deselects_and_drops_unknown_ids() {
        let mut engine = engine();
        engine.set_ticket_count(TicketType::Standard, 2);
        engine.toggle_seat(seat(3)).expect("A4");
        engine.toggle_seat(seat(4)).expect("A5");

        let state = engine.set_unavailable([seat(3), seat(99)]);

        assert!(state.unavailable_seats().contains(seat(3)));
        assert!(!state.unavailable_seats().contains(seat(99)));
        assert_eq!(selected(&engine), [4]);
        assert!(engine.availability().is_unavailable(seat(3)));
    }

    #[test]
    fn same_snapshot_twice_is_idempotent() {
        let mut engine = engine();
        engine.toggle_seat(seat(5)).expect("A6");

        let once = engine.set_unavailable([seat(5), seat(6)]).clone();
        let twice = engine.set_unavailable([seat(6), seat(5)]).clone();

        assert_eq!(once, twice);
    }

    #[test]
    fn toggling_unavailable_seat_is_a_no_op() {
        let mut engine = engine();
        engine.set_unavailable([seat(2)]);

        let state = engine.toggle_seat(seat(2)).expect("known seat").clone();

        assert!(state.selected_seats().is_empty());
        assert_eq!(state.limit(), 0);
    }

    #[test]
    fn seat_labels_are_sorted() {
        let mut engine = engine();
        engine.set_ticket_count(TicketType::Standard, 3);
        for id in [8, 2, 0] {
            engine.toggle_seat(seat(id)).expect("demo seat");
        }
        assert_eq!(engine.selected_seat_labels(), ["A1", "A3", "B2"]);
    }

    #[test]
    fn seat_plan_reflects_engine_state() {
        let mut engine = engine();
        engine.toggle_seat(seat(0)).expect("A1");
        engine.set_unavailable([seat(8)]);

        let plan = engine.current_seat_plan();

        assert_eq!(plan.status_of(seat(0)), Some(SeatStatus::Selected));
        assert_eq!(plan.status_of(seat(8)), Some(SeatStatus::Unavailable));
        assert_eq!(plan.status_of(seat(7)), Some(SeatStatus::Distancing));
        assert_eq!(plan.status_of(seat(9)), Some(SeatStatus::Distancing));
        assert_eq!(plan.status_of(seat(10)), Some(SeatStatus::Available));
    }

    #[test]
    fn seat_plan_without_distancing() {
        let mut engine = engine().with_distancing(DistancingPolicy::Disabled);
        engine.set_unavailable([seat(8)]);
        assert_eq!(engine.current_seat_plan().status_of(seat(7)), Some(SeatStatus::Available));
    }
}
