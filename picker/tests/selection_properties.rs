//! Property-based tests for the selection engine.
//!
//! Arbitrary interleavings of ticket edits, seat toggles (including unknown
//! seats) and availability snapshots must keep the engine's invariants, and
//! the seat plan must agree with the engine state it was projected from.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use proptest::prelude::*;
use seat_picker::{
    DistancingPolicy, SeatCatalog, SeatId, SeatStatus, SelectionEngine, SelectionError, TicketType,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Catalog ids run 0..12; 12..16 are unknown
const ID_RANGE: std::ops::Range<u32> = 0..16;

#[derive(Clone, Debug)]
enum Event {
    SetTicketCount(TicketType, i64),
    Toggle(u32),
    SetUnavailable(Vec<u32>),
}

fn ticket_type() -> impl Strategy<Value = TicketType> {
    prop_oneof![Just(TicketType::Standard), Just(TicketType::Member)]
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        3 => (ticket_type(), -3i64..12).prop_map(|(t, c)| Event::SetTicketCount(t, c)),
        6 => ID_RANGE.prop_map(Event::Toggle),
        2 => prop::collection::vec(ID_RANGE, 0..6).prop_map(Event::SetUnavailable),
    ]
}

fn catalog() -> Arc<SeatCatalog> {
    Arc::new(SeatCatalog::uniform(2, 2, 3))
}

fn apply(engine: &mut SelectionEngine, event: &Event) -> Result<(), SelectionError> {
    match event {
        Event::SetTicketCount(ticket_type, count) => {
            engine.set_ticket_count(*ticket_type, *count);
        },
        Event::Toggle(id) => {
            engine.toggle_seat(SeatId::new(*id))?;
        },
        Event::SetUnavailable(ids) => {
            engine.set_unavailable(ids.iter().copied().map(SeatId::new));
        },
    }
    Ok(())
}

fn assert_invariants(engine: &SelectionEngine) -> Result<(), TestCaseError> {
    let state = engine.current_selection();
    let selected = state.selected_seats();
    let limit = state.limit() as usize;

    prop_assert!(selected.len() <= limit, "{} seats selected with limit {}", selected.len(), limit);

    for seat_id in selected.iter() {
        prop_assert!(!state.unavailable_seats().contains(seat_id), "unavailable seat {} selected", seat_id);
        prop_assert!(engine.catalog().contains(seat_id), "unknown seat {} selected", seat_id);
    }

    let distinct: BTreeSet<_> = selected.iter().collect();
    prop_assert_eq!(distinct.len(), selected.len());

    prop_assert_eq!(engine.current_validity(), limit > 0 && selected.len() == limit);

    for seat_id in state.unavailable_seats().iter() {
        prop_assert!(engine.catalog().contains(seat_id));
    }
    Ok(())
}

proptest! {
    /// Invariants hold after every event of any sequence
    #[test]
    fn prop_invariants_hold(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut engine = SelectionEngine::new(catalog());
        for event in &events {
            let _ = apply(&mut engine, event);
            assert_invariants(&engine)?;
        }
    }

    /// Rejected operations leave the state untouched
    #[test]
    fn prop_rejections_change_nothing(
        events in prop::collection::vec(event_strategy(), 0..30),
        unknown in 12u32..100,
        name in "[a-z]{1,8}",
    ) {
        let mut engine = SelectionEngine::new(catalog());
        for event in &events {
            let _ = apply(&mut engine, event);
        }
        let before = engine.current_selection().clone();

        prop_assert_eq!(
            engine.toggle_seat(SeatId::new(unknown)).map(|_| ()),
            Err(SelectionError::InvalidSeatReference(SeatId::new(unknown)))
        );
        prop_assert!(engine.set_ticket_count_by_name(&name, 1).is_err());
        prop_assert_eq!(engine.current_selection(), &before);
    }

    /// Delivering the same snapshot twice equals delivering it once
    #[test]
    fn prop_unavailable_replace_is_idempotent(
        events in prop::collection::vec(event_strategy(), 0..30),
        snapshot in prop::collection::vec(ID_RANGE, 0..8),
    ) {
        let mut engine = SelectionEngine::new(catalog());
        for event in &events {
            let _ = apply(&mut engine, event);
        }

        let ids = || snapshot.iter().copied().map(SeatId::new);
        let once = engine.set_unavailable(ids()).clone();
        let twice = engine.set_unavailable(ids()).clone();

        prop_assert_eq!(once, twice);
    }

    /// Eviction always drops the oldest selections first
    #[test]
    fn prop_eviction_is_fifo(picks in prop::collection::btree_set(0u32..12, 1..8), keep in 0i64..8) {
        let picks: Vec<_> = picks.into_iter().collect();
        let mut engine = SelectionEngine::new(catalog());
        engine.set_ticket_count(TicketType::Standard, picks.len() as i64);
        for id in &picks {
            engine.toggle_seat(SeatId::new(*id)).unwrap();
        }

        engine.set_ticket_count(TicketType::Standard, keep);

        let kept: Vec<u32> = engine.current_selection().selected_seats().iter().map(SeatId::get).collect();
        let expected = &picks[picks.len().saturating_sub(keep as usize)..];
        prop_assert_eq!(kept.as_slice(), expected);
    }

    /// The seat plan agrees with the engine state
    #[test]
    fn prop_plan_matches_state(events in prop::collection::vec(event_strategy(), 0..40)) {
        let mut engine = SelectionEngine::new(catalog()).with_distancing(DistancingPolicy::Enabled);
        for event in &events {
            let _ = apply(&mut engine, event);
        }

        let state = engine.current_selection();
        let plan = engine.current_seat_plan();
        prop_assert_eq!(plan.entries().count(), engine.catalog().len());

        for section in plan.rows.iter().flat_map(|row| row.sections.iter()) {
            for (position, entry) in section.entries.iter().enumerate() {
                let unavailable = |p: usize| {
                    section.entries.get(p).is_some_and(|e| state.unavailable_seats().contains(e.seat_id))
                };
                let near_unavailable =
                    position.checked_sub(1).is_some_and(unavailable) || unavailable(position + 1);

                let expected = if state.selected_seats().contains(entry.seat_id) {
                    SeatStatus::Selected
                } else if state.unavailable_seats().contains(entry.seat_id) {
                    SeatStatus::Unavailable
                } else if near_unavailable {
                    SeatStatus::Distancing
                } else {
                    SeatStatus::Available
                };
                prop_assert_eq!(entry.status, expected, "seat {}", entry.seat_id);
            }
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

fn engine() -> SelectionEngine {
    SelectionEngine::new(Arc::new(SeatCatalog::uniform(1, 1, 3)))
}

#[test]
fn fifo_eviction_scenario() {
    let mut engine = engine();
    engine.set_ticket_count(TicketType::Standard, 3);
    for id in [0, 1, 2] {
        engine.toggle_seat(SeatId::new(id)).unwrap();
    }

    engine.set_ticket_count(TicketType::Standard, 1);

    assert_eq!(engine.current_selection().selected_seats().as_slice(), [SeatId::new(2)]);
}

#[test]
fn auto_default_ticket_scenario() {
    let mut engine = engine();
    let state = engine.toggle_seat(SeatId::new(1)).unwrap();

    assert_eq!(state.ticket_selection().get(TicketType::Standard), 1);
    assert_eq!(state.ticket_selection().get(TicketType::Member), 0);
    assert_eq!(state.selected_seats().as_slice(), [SeatId::new(1)]);
}

#[test]
fn distancing_scenario() {
    let mut engine = engine();
    engine.set_unavailable([SeatId::new(1)]);

    let plan = engine.current_seat_plan();

    assert_eq!(plan.status_of(SeatId::new(0)), Some(SeatStatus::Distancing));
    assert_eq!(plan.status_of(SeatId::new(1)), Some(SeatStatus::Unavailable));
    assert_eq!(plan.status_of(SeatId::new(2)), Some(SeatStatus::Distancing));
}

#[test]
fn distancing_seat_stays_selectable() {
    let mut engine = engine();
    engine.set_unavailable([SeatId::new(1)]);

    engine.toggle_seat(SeatId::new(0)).unwrap();

    assert_eq!(engine.current_seat_plan().status_of(SeatId::new(0)), Some(SeatStatus::Selected));
}

#[test]
fn validity_toggling_scenario() {
    let mut engine = engine();
    engine.set_ticket_count(TicketType::Standard, 2);
    engine.toggle_seat(SeatId::new(0)).unwrap();
    engine.toggle_seat(SeatId::new(1)).unwrap();
    assert!(engine.current_validity());

    engine.toggle_seat(SeatId::new(0)).unwrap();
    assert!(!engine.current_validity());
}

#[test]
fn unavailability_forces_deselection_scenario() {
    let mut engine = engine();
    engine.toggle_seat(SeatId::new(2)).unwrap();

    engine.set_unavailable([SeatId::new(2)]);

    assert!(!engine.current_selection().selected_seats().contains(SeatId::new(2)));
}

#[test]
fn seat_becoming_available_again_is_not_reselected() {
    let mut engine = engine();
    engine.toggle_seat(SeatId::new(2)).unwrap();
    engine.set_unavailable([SeatId::new(2)]);

    engine.set_unavailable([]);

    assert!(engine.current_selection().selected_seats().is_empty());
    assert_eq!(engine.current_seat_plan().status_of(SeatId::new(2)), Some(SeatStatus::Available));
}
