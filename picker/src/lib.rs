//! Seat Picker - seat-selection state engine for an auditorium booking flow
//!
//! A user asks for a number of tickets per ticket type, then picks that many
//! seats from a grid while an external feed keeps reporting which seats other
//! customers have taken. This crate owns the rules that keep those two inputs
//! consistent:
//!
//! - never more seats selected than tickets requested (oldest selection goes
//!   first when the limit drops)
//! - never an unavailable seat selected (it is deselected when the feed says so)
//! - picking a seat before choosing tickets assumes one `STANDARD` ticket
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────┐
//!              │ SeatCatalog  │  static, shared via Arc
//!              └──────┬───────┘
//!                     │
//! gestures ──▶ ┌──────┴─────────────────────────┐ ──▶ SeatPlan (project)
//!              │ SelectionEngine                │
//! feed ──────▶ │   AvailabilityTracker          │
//!              │   SelectionState               │
//!              └────────────────────────────────┘
//! ```
//!
//! The engine can be driven directly, or through [`reducer::SeatPickerReducer`]
//! inside a `seat_picker_runtime::Store`, which also runs the availability
//! poll loop as effects.
//!
//! # Example
//!
//! ```
//! use seat_picker::{SeatCatalog, SeatId, SeatStatus, SelectionEngine, TicketType};
//! use std::sync::Arc;
//!
//! let mut engine = SelectionEngine::new(Arc::new(SeatCatalog::demo()));
//! engine.set_ticket_count(TicketType::Standard, 2);
//! engine.toggle_seat(SeatId::new(3)).ok();
//! engine.set_unavailable([SeatId::new(5)]);
//!
//! let plan = engine.current_seat_plan();
//! assert_eq!(plan.status_of(SeatId::new(3)), Some(SeatStatus::Selected));
//! assert_eq!(plan.status_of(SeatId::new(4)), Some(SeatStatus::Distancing));
//! assert!(!engine.current_validity());
//! ```

pub mod availability;
pub mod catalog;
pub mod config;
pub mod digits;
pub mod engine;
pub mod error;
pub mod feed;
pub mod plan;
pub mod reducer;
pub mod selection;
pub mod types;

pub use availability::{AvailabilitySnapshot, AvailabilityTracker};
pub use catalog::SeatCatalog;
pub use config::Config;
pub use engine::SelectionEngine;
pub use error::{CatalogError, FeedError, SelectionError};
pub use feed::{AvailabilityFeed, PollSchedule, RandomAvailabilityFeed, ScriptedFeed, StaticFeed};
pub use plan::{project, DistancingPolicy, SeatPlan, SeatPlanEntry};
pub use reducer::{FeedStatus, SeatPickerAction, SeatPickerEnvironment, SeatPickerReducer, SeatPickerState};
pub use selection::{SelectedSeats, SelectionState};
pub use types::{ColumnId, RowId, Seat, SeatId, SeatStatus, SectionId, TicketSelection, TicketType};
